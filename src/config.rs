use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use strum::{Display, EnumString};

use crate::address::{CellAddress, MAX_ROW, column_index};
use crate::distribute::PercentBand;
use crate::errors::ReflowError;
use crate::label::{CountLabelMatcher, KeywordCountMatcher};

const DEFAULT_MAX_PREVIEW_ROWS: usize = 20;
const DEFAULT_EXTENSIONS: &[&str] = &["xlsx"];
const DEFAULT_SOFFICE: &str = "soffice";
const DEFAULT_PDF_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_TEMPLATE: &str = "default";
pub const DEFAULT_PDF_PROFILE: &str = "default";
pub const DEFAULT_FOOTER: &str = "Generated by invoice-reflow";

/// Where things live in one invoice layout, plus how values are written.
#[derive(Debug, Clone)]
pub struct TemplateConfig {
    pub name: String,
    pub weight_column: String,
    pub start_row: u32,
    pub total_row: u32,
    pub count_label_cell: String,
    /// Row whose formatting new rows copy; `start_row` when unset.
    pub template_row: Option<u32>,
    pub font_size: f64,
    pub min_percent: f64,
    pub max_percent: f64,
    pub preserve_wrapping: bool,
    pub date_cell: String,
    pub lot_number_cell: String,
    pub name_cell: String,
    pub address_cell: String,
    pub count_label: Arc<dyn CountLabelMatcher>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_TEMPLATE.to_string(),
            weight_column: "G".to_string(),
            start_row: 8,
            total_row: 38,
            count_label_cell: "C38".to_string(),
            template_row: None,
            font_size: 9.0,
            min_percent: -2.0,
            max_percent: 2.0,
            preserve_wrapping: true,
            date_cell: "A4".to_string(),
            lot_number_cell: "B4".to_string(),
            name_cell: "C3".to_string(),
            address_cell: "C4".to_string(),
            count_label: Arc::new(KeywordCountMatcher::bags()),
        }
    }
}

/// Partial template, as read from YAML or supplied per call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatePatch {
    pub weight_column: Option<String>,
    pub start_row: Option<u32>,
    pub total_row: Option<u32>,
    pub count_label_cell: Option<String>,
    pub template_row: Option<u32>,
    pub font_size: Option<f64>,
    pub min_percent: Option<f64>,
    pub max_percent: Option<f64>,
    pub preserve_wrapping: Option<bool>,
    pub date_cell: Option<String>,
    pub lot_number_cell: Option<String>,
    pub name_cell: Option<String>,
    pub address_cell: Option<String>,
    /// Unit keyword of the count label, e.g. `bag`.
    pub count_keyword: Option<String>,
    /// Unit written when a label has to be created from scratch, e.g. `Bags`.
    pub count_unit: Option<String>,
}

impl TemplatePatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Template coordinates checked and converted to grid addresses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateLayout {
    pub weight_col: u32,
    pub start_row: u32,
    pub total_row: u32,
    pub template_row: u32,
    pub count_label: CellAddress,
    pub date: CellAddress,
    pub lot_number: CellAddress,
    pub name: CellAddress,
    pub address: CellAddress,
    pub band: PercentBand,
}

impl TemplateLayout {
    /// Rows available for items before the total row.
    pub fn capacity(&self) -> u32 {
        self.total_row - self.start_row
    }

    pub fn weight_cell(&self, row: u32) -> CellAddress {
        CellAddress::new(self.weight_col, row)
    }
}

impl TemplateConfig {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn apply_patch(&mut self, patch: &TemplatePatch) -> Result<(), ReflowError> {
        macro_rules! take {
            ($field:ident) => {
                if let Some(value) = &patch.$field {
                    self.$field = value.clone();
                }
            };
        }
        take!(weight_column);
        take!(start_row);
        take!(total_row);
        take!(count_label_cell);
        take!(font_size);
        take!(min_percent);
        take!(max_percent);
        take!(preserve_wrapping);
        take!(date_cell);
        take!(lot_number_cell);
        take!(name_cell);
        take!(address_cell);
        if patch.template_row.is_some() {
            self.template_row = patch.template_row;
        }

        if patch.count_keyword.is_some() || patch.count_unit.is_some() {
            let keyword = patch.count_keyword.as_deref().unwrap_or("bag");
            let unit = patch.count_unit.as_deref().unwrap_or("Bags");
            let matcher = KeywordCountMatcher::new(keyword, unit).map_err(|e| {
                ReflowError::config(format!("count keyword '{}' is not usable: {}", keyword, e))
            })?;
            self.count_label = Arc::new(matcher);
        }
        Ok(())
    }

    pub fn with_matcher(mut self, matcher: Arc<dyn CountLabelMatcher>) -> Self {
        self.count_label = matcher;
        self
    }

    pub fn validate(&self) -> Result<TemplateLayout, ReflowError> {
        let weight_col = column_index(self.weight_column.trim()).ok_or_else(|| {
            ReflowError::config(format!(
                "template '{}': weight column '{}' is not a column letter",
                self.name, self.weight_column
            ))
        })?;
        if self.start_row < 1 {
            return Err(ReflowError::config(format!(
                "template '{}': start_row must be at least 1",
                self.name
            )));
        }
        if self.start_row >= self.total_row {
            return Err(ReflowError::config(format!(
                "template '{}': start_row ({}) must be before total_row ({})",
                self.name, self.start_row, self.total_row
            )));
        }
        if self.total_row > MAX_ROW {
            return Err(ReflowError::config(format!(
                "template '{}': total_row {} is past the last sheet row",
                self.name, self.total_row
            )));
        }
        let template_row = self.template_row.unwrap_or(self.start_row);
        if template_row < 1 || template_row > MAX_ROW {
            return Err(ReflowError::config(format!(
                "template '{}': template_row {} is out of range",
                self.name, template_row
            )));
        }
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(ReflowError::config(format!(
                "template '{}': font_size must be positive",
                self.name
            )));
        }
        let band = PercentBand::new(self.min_percent, self.max_percent)?;

        let cell = |field: &str, value: &str| {
            CellAddress::parse(value).ok_or_else(|| {
                ReflowError::config(format!(
                    "template '{}': {} '{}' is not a cell address",
                    self.name, field, value
                ))
            })
        };

        Ok(TemplateLayout {
            weight_col,
            start_row: self.start_row,
            total_row: self.total_row,
            template_row,
            count_label: cell("count_label_cell", &self.count_label_cell)?,
            date: cell("date_cell", &self.date_cell)?,
            lot_number: cell("lot_number_cell", &self.lot_number_cell)?,
            name: cell("name_cell", &self.name_cell)?,
            address: cell("address_cell", &self.address_cell)?,
            band,
        })
    }

    pub fn summary(&self) -> TemplateSummary {
        TemplateSummary {
            name: self.name.clone(),
            weight_column: self.weight_column.clone(),
            start_row: self.start_row,
            total_row: self.total_row,
            capacity: self.total_row.saturating_sub(self.start_row),
            count_label_cell: self.count_label_cell.clone(),
            font_size: self.font_size,
            min_percent: self.min_percent,
            max_percent: self.max_percent,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateSummary {
    pub name: String,
    pub weight_column: String,
    pub start_row: u32,
    pub total_row: u32,
    pub capacity: u32,
    pub count_label_cell: String,
    pub font_size: f64,
    pub min_percent: f64,
    pub max_percent: f64,
}

fn builtin_patches() -> Vec<(&'static str, TemplatePatch)> {
    let cells = |label: &str, date: &str, lot: &str, name: &str, address: &str| TemplatePatch {
        count_label_cell: Some(label.to_string()),
        date_cell: Some(date.to_string()),
        lot_number_cell: Some(lot.to_string()),
        name_cell: Some(name.to_string()),
        address_cell: Some(address.to_string()),
        ..TemplatePatch::default()
    };
    vec![
        (DEFAULT_TEMPLATE, TemplatePatch::default()),
        (
            "invoice1",
            TemplatePatch {
                weight_column: Some("F".into()),
                start_row: Some(10),
                total_row: Some(40),
                ..cells("B40", "A3", "B3", "C2", "C3")
            },
        ),
        (
            "invoice2",
            TemplatePatch {
                weight_column: Some("H".into()),
                start_row: Some(12),
                total_row: Some(42),
                ..cells("D42", "A5", "B5", "C4", "C5")
            },
        ),
        (
            "custom",
            TemplatePatch {
                start_row: Some(10),
                total_row: Some(40),
                count_label_cell: Some("C40".into()),
                ..TemplatePatch::default()
            },
        ),
        (
            "yarn",
            TemplatePatch {
                start_row: Some(10),
                total_row: Some(42),
                font_size: Some(11.0),
                ..TemplatePatch::default()
            },
        ),
    ]
}

/// Named templates, built once and only read afterwards.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, TemplateConfig>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateRegistry {
    pub fn builtin() -> Self {
        let mut templates = BTreeMap::new();
        for (name, patch) in builtin_patches() {
            let mut config = TemplateConfig::named(name);
            // built-in patches carry no matcher settings, so this cannot fail
            if config.apply_patch(&patch).is_ok() {
                templates.insert(name.to_string(), config);
            }
        }
        Self { templates }
    }

    /// Built-ins plus file templates. A file entry named like a built-in
    /// patches it; a new name starts from the defaults.
    pub fn with_patches(patches: &BTreeMap<String, TemplatePatch>) -> Result<Self, ReflowError> {
        let mut registry = Self::builtin();
        for (name, patch) in patches {
            let mut config = registry
                .templates
                .get(name)
                .cloned()
                .unwrap_or_else(|| TemplateConfig::named(name));
            config.apply_patch(patch)?;
            config.validate()?;
            registry.templates.insert(name.clone(), config);
        }
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Result<&TemplateConfig, ReflowError> {
        self.templates.get(name).ok_or_else(|| {
            ReflowError::config(format!(
                "unknown template '{}'; known templates: {}",
                name,
                self.names().join(", ")
            ))
        })
    }

    /// Named template (or the default) with per-call overrides on top.
    pub fn resolve(
        &self,
        name: Option<&str>,
        overrides: &TemplatePatch,
    ) -> Result<TemplateConfig, ReflowError> {
        let mut config = self.get(name.unwrap_or(DEFAULT_TEMPLATE))?.clone();
        config.apply_patch(overrides)?;
        config.validate()?;
        Ok(config)
    }

    pub fn names(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TemplateConfig> {
        self.templates.values()
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
}

impl PageSize {
    /// Width and height in PDF points.
    pub fn dimensions(self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfProfile {
    pub page_size: PageSize,
    pub margin: f64,
    pub include_header: bool,
    pub include_footer: bool,
    pub footer_text: String,
    /// Try a LibreOffice conversion before drawing the grid ourselves.
    pub preserve_formatting: bool,
}

impl Default for PdfProfile {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            margin: 36.0,
            include_header: true,
            include_footer: true,
            footer_text: DEFAULT_FOOTER.to_string(),
            preserve_formatting: true,
        }
    }
}

pub fn builtin_pdf_profiles() -> BTreeMap<String, PdfProfile> {
    let mut profiles = BTreeMap::new();
    profiles.insert(DEFAULT_PDF_PROFILE.to_string(), PdfProfile::default());
    profiles.insert(
        "compact".to_string(),
        PdfProfile {
            margin: 18.0,
            include_header: false,
            include_footer: false,
            ..PdfProfile::default()
        },
    );
    profiles.insert(
        "letter".to_string(),
        PdfProfile {
            page_size: PageSize::Letter,
            ..PdfProfile::default()
        },
    );
    profiles
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub output_dir: Option<PathBuf>,
    pub max_preview_rows: usize,
    pub allowed_extensions: Vec<String>,
    pub soffice_path: PathBuf,
    pub pdf_timeout_ms: u64,
    pub pdf_profiles: BTreeMap<String, PdfProfile>,
    pub templates: TemplateRegistry,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            max_preview_rows: DEFAULT_MAX_PREVIEW_ROWS,
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            soffice_path: PathBuf::from(DEFAULT_SOFFICE),
            pdf_timeout_ms: DEFAULT_PDF_TIMEOUT_MS,
            pdf_profiles: builtin_pdf_profiles(),
            templates: TemplateRegistry::builtin(),
        }
    }
}

impl AppConfig {
    pub fn from_args(args: ConfigArgs) -> Result<Self> {
        let ConfigArgs {
            config,
            output_dir: cli_output_dir,
            max_preview_rows: cli_max_preview_rows,
            extensions: cli_extensions,
            soffice_path: cli_soffice_path,
            pdf_timeout_ms: cli_pdf_timeout_ms,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            output_dir: file_output_dir,
            max_preview_rows: file_max_preview_rows,
            extensions: file_extensions,
            soffice_path: file_soffice_path,
            pdf_timeout_ms: file_pdf_timeout_ms,
            pdf_profiles: file_pdf_profiles,
            templates: file_templates,
        } = file_config;

        let output_dir = cli_output_dir.or(file_output_dir);

        let max_preview_rows = cli_max_preview_rows
            .or(file_max_preview_rows)
            .unwrap_or(DEFAULT_MAX_PREVIEW_ROWS)
            .max(1);

        let mut allowed_extensions = cli_extensions
            .or(file_extensions)
            .unwrap_or_else(|| DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect())
            .into_iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect::<Vec<_>>();
        allowed_extensions.sort();
        allowed_extensions.dedup();

        anyhow::ensure!(
            !allowed_extensions.is_empty(),
            "at least one file extension must be allowed"
        );

        let soffice_path = cli_soffice_path
            .or(file_soffice_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SOFFICE));

        let pdf_timeout_ms = cli_pdf_timeout_ms
            .or(file_pdf_timeout_ms)
            .unwrap_or(DEFAULT_PDF_TIMEOUT_MS);

        let mut pdf_profiles = builtin_pdf_profiles();
        pdf_profiles.extend(file_pdf_profiles.unwrap_or_default());

        let templates = TemplateRegistry::with_patches(&file_templates.unwrap_or_default())
            .context("invalid template in config file")?;

        Ok(Self {
            output_dir,
            max_preview_rows,
            allowed_extensions,
            soffice_path,
            pdf_timeout_ms,
            pdf_profiles,
            templates,
        })
    }

    pub fn pdf_profile(&self, name: Option<&str>) -> Result<&PdfProfile> {
        let name = name.unwrap_or(DEFAULT_PDF_PROFILE);
        self.pdf_profiles.get(name).ok_or_else(|| {
            anyhow::anyhow!(
                "unknown pdf profile '{}'; known profiles: {}",
                name,
                self.pdf_profiles.keys().cloned().collect::<Vec<_>>().join(", ")
            )
        })
    }

    pub fn pdf_timeout(&self) -> Duration {
        Duration::from_millis(self.pdf_timeout_ms.max(1))
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    #[arg(
        long,
        value_name = "FILE",
        env = "INVOICE_REFLOW_CONFIG",
        global = true,
        help = "Path to a YAML or JSON config file"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        value_name = "DIR",
        env = "INVOICE_REFLOW_OUTPUT_DIR",
        global = true,
        help = "Directory for generated files (defaults to the input file's directory)"
    )]
    pub output_dir: Option<PathBuf>,

    #[arg(
        long,
        value_name = "N",
        env = "INVOICE_REFLOW_MAX_PREVIEW_ROWS",
        global = true,
        help = "Maximum data rows shown by preview (default: 20)",
        value_parser = clap::value_parser!(usize)
    )]
    pub max_preview_rows: Option<usize>,

    #[arg(
        long,
        value_name = "EXT",
        env = "INVOICE_REFLOW_EXTENSIONS",
        value_delimiter = ',',
        global = true,
        help = "Comma-separated list of accepted input extensions"
    )]
    pub extensions: Option<Vec<String>>,

    #[arg(
        long,
        value_name = "PATH",
        env = "INVOICE_REFLOW_SOFFICE",
        global = true,
        help = "LibreOffice binary used for native PDF conversion"
    )]
    pub soffice_path: Option<PathBuf>,

    #[arg(
        long,
        value_name = "MS",
        env = "INVOICE_REFLOW_PDF_TIMEOUT_MS",
        global = true,
        help = "Timeout for native PDF conversion in milliseconds (default: 60000)",
        value_parser = clap::value_parser!(u64)
    )]
    pub pdf_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialConfig {
    output_dir: Option<PathBuf>,
    max_preview_rows: Option<usize>,
    extensions: Option<Vec<String>>,
    soffice_path: Option<PathBuf>,
    pdf_timeout_ms: Option<u64>,
    pdf_profiles: Option<BTreeMap<String, PdfProfile>>,
    templates: Option<BTreeMap<String, TemplatePatch>>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}
