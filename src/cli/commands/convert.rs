use anyhow::{Context, Result};
use serde_json::Value;
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::render::{SofficeConverter, render_pdf};
use crate::validation::validate_extension;

pub async fn convert(
    app: &AppConfig,
    file: PathBuf,
    output: Option<PathBuf>,
    profile: Option<String>,
    sheet: Option<String>,
    basic: bool,
) -> Result<Value> {
    validate_extension(&file, &app.allowed_extensions)?;
    if !file.exists() {
        anyhow::bail!("workbook {} does not exist", file.display());
    }

    let mut profile = app.pdf_profile(profile.as_deref())?.clone();
    if basic {
        profile.preserve_formatting = false;
    }

    let output = match output {
        Some(path) => path,
        None => {
            let stem = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "invoice".to_string());
            let dir = app
                .output_dir
                .clone()
                .or_else(|| file.parent().map(PathBuf::from))
                .unwrap_or_default();
            dir.join(format!("{stem}.pdf"))
        }
    };
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create output dir '{}'", parent.display()))?;
    }

    let converter = SofficeConverter::new(app.soffice_path.clone(), app.pdf_timeout());
    let rendered = render_pdf(&file, &output, &profile, sheet.as_deref(), &converter).await?;
    Ok(serde_json::to_value(rendered)?)
}
