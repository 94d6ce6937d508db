pub mod basic;
pub mod native;

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::PdfProfile;
use crate::process::{load_workbook, sheet};
pub use basic::render_basic;
pub use native::{NativeConverter, SofficeConverter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMethod {
    Native,
    Basic,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderOutcome {
    pub path: PathBuf,
    pub method: RenderMethod,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Converts a saved workbook to PDF, preferring the native converter when the
/// profile asks to keep formatting and falling back to the basic redraw.
pub async fn render_pdf(
    workbook_path: &Path,
    output_path: &Path,
    profile: &PdfProfile,
    sheet_name: Option<&str>,
    converter: &dyn NativeConverter,
) -> Result<RenderOutcome> {
    let mut warnings = Vec::new();

    if profile.preserve_formatting {
        if converter.is_available() {
            match converter.convert(workbook_path, output_path).await {
                Ok(()) => {
                    info!(backend = converter.name(), path = %output_path.display(), "pdf written");
                    return Ok(RenderOutcome {
                        path: output_path.to_path_buf(),
                        method: RenderMethod::Native,
                        warnings,
                    });
                }
                Err(err) => {
                    warn!(backend = converter.name(), error = %err, "native pdf conversion failed");
                    warnings.push(format!(
                        "{} conversion failed, used basic layout: {}",
                        converter.name(),
                        err
                    ));
                }
            }
        } else {
            warnings.push(format!(
                "{} is not available, used basic layout",
                converter.name()
            ));
        }
    }

    let workbook_path = workbook_path.to_path_buf();
    let target = output_path.to_path_buf();
    let profile = profile.clone();
    let sheet_name = sheet_name.map(str::to_string);
    tokio::task::spawn_blocking(move || {
        render_basic_file(&workbook_path, &target, &profile, sheet_name.as_deref())
    })
    .await??;

    info!(path = %output_path.display(), "pdf written with basic layout");
    Ok(RenderOutcome {
        path: output_path.to_path_buf(),
        method: RenderMethod::Basic,
        warnings,
    })
}

fn render_basic_file(
    workbook_path: &Path,
    output_path: &Path,
    profile: &PdfProfile,
    sheet_name: Option<&str>,
) -> Result<()> {
    let book = load_workbook(workbook_path)?;
    let sheet = sheet(&book, sheet_name)?;
    let title = workbook_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let bytes = render_basic(sheet, &title, profile)?;
    std::fs::write(output_path, bytes)
        .with_context(|| format!("failed to write pdf '{}'", output_path.display()))?;
    Ok(())
}
