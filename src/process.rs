//! Load, reflow, save. The only layer that touches the filesystem around
//! the engine.

use anyhow::{Context, Result, anyhow};
use rand::Rng;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use umya_spreadsheet::{Spreadsheet, Worksheet};

use crate::engine::{ReflowEngine, ReflowOutcome, ReflowRequest};

pub const OUTPUT_SUFFIX: &str = "_processed";

pub fn load_workbook(path: &Path) -> Result<Spreadsheet> {
    if !path.exists() {
        anyhow::bail!("workbook {} does not exist", path.display());
    }
    umya_spreadsheet::reader::xlsx::read(path)
        .with_context(|| format!("failed to open workbook '{}'", path.display()))
}

pub fn save_workbook(book: &Spreadsheet, path: &Path) -> Result<()> {
    umya_spreadsheet::writer::xlsx::write(book, path)
        .with_context(|| format!("failed to save workbook '{}'", path.display()))
}

/// Named sheet, or the first one.
pub fn sheet<'a>(book: &'a Spreadsheet, name: Option<&str>) -> Result<&'a Worksheet> {
    match name {
        Some(name) => book
            .get_sheet_by_name(name)
            .ok_or_else(|| sheet_not_found(book, name)),
        None => book
            .get_sheet_collection()
            .first()
            .ok_or_else(|| anyhow!("workbook has no sheets")),
    }
}

pub fn sheet_mut<'a>(book: &'a mut Spreadsheet, name: Option<&str>) -> Result<&'a mut Worksheet> {
    match name {
        Some(name) => {
            if book.get_sheet_by_name(name).is_none() {
                return Err(sheet_not_found(book, name));
            }
            book.get_sheet_by_name_mut(name)
                .ok_or_else(|| anyhow!("sheet '{}' not found", name))
        }
        None => book
            .get_sheet_collection_mut()
            .first_mut()
            .ok_or_else(|| anyhow!("workbook has no sheets")),
    }
}

fn sheet_not_found(book: &Spreadsheet, requested: &str) -> anyhow::Error {
    let wanted = requested.trim().to_lowercase();
    let suggestion = book
        .get_sheet_collection()
        .iter()
        .map(|sheet| sheet.get_name().to_string())
        .find(|candidate| {
            let lower = candidate.to_lowercase();
            lower == wanted || lower.starts_with(&wanted) || wanted.starts_with(&lower)
        });
    match suggestion {
        Some(suggested) => anyhow!(
            "sheet '{}' not found; did you mean '{}' ?",
            requested,
            suggested
        ),
        None => anyhow!("sheet '{}' not found", requested),
    }
}

/// `<dir>/<stem>_processed.xlsx`, next to the input unless a directory is given.
pub fn default_output_path(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "invoice".to_string());
    let dir = output_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{stem}{OUTPUT_SUFFIX}.xlsx"))
}

/// Reflows one sheet of `input` and writes the result to `output`.
/// A half-written output file is removed when saving fails.
pub fn process_file<R: Rng>(
    input: &Path,
    output: &Path,
    engine: &ReflowEngine,
    request: &ReflowRequest,
    sheet_name: Option<&str>,
    rng: &mut R,
) -> Result<ReflowOutcome> {
    let mut book = load_workbook(input)?;
    let outcome = {
        let sheet = sheet_mut(&mut book, sheet_name)?;
        engine.run(sheet, request, rng)?
    };

    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output dir '{}'", parent.display()))?;
    }

    if let Err(err) = save_workbook(&book, output) {
        if output.exists() {
            if let Err(cleanup) = std::fs::remove_file(output) {
                warn!(
                    path = %output.display(),
                    error = %cleanup,
                    "could not remove partial output"
                );
            }
        }
        return Err(err);
    }

    info!(
        input = %input.display(),
        output = %output.display(),
        items = outcome.item_count,
        rows_inserted = outcome.rows_inserted,
        "workbook processed"
    );
    Ok(outcome)
}
