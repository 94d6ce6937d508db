//! Merge-aware cell access over a `umya_spreadsheet::Worksheet`.
//!
//! Only the top-left anchor of a merge region stores a value; writes to an
//! interior cell are dropped by spreadsheet applications. Every read and
//! write the engine performs goes through [`merge_aware_get`] and
//! [`merge_aware_set`] so it always lands on the anchor.

pub mod merge;
pub mod rows;

use tracing::warn;
use umya_spreadsheet::Worksheet;

use crate::address::{CellAddress, CellRect};

#[derive(Debug, Clone, PartialEq)]
pub enum CellData {
    Empty,
    Number(f64),
    Text(String),
    /// Formula text without the leading `=`.
    Formula(String),
}

impl CellData {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Direct read of one cell, ignoring merges.
pub fn read_cell(sheet: &Worksheet, addr: CellAddress) -> CellData {
    let Some(cell) = sheet.get_cell(addr.as_tuple()) else {
        return CellData::Empty;
    };
    if cell.is_formula() {
        return CellData::Formula(cell.get_formula().to_string());
    }
    if let Some(number) = cell.get_value_number() {
        return CellData::Number(number);
    }
    let text = cell.get_value();
    if text.is_empty() {
        CellData::Empty
    } else {
        CellData::Text(text.to_string())
    }
}

/// Direct write of one cell, ignoring merges. Styles are left untouched.
pub fn write_cell(sheet: &mut Worksheet, addr: CellAddress, value: &CellData) {
    let cell = sheet.get_cell_mut(addr.as_tuple());
    cell.get_cell_value_mut().remove_formula();
    match value {
        CellData::Empty => {
            cell.get_cell_value_mut().set_blank();
        }
        CellData::Number(n) => {
            cell.set_value_number(*n);
        }
        CellData::Text(s) => {
            cell.set_value_string(s.clone());
        }
        CellData::Formula(f) => {
            cell.set_formula(f.trim_start_matches('=').to_string());
            cell.set_formula_result_default("");
        }
    }
}

/// Clears a value without creating a cell that did not exist.
pub fn clear_cell(sheet: &mut Worksheet, addr: CellAddress) {
    if sheet.get_cell(addr.as_tuple()).is_some() {
        write_cell(sheet, addr, &CellData::Empty);
    }
}

/// Parsed merge regions. Ranges that do not parse are skipped with a warning.
pub fn merged_regions(sheet: &Worksheet) -> Vec<CellRect> {
    sheet
        .get_merge_cells()
        .iter()
        .filter_map(|range| {
            let text = range.get_range();
            let rect = CellRect::parse(&text);
            if rect.is_none() {
                warn!(range = %text, "ignoring merge region with unreadable address");
            }
            rect
        })
        .collect()
}

pub fn merge_region_at(sheet: &Worksheet, addr: CellAddress) -> Option<CellRect> {
    merged_regions(sheet).into_iter().find(|rect| rect.contains(addr))
}

/// The cell that actually stores the value shown at `addr`.
pub fn resolve_anchor(sheet: &Worksheet, addr: CellAddress) -> CellAddress {
    merge_region_at(sheet, addr)
        .map(|rect| rect.anchor())
        .unwrap_or(addr)
}

pub fn merge_aware_get(sheet: &Worksheet, addr: CellAddress) -> CellData {
    read_cell(sheet, resolve_anchor(sheet, addr))
}

/// Writes to the anchor of the region covering `addr`, or to `addr` itself.
/// Returns the address that received the value.
pub fn merge_aware_set(
    sheet: &mut Worksheet,
    addr: CellAddress,
    value: &CellData,
) -> CellAddress {
    let target = resolve_anchor(sheet, addr);
    write_cell(sheet, target, value);
    target
}

/// Text shown at `addr` once merges are taken into account: the anchor
/// carries the region's text and every other cell of the region is blank.
pub fn merged_text(sheet: &Worksheet, regions: &[CellRect], addr: CellAddress) -> String {
    match regions.iter().find(|rect| rect.contains(addr)) {
        Some(rect) if rect.anchor() != addr => String::new(),
        _ => formatted_text(sheet, addr),
    }
}

/// Text of one cell as printed. A formula without a cached result shows
/// its source.
pub fn formatted_text(sheet: &Worksheet, addr: CellAddress) -> String {
    let Some(cell) = sheet.get_cell(addr.as_tuple()) else {
        return String::new();
    };
    let shown = cell.get_formatted_value();
    if shown.is_empty() && cell.is_formula() {
        format!("={}", cell.get_formula())
    } else {
        shown
    }
}
