use serde::Serialize;
use umya_spreadsheet::Worksheet;

use crate::address::CellAddress;
use crate::grid::{merged_regions, merged_text};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PreviewData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub metadata: PreviewMetadata,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreviewMetadata {
    pub total_rows: u32,
    pub total_columns: u32,
    pub sheet_name: String,
    pub preview_rows: usize,
}

/// Row 1 as headers, then up to `max_rows` rows below it as text.
pub fn build_preview(sheet: &Worksheet, max_rows: usize) -> PreviewData {
    let total_rows = sheet.get_highest_row();
    let total_columns = sheet.get_highest_column();
    let regions = merged_regions(sheet);

    let row_text = |row: u32| -> Vec<String> {
        (1..=total_columns)
            .map(|col| merged_text(sheet, &regions, CellAddress::new(col, row)))
            .collect()
    };

    let headers = if total_rows >= 1 { row_text(1) } else { Vec::new() };
    let last = total_rows.min(max_rows.saturating_add(1).min(u32::MAX as usize) as u32);
    let rows: Vec<Vec<String>> = (2..=last).map(row_text).collect();

    PreviewData {
        headers,
        metadata: PreviewMetadata {
            total_rows,
            total_columns,
            sheet_name: sheet.get_name().to_string(),
            preview_rows: rows.len(),
        },
        rows,
    }
}
