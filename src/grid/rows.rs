//! Row snapshots and merge-preserving row insertion.

use tracing::info;
use umya_spreadsheet::{Style, Worksheet};

use super::merge::{MergePlan, attach_merges, detach_merges};
use crate::errors::ReflowWarning;

/// Formatting of one row: height, per-cell styles, and the widths of the
/// columns those styles were captured from. Values are never recorded.
#[derive(Debug, Clone)]
pub struct RowSnapshot {
    pub row: u32,
    pub height: Option<f64>,
    pub custom_height: bool,
    pub styles: Vec<(u32, Style)>,
    pub column_widths: Vec<(u32, f64)>,
}

impl RowSnapshot {
    pub fn capture(sheet: &Worksheet, row: u32) -> Self {
        let (height, custom_height) = match sheet.get_row_dimension(&row) {
            Some(dim) if *dim.get_height() > 0.0 => {
                (Some(*dim.get_height()), *dim.get_custom_height())
            }
            _ => (None, false),
        };

        let last_col = sheet.get_highest_column();
        let mut styles = Vec::new();
        let mut column_widths = Vec::new();
        for col in 1..=last_col {
            if let Some(cell) = sheet.get_cell((col, row)) {
                styles.push((col, cell.get_style().clone()));
            }
            if let Some(dim) = sheet.get_column_dimension_by_number(&col) {
                column_widths.push((col, *dim.get_width()));
            }
        }

        Self {
            row,
            height,
            custom_height,
            styles,
            column_widths,
        }
    }

    /// Applies the snapshot to `row`. Every style is cloned per cell so no
    /// two cells share one style value.
    pub fn restore(&self, sheet: &mut Worksheet, row: u32, preserve_wrapping: bool) {
        if let Some(height) = self.height {
            let dim = sheet.get_row_dimension_mut(&row);
            dim.set_height(height);
            dim.set_custom_height(self.custom_height);
        }

        for (col, style) in &self.styles {
            let mut style = style.clone();
            if !preserve_wrapping && style.get_alignment().is_some() {
                style.get_alignment_mut().set_wrap_text(false);
            }
            sheet.get_cell_mut((*col, row)).set_style(style);
        }

        for (col, width) in &self.column_widths {
            let dim = sheet.get_column_dimension_by_number_mut(col);
            if *dim.get_width() != *width {
                dim.set_width(*width);
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InsertReport {
    pub inserted: u32,
    pub plan: MergePlan,
    pub warnings: Vec<ReflowWarning>,
}

/// Inserts `count` rows before `insert_at`, formatted like `template_row`.
///
/// Merges are detached before the insert and re-added from a [`MergePlan`],
/// so the result does not depend on how the grid library treats merges
/// during structural edits.
pub fn insert_rows_preserving_merges(
    sheet: &mut Worksheet,
    insert_at: u32,
    count: u32,
    template_row: u32,
    preserve_wrapping: bool,
) -> InsertReport {
    if count == 0 {
        return InsertReport::default();
    }

    let snapshot = RowSnapshot::capture(sheet, template_row);
    let (regions, mut warnings) = detach_merges(sheet);
    let plan = MergePlan::partition(&regions, insert_at, count);

    sheet.insert_new_row(&insert_at, &count);

    for row in insert_at..insert_at + count {
        snapshot.restore(sheet, row, preserve_wrapping);
    }

    let (rebuilt, overlap_warnings) = plan.resolve();
    warnings.extend(overlap_warnings);
    attach_merges(sheet, &rebuilt);

    info!(
        insert_at,
        count,
        template_row,
        merges = rebuilt.len(),
        "inserted rows"
    );

    InsertReport {
        inserted: count,
        plan,
        warnings,
    }
}
