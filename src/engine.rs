//! The reflow pass over one worksheet.
//!
//! Order of work: resolve count, grow or clear, find the label, draw the
//! values, write them, fix the total, then fill the named fields. Only
//! configuration and a negative count are hard errors, and both are
//! reported before the sheet is touched.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use umya_spreadsheet::Worksheet;

use crate::address::{CellAddress, MAX_ROW};
use crate::config::{TemplateConfig, TemplateLayout};
use crate::distribute::{DistributionRequest, round_to_precision};
use crate::errors::{
    ReflowError, ReflowWarning, WARN_FIELD_ADDRESS, WARN_LABEL_NOT_FOUND, WARN_TOTAL_FORMULA,
};
use crate::formula::{retarget_column_ranges, sum_formula};
use crate::grid::rows::insert_rows_preserving_merges;
use crate::grid::{CellData, clear_cell, merge_aware_get, merge_aware_set, read_cell};
use crate::styles::{apply_date_format, apply_weight_format};
use crate::validation::{excel_serial, parse_date};

/// Rows above and below the total row searched for the count label.
pub const LABEL_SCAN_WINDOW: u32 = 5;

/// Header values; each is written only when present and non-blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentFields {
    pub date: Option<String>,
    pub lot_number: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReflowRequest {
    /// Items wanted; read from the count label when absent.
    pub count: Option<i64>,
    /// Total to distribute; the current column sum when absent.
    pub target: Option<f64>,
    pub fields: DocumentFields,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReflowOutcome {
    pub item_count: usize,
    pub target: f64,
    pub values: Vec<f64>,
    pub start_row: u32,
    pub total_row: u32,
    pub rows_inserted: u32,
    pub rows_cleared: u32,
    pub total_cell: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_formula: Option<String>,
    pub label_cell: String,
    pub label_text: String,
    pub fields_written: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ReflowWarning>,
}

#[derive(Debug, Clone)]
pub struct ReflowEngine {
    template: TemplateConfig,
    layout: TemplateLayout,
}

impl ReflowEngine {
    pub fn new(template: TemplateConfig) -> Result<Self, ReflowError> {
        let layout = template.validate()?;
        Ok(Self { template, layout })
    }

    pub fn template(&self) -> &TemplateConfig {
        &self.template
    }

    pub fn layout(&self) -> &TemplateLayout {
        &self.layout
    }

    pub fn run<R: Rng>(
        &self,
        sheet: &mut Worksheet,
        request: &ReflowRequest,
        rng: &mut R,
    ) -> Result<ReflowOutcome, ReflowError> {
        let layout = &self.layout;
        let matcher = &self.template.count_label;
        let mut warnings = Vec::new();

        if let Some(count) = request.count
            && count < 0
        {
            return Err(ReflowError::NegativeCount(count));
        }

        // 1. item count
        let count = match request.count {
            Some(count) => count,
            None => {
                let configured = match merge_aware_get(sheet, layout.count_label) {
                    CellData::Text(text) => matcher.extract(&text),
                    _ => None,
                };
                let found = configured.or_else(|| {
                    self.label_text_near(sheet, layout.total_row)
                        .and_then(|(_, text)| matcher.extract(&text))
                });
                if found.is_none() {
                    warnings.push(ReflowWarning::new(
                        WARN_LABEL_NOT_FOUND,
                        "no item count found in the count label; using 0",
                    ));
                }
                i64::from(found.unwrap_or(0))
            }
        };

        // 2. capacity
        let available = layout.capacity();
        let deficit = u32::try_from(count)
            .ok()
            .map(|c| c.saturating_sub(available))
            .filter(|d| layout.total_row.saturating_add(*d) <= MAX_ROW)
            .ok_or_else(|| {
                ReflowError::config(format!(
                    "{} items do not fit below row {} of the sheet",
                    count, layout.start_row
                ))
            })?;

        let target = match request.target {
            Some(target) => target,
            None => self.column_sum(sheet),
        };
        let distribution = DistributionRequest::new(target, count, layout.band)?;
        let count = distribution.count;

        info!(
            template = %self.template.name,
            count,
            available,
            deficit,
            target,
            "reflowing sheet"
        );

        // 3. grow
        let original_total = layout.total_row;
        let mut total_row = original_total;
        if deficit > 0 {
            let report = insert_rows_preserving_merges(
                sheet,
                original_total,
                deficit,
                layout.template_row,
                self.template.preserve_wrapping,
            );
            warnings.extend(report.warnings);
            total_row += deficit;
        }

        // 4. shrink by clearing; rows stay in place
        let count_rows = count as u32;
        for row in layout.start_row..total_row {
            clear_cell(sheet, layout.weight_cell(row));
        }
        let rows_cleared = available.saturating_sub(count_rows);
        if rows_cleared > 0 {
            debug!(
                from = layout.start_row + count_rows,
                to = original_total - 1,
                "cleared unused item rows"
            );
        }

        // 5. live label cell
        let label_cell = match self.label_text_near(sheet, total_row) {
            Some((addr, _)) => addr,
            None => {
                let fallback = shift_if_below(layout.count_label, original_total, deficit);
                warn!(cell = %fallback, "count label not found near total row");
                warnings.push(ReflowWarning::new(
                    WARN_LABEL_NOT_FOUND,
                    format!("count label not found near row {}; using {}", total_row, fallback),
                ));
                fallback
            }
        };

        // 6. values
        let values = distribution.run(rng);

        // 7. write
        for (offset, value) in values.iter().enumerate() {
            let addr = layout.weight_cell(layout.start_row + offset as u32);
            let written = merge_aware_set(sheet, addr, &CellData::Number(*value));
            apply_weight_format(sheet, written, self.template.font_size);
        }

        // 8. total
        let total_addr = layout.weight_cell(total_row);
        let total_formula = self.update_total(sheet, total_addr, &values, &mut warnings);

        let current_label = match merge_aware_get(sheet, label_cell) {
            CellData::Text(text) => text,
            _ => String::new(),
        };
        let label_text = matcher.rewrite(&current_label, count);
        merge_aware_set(sheet, label_cell, &CellData::text(label_text.clone()));

        // 9. named fields
        let fields_written =
            self.write_fields(sheet, &request.fields, original_total, deficit, &mut warnings);

        Ok(ReflowOutcome {
            item_count: count,
            target,
            values,
            start_row: layout.start_row,
            total_row,
            rows_inserted: deficit,
            rows_cleared,
            total_cell: total_addr.to_string(),
            total_formula,
            label_cell: label_cell.to_string(),
            label_text,
            fields_written,
            warnings,
        })
    }

    /// Sum of the numbers currently in the item rows.
    fn column_sum(&self, sheet: &Worksheet) -> f64 {
        let layout = &self.layout;
        let sum: f64 = (layout.start_row..layout.total_row)
            .filter_map(|row| match read_cell(sheet, layout.weight_cell(row)) {
                CellData::Number(n) => Some(n),
                _ => None,
            })
            .sum();
        round_to_precision(sum)
    }

    /// Closest cell to `total_row` in the label column whose text the matcher
    /// recognizes.
    fn label_text_near(&self, sheet: &Worksheet, total_row: u32) -> Option<(CellAddress, String)> {
        let column = self.layout.count_label.col;
        let first = total_row.saturating_sub(LABEL_SCAN_WINDOW).max(1);
        let last = (total_row + LABEL_SCAN_WINDOW).min(MAX_ROW);
        let mut rows: Vec<u32> = (first..=last).collect();
        rows.sort_by_key(|row| (row.abs_diff(total_row), *row));

        rows.into_iter().find_map(|row| {
            let addr = CellAddress::new(column, row);
            match merge_aware_get(sheet, addr) {
                CellData::Text(text) if self.template.count_label.matches(&text) => {
                    Some((addr, text))
                }
                _ => None,
            }
        })
    }

    fn update_total(
        &self,
        sheet: &mut Worksheet,
        total_addr: CellAddress,
        values: &[f64],
        warnings: &mut Vec<ReflowWarning>,
    ) -> Option<String> {
        let start = self.layout.start_row;
        let col = self.layout.weight_col;
        let existing = merge_aware_get(sheet, total_addr);

        match existing {
            CellData::Formula(formula) if !values.is_empty() => {
                let end = start + values.len() as u32 - 1;
                let rewritten =
                    retarget_column_ranges(&formula, col, start, end).unwrap_or_else(|e| {
                        warnings.push(ReflowWarning::new(
                            WARN_TOTAL_FORMULA,
                            format!("total formula replaced with a plain SUM: {}", e),
                        ));
                        sum_formula(col, start, end)
                    });
                merge_aware_set(sheet, total_addr, &CellData::Formula(rewritten.clone()));
                Some(rewritten)
            }
            _ => {
                let total = round_to_precision(values.iter().sum());
                merge_aware_set(sheet, total_addr, &CellData::Number(total));
                None
            }
        }
    }

    fn write_fields(
        &self,
        sheet: &mut Worksheet,
        fields: &DocumentFields,
        original_total: u32,
        deficit: u32,
        warnings: &mut Vec<ReflowWarning>,
    ) -> Vec<String> {
        let layout = &self.layout;
        let item_end = original_total + deficit;
        let entries = [
            ("date", &fields.date, layout.date),
            ("lot_number", &fields.lot_number, layout.lot_number),
            ("name", &fields.name, layout.name),
            ("address", &fields.address, layout.address),
        ];

        let mut written = Vec::new();
        for (field, value, addr) in entries {
            let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) else {
                continue;
            };
            let addr = shift_if_below(addr, original_total, deficit);
            if addr.col == layout.weight_col && (layout.start_row..item_end).contains(&addr.row) {
                warnings.push(ReflowWarning::new(
                    WARN_FIELD_ADDRESS,
                    format!("{} cell {} sits in the item rows; written anyway", field, addr),
                ));
            }

            if field == "date"
                && let Some(date) = parse_date(value)
            {
                let target = merge_aware_set(sheet, addr, &CellData::Number(excel_serial(date)));
                apply_date_format(sheet, target);
            } else {
                merge_aware_set(sheet, addr, &CellData::text(value));
            }
            written.push(field.to_string());
        }
        written
    }
}

/// Where a cell configured against the template ended up after growth.
fn shift_if_below(addr: CellAddress, insert_at: u32, deficit: u32) -> CellAddress {
    if addr.row >= insert_at {
        addr.with_row(addr.row + deficit)
    } else {
        addr
    }
}
