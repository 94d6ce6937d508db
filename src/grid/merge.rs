use serde::Serialize;
use tracing::{debug, warn};
use umya_spreadsheet::Worksheet;

use crate::address::CellRect;
use crate::errors::{ReflowWarning, WARN_MERGE_ADDRESS, WARN_MERGE_OVERLAP};

/// Where a merge region ends up when rows are inserted at a given row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePlacement {
    /// Entirely above the insertion row; unchanged.
    Above,
    /// Starts at or below the insertion row; moved down.
    Shifted,
    /// Spans the insertion row; bottom edge grows.
    Extended,
}

impl MergePlacement {
    pub fn classify(rect: &CellRect, insert_at: u32) -> Self {
        if rect.max_row < insert_at {
            Self::Above
        } else if rect.min_row >= insert_at {
            Self::Shifted
        } else {
            Self::Extended
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMerge {
    pub original: CellRect,
    pub placement: MergePlacement,
    pub rebuilt: CellRect,
}

#[derive(Debug, Clone, Default)]
pub struct MergePlan {
    pub insert_at: u32,
    pub delta: u32,
    pub merges: Vec<PlannedMerge>,
}

impl MergePlan {
    pub fn partition(regions: &[CellRect], insert_at: u32, delta: u32) -> Self {
        let merges = regions
            .iter()
            .map(|rect| {
                let placement = MergePlacement::classify(rect, insert_at);
                let rebuilt = match placement {
                    MergePlacement::Above => *rect,
                    MergePlacement::Shifted => rect.shift_rows(delta),
                    MergePlacement::Extended => rect.extend_rows(delta),
                };
                PlannedMerge {
                    original: *rect,
                    placement,
                    rebuilt,
                }
            })
            .collect();
        Self {
            insert_at,
            delta,
            merges,
        }
    }

    pub fn count(&self, placement: MergePlacement) -> usize {
        self.merges
            .iter()
            .filter(|m| m.placement == placement)
            .count()
    }

    /// Rebuilt regions with any overlap removed. The first region claiming
    /// a cell wins; later ones are reported.
    pub fn resolve(&self) -> (Vec<CellRect>, Vec<ReflowWarning>) {
        let mut kept: Vec<CellRect> = Vec::with_capacity(self.merges.len());
        let mut warnings = Vec::new();
        for planned in &self.merges {
            if let Some(existing) = kept.iter().find(|k| k.overlaps(&planned.rebuilt)) {
                warnings.push(ReflowWarning::new(
                    WARN_MERGE_OVERLAP,
                    format!(
                        "merge {} overlaps {} after reflow and was dropped",
                        planned.rebuilt, existing
                    ),
                ));
                continue;
            }
            kept.push(planned.rebuilt);
        }
        (kept, warnings)
    }
}

/// Removes every merge from the sheet, hands back the parsed ones, and puts
/// back unreadable ones untouched.
pub(crate) fn detach_merges(sheet: &mut Worksheet) -> (Vec<CellRect>, Vec<ReflowWarning>) {
    let ranges = std::mem::take(sheet.get_merge_cells_mut());
    let mut parsed = Vec::with_capacity(ranges.len());
    let mut warnings = Vec::new();
    for range in ranges {
        let text = range.get_range();
        match CellRect::parse(&text) {
            Some(rect) => parsed.push(rect),
            None => {
                warn!(range = %text, "merge region kept as-is; address not understood");
                warnings.push(ReflowWarning::new(
                    WARN_MERGE_ADDRESS,
                    format!("merge region '{}' could not be parsed and was not moved", text),
                ));
                sheet.get_merge_cells_mut().push(range);
            }
        }
    }
    (parsed, warnings)
}

pub(crate) fn attach_merges(sheet: &mut Worksheet, regions: &[CellRect]) {
    for rect in regions {
        sheet.add_merge_cells(rect.to_string());
    }
    debug!(count = regions.len(), "merge regions rebuilt");
}
