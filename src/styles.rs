use umya_spreadsheet::structs::HorizontalAlignmentValues;
use umya_spreadsheet::{Font, NumberingFormat, Style, Worksheet};

use crate::address::CellAddress;

/// Number format applied to written weights.
pub const WEIGHT_NUMBER_FORMAT: &str = "0.00";
const DEFAULT_FONT_NAME: &str = "Calibri";

/// Font family and emphasis of an existing cell, kept when the size changes.
#[derive(Debug, Clone, PartialEq)]
pub struct FontFace {
    pub name: Option<String>,
    pub bold: bool,
    pub italic: bool,
}

impl FontFace {
    pub fn of(style: &Style) -> Self {
        match style.get_font() {
            Some(font) => Self {
                name: Some(font.get_name().to_string()).filter(|n| !n.is_empty()),
                bold: *font.get_bold(),
                italic: *font.get_italic(),
            },
            None => Self {
                name: None,
                bold: false,
                italic: false,
            },
        }
    }

    fn to_font(&self, size: f64) -> Font {
        let mut font = Font::default();
        font.set_name(self.name.as_deref().unwrap_or(DEFAULT_FONT_NAME));
        font.set_bold(self.bold);
        font.set_italic(self.italic);
        font.set_size(size);
        font
    }
}

/// Right-aligns a weight cell and sets its font size, keeping family,
/// emphasis, borders, fill and wrap of the style it already had.
pub fn apply_weight_format(sheet: &mut Worksheet, addr: CellAddress, font_size: f64) {
    let cell = sheet.get_cell_mut(addr.as_tuple());
    let mut style = cell.get_style().clone();
    let face = FontFace::of(&style);
    style.set_font(face.to_font(font_size));
    style
        .get_alignment_mut()
        .set_horizontal(HorizontalAlignmentValues::Right);
    style
        .get_number_format_mut()
        .set_format_code(WEIGHT_NUMBER_FORMAT);
    cell.set_style(style);
}

pub fn apply_date_format(sheet: &mut Worksheet, addr: CellAddress) {
    let cell = sheet.get_cell_mut(addr.as_tuple());
    let mut style = cell.get_style().clone();
    style
        .get_number_format_mut()
        .set_format_code(NumberingFormat::FORMAT_DATE_YYYYMMDD2);
    cell.set_style(style);
}

/// Whether text in the cell wraps; used to tell if a restored row kept it.
pub fn wraps_text(sheet: &Worksheet, addr: CellAddress) -> bool {
    sheet
        .get_cell(addr.as_tuple())
        .and_then(|cell| cell.get_style().get_alignment())
        .map(|alignment| *alignment.get_wrap_text())
        .unwrap_or(false)
}
