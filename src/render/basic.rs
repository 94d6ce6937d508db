//! Plain grid redraw used when no native converter is available.

use anyhow::{Context, Result};
use lopdf::{Document, Object, Stream, dictionary};
use umya_spreadsheet::Worksheet;

use crate::address::CellAddress;
use crate::config::PdfProfile;
use crate::grid::{merged_regions, merged_text};

pub const ROWS_PER_PAGE: usize = 40;
pub const ROW_HEIGHT: f64 = 20.0;
/// Width, in characters, of a column with no explicit width.
pub const DEFAULT_COLUMN_WIDTH: f64 = 8.43;
const FONT_SIZE: f64 = 9.0;
const HEADER_BAND: f64 = 30.0;
const FOOTER_BAND: f64 = 24.0;
const CELL_PADDING: f64 = 3.0;

#[derive(Debug, Clone, PartialEq)]
struct PageGeometry {
    width: f64,
    height: f64,
    margin: f64,
    /// x offset of each printed column, plus the right edge.
    column_edges: Vec<f64>,
    rows_per_page: usize,
    table_top: f64,
}

impl PageGeometry {
    fn new(widths: &[f64], profile: &PdfProfile) -> Self {
        let (width, height) = profile.page_size.dimensions();
        let margin = profile.margin.clamp(0.0, width.min(height) / 4.0);

        let usable_width = width - 2.0 * margin;
        let total: f64 = widths.iter().sum();
        let mut column_edges = Vec::with_capacity(widths.len() + 1);
        let mut x = margin;
        column_edges.push(x);
        for w in widths {
            x += if total > 0.0 { w / total * usable_width } else { 0.0 };
            column_edges.push(x);
        }

        let header = if profile.include_header { HEADER_BAND } else { 0.0 };
        let footer = if profile.include_footer { FOOTER_BAND } else { 0.0 };
        let table_top = height - margin - header;
        let usable_height = (table_top - margin - footer).max(ROW_HEIGHT);
        let rows_per_page = ((usable_height / ROW_HEIGHT) as usize).clamp(1, ROWS_PER_PAGE);

        Self {
            width,
            height,
            margin,
            column_edges,
            rows_per_page,
            table_top,
        }
    }
}

/// Visible columns with their widths in characters.
fn printed_columns(sheet: &Worksheet) -> Vec<(u32, f64)> {
    (1..=sheet.get_highest_column())
        .filter_map(|col| match sheet.get_column_dimension_by_number(&col) {
            Some(dim) if *dim.get_hidden() => None,
            Some(dim) if *dim.get_width() > 0.0 => Some((col, *dim.get_width())),
            _ => Some((col, DEFAULT_COLUMN_WIDTH)),
        })
        .collect()
}

fn printed_rows(sheet: &Worksheet) -> Vec<u32> {
    (1..=sheet.get_highest_row())
        .filter(|row| {
            !sheet
                .get_row_dimension(row)
                .map(|dim| *dim.get_hidden())
                .unwrap_or(false)
        })
        .collect()
}

fn escape_pdf_string(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\n' | '\r' | '\t' => out.push(' '),
            c if c.is_ascii() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

/// Cuts text to roughly what fits in `width` points of Helvetica.
fn fit_text(text: &str, width: f64) -> String {
    let max_chars = ((width - 2.0 * CELL_PADDING) / (FONT_SIZE * 0.5)).floor().max(0.0) as usize;
    text.chars().take(max_chars).collect()
}

fn text_op(out: &mut String, x: f64, y: f64, size: f64, text: &str) {
    if text.is_empty() {
        return;
    }
    out.push_str(&format!(
        "BT /F1 {:.1} Tf {:.2} {:.2} Td ({}) Tj ET\n",
        size,
        x,
        y,
        escape_pdf_string(text)
    ));
}

fn page_content(
    sheet: &Worksheet,
    geometry: &PageGeometry,
    columns: &[(u32, f64)],
    rows: &[u32],
    page_number: usize,
    title: &str,
    profile: &PdfProfile,
) -> String {
    let mut out = String::new();
    let left = geometry.margin;
    let right = geometry.width - geometry.margin;
    let regions = merged_regions(sheet);

    if profile.include_header {
        let y = geometry.height - geometry.margin - 12.0;
        text_op(&mut out, left, y, 10.0, &format!("File: {}", title));
        let rule = geometry.table_top + 6.0;
        out.push_str(&format!("0.5 w {left:.2} {rule:.2} m {right:.2} {rule:.2} l S\n"));
    }

    for (index, row) in rows.iter().enumerate() {
        let baseline = geometry.table_top - (index as f64 + 1.0) * ROW_HEIGHT + 6.0;
        for (slot, (col, _)) in columns.iter().enumerate() {
            let x0 = geometry.column_edges[slot];
            let x1 = geometry.column_edges[slot + 1];
            let text = merged_text(sheet, &regions, CellAddress::new(*col, *row));
            text_op(
                &mut out,
                x0 + CELL_PADDING,
                baseline,
                FONT_SIZE,
                &fit_text(&text, x1 - x0),
            );
        }
    }

    if profile.include_footer {
        let y = geometry.margin.max(FOOTER_BAND) - 14.0;
        text_op(&mut out, left, y, 8.0, &profile.footer_text);
        text_op(&mut out, right - 40.0, y, 8.0, &format!("Page {}", page_number));
    }
    out
}

/// Draws every printed row of `sheet` onto paginated PDF pages.
pub fn render_basic(sheet: &Worksheet, title: &str, profile: &PdfProfile) -> Result<Vec<u8>> {
    let columns = printed_columns(sheet);
    let rows = printed_rows(sheet);
    let widths: Vec<f64> = columns.iter().map(|(_, w)| *w).collect();
    let geometry = PageGeometry::new(&widths, profile);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let media_box: Vec<Object> = vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Real(geometry.width as f32),
        Object::Real(geometry.height as f32),
    ];

    // an empty sheet still yields one (blank) page
    let chunks: Vec<&[u32]> = if rows.is_empty() {
        vec![rows.as_slice()]
    } else {
        rows.chunks(geometry.rows_per_page).collect()
    };

    let mut kids: Vec<Object> = Vec::with_capacity(chunks.len());
    for (index, chunk) in chunks.iter().enumerate() {
        let content = page_content(sheet, &geometry, &columns, chunk, index + 1, title, profile);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => media_box.clone(),
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).context("failed to serialize pdf")?;
    Ok(bytes)
}
