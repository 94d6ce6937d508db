#![allow(dead_code)]
use invoice_reflow::CellAddress;
use umya_spreadsheet::{NumberingFormat, Spreadsheet, Worksheet};

#[derive(Clone, Debug)]
pub enum CellVal {
    Text(String),
    Num(f64),
    Date(f64),
    Formula(String),
    Empty,
}

impl From<&str> for CellVal {
    fn from(s: &str) -> Self {
        CellVal::Text(s.to_string())
    }
}

impl From<f64> for CellVal {
    fn from(n: f64) -> Self {
        CellVal::Num(n)
    }
}

impl From<i32> for CellVal {
    fn from(n: i32) -> Self {
        CellVal::Num(n as f64)
    }
}

fn addr(cell_ref: &str) -> (u32, u32) {
    CellAddress::parse(cell_ref)
        .map(CellAddress::as_tuple)
        .unwrap_or_else(|| panic!("bad cell ref {cell_ref}"))
}

pub fn set_cell(sheet: &mut Worksheet, cell_ref: &str, val: &CellVal) {
    let (col, row) = addr(cell_ref);
    match val {
        CellVal::Text(s) => {
            sheet.get_cell_mut((col, row)).set_value_string(s.clone());
        }
        CellVal::Num(n) => {
            sheet.get_cell_mut((col, row)).set_value_number(*n);
        }
        CellVal::Date(serial) => {
            sheet.get_cell_mut((col, row)).set_value_number(*serial);
            sheet
                .get_style_mut((col, row))
                .get_number_format_mut()
                .set_format_code(NumberingFormat::FORMAT_DATE_YYYYMMDD2);
        }
        CellVal::Formula(f) => {
            sheet.get_cell_mut((col, row)).set_formula(f.clone());
        }
        CellVal::Empty => {}
    }
}

pub fn fill_sparse(sheet: &mut Worksheet, cells: &[(&str, CellVal)]) {
    for (cell_ref, val) in cells {
        set_cell(sheet, cell_ref, val);
    }
}

/// An invoice laid out like the built-in `default` template: items in
/// column G from row 8, totals on row 38, "24 Bags" in C38.
#[derive(Clone, Debug)]
pub struct InvoiceFixture {
    pub weight_column: String,
    pub start_row: u32,
    pub total_row: u32,
    pub filled_rows: u32,
    pub item_weight: f64,
    pub label_cell: String,
    pub label: Option<String>,
    pub total_formula: bool,
    pub merges: Vec<String>,
    pub template_row_height: f64,
}

impl Default for InvoiceFixture {
    fn default() -> Self {
        Self {
            weight_column: "G".to_string(),
            start_row: 8,
            total_row: 38,
            filled_rows: 24,
            item_weight: 40.0,
            label_cell: "C38".to_string(),
            label: Some("24 Bags".to_string()),
            total_formula: true,
            merges: vec![
                "A1:G1".to_string(),
                "C3:E3".to_string(),
                "A38:B38".to_string(),
                "C38:D38".to_string(),
            ],
            template_row_height: 18.0,
        }
    }
}

impl InvoiceFixture {
    pub fn filled(mut self, rows: u32) -> Self {
        self.filled_rows = rows;
        self
    }

    pub fn label(mut self, text: &str) -> Self {
        self.label = Some(text.to_string());
        self
    }

    pub fn without_label(mut self) -> Self {
        self.label = None;
        self
    }

    pub fn literal_total(mut self) -> Self {
        self.total_formula = false;
        self
    }

    pub fn merge(mut self, range: &str) -> Self {
        self.merges.push(range.to_string());
        self
    }

    pub fn cell(&self, row: u32) -> String {
        format!("{}{}", self.weight_column, row)
    }

    pub fn total_cell(&self) -> String {
        self.cell(self.total_row)
    }

    pub fn fill(&self, sheet: &mut Worksheet) {
        fill_sparse(
            sheet,
            &[
                ("A1", "COMMERCIAL INVOICE".into()),
                ("A3", "Buyer".into()),
                ("A4", "Date".into()),
                ("A7", "No".into()),
                ("B7", "Description".into()),
                (self.cell(7).as_str(), "Weight".into()),
                (format!("A{}", self.total_row).as_str(), "TOTAL".into()),
            ],
        );
        sheet.get_style_mut("A1").get_font_mut().set_bold(true);

        for i in 0..self.filled_rows {
            let row = self.start_row + i;
            set_cell(sheet, &format!("A{row}"), &CellVal::Num(f64::from(i + 1)));
            set_cell(sheet, &format!("B{row}"), &CellVal::Text(format!("Bag {}", i + 1)));
            set_cell(sheet, &self.cell(row), &CellVal::Num(self.item_weight));
        }

        let start = self.start_row;
        let style = sheet.get_style_mut(self.cell(start).as_str());
        style.get_font_mut().set_size(9.0);
        style.get_alignment_mut().set_wrap_text(true);
        let b_style = sheet.get_style_mut(format!("B{start}").as_str());
        b_style.get_alignment_mut().set_wrap_text(true);
        let dim = sheet.get_row_dimension_mut(&start);
        dim.set_height(self.template_row_height);
        dim.set_custom_height(true);

        let last_item = self.total_row - 1;
        let total = if self.total_formula {
            CellVal::Formula(format!(
                "SUM({}:{})",
                self.cell(self.start_row),
                self.cell(last_item)
            ))
        } else {
            CellVal::Num(self.item_weight * f64::from(self.filled_rows))
        };
        set_cell(sheet, &self.total_cell(), &total);

        if let Some(label) = &self.label {
            set_cell(sheet, &self.label_cell, &CellVal::Text(label.clone()));
        }

        for range in &self.merges {
            sheet.add_merge_cells(range.clone());
        }
    }

    pub fn book(&self) -> Spreadsheet {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book
            .get_sheet_by_name_mut("Sheet1")
            .expect("default sheet exists");
        self.fill(sheet);
        book
    }
}

pub fn first_sheet(book: &Spreadsheet) -> &Worksheet {
    book.get_sheet_by_name("Sheet1").expect("Sheet1")
}

pub fn first_sheet_mut(book: &mut Spreadsheet) -> &mut Worksheet {
    book.get_sheet_by_name_mut("Sheet1").expect("Sheet1")
}
