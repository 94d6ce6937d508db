use anyhow::{Result, bail};
use async_trait::async_trait;
use invoice_reflow::config::{PageSize, PdfProfile};
use invoice_reflow::preview::build_preview;
use invoice_reflow::render::{NativeConverter, RenderMethod, render_basic, render_pdf};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

mod support;
use support::{InvoiceFixture, TestWorkspace, first_sheet};

struct Unavailable;

#[async_trait]
impl NativeConverter for Unavailable {
    async fn convert(&self, _workbook_path: &Path, _output_path: &Path) -> Result<()> {
        bail!("should not be called")
    }

    fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

#[derive(Default)]
struct Failing {
    calls: AtomicUsize,
}

#[async_trait]
impl NativeConverter for Failing {
    async fn convert(&self, _workbook_path: &Path, _output_path: &Path) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        bail!("converter crashed")
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

#[test]
fn preview_limits_rows_and_reports_shape() {
    let book = InvoiceFixture::default().book();
    let preview = build_preview(first_sheet(&book), 5);

    assert_eq!(preview.headers[0], "COMMERCIAL INVOICE");
    assert_eq!(preview.rows.len(), 5);
    assert_eq!(preview.rows[1][0], "Buyer");
    assert_eq!(preview.metadata.sheet_name, "Sheet1");
    assert_eq!(preview.metadata.total_rows, 38);
    assert_eq!(preview.metadata.total_columns, 7);
    assert_eq!(preview.metadata.preview_rows, 5);

    let json = serde_json::to_value(&preview).expect("json");
    assert_eq!(json["metadata"]["sheetName"], "Sheet1");
    assert_eq!(json["metadata"]["totalRows"], 38);
}

#[test]
fn basic_render_paginates_rows() {
    let book = InvoiceFixture::default().book();
    let profile = PdfProfile {
        page_size: PageSize::Letter,
        ..PdfProfile::default()
    };
    let bytes = render_basic(first_sheet(&book), "invoice.xlsx", &profile).expect("pdf");
    assert!(bytes.starts_with(b"%PDF-1.5"));

    let doc = lopdf::Document::load_mem(&bytes).expect("parse pdf");
    // a letter page holds 33 rows once the header and footer bands are taken
    assert_eq!(doc.get_pages().len(), 2);
}

#[test]
fn empty_sheet_renders_one_page() {
    let book = umya_spreadsheet::new_file();
    let profile = PdfProfile {
        include_header: false,
        include_footer: false,
        ..PdfProfile::default()
    };
    let bytes = render_basic(first_sheet(&book), "", &profile).expect("pdf");
    let doc = lopdf::Document::load_mem(&bytes).expect("parse pdf");
    assert_eq!(doc.get_pages().len(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn missing_converter_falls_back_to_basic_layout() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_invoice("invoice.xlsx", &InvoiceFixture::default());
    let output = workspace.path("invoice.pdf");

    let outcome = render_pdf(&input, &output, &PdfProfile::default(), None, &Unavailable)
        .await
        .expect("render");

    assert_eq!(outcome.method, RenderMethod::Basic);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("unavailable"));
    let bytes = std::fs::read(&output).expect("pdf written");
    assert!(lopdf::Document::load_mem(&bytes).is_ok());
}

#[tokio::test(flavor = "current_thread")]
async fn failed_conversion_falls_back_to_basic_layout() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_invoice("invoice.xlsx", &InvoiceFixture::default());
    let output = workspace.path("out.pdf");
    let converter = Failing::default();

    let outcome = render_pdf(&input, &output, &PdfProfile::default(), None, &converter)
        .await
        .expect("render");

    assert_eq!(converter.calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.method, RenderMethod::Basic);
    assert!(outcome.warnings[0].contains("converter crashed"));
    assert!(output.exists());
}

#[tokio::test(flavor = "current_thread")]
async fn profiles_without_formatting_skip_the_converter() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_invoice("invoice.xlsx", &InvoiceFixture::default());
    let output = workspace.path("plain.pdf");
    let converter = Failing::default();
    let profile = PdfProfile {
        preserve_formatting: false,
        ..PdfProfile::default()
    };

    let outcome = render_pdf(&input, &output, &profile, Some("Sheet1"), &converter)
        .await
        .expect("render");

    assert_eq!(converter.calls.load(Ordering::SeqCst), 0);
    assert!(outcome.warnings.is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn unknown_sheet_is_reported() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_invoice("invoice.xlsx", &InvoiceFixture::default());
    let output = workspace.path("x.pdf");
    let profile = PdfProfile {
        preserve_formatting: false,
        ..PdfProfile::default()
    };

    let err = render_pdf(&input, &output, &profile, Some("Totals"), &Unavailable)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("sheet 'Totals' not found"));
}
