use invoice_reflow::engine::{ReflowEngine, ReflowRequest};
use invoice_reflow::grid::merged_regions;
use invoice_reflow::process::{default_output_path, process_file};
use invoice_reflow::{CellRect, TemplateConfig};

mod support;
use support::{InvoiceFixture, TestWorkspace, first_sheet, seeded};

fn engine() -> ReflowEngine {
    ReflowEngine::new(TemplateConfig::default()).expect("engine")
}

#[test]
fn processed_workbook_survives_a_save_and_reload() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_invoice("in.xlsx", &InvoiceFixture::default());
    let output = default_output_path(&input, Some(&workspace.path("out")));

    let request = ReflowRequest {
        count: Some(32),
        target: Some(1280.0),
        ..ReflowRequest::default()
    };
    let outcome =
        process_file(&input, &output, &engine(), &request, None, &mut seeded(17)).expect("process");
    assert_eq!(outcome.rows_inserted, 2);

    let book = workspace.open(&output);
    let sheet = first_sheet(&book);
    assert_eq!(sheet.get_value("C40"), "32 Bags");
    assert_eq!(sheet.get_cell("G40").expect("total").get_formula(), "SUM(G8:G39)");
    let regions = merged_regions(sheet);
    assert!(regions.contains(&CellRect::parse("C40:D40").expect("range")));

    let sum: f64 = (8..=39)
        .map(|row| {
            sheet
                .get_cell((7, row))
                .and_then(|c| c.get_value_number())
                .unwrap_or_default()
        })
        .sum();
    assert!((sum - 1280.0).abs() <= 0.005);
}

#[test]
fn failures_leave_no_output_behind() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_invoice("in.xlsx", &InvoiceFixture::default());
    let output = workspace.path("in_processed.xlsx");

    let err = process_file(
        &input,
        &output,
        &engine(),
        &ReflowRequest::default(),
        Some("Missing"),
        &mut seeded(1),
    )
    .unwrap_err();
    assert!(err.to_string().contains("sheet 'Missing' not found"));
    assert!(!output.exists());

    let err = process_file(
        &workspace.path("nope.xlsx"),
        &output,
        &engine(),
        &ReflowRequest::default(),
        None,
        &mut seeded(1),
    )
    .unwrap_err();
    assert!(err.to_string().contains("does not exist"));
    assert!(!output.exists());
}
