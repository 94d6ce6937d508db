use assert_matches::assert_matches;
use invoice_reflow::config::{AppConfig, ConfigArgs, PageSize, TemplatePatch};
use invoice_reflow::engine::{ReflowEngine, ReflowRequest};
use invoice_reflow::grid::{CellData, read_cell};
use invoice_reflow::{CellAddress, ReflowError};
use std::path::PathBuf;

mod support;
use support::{InvoiceFixture, TestWorkspace, first_sheet_mut, seeded};

const CONFIG_YAML: &str = r#"
max_preview_rows: 5
extensions: [".XLSX", "xlsm"]
pdf_timeout_ms: 2500
pdf_profiles:
  wide:
    page_size: letter
    margin: 12
    include_header: false
templates:
  cartons:
    start_row: 8
    total_row: 20
    count_label_cell: C20
    count_keyword: carton
    count_unit: Cartons
  yarn:
    font_size: 10
"#;

fn load(workspace: &TestWorkspace, name: &str, contents: &str) -> anyhow::Result<AppConfig> {
    let path = workspace.path(name);
    std::fs::write(&path, contents).expect("write config");
    AppConfig::from_args(ConfigArgs {
        config: Some(path),
        ..ConfigArgs::default()
    })
}

#[test]
fn yaml_file_layers_over_builtins() {
    let workspace = TestWorkspace::new();
    let config = load(&workspace, "reflow.yaml", CONFIG_YAML).expect("config");

    assert_eq!(config.max_preview_rows, 5);
    assert_eq!(config.allowed_extensions, vec!["xlsm", "xlsx"]);
    assert_eq!(config.pdf_timeout_ms, 2500);

    let wide = config.pdf_profile(Some("wide")).expect("wide profile");
    assert_eq!(wide.page_size, PageSize::Letter);
    assert_eq!(wide.margin, 12.0);
    assert!(!wide.include_header);
    assert!(wide.include_footer);
    assert!(config.pdf_profile(Some("compact")).is_ok());

    let yarn = config.templates.get("yarn").expect("yarn");
    assert_eq!(yarn.font_size, 10.0);
    assert_eq!(yarn.total_row, 42);
    assert!(config.templates.names().contains(&"cartons".to_string()));
}

#[test]
fn cli_values_win_over_file_values() {
    let workspace = TestWorkspace::new();
    let path = workspace.path("reflow.yml");
    std::fs::write(&path, "max_preview_rows: 5\noutput_dir: /tmp/from-file\n").expect("write");

    let config = AppConfig::from_args(ConfigArgs {
        config: Some(path),
        max_preview_rows: Some(9),
        ..ConfigArgs::default()
    })
    .expect("config");
    assert_eq!(config.max_preview_rows, 9);
    assert_eq!(config.output_dir, Some(PathBuf::from("/tmp/from-file")));
}

#[test]
fn json_config_is_accepted_and_unknown_keys_are_not() {
    let workspace = TestWorkspace::new();
    let config = load(&workspace, "reflow.json", r#"{"pdf_timeout_ms": 10}"#).expect("json");
    assert_eq!(config.pdf_timeout_ms, 10);

    assert!(load(&workspace, "typo.yaml", "max_preview_row: 5\n").is_err());
    assert!(load(&workspace, "reflow.toml", "x = 1\n").is_err());
}

#[test]
fn broken_file_template_is_a_configuration_error() {
    let workspace = TestWorkspace::new();
    let err = load(
        &workspace,
        "bad.yaml",
        "templates:\n  broken:\n    start_row: 50\n    total_row: 10\n",
    )
    .unwrap_err();
    assert_matches!(
        err.chain().find_map(|e| e.downcast_ref::<ReflowError>()),
        Some(ReflowError::Configuration(_))
    );
}

#[test]
fn file_template_with_custom_keyword_drives_the_engine() {
    let workspace = TestWorkspace::new();
    let config = load(&workspace, "reflow.yaml", CONFIG_YAML).expect("config");
    let template = config
        .templates
        .resolve(Some("cartons"), &TemplatePatch::default())
        .expect("cartons");

    let fixture = InvoiceFixture {
        total_row: 20,
        filled_rows: 6,
        label_cell: "C20".into(),
        label: Some("6 cartons".into()),
        merges: Vec::new(),
        ..InvoiceFixture::default()
    };
    let mut book = fixture.book();
    let sheet = first_sheet_mut(&mut book);

    let outcome = ReflowEngine::new(template)
        .expect("engine")
        .run(
            sheet,
            &ReflowRequest {
                count: Some(15),
                target: Some(300.0),
                ..ReflowRequest::default()
            },
            &mut seeded(21),
        )
        .expect("reflow");

    assert_eq!(outcome.rows_inserted, 3);
    assert_eq!(outcome.label_text, "15 cartons");
    assert_eq!(
        read_cell(sheet, CellAddress::new(3, 23)),
        CellData::text("15 cartons")
    );
}
