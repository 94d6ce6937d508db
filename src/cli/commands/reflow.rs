use anyhow::{Result, anyhow};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{Value, json};
use std::path::PathBuf;

use crate::cli::ReflowArgs;
use crate::config::{AppConfig, TemplatePatch};
use crate::distribute::{
    DEFAULT_TOLERANCE, DistributionRequest, PercentBand, round_to_precision, validate,
};
use crate::engine::{DocumentFields, ReflowEngine, ReflowRequest};
use crate::preview::build_preview;
use crate::process::{default_output_path, load_workbook, process_file, sheet_mut};
use crate::render::{SofficeConverter, render_pdf};
use crate::validation::{sanitize_number, validate_extension};

pub(crate) fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn parse_weight(text: &str) -> Result<f64> {
    sanitize_number(text).ok_or_else(|| anyhow!("invalid weight '{}'", text))
}

fn engine_for(app: &AppConfig, args: &ReflowArgs) -> Result<ReflowEngine> {
    let overrides = TemplatePatch {
        min_percent: args.min_percent,
        max_percent: args.max_percent,
        font_size: args.font_size,
        preserve_wrapping: args.preserve_wrapping,
        ..TemplatePatch::default()
    };
    let template = app.templates.resolve(args.template.as_deref(), &overrides)?;
    Ok(ReflowEngine::new(template)?)
}

fn request_for(args: &ReflowArgs) -> Result<ReflowRequest> {
    let target = args.target.as_deref().map(parse_weight).transpose()?;
    Ok(ReflowRequest {
        count: args.count,
        target,
        fields: DocumentFields {
            date: args.date.clone(),
            lot_number: args.lot_number.clone(),
            name: args.name.clone(),
            address: args.address.clone(),
        },
    })
}

pub async fn process(
    app: &AppConfig,
    file: PathBuf,
    output: Option<PathBuf>,
    args: ReflowArgs,
    pdf: bool,
    pdf_profile: Option<String>,
    seed: Option<u64>,
) -> Result<Value> {
    validate_extension(&file, &app.allowed_extensions)?;
    let engine = engine_for(app, &args)?;
    let request = request_for(&args)?;
    let profile = if pdf {
        Some(app.pdf_profile(pdf_profile.as_deref())?.clone())
    } else {
        None
    };
    let output =
        output.unwrap_or_else(|| default_output_path(&file, app.output_dir.as_deref()));
    let template = engine.template().name.clone();

    let outcome = {
        let input = file.clone();
        let output = output.clone();
        let sheet = args.sheet.clone();
        tokio::task::spawn_blocking(move || {
            let mut rng = rng_for(seed);
            process_file(&input, &output, &engine, &request, sheet.as_deref(), &mut rng)
        })
        .await??
    };

    let mut payload = json!({
        "input": file,
        "output": output,
        "template": template,
        "outcome": outcome,
    });

    if let Some(profile) = profile {
        let pdf_path = output.with_extension("pdf");
        let converter = SofficeConverter::new(app.soffice_path.clone(), app.pdf_timeout());
        let rendered = render_pdf(
            &output,
            &pdf_path,
            &profile,
            args.sheet.as_deref(),
            &converter,
        )
        .await?;
        payload["pdf"] = serde_json::to_value(rendered)?;
    }

    Ok(payload)
}

pub async fn preview(
    app: &AppConfig,
    file: PathBuf,
    args: ReflowArgs,
    rows: Option<usize>,
    seed: Option<u64>,
) -> Result<Value> {
    validate_extension(&file, &app.allowed_extensions)?;
    let engine = engine_for(app, &args)?;
    let request = request_for(&args)?;
    let max_rows = rows.unwrap_or(app.max_preview_rows).max(1);
    let template = engine.template().name.clone();
    let sheet_name = args.sheet.clone();

    let input = file.clone();
    let (outcome, preview) = tokio::task::spawn_blocking(move || -> Result<_> {
        let mut book = load_workbook(&input)?;
        let sheet = sheet_mut(&mut book, sheet_name.as_deref())?;
        let mut rng = rng_for(seed);
        let outcome = engine.run(sheet, &request, &mut rng)?;
        let preview = build_preview(sheet, max_rows);
        Ok((outcome, preview))
    })
    .await??;

    Ok(json!({
        "input": file,
        "template": template,
        "outcome": outcome,
        "preview": preview,
    }))
}

pub fn distribute(
    target: String,
    count: i64,
    min_percent: f64,
    max_percent: f64,
    seed: Option<u64>,
) -> Result<Value> {
    let target = parse_weight(&target)?;
    let band = PercentBand::new(min_percent, max_percent)?;
    let request = DistributionRequest::new(target, count, band)?;
    let mut rng = rng_for(seed);
    let values = request.run(&mut rng);
    let total = round_to_precision(values.iter().sum());

    Ok(json!({
        "target": target,
        "count": values.len(),
        "min_percent": band.min(),
        "max_percent": band.max(),
        "total": total,
        "valid": validate(&values, target, DEFAULT_TOLERANCE),
        "values": values,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_accept_thousands_separators() {
        assert_eq!(parse_weight("1,250.5").unwrap(), 1250.5);
        assert!(parse_weight("heavy").is_err());
    }

    #[test]
    fn seeded_distribution_is_reproducible() {
        let first = distribute("1000".into(), 12, -2.0, 2.0, Some(7)).unwrap();
        let second = distribute("1000".into(), 12, -2.0, 2.0, Some(7)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first["count"], 12);
        assert_eq!(first["valid"], true);
    }

    #[test]
    fn overrides_reach_the_template() {
        let app = AppConfig::default();
        let args = ReflowArgs {
            template: Some("invoice1".into()),
            font_size: Some(12.0),
            ..ReflowArgs::default()
        };
        let engine = engine_for(&app, &args).unwrap();
        assert_eq!(engine.template().weight_column, "F");
        assert_eq!(engine.template().font_size, 12.0);
    }
}
