pub mod commands;
pub mod errors;
pub mod output;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

use crate::config::{AppConfig, ConfigArgs};

#[derive(Debug, Parser)]
#[command(
    name = "invoice-reflow",
    version,
    about = "Reflow invoice templates to an item count and spread a total weight across the rows"
)]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[arg(long, global = true, help = "Print single-line JSON")]
    pub compact: bool,

    #[arg(
        long,
        global = true,
        env = "INVOICE_REFLOW_SEED",
        value_name = "N",
        help = "Seed for the weight distribution (random when omitted)"
    )]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Template selection, per-call overrides and header values.
#[derive(Debug, Clone, Default, Args)]
pub struct ReflowArgs {
    #[arg(long, short = 't', value_name = "NAME", help = "Template name (default: default)")]
    pub template: Option<String>,

    #[arg(
        long,
        short = 'n',
        value_name = "N",
        allow_hyphen_values = true,
        help = "Number of items; read from the count label when omitted"
    )]
    pub count: Option<i64>,

    #[arg(
        long,
        value_name = "WEIGHT",
        allow_hyphen_values = true,
        help = "Total weight to distribute; the current column sum when omitted"
    )]
    pub target: Option<String>,

    #[arg(
        long,
        value_name = "DATE",
        help = "Invoice date (YYYY-MM-DD, MM/DD/YYYY or DD-MM-YYYY)"
    )]
    pub date: Option<String>,

    #[arg(long, value_name = "LOT")]
    pub lot_number: Option<String>,

    #[arg(long, value_name = "TEXT", help = "Counterparty name")]
    pub name: Option<String>,

    #[arg(long, value_name = "TEXT", help = "Counterparty address")]
    pub address: Option<String>,

    #[arg(long, value_name = "SHEET", help = "Sheet to reflow (default: first sheet)")]
    pub sheet: Option<String>,

    #[arg(long, value_name = "PCT", allow_hyphen_values = true)]
    pub min_percent: Option<f64>,

    #[arg(long, value_name = "PCT", allow_hyphen_values = true)]
    pub max_percent: Option<f64>,

    #[arg(long, value_name = "PT")]
    pub font_size: Option<f64>,

    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true",
        help = "Keep text wrapping on inserted rows"
    )]
    pub preserve_wrapping: Option<bool>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Reflow a workbook and save the result.
    Process {
        file: PathBuf,
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,
        #[command(flatten)]
        reflow: ReflowArgs,
        #[arg(long, help = "Also render the result to PDF")]
        pdf: bool,
        #[arg(long, value_name = "PROFILE", help = "PDF profile (default, compact, letter)")]
        pdf_profile: Option<String>,
    },
    /// Reflow in memory and print a preview grid plus the generated values.
    Preview {
        file: PathBuf,
        #[command(flatten)]
        reflow: ReflowArgs,
        #[arg(long, value_name = "N")]
        rows: Option<usize>,
    },
    /// Run only the weight distribution.
    Distribute {
        #[arg(long, value_name = "WEIGHT", allow_hyphen_values = true)]
        target: String,
        #[arg(long, short = 'n', value_name = "N", allow_hyphen_values = true)]
        count: i64,
        #[arg(long, value_name = "PCT", allow_hyphen_values = true, default_value_t = -2.0)]
        min_percent: f64,
        #[arg(long, value_name = "PCT", allow_hyphen_values = true, default_value_t = 2.0)]
        max_percent: f64,
    },
    /// Render a workbook to PDF.
    Convert {
        file: PathBuf,
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,
        #[arg(long, value_name = "PROFILE")]
        profile: Option<String>,
        #[arg(long, value_name = "SHEET")]
        sheet: Option<String>,
        #[arg(long, help = "Skip LibreOffice and draw the grid directly")]
        basic: bool,
    },
    /// List the available templates.
    Templates,
}

pub async fn run_command(cli: Cli) -> Result<Value> {
    let Cli {
        config,
        seed,
        command,
        ..
    } = cli;
    let app = AppConfig::from_args(config)?;

    match command {
        Commands::Process {
            file,
            output,
            reflow,
            pdf,
            pdf_profile,
        } => commands::reflow::process(&app, file, output, reflow, pdf, pdf_profile, seed).await,
        Commands::Preview { file, reflow, rows } => {
            commands::reflow::preview(&app, file, reflow, rows, seed).await
        }
        Commands::Distribute {
            target,
            count,
            min_percent,
            max_percent,
        } => commands::reflow::distribute(target, count, min_percent, max_percent, seed),
        Commands::Convert {
            file,
            output,
            profile,
            sheet,
            basic,
        } => commands::convert::convert(&app, file, output, profile, sheet, basic).await,
        Commands::Templates => commands::templates::list(&app),
    }
}
