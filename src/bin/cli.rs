use anyhow::Result;
use clap::Parser;
use invoice_reflow::cli;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let cli_args = cli::Cli::parse();
    let compact = cli_args.compact;

    match cli::run_command(cli_args).await {
        Ok(payload) => {
            if let Err(error) = cli::output::emit_value(&payload, compact) {
                emit_error_and_exit(error);
            }
            Ok(())
        }
        Err(error) => {
            emit_error_and_exit(error);
        }
    }
}

fn emit_error_and_exit(error: anyhow::Error) -> ! {
    let envelope = cli::errors::envelope_for(&error);
    let stderr = std::io::stderr();
    let mut handle = stderr.lock();
    if serde_json::to_writer(&mut handle, &envelope).is_err() {
        eprintln!("{{\"code\":\"COMMAND_FAILED\",\"message\":\"{}\"}}", error);
    } else {
        use std::io::Write;
        let _ = handle.write_all(b"\n");
    }
    std::process::exit(1)
}
