//! CLI entry point - the composition root.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use osrm_loader_cli::handlers::run::RunArgs;
use osrm_loader_cli::{Cli, CliError, Commands, build_config, handlers};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // Logs go to stderr so stdout carries only the JSON status
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let config = build_config(&cli).map_err(CliError::from)?;

    match cli.command {
        Commands::Run {
            datasets,
            strategy,
            log,
            loader_args,
            hold_ms,
        } => {
            let args = RunArgs {
                datasets,
                strategy,
                log,
                loader_args,
                hold: hold_ms.map(Duration::from_millis),
            };
            handlers::run::execute(config, args).await?;
        }
        Commands::Probe => {
            handlers::probe::execute(&config).await?;
        }
    }

    Ok(())
}
