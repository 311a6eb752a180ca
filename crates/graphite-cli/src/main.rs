//! graphite-fetch binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use graphite_cli::{Cli, CliError, FetchCommand, OutputFormat};
use graphite_render::RenderClient;

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let client = RenderClient::from_config(&cli.config())?;
    let format = OutputFormat::new(cli.format);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, cancelling fetch");
                cancel.cancel();
            }
        }
    });

    let mut stdout = io::stdout().lock();
    FetchCommand::new(&client)
        .execute(
            &mut stdout,
            &format,
            &cancel,
            &cli.request(),
            cli.aggregate.map(Into::into),
        )
        .await
}
