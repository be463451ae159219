use std::process::ExitCode;

use anyhow::Context;

use jobrun::cli::{self, EX_CONFIG};
use jobrun::config::RunnerConfig;
use jobrun::runner::RunnerClient;

fn build_client() -> anyhow::Result<RunnerClient> {
    let config = RunnerConfig::from_env().context("Failed to load configuration")?;
    RunnerClient::from_config(config).context("Failed to set up runner client")
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries job output only.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let client = match build_client() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::from(EX_CONFIG);
        }
    };

    let mut stdout = std::io::stdout().lock();
    let mut stderr = std::io::stderr().lock();
    cli::run(std::env::args_os(), &client, &mut stdout, &mut stderr).await
}
