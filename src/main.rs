//! Gateway binary.
//!
//! ```text
//! gateway <config.toml>            run until SIGINT/SIGTERM
//! gateway --check <config.toml>    validate and exit
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use gateway::lifecycle::{signals, Gateway, SHUTDOWN_TIMEOUT};
use gateway::observability::{init_logging, logging::DEFAULT_FILTER};

#[derive(Parser, Debug)]
#[command(name = "gateway", version, about = "HTTP/HTTPS gateway with TLS termination and host/path routing")]
struct Cli {
    /// Path to the TOML configuration file
    config: PathBuf,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging(DEFAULT_FILTER);
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Gateway exited with error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = gateway::load_config(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    tracing::info!(
        path = %cli.config.display(),
        frontends = config.servers.len(),
        "Configuration loaded"
    );

    if cli.check {
        for server in &config.servers {
            tracing::info!(
                protocol = %server.protocol,
                port = server.port,
                hosts = server.hosts.len(),
                rules = server.proxies.len(),
                "Frontend OK"
            );
        }
        return Ok(());
    }

    let gateway = Gateway::start(&config).await.context("starting frontends")?;
    signals::spawn_signal_listener(gateway.shutdown_handle());
    gateway.wait(SHUTDOWN_TIMEOUT).await?;
    Ok(())
}
