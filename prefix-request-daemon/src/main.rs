//! prefix-request - authenticated route registration for a local NDN forwarder.
//!
//! Outcome records go to stdout; diagnostics go to stderr.

use clap::Parser;
use prefix_request_daemon::args::Args;
use prefix_request_daemon::config::Config;
use prefix_request_daemon::run;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Usage errors exit here, before any networking.
    let args = Args::parse();

    let config = match Config::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run::run(config).await {
        tracing::error!("prefix-request error: {:#}", e);
        std::process::exit(1);
    }
}
