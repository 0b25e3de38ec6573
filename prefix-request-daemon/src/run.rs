//! Startup and main loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use prefix_request_auth::Secret;
use prefix_request_core::listen_prefix;
use tokio::signal;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::controller::Controller;
use crate::face::{Face, IncomingInterest};
use crate::keychain::KeyChain;
use crate::listener::CommandListener;
use crate::outcome_log::OutcomeLogger;
use crate::registrar::RouteRegistrar;

/// Upper bound on each setup command. Registrations have no such bound.
const SETUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Run the daemon until a shutdown signal arrives.
///
/// # Errors
///
/// Any setup failure, or the forwarder closing the connection, is returned
/// as an error and should end the process.
pub async fn run(config: Config) -> Result<()> {
    let keychain = Arc::new(
        KeyChain::load_or_generate(&config.key_path, &config.identity)
            .context("failed to load signing key")?,
    );
    tracing::info!(
        key = %keychain.key_name(),
        key_id = %hex::encode(keychain.public_key().key_id()),
        "Signing identity ready"
    );

    let (face, commands) = Face::connect(&config.socket_path)
        .await
        .context("failed to connect to forwarder")?;

    serve(
        face,
        commands,
        keychain,
        config.secret,
        OutcomeLogger::stdout(),
        shutdown_signal(),
    )
    .await
}

/// Prepare the forwarder and handle commands on an established face.
///
/// Enabling local fields and registering the command prefix must both
/// succeed before any command is accepted.
///
/// # Errors
///
/// Returns an error if either setup step fails or times out, or if the
/// face closes before `shutdown` resolves.
pub async fn serve<F>(
    face: Face,
    commands: mpsc::Receiver<IncomingInterest>,
    keychain: Arc<KeyChain>,
    secret: Secret,
    logger: OutcomeLogger,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    let controller = Controller::new(face.clone(), Arc::clone(&keychain));

    tokio::time::timeout(SETUP_TIMEOUT, controller.enable_local_fields())
        .await
        .context("timed out enabling local fields")?
        .context("failed to enable local fields")?;
    tracing::info!("Local fields enabled");

    let prefix = listen_prefix();
    face.add_filter(prefix.clone()).await;
    tokio::time::timeout(SETUP_TIMEOUT, controller.register_prefix(&prefix))
        .await
        .context("timed out registering command prefix")?
        .context("failed to register command prefix")?;

    let listener = CommandListener::new(
        secret,
        RouteRegistrar::new(Arc::new(controller)),
        Arc::new(face),
        keychain,
        logger,
    )
    .with_listen_prefix(prefix);

    listener
        .run(commands, shutdown)
        .await
        .context("listener stopped")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
