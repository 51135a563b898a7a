//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use secrecy::SecretString;
use tracing::{error, info};

use crate::app::options::AppOptions;
use crate::config::Config;
use crate::deploy::dispatcher::Dispatcher;
use crate::errors::ServerError;
use crate::server::serve::serve;
use crate::server::state::ServerState;
use crate::signature::SignatureVerifier;

/// Run the deploy server
///
/// Serves until the shutdown signal resolves, then waits for in-flight
/// deploy runs to reach a terminal state before returning.
pub async fn run(
    options: AppOptions,
    config: Config,
    secret: Option<SecretString>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    info!("Initializing deploy server...");

    let verifier = SignatureVerifier::new(secret);
    if !verifier.has_secret() {
        // Fail-closed: every webhook is rejected until a secret is set.
        // Surfaced once here, not per request.
        error!("WEBHOOK_SECRET is not set - rejecting all webhooks");
    }

    let dispatcher = Arc::new(Dispatcher::new(options.deploy.clone()));
    let state = Arc::new(ServerState::new(
        Arc::new(config),
        verifier,
        dispatcher.clone(),
    ));

    info!(
        "Configured projects: {}",
        state.config.project_names().join(", ")
    );

    let server_handle = serve(&options.server, state, shutdown_signal).await?;
    server_handle
        .await
        .map_err(|e| ServerError::ShutdownError(e.to_string()))??;

    // The HTTP listener is gone; let in-flight runs finish their steps
    let outstanding = dispatcher.wait_idle().await;
    if !outstanding.is_empty() {
        info!("Waited for {} in-flight deploy run(s)", outstanding.len());
    }

    info!("Shutdown complete");
    Ok(())
}
