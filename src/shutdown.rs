use tracing::{error, info};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
#[cfg(windows)]
use tokio::signal::windows::{ctrl_break, ctrl_c};

/// Resolve once a termination signal arrives
///
/// If a handler cannot be installed the error is logged and this future
/// never resolves, so the server keeps running until killed.
#[cfg(unix)]
pub async fn wait_for_signal() {
    // Handle SIGTERM (sent by Kubernetes when pod is terminating)
    let sigterm = signal(SignalKind::terminate());
    // Handle SIGINT (Ctrl+C)
    let sigint = signal(SignalKind::interrupt());

    let (mut sigterm, mut sigint) = match (sigterm, sigint) {
        (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to install signal handlers: {}", e);
            return std::future::pending().await;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM signal, initiating graceful shutdown");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT signal, initiating graceful shutdown");
        }
    }
}

/// Resolve once a termination signal arrives
#[cfg(windows)]
pub async fn wait_for_signal() {
    // Handle Ctrl+C
    let ctrlc = ctrl_c();
    // Handle Ctrl+Break
    let ctrlbreak = ctrl_break();

    let (mut ctrlc, mut ctrlbreak) = match (ctrlc, ctrlbreak) {
        (Ok(ctrlc), Ok(ctrlbreak)) => (ctrlc, ctrlbreak),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to install signal handlers: {}", e);
            return std::future::pending().await;
        }
    };

    tokio::select! {
        _ = ctrlc.recv() => {
            info!("Received Ctrl+C signal, initiating graceful shutdown");
        }
        _ = ctrlbreak.recv() => {
            info!("Received Ctrl+Break signal, initiating graceful shutdown");
        }
    }
}
