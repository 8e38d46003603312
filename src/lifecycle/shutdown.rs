//! Shutdown coordination for the proxy.

use std::future::Future;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinError;

use crate::http::HttpServer;
use crate::lifecycle::signals::TerminationSignals;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Serve until one of `signals` arrives, then drain and return.
pub async fn serve_until_signal(
    server: HttpServer,
    listener: TcpListener,
    signals: TerminationSignals,
) {
    serve_until(server, listener, signals.recv()).await
}

/// Serve on a background task until `stop` resolves or the serve loop ends
/// on its own.
///
/// Serve-loop errors are logged, never propagated: by the time they surface
/// the process is already on its way out.
pub async fn serve_until<F>(server: HttpServer, listener: TcpListener, stop: F)
where
    F: Future<Output = &'static str>,
{
    let shutdown = Shutdown::new();
    let mut serving = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        signal = stop => tracing::info!(signal, "stopping"),
        finished = &mut serving => {
            report(finished);
            return;
        }
    }

    shutdown.trigger();
    report(serving.await);
}

fn report(finished: Result<std::io::Result<()>, JoinError>) {
    match finished {
        Ok(Ok(())) => tracing::info!("Shutdown complete"),
        Ok(Err(e)) => tracing::error!(error = %e, "Serve loop terminated with error"),
        Err(e) => tracing::error!(error = %e, "Serve task aborted"),
    }
}
