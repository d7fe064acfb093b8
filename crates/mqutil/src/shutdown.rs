//! Translation of process shutdown signals into a [`CancellationToken`].

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

/// How long a long-running body may drain after cancellation before it is
/// forced to stop.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[cfg(unix)]
struct ShutdownSignals {
    term: tokio::signal::unix::Signal,
    int: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};
        Ok(Self {
            term: signal(SignalKind::terminate())?,
            int: signal(SignalKind::interrupt())?,
        })
    }

    async fn recv(&mut self) {
        tokio::select! {
            _ = self.term.recv() => info!("Received SIGTERM"),
            _ = self.int.recv() => info!("Received SIGINT"),
        }
    }
}

// ctrl_c is the cross-platform way to intercept the equivalent of SIGINT
#[cfg(not(unix))]
struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    fn install() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C");
        }
    }
}

/// A token that is cancelled when the process receives SIGINT or SIGTERM.
///
/// Handlers are installed before this returns, so a signal arriving right
/// after the call is not lost. The listener task ends when the token is
/// cancelled for any reason. Must be called from within a Tokio runtime.
pub fn signal_token() -> std::io::Result<CancellationToken> {
    let mut signals = ShutdownSignals::install()?;
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = signals.recv() => trigger.cancel(),
            _ = trigger.cancelled() => {}
        }
    });
    Ok(token)
}
