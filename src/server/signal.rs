// Signal handling module
//
// Supported signals:
// - SIGINT:  Graceful shutdown (Ctrl+C)
// - SIGTERM: Graceful shutdown
//
// Other platforms only get Ctrl+C.
//
// Handlers are installed by `ShutdownSignal::register`, so a signal that
// arrives while the share is being built or the port bound is queued
// instead of killing the process before teardown.

use crate::logger;

#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};

/// Installed shutdown handlers, resolved with [`ShutdownSignal::wait`]
#[cfg(unix)]
pub struct ShutdownSignal {
    interrupt: Option<Signal>,
    terminate: Option<Signal>,
}

#[cfg(unix)]
impl ShutdownSignal {
    /// Install SIGINT and SIGTERM handlers now
    ///
    /// Must be called inside a tokio runtime. A handler that cannot be
    /// installed is logged and the other one still works.
    pub fn register() -> Self {
        Self {
            interrupt: install(SignalKind::interrupt(), "SIGINT"),
            terminate: install(SignalKind::terminate(), "SIGTERM"),
        }
    }

    /// Resolve when the process is asked to stop
    pub async fn wait(mut self) {
        tokio::select! {
            () = recv(self.interrupt.as_mut()) => logger::log_shutdown("SIGINT"),
            () = recv(self.terminate.as_mut()) => logger::log_shutdown("SIGTERM"),
        }
    }
}

#[cfg(unix)]
fn install(kind: SignalKind, name: &str) -> Option<Signal> {
    match signal(kind) {
        Ok(s) => Some(s),
        Err(e) => {
            logger::log_warning(&format!("Failed to register {name} handler: {e}"));
            None
        }
    }
}

#[cfg(unix)]
async fn recv(signal: Option<&mut Signal>) {
    match signal {
        Some(s) => {
            s.recv().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub struct ShutdownSignal {
    ctrl_c: Option<tokio::signal::windows::CtrlC>,
}

#[cfg(not(unix))]
impl ShutdownSignal {
    pub fn register() -> Self {
        match tokio::signal::windows::ctrl_c() {
            Ok(ctrl_c) => Self {
                ctrl_c: Some(ctrl_c),
            },
            Err(e) => {
                logger::log_warning(&format!("Failed to register Ctrl+C handler: {e}"));
                Self { ctrl_c: None }
            }
        }
    }

    pub async fn wait(mut self) {
        match self.ctrl_c.as_mut() {
            Some(ctrl_c) => {
                ctrl_c.recv().await;
                logger::log_shutdown("Ctrl+C");
            }
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_signal_before_wait_is_not_lost() {
        let shutdown = ShutdownSignal::register();

        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        tokio::time::timeout(Duration::from_secs(5), shutdown.wait())
            .await
            .unwrap();
    }
}
