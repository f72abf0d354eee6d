//! Termination signal handling.
//!
//! SIGINT and SIGTERM flip a watch channel that the poll loop selects on
//! while it sleeps between cycles. A second signal exits the process
//! without waiting for the loop.

use tokio::sync::watch;

/// Exit status used when a second signal cuts shutdown short.
const EXIT_ON_SECOND_SIGNAL: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignalAction {
    /// Let the poll loop stop at its next sleep.
    Drain,
    /// Shutdown was already requested; stop waiting.
    Exit,
}

fn on_signal(tx: &watch::Sender<bool>) -> SignalAction {
    if tx.send_replace(true) {
        SignalAction::Exit
    } else {
        SignalAction::Drain
    }
}

/// Receiving side of the shutdown signal.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

/// Sending side of a manually driven [`Shutdown`].
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    /// Installs the process-wide SIGINT/SIGTERM handler.
    ///
    /// Can only succeed once per process.
    pub fn install() -> Result<Self, ctrlc::Error> {
        let (tx, rx) = watch::channel(false);
        ctrlc::set_handler(move || match on_signal(&tx) {
            SignalAction::Drain => {
                tracing::info!("Termination signal received, stopping after the current cycle")
            }
            SignalAction::Exit => {
                tracing::warn!("Second termination signal received, exiting now");
                std::process::exit(EXIT_ON_SECOND_SIGNAL);
            }
        })?;
        Ok(Self { rx })
    }

    /// Creates a shutdown signal fired by the returned trigger.
    pub fn manual() -> (ShutdownTrigger, Self) {
        let (tx, rx) = watch::channel(false);
        (ShutdownTrigger { tx }, Self { rx })
    }

    /// Completes once shutdown has been requested.
    ///
    /// Never completes if the sending side goes away without firing.
    pub async fn triggered(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

impl ShutdownTrigger {
    /// Requests shutdown.
    pub fn fire(&self) {
        self.tx.send_replace(true);
    }
}
