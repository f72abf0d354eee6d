//! Connection lifecycle.
//!
//! The [`ConnectionManager`] owns at most one live handle to the external
//! resource. It is a two-state machine:
//!
//! ```text
//!               connect ok
//! Disconnected ───────────▶ Connected
//!      ▲                        │
//!      └──────── any error ─────┘
//! ```
//!
//! A failed connect leaves it `Disconnected` and the next poll tick tries
//! again. There is no backoff and no attempt limit.

mod connector;

pub use connector::{Connector, Detached, DriverConnector};

use crate::metrics::{HealthIndicator, HealthState};
use crate::probe::ProbeFailure;

/// Current state of a [`ConnectionManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No handle is held; the next cycle connects.
    Disconnected,
    /// A handle is held and reused by every cycle.
    Connected,
}

/// Owns the connection handle and keeps the health indicator in step with it.
pub struct ConnectionManager<C: Connector> {
    connector: C,
    handle: Option<C::Handle>,
    health: Option<HealthIndicator>,
}

impl<C: Connector> ConnectionManager<C> {
    /// Creates a manager with no handle and no health indicator.
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            handle: None,
            health: None,
        }
    }

    /// Reports connection health through `indicator`.
    pub fn with_health(mut self, indicator: HealthIndicator) -> Self {
        self.health = Some(indicator);
        self
    }

    /// Whether a handle is currently held.
    pub fn state(&self) -> ConnectionState {
        if self.handle.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    /// Returns the live handle, connecting first if there is none.
    ///
    /// A successful connect marks health `up`. On failure the manager stays
    /// disconnected and the health indicator is left for
    /// [`invalidate`](Self::invalidate) to update.
    pub async fn ensure_connected(&mut self) -> Result<&mut C::Handle, ProbeFailure> {
        let handle = match self.handle.take() {
            Some(handle) => handle,
            None => {
                let handle = self.connector.connect().await?;
                tracing::info!("Connection established");
                self.report(HealthState::Up);
                handle
            }
        };
        Ok(self.handle.insert(handle))
    }

    /// Marks health `down`, then closes and drops the current handle, if any.
    ///
    /// The handle is detached before closing starts, so the manager is
    /// already `Disconnected` even if the close never completes.
    pub async fn invalidate(&mut self) {
        self.report(HealthState::Down);
        if let Some(handle) = self.handle.take() {
            self.connector.close(handle).await;
            tracing::debug!("Connection discarded");
        }
    }

    fn report(&self, state: HealthState) {
        if let Some(health) = &self.health {
            health.set(state);
        }
    }
}
