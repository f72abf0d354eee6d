//! Ways of opening the handle a probe samples through.

use crate::driver::{ConnectParams, Driver};
use crate::probe::ProbeFailure;
use async_trait::async_trait;
use std::sync::Arc;

/// Opens and closes connection handles for a [`ConnectionManager`](super::ConnectionManager).
#[async_trait]
pub trait Connector: Send + Sync {
    /// The handle handed to probes.
    type Handle: Send;

    /// Opens a new handle.
    async fn connect(&self) -> Result<Self::Handle, ProbeFailure>;

    /// Closes a handle that is no longer wanted.
    async fn close(&self, handle: Self::Handle);
}

/// Connects through a [`Driver`] with fixed parameters.
pub struct DriverConnector<D: Driver> {
    driver: Arc<D>,
    params: ConnectParams,
}

impl<D: Driver> DriverConnector<D> {
    /// Creates a connector that opens links with `params`.
    pub fn new(driver: Arc<D>, params: ConnectParams) -> Self {
        Self { driver, params }
    }
}

#[async_trait]
impl<D: Driver> Connector for DriverConnector<D> {
    type Handle = D::Handle;

    async fn connect(&self) -> Result<D::Handle, ProbeFailure> {
        self.driver
            .connect(&self.params)
            .await
            .map_err(ProbeFailure::from_connect)
    }

    async fn close(&self, handle: D::Handle) {
        self.driver.close(handle).await;
    }
}

/// Connector for probes that hold no long-lived connection.
///
/// Connecting always succeeds and yields the unit handle.
#[derive(Debug, Clone, Copy, Default)]
pub struct Detached;

#[async_trait]
impl Connector for Detached {
    type Handle = ();

    async fn connect(&self) -> Result<(), ProbeFailure> {
        Ok(())
    }

    async fn close(&self, _handle: ()) {}
}
