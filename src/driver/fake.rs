//! Scriptable in-memory driver.

use super::{ConnectParams, Driver, DriverError, Rows};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Handle returned by [`FakeDriver::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeHandle {
    id: u64,
}

impl FakeHandle {
    /// Sequence number of the connect call that produced this handle.
    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Default)]
struct FakeState {
    connects: VecDeque<Result<(), DriverError>>,
    executes: VecDeque<Result<Rows, DriverError>>,
    connect_calls: u64,
    close_calls: u64,
    open_handles: usize,
    queries: Vec<String>,
}

/// Driver that replays scripted results.
///
/// Cloning shares the script and the call counters, so a test can keep one
/// clone for assertions while the code under test owns another. Once a
/// script runs dry, connects succeed and statements return no rows.
#[derive(Debug, Clone, Default)]
pub struct FakeDriver {
    state: Arc<Mutex<FakeState>>,
}

impl FakeDriver {
    /// Creates a driver with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the outcome of the next unscripted connect call.
    pub fn push_connect(&self, result: Result<(), DriverError>) -> &Self {
        self.state().connects.push_back(result);
        self
    }

    /// Queues the outcome of the next unscripted execute call.
    pub fn push_execute(&self, result: Result<Rows, DriverError>) -> &Self {
        self.state().executes.push_back(result);
        self
    }

    /// Number of connect attempts made so far.
    pub fn connect_calls(&self) -> u64 {
        self.state().connect_calls
    }

    /// Number of handles closed so far.
    pub fn close_calls(&self) -> u64 {
        self.state().close_calls
    }

    /// Number of handles connected and not yet closed.
    pub fn open_handles(&self) -> usize {
        self.state().open_handles
    }

    /// Statements executed so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.state().queries.clone()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Driver for FakeDriver {
    type Handle = FakeHandle;

    async fn connect(&self, _params: &ConnectParams) -> Result<FakeHandle, DriverError> {
        let mut state = self.state();
        state.connect_calls += 1;
        state.connects.pop_front().unwrap_or(Ok(()))?;
        state.open_handles += 1;
        Ok(FakeHandle {
            id: state.connect_calls,
        })
    }

    async fn execute(&self, _handle: &mut FakeHandle, query: &str) -> Result<Rows, DriverError> {
        let mut state = self.state();
        state.queries.push(query.to_string());
        state
            .executes
            .pop_front()
            .unwrap_or_else(|| Ok(Rows::default()))
    }

    async fn close(&self, _handle: FakeHandle) {
        let mut state = self.state();
        state.close_calls += 1;
        state.open_handles = state.open_handles.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_driver_replays_script() {
        let driver = FakeDriver::new();
        driver
            .push_connect(Err(DriverError::Connect("refused".into())))
            .push_execute(Ok(Rows::scalar(2.0)));
        let params = ConnectParams::new("localhost", 5432);

        assert!(driver.connect(&params).await.is_err());
        let mut handle = driver.connect(&params).await.unwrap();
        assert_eq!(handle.id(), 2);
        assert_eq!(driver.open_handles(), 1);

        let rows = driver.execute(&mut handle, "SELECT 1").await.unwrap();
        assert_eq!(rows.scalar, Some(2.0));

        driver.close(handle).await;
        assert_eq!(driver.connect_calls(), 2);
        assert_eq!(driver.close_calls(), 1);
        assert_eq!(driver.open_handles(), 0);
        assert_eq!(driver.queries(), vec!["SELECT 1".to_string()]);
    }

    #[tokio::test]
    async fn test_clones_share_counters() {
        let driver = FakeDriver::new();
        let observer = driver.clone();

        driver
            .connect(&ConnectParams::new("localhost", 3306))
            .await
            .unwrap();
        assert_eq!(observer.connect_calls(), 1);
    }
}
