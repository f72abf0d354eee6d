//! Resource driver boundary.
//!
//! A driver is the opaque client library for an external resource. The
//! exporters only need three things from it: open a link, run a statement
//! on that link, and close it again. Everything else about the resource is
//! hidden behind the [`Driver`] trait so the connection lifecycle can be
//! exercised against [`FakeDriver`] instead of a live database.

pub mod fake;
#[cfg(feature = "mysql")]
mod mysql;
#[cfg(feature = "postgres")]
mod postgres;

pub use fake::{FakeDriver, FakeHandle};
#[cfg(feature = "mysql")]
pub use mysql::MySqlDriver;
#[cfg(feature = "postgres")]
pub use postgres::PostgresDriver;

use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by a driver.
///
/// The variants describe *where* the link failed, which is all the
/// lifecycle manager needs to decide whether to keep the handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// The resource could not be reached or refused the credentials.
    #[error("connect failed: {0}")]
    Connect(String),
    /// A previously established link has gone away.
    #[error("connection closed: {0}")]
    Closed(String),
    /// The resource answered but rejected the statement.
    #[error("statement failed: {0}")]
    Query(String),
}

/// Parameters needed to open a link to a database.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectParams {
    /// Host name or address of the database server.
    pub host: String,
    /// TCP port of the database server.
    pub port: u16,
    /// User to authenticate as.
    pub user: Option<String>,
    /// Password for `user`.
    pub password: Option<String>,
    /// Database (schema) to select after connecting.
    pub database: Option<String>,
}

impl ConnectParams {
    /// Creates parameters for `host:port` with no credentials.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            user: None,
            password: None,
            database: None,
        }
    }

    /// Sets the user and password.
    pub fn with_credentials(mut self, user: impl Into<String>, password: Option<String>) -> Self {
        self.user = Some(user.into());
        self.password = password;
        self
    }

    /// Sets the database to select.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Returns `host:port`, used in log lines and labels.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .finish()
    }
}

/// Summary of the rows a statement produced.
///
/// Exporters never look at result sets beyond the first column of the
/// first row, so only that value is decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rows {
    /// Number of rows returned.
    pub len: usize,
    /// First column of the first row, if it decoded as a number.
    pub scalar: Option<f64>,
}

impl Rows {
    /// Builds a single-row result holding `value`.
    pub fn scalar(value: f64) -> Self {
        Self {
            len: 1,
            scalar: Some(value),
        }
    }

    /// Builds a result with `len` rows and nothing decoded.
    pub fn with_len(len: usize) -> Self {
        Self { len, scalar: None }
    }
}

/// Client library for an external resource.
#[async_trait]
pub trait Driver: Send + Sync + 'static {
    /// An open link to the resource.
    type Handle: Send;

    /// Opens a new link.
    async fn connect(&self, params: &ConnectParams) -> Result<Self::Handle, DriverError>;

    /// Runs `query` on an open link.
    async fn execute(&self, handle: &mut Self::Handle, query: &str) -> Result<Rows, DriverError>;

    /// Closes a link. Failures while closing are logged, never returned.
    async fn close(&self, handle: Self::Handle);
}

/// Sorts a sqlx error raised on an established link.
#[cfg(any(feature = "postgres", feature = "mysql"))]
fn classify(error: sqlx::Error) -> DriverError {
    match error {
        sqlx::Error::Database(e) => DriverError::Query(e.to_string()),
        sqlx::Error::Io(e) => DriverError::Closed(e.to_string()),
        sqlx::Error::Protocol(message) => DriverError::Closed(message),
        sqlx::Error::WorkerCrashed => DriverError::Closed("connection worker crashed".to_string()),
        other => DriverError::Query(other.to_string()),
    }
}
