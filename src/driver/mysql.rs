//! MySQL driver backed by sqlx.

use super::{classify, ConnectParams, Driver, DriverError, Rows};
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Connection, Row};

/// Driver opening single (unpooled) MySQL connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDriver;

impl MySqlDriver {
    fn options(params: &ConnectParams) -> MySqlConnectOptions {
        let mut options = MySqlConnectOptions::new()
            .host(&params.host)
            .port(params.port);
        if let Some(user) = &params.user {
            options = options.username(user);
        }
        if let Some(password) = &params.password {
            options = options.password(password);
        }
        if let Some(database) = &params.database {
            options = options.database(database);
        }
        options
    }
}

#[async_trait]
impl Driver for MySqlDriver {
    type Handle = MySqlConnection;

    async fn connect(&self, params: &ConnectParams) -> Result<MySqlConnection, DriverError> {
        MySqlConnection::connect_with(&Self::options(params))
            .await
            .map_err(|e| DriverError::Connect(e.to_string()))
    }

    async fn execute(
        &self,
        handle: &mut MySqlConnection,
        query: &str,
    ) -> Result<Rows, DriverError> {
        let rows: Vec<MySqlRow> = sqlx::query(query)
            .fetch_all(&mut *handle)
            .await
            .map_err(classify)?;

        Ok(Rows {
            len: rows.len(),
            scalar: rows.first().and_then(first_column),
        })
    }

    async fn close(&self, handle: MySqlConnection) {
        if let Err(e) = handle.close().await {
            tracing::debug!(error = %e, "MySQL connection did not close cleanly");
        }
    }
}

fn first_column(row: &MySqlRow) -> Option<f64> {
    row.try_get::<i64, _>(0)
        .map(|v| v as f64)
        .or_else(|_| row.try_get::<f64, _>(0))
        .ok()
}
