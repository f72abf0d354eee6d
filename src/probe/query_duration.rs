//! Query latency probe.

use super::{Probe, ProbeFailure, SampleOutcome};
use crate::driver::{ConnectParams, Driver};
use crate::metrics::{GaugeSpec, MetricName, MetricsError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Times a fixed query end to end.
///
/// Each sample opens its own connection, runs the query and closes the
/// connection again; the observation is the wall-clock time for all three
/// steps, in seconds. The query's result set is ignored.
pub struct QueryDurationProbe<D: Driver> {
    driver: Arc<D>,
    params: ConnectParams,
    query: String,
    gauge: GaugeSpec,
}

impl<D: Driver> QueryDurationProbe<D> {
    /// Creates a probe for `query`; `name` becomes part of the metric name.
    pub fn new(
        driver: Arc<D>,
        params: ConnectParams,
        name: &str,
        query: impl Into<String>,
    ) -> Result<Self, MetricsError> {
        let query = query.into();
        let gauge = GaugeSpec::new(
            MetricName::query_duration(name)?,
            format!("{} query duration", name),
        )
        .with_label("query", query.clone());

        Ok(Self {
            driver,
            params,
            query,
            gauge,
        })
    }
}

#[async_trait]
impl<D: Driver> Probe<()> for QueryDurationProbe<D> {
    fn gauge(&self) -> &GaugeSpec {
        &self.gauge
    }

    async fn sample(&mut self, _handle: &mut ()) -> SampleOutcome {
        let started = Instant::now();

        let mut handle = self
            .driver
            .connect(&self.params)
            .await
            .map_err(ProbeFailure::from_connect)?;
        let result = self.driver.execute(&mut handle, &self.query).await;
        self.driver.close(handle).await;
        result?;

        let duration = started.elapsed().as_secs_f64();
        tracing::info!(seconds = duration, "Query execution took {} seconds", duration);
        Ok(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{DriverError, FakeDriver, Rows};
    use crate::probe::FailureKind;

    fn probe(driver: &FakeDriver) -> QueryDurationProbe<FakeDriver> {
        QueryDurationProbe::new(
            Arc::new(driver.clone()),
            ConnectParams::new("mysql.internal", 3306),
            "MySQL",
            "SELECT * FROM employees",
        )
        .unwrap()
    }

    #[test]
    fn test_gauge_name_and_label() {
        let probe = probe(&FakeDriver::new());
        let gauge = probe.gauge();

        assert_eq!(gauge.name().as_str(), "cust_mysql_query_duration");
        assert_eq!(gauge.help(), "MySQL query duration");
        assert_eq!(gauge.label_values(), vec!["SELECT * FROM employees"]);
    }

    #[tokio::test]
    async fn test_measures_and_closes_each_time() {
        let driver = FakeDriver::new();
        driver.push_execute(Ok(Rows::with_len(12)));
        let mut probe = probe(&driver);

        let first = probe.sample(&mut ()).await.unwrap();
        let second = probe.sample(&mut ()).await.unwrap();

        assert!(first >= 0.0 && second >= 0.0);
        assert_eq!(driver.connect_calls(), 2);
        assert_eq!(driver.close_calls(), 2);
        assert_eq!(driver.open_handles(), 0);
    }

    #[tokio::test]
    async fn test_connect_failure_is_connectivity() {
        let driver = FakeDriver::new();
        driver.push_connect(Err(DriverError::Connect("access denied".into())));
        let mut probe = probe(&driver);

        let failure = probe.sample(&mut ()).await.unwrap_err();
        assert_eq!(failure.kind(), FailureKind::Connectivity);
        assert_eq!(driver.close_calls(), 0);
    }

    #[tokio::test]
    async fn test_query_failure_still_closes() {
        let driver = FakeDriver::new();
        driver.push_execute(Err(DriverError::Query("table does not exist".into())));
        let mut probe = probe(&driver);

        let failure = probe.sample(&mut ()).await.unwrap_err();
        assert_eq!(failure.kind(), FailureKind::Query);
        assert_eq!(driver.open_handles(), 0);
    }
}
