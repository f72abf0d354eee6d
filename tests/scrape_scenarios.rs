//! Poll cycles observed through the HTTP metrics endpoint.

use resource_exporters::{
    driver::{ConnectParams, DriverError, FakeDriver, Rows},
    lifecycle::{ConnectionManager, DriverConnector},
    metrics::{MetricName, MetricsRegistry, MetricsServer, MetricsServerConfig},
    probe::IdleConnectionsProbe,
    scheduler::{CycleReport, Sampler},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

async fn scrape(addr: SocketAddr) -> String {
    let resp = reqwest::get(format!("http://{}/metrics", addr))
        .await
        .expect("Failed to scrape /metrics");
    assert_eq!(resp.status(), 200);
    resp.text().await.expect("Failed to read scrape body")
}

/// Value of the first series of `metric` whose labels contain `label`.
fn series(body: &str, metric: &str, label: &str) -> Option<f64> {
    let prefix = format!("{}{{", metric);
    body.lines()
        .filter(|line| line.starts_with(&prefix) && line.contains(label))
        .find_map(|line| line.rsplit(' ').next()?.parse().ok())
}

async fn start(
    driver: &FakeDriver,
) -> (
    Sampler<DriverConnector<FakeDriver>, IdleConnectionsProbe<FakeDriver>>,
    SocketAddr,
) {
    let registry = Arc::new(MetricsRegistry::new());
    let health = registry
        .health_indicator(&MetricName::new("db_host_status").unwrap(), "Status of db host")
        .unwrap();
    let params = ConnectParams::new("db.internal", 5432).with_database("app");
    let driver = Arc::new(driver.clone());
    let probe = IdleConnectionsProbe::new(Arc::clone(&driver), &params).unwrap();
    let connections =
        ConnectionManager::new(DriverConnector::new(driver, params)).with_health(health);
    let sampler = Sampler::new(
        connections,
        probe,
        Arc::clone(&registry),
        Duration::from_secs(5),
    )
    .unwrap();

    let server = MetricsServer::new(
        MetricsServerConfig {
            bind_addr: ([127, 0, 0, 1], 0).into(),
        },
        registry,
    )
    .start()
    .await
    .unwrap();

    (sampler, server.local_addr())
}

#[tokio::test]
async fn healthy_cycle_is_scraped_exactly() {
    let driver = FakeDriver::new();
    driver.push_execute(Ok(Rows::scalar(3.0)));
    let (mut sampler, addr) = start(&driver).await;

    assert_eq!(sampler.run_cycle().await, CycleReport::Observed(3.0));

    let body = scrape(addr).await;
    assert_eq!(series(&body, "db_idle_connections", r#"db_name="app""#), Some(3.0));
    assert_eq!(series(&body, "db_host_status", r#""up""#), Some(1.0));
    assert_eq!(series(&body, "db_host_status", r#""down""#), Some(0.0));
}

#[tokio::test]
async fn unreachable_database_recovers_on_next_cycle() {
    let driver = FakeDriver::new();
    driver.push_connect(Err(DriverError::Connect("connection refused".into())));
    driver.push_execute(Ok(Rows::scalar(7.0)));
    let (mut sampler, addr) = start(&driver).await;

    sampler.run_cycle().await;
    let body = scrape(addr).await;
    assert_eq!(series(&body, "db_host_status", r#""down""#), Some(1.0));
    assert_eq!(series(&body, "db_idle_connections", r#"db_name="app""#), None);

    sampler.run_cycle().await;
    let body = scrape(addr).await;
    assert_eq!(series(&body, "db_host_status", r#""up""#), Some(1.0));
    assert_eq!(series(&body, "db_idle_connections", r#"db_name="app""#), Some(7.0));
}

#[tokio::test]
async fn dropped_connection_keeps_last_value() {
    let driver = FakeDriver::new();
    driver
        .push_execute(Ok(Rows::scalar(12.0)))
        .push_execute(Err(DriverError::Closed("terminating connection".into())));
    let (mut sampler, addr) = start(&driver).await;

    sampler.run_cycle().await;
    sampler.run_cycle().await;

    let body = scrape(addr).await;
    assert_eq!(series(&body, "db_host_status", r#""down""#), Some(1.0));
    assert_eq!(series(&body, "db_idle_connections", r#"db_name="app""#), Some(12.0));
    assert_eq!(driver.open_handles(), 0);
}
