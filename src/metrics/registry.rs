//! Metric registry adapter.

use super::{MetricName, MetricsError};
use prometheus::{Encoder, Gauge, GaugeVec, IntGaugeVec, Opts, Registry, TextEncoder};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Description of a labelled gauge.
///
/// Built once at startup; the same spec is passed to every
/// [`MetricsRegistry::record`] call for that gauge.
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeSpec {
    name: MetricName,
    help: String,
    labels: Vec<(String, String)>,
}

impl GaugeSpec {
    /// Creates an unlabelled gauge spec.
    pub fn new(name: MetricName, help: impl Into<String>) -> Self {
        Self {
            name,
            help: help.into(),
            labels: Vec::new(),
        }
    }

    /// Adds a fixed label.
    pub fn with_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.push((name.into(), value.into()));
        self
    }

    /// Metric name.
    pub fn name(&self) -> &MetricName {
        &self.name
    }

    /// Help text shown in the exposition.
    pub fn help(&self) -> &str {
        &self.help
    }

    /// Label names in declaration order.
    pub fn label_names(&self) -> Vec<&str> {
        self.labels.iter().map(|(k, _)| k.as_str()).collect()
    }

    /// Label values in declaration order.
    pub fn label_values(&self) -> Vec<&str> {
        self.labels.iter().map(|(_, v)| v.as_str()).collect()
    }
}

/// States of the binary health indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    /// The resource is reachable.
    Up,
    /// The last cycle could not reach the resource.
    Down,
}

impl HealthState {
    /// Every state, in exposition order.
    pub const ALL: [HealthState; 2] = [HealthState::Up, HealthState::Down];

    /// Label value of this state's series.
    pub fn as_str(self) -> &'static str {
        match self {
            HealthState::Up => "up",
            HealthState::Down => "down",
        }
    }

    fn code(self) -> u8 {
        match self {
            HealthState::Up => 1,
            HealthState::Down => 2,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(HealthState::Up),
            2 => Some(HealthState::Down),
            _ => None,
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Two-state enum metric.
///
/// Exposed the way Prometheus client libraries render enums: one series per
/// state, labelled with the metric's own name, where exactly one series
/// reads 1. Nothing is exported until the first [`set`](Self::set).
#[derive(Clone)]
pub struct HealthIndicator {
    states: IntGaugeVec,
    current: Arc<AtomicU8>,
    scrape: Arc<RwLock<()>>,
}

impl HealthIndicator {
    /// Activates `state` and clears the other one.
    ///
    /// Both series change under the scrape lock, so a concurrent scrape
    /// sees either the old pair or the new pair.
    pub fn set(&self, state: HealthState) {
        let _guard = self.scrape.write().unwrap_or_else(PoisonError::into_inner);
        for candidate in HealthState::ALL {
            self.states
                .with_label_values(&[candidate.as_str()])
                .set(i64::from(candidate == state));
        }
        self.current.store(state.code(), Ordering::Release);
    }

    /// The active state, or `None` if the indicator was never set.
    pub fn get(&self) -> Option<HealthState> {
        HealthState::from_code(self.current.load(Ordering::Acquire))
    }
}

impl fmt::Debug for HealthIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthIndicator")
            .field("current", &self.get())
            .finish()
    }
}

enum Instrument {
    Gauge {
        vec: GaugeVec,
        label_names: Vec<String>,
    },
    Health(HealthIndicator),
}

/// Prometheus registry holding every instrument an exporter publishes.
///
/// Instruments are created on first use and live for the rest of the
/// process; registering the same name again returns the existing one.
pub struct MetricsRegistry {
    registry: Registry,
    instruments: RwLock<HashMap<String, Instrument>>,
    scrape: Arc<RwLock<()>>,
}

impl MetricsRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            instruments: RwLock::new(HashMap::new()),
            scrape: Arc::new(RwLock::new(())),
        }
    }

    /// Registers the gauge family described by `spec` without creating a
    /// series, so nothing is exported until the first [`record`](Self::record).
    pub fn register_gauge(&self, spec: &GaugeSpec) -> Result<(), MetricsError> {
        self.gauge_family(spec).map(|_| ())
    }

    /// Returns the gauge described by `spec`, registering it on first use.
    pub fn gauge(&self, spec: &GaugeSpec) -> Result<Gauge, MetricsError> {
        let family = self.gauge_family(spec)?;
        Ok(family.get_metric_with_label_values(&spec.label_values())?)
    }

    /// Overwrites the current value of the gauge described by `spec`.
    pub fn record(&self, spec: &GaugeSpec, value: f64) -> Result<(), MetricsError> {
        self.gauge(spec)?.set(value);
        Ok(())
    }

    /// Returns the health indicator named `name`, registering it on first use.
    pub fn health_indicator(
        &self,
        name: &MetricName,
        help: &str,
    ) -> Result<HealthIndicator, MetricsError> {
        let mut instruments = self.write_instruments();
        if let Some(instrument) = instruments.get(name.as_str()) {
            return match instrument {
                Instrument::Health(indicator) => Ok(indicator.clone()),
                Instrument::Gauge { .. } => Err(MetricsError::KindMismatch(name.to_string())),
            };
        }

        let states = IntGaugeVec::new(Opts::new(name.as_str(), help), &[name.as_str()])?;
        self.registry.register(Box::new(states.clone()))?;
        let indicator = HealthIndicator {
            states,
            current: Arc::new(AtomicU8::new(0)),
            scrape: Arc::clone(&self.scrape),
        };
        instruments.insert(name.to_string(), Instrument::Health(indicator.clone()));
        tracing::debug!(metric = %name, "Registered health indicator");
        Ok(indicator)
    }

    /// Reads back the exported value of the gauge described by `spec`.
    ///
    /// Returns `None` if nothing has been recorded for that label set yet.
    pub fn value(&self, spec: &GaugeSpec) -> Option<f64> {
        let wanted: Vec<(&str, &str)> = spec
            .label_names()
            .into_iter()
            .zip(spec.label_values())
            .collect();

        self.registry
            .gather()
            .iter()
            .filter(|family| family.get_name() == spec.name().as_str())
            .flat_map(|family| family.get_metric())
            .find(|metric| {
                let pairs = metric.get_label();
                pairs.len() == wanted.len()
                    && wanted.iter().all(|(k, v)| {
                        pairs
                            .iter()
                            .any(|pair| pair.get_name() == *k && pair.get_value() == *v)
                    })
            })
            .map(|metric| metric.get_gauge().get_value())
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = {
            let _guard = self.scrape.read().unwrap_or_else(PoisonError::into_inner);
            self.registry.gather()
        };
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    fn gauge_family(&self, spec: &GaugeSpec) -> Result<GaugeVec, MetricsError> {
        let name = spec.name().as_str();

        if let Some(instrument) = self.read_instruments().get(name) {
            return Self::matching_family(name, instrument, spec);
        }

        let mut instruments = self.write_instruments();
        if let Some(instrument) = instruments.get(name) {
            return Self::matching_family(name, instrument, spec);
        }

        let label_names = spec.label_names();
        let vec = GaugeVec::new(Opts::new(name, spec.help()), &label_names)?;
        self.registry.register(Box::new(vec.clone()))?;
        tracing::debug!(metric = name, labels = ?label_names, "Registered gauge");
        instruments.insert(
            name.to_string(),
            Instrument::Gauge {
                vec: vec.clone(),
                label_names: label_names.into_iter().map(String::from).collect(),
            },
        );
        Ok(vec)
    }

    fn matching_family(
        name: &str,
        instrument: &Instrument,
        spec: &GaugeSpec,
    ) -> Result<GaugeVec, MetricsError> {
        match instrument {
            Instrument::Gauge { vec, label_names } => {
                if label_names.iter().map(String::as_str).ne(spec.label_names()) {
                    return Err(MetricsError::LabelMismatch {
                        name: name.to_string(),
                        expected: label_names.clone(),
                    });
                }
                Ok(vec.clone())
            }
            Instrument::Health(_) => Err(MetricsError::KindMismatch(name.to_string())),
        }
    }

    fn read_instruments(&self) -> RwLockReadGuard<'_, HashMap<String, Instrument>> {
        self.instruments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_instruments(&self) -> RwLockWriteGuard<'_, HashMap<String, Instrument>> {
        self.instruments
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn idle_spec() -> GaugeSpec {
        GaugeSpec::new(
            MetricName::new("db_idle_connections").unwrap(),
            "Number of idle db connections",
        )
        .with_label("db_name", "app")
        .with_label("db_host", "db.internal")
        .with_label("db_port", "5432")
    }

    #[test]
    fn test_record_overwrites_value() {
        let registry = MetricsRegistry::new();
        let spec = idle_spec();

        registry.record(&spec, 3.0).unwrap();
        registry.record(&spec, 1.0).unwrap();

        assert_eq!(registry.value(&spec), Some(1.0));
    }

    #[test]
    fn test_registration_is_idempotent() {
        let registry = MetricsRegistry::new();
        let spec = idle_spec();

        registry.record(&spec, 4.0).unwrap();
        // Registering again must neither fail nor reset the value.
        registry.gauge(&spec).unwrap();
        registry.gauge(&spec).unwrap();

        assert_eq!(registry.value(&spec), Some(4.0));
        assert_eq!(registry.registry().gather().len(), 1);
    }

    #[test]
    fn test_unrecorded_gauge_has_no_value() {
        let registry = MetricsRegistry::new();
        registry.register_gauge(&idle_spec()).unwrap();

        assert_eq!(registry.value(&idle_spec()), None);
        assert!(!registry.encode().unwrap().contains("db_idle_connections{"));
    }

    #[test]
    fn test_label_set_must_match() {
        let registry = MetricsRegistry::new();
        registry.record(&idle_spec(), 1.0).unwrap();

        let other = GaugeSpec::new(MetricName::new("db_idle_connections").unwrap(), "x")
            .with_label("db_name", "app");
        assert!(matches!(
            registry.record(&other, 2.0),
            Err(MetricsError::LabelMismatch { .. })
        ));
    }

    #[test]
    fn test_health_indicator_states() {
        let registry = MetricsRegistry::new();
        let name = MetricName::new("db_host_status").unwrap();
        let health = registry.health_indicator(&name, "Status of db host").unwrap();
        assert_eq!(health.get(), None);
        assert!(!registry.encode().unwrap().contains("db_host_status{"));

        health.set(HealthState::Up);
        let output = registry.encode().unwrap();
        assert!(output.contains(r#"db_host_status{db_host_status="up"} 1"#));
        assert!(output.contains(r#"db_host_status{db_host_status="down"} 0"#));

        health.set(HealthState::Down);
        health.set(HealthState::Down);
        let output = registry.encode().unwrap();
        assert!(output.contains(r#"db_host_status{db_host_status="up"} 0"#));
        assert!(output.contains(r#"db_host_status{db_host_status="down"} 1"#));
        assert_eq!(health.get(), Some(HealthState::Down));
    }

    #[test]
    fn test_health_indicator_is_shared() {
        let registry = MetricsRegistry::new();
        let name = MetricName::new("db_host_status").unwrap();
        let first = registry.health_indicator(&name, "Status of db host").unwrap();
        first.set(HealthState::Up);

        let second = registry.health_indicator(&name, "Status of db host").unwrap();
        assert_eq!(second.get(), Some(HealthState::Up));
    }

    #[test]
    fn test_kind_mismatch() {
        let registry = MetricsRegistry::new();
        let name = MetricName::new("shared_name").unwrap();
        registry
            .record(&GaugeSpec::new(name.clone(), "gauge"), 1.0)
            .unwrap();

        assert!(matches!(
            registry.health_indicator(&name, "enum"),
            Err(MetricsError::KindMismatch(_))
        ));
    }

    #[test]
    fn test_encode_contains_help_and_value() {
        let registry = MetricsRegistry::new();
        registry.record(&idle_spec(), 3.0).unwrap();

        let output = registry.encode().unwrap();
        assert!(output.contains("# HELP db_idle_connections Number of idle db connections"));
        assert!(output.contains("# TYPE db_idle_connections gauge"));
        assert!(output.contains(r#"db_name="app""#));
    }

    proptest! {
        #[test]
        fn recorded_value_reads_back_exactly(value in proptest::num::f64::NORMAL | proptest::num::f64::ZERO) {
            let registry = MetricsRegistry::new();
            let spec = idle_spec();
            registry.record(&spec, value).unwrap();
            prop_assert_eq!(registry.value(&spec), Some(value));
        }

        #[test]
        fn recorded_value_survives_text_encoding(value in proptest::num::f64::NORMAL | proptest::num::f64::ZERO) {
            let registry = MetricsRegistry::new();
            registry.record(&idle_spec(), value).unwrap();

            let output = registry.encode().unwrap();
            let exported: Vec<f64> = output
                .lines()
                .filter(|line| line.starts_with("db_idle_connections{"))
                .map(|line| line.rsplit(' ').next().unwrap().parse().unwrap())
                .collect();
            prop_assert_eq!(exported, vec![value]);
        }
    }
}
