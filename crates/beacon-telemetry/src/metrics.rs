//! Metrics client
//!
//! Thin wrapper over the core's `Meter`: instrument constructors plus
//! one-shot record helpers for callers that do not want to hold instruments.

use std::borrow::Cow;

use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter, UpDownCounter};
use opentelemetry::KeyValue;

use beacon_core::{BeaconError, ServiceIdentity};

use crate::core::TelemetryCore;

/// Metrics client bound to the shared telemetry core.
pub struct Metrics {
    meter: Meter,
}

impl Metrics {
    pub fn new(_identity: &ServiceIdentity, core: &TelemetryCore) -> Result<Self, BeaconError> {
        Ok(Self { meter: core.meter() })
    }

    pub fn counter(&self, name: impl Into<Cow<'static, str>>) -> Counter<u64> {
        self.meter.u64_counter(name).build()
    }

    pub fn float_counter(&self, name: impl Into<Cow<'static, str>>) -> Counter<f64> {
        self.meter.f64_counter(name).build()
    }

    pub fn up_down_counter(&self, name: impl Into<Cow<'static, str>>) -> UpDownCounter<i64> {
        self.meter.i64_up_down_counter(name).build()
    }

    pub fn histogram(&self, name: impl Into<Cow<'static, str>>) -> Histogram<f64> {
        self.meter.f64_histogram(name).build()
    }

    pub fn gauge(&self, name: impl Into<Cow<'static, str>>) -> Gauge<f64> {
        self.meter.f64_gauge(name).build()
    }

    /// Record a single counter increment without holding the instrument.
    pub fn record_u64(
        &self,
        name: impl Into<Cow<'static, str>>,
        value: u64,
        attributes: &[KeyValue],
    ) {
        self.counter(name).add(value, attributes);
    }

    /// Record a single float counter increment without holding the instrument.
    pub fn record_f64(
        &self,
        name: impl Into<Cow<'static, str>>,
        value: f64,
        attributes: &[KeyValue],
    ) {
        self.float_counter(name).add(value, attributes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::TelemetryConfig;

    #[test]
    fn instruments_resolve_without_export() {
        let identity = ServiceIdentity::new("metrics-test").unwrap();
        let core = TelemetryCore::new(&identity, &TelemetryConfig::default()).unwrap();
        let metrics = Metrics::new(&identity, &core).unwrap();

        let requests = metrics.counter("beacon_requests_total");
        requests.add(1, &[KeyValue::new("route", "/health")]);

        metrics.histogram("beacon_latency_seconds").record(0.012, &[]);
        metrics.up_down_counter("beacon_active").add(1, &[]);
        metrics.gauge("beacon_queue_depth").record(3.0, &[]);
        metrics.record_u64("beacon_oneshot_total", 2, &[]);
        metrics.record_f64("beacon_oneshot_bytes", 8.5, &[]);
    }
}
