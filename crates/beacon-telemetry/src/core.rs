//! Shared telemetry core
//!
//! The core owns the OpenTelemetry providers (traces, metrics, logs) that the
//! Logger, Metrics, and Tracer clients register against. It always exists:
//! with export disabled the providers are built without processors or
//! readers, so instruments resolve but nothing leaves the process.
//! Note: OTLP log records are exported via the logger provider held here;
//! the global logger provider API was removed in opentelemetry 0.27.

use std::env;
use std::time::Duration;

use opentelemetry::logs::LoggerProvider as _;
use opentelemetry::metrics::{Meter, MeterProvider as _};
use opentelemetry::{trace::TracerProvider as _, KeyValue};
use opentelemetry_otlp::{WithExportConfig, WithHttpConfig};
use opentelemetry_sdk::{
    logs as sdklogs,
    metrics::{self as sdkmetrics, PeriodicReader, SdkMeterProvider},
    trace::{self as sdktrace, BatchConfig, BatchSpanProcessor, RandomIdGenerator, Sampler},
    Resource,
};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};

use beacon_core::{BeaconError, ServiceIdentity, TelemetryConfig};

/// Shared telemetry core that the Logger, Metrics, and Tracer depend on.
pub struct TelemetryCore {
    service_name: String,
    resource: Resource,
    tracer: sdktrace::Tracer,
    tracer_provider: Option<sdktrace::TracerProvider>,
    meter_provider: Option<SdkMeterProvider>,
    logger_provider: Option<sdklogs::LoggerProvider>,
}

impl TelemetryCore {
    /// Build the telemetry core from the service identity and the telemetry
    /// sub-config. OTLP pipelines are attached only for the signals whose
    /// enable flag is set while `export_enabled` is on.
    pub fn new(
        identity: &ServiceIdentity,
        config: &TelemetryConfig,
    ) -> Result<Self, BeaconError> {
        let service_name = identity.name().to_string();
        let resource = build_resource(identity);
        let export = config.export_enabled;

        // Tracer provider, with a batch OTLP processor when trace export is live
        let mut tracer_builder = sdktrace::TracerProvider::builder()
            .with_sampler(sampler_for_ratio(config.sample_ratio))
            .with_id_generator(RandomIdGenerator::default())
            .with_resource(resource.clone());

        if export && config.enable_tracing {
            let span_exporter = if config.otlp.use_grpc {
                opentelemetry_otlp::SpanExporter::builder()
                    .with_tonic()
                    .with_endpoint(config.otlp.grpc_endpoint.clone())
                    .with_timeout(Duration::from_secs(config.otlp.timeout_secs))
                    .build()
                    .map_err(|e| BeaconError::startup("telemetry-core", e))?
            } else {
                opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .with_endpoint(config.otlp.http_endpoint.clone())
                    .with_headers(config.otlp.headers.clone())
                    .with_timeout(Duration::from_secs(config.otlp.timeout_secs))
                    .build()
                    .map_err(|e| BeaconError::startup("telemetry-core", e))?
            };

            let batch_processor =
                BatchSpanProcessor::builder(span_exporter, opentelemetry_sdk::runtime::Tokio)
                    .with_batch_config(BatchConfig::default())
                    .build();
            tracer_builder = tracer_builder.with_span_processor(batch_processor);
        }

        let tracer_provider = tracer_builder.build();
        let tracer = tracer_provider.tracer(service_name.clone());
        opentelemetry::global::set_tracer_provider(tracer_provider.clone());

        // Meter provider, with a periodic OTLP reader when metric export is live
        let mut meter_builder = SdkMeterProvider::builder().with_resource(resource.clone());

        if export && config.enable_metrics {
            let metric_exporter = if config.otlp.use_grpc {
                opentelemetry_otlp::MetricExporter::builder()
                    .with_tonic()
                    .with_endpoint(config.otlp.grpc_endpoint.clone())
                    .with_timeout(Duration::from_secs(config.otlp.timeout_secs))
                    .with_temporality(sdkmetrics::Temporality::Cumulative)
                    .build()
                    .map_err(|e| BeaconError::startup("telemetry-core", e))?
            } else {
                opentelemetry_otlp::MetricExporter::builder()
                    .with_http()
                    .with_endpoint(config.otlp.http_endpoint.clone())
                    .with_headers(config.otlp.headers.clone())
                    .with_timeout(Duration::from_secs(config.otlp.timeout_secs))
                    .with_temporality(sdkmetrics::Temporality::Cumulative)
                    .build()
                    .map_err(|e| BeaconError::startup("telemetry-core", e))?
            };

            let reader = PeriodicReader::builder(metric_exporter, opentelemetry_sdk::runtime::Tokio)
                .with_interval(Duration::from_secs(config.metrics_interval_secs))
                .build();
            meter_builder = meter_builder.with_reader(reader);
        }

        let meter_provider = meter_builder.build();
        opentelemetry::global::set_meter_provider(meter_provider.clone());

        // Logger provider, with a batch OTLP exporter when log export is live
        let mut logger_builder = sdklogs::LoggerProvider::builder().with_resource(resource.clone());

        if export && config.enable_logging {
            let log_exporter = if config.otlp.use_grpc {
                opentelemetry_otlp::LogExporter::builder()
                    .with_tonic()
                    .with_endpoint(config.otlp.grpc_endpoint.clone())
                    .with_timeout(Duration::from_secs(config.otlp.timeout_secs))
                    .build()
                    .map_err(|e| BeaconError::startup("telemetry-core", e))?
            } else {
                opentelemetry_otlp::LogExporter::builder()
                    .with_http()
                    .with_endpoint(config.otlp.http_endpoint.clone())
                    .with_headers(config.otlp.headers.clone())
                    .with_timeout(Duration::from_secs(config.otlp.timeout_secs))
                    .build()
                    .map_err(|e| BeaconError::startup("telemetry-core", e))?
            };
            logger_builder =
                logger_builder.with_batch_exporter(log_exporter, opentelemetry_sdk::runtime::Tokio);
        }

        let logger_provider = logger_builder.build();

        Ok(Self {
            service_name,
            resource,
            tracer,
            tracer_provider: Some(tracer_provider),
            meter_provider: Some(meter_provider),
            logger_provider: Some(logger_provider),
        })
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Tracer scoped to the service name.
    pub fn tracer(&self) -> sdktrace::Tracer {
        self.tracer.clone()
    }

    /// Meter scoped to the service name.
    pub fn meter(&self) -> Meter {
        let scope = opentelemetry::InstrumentationScope::builder(self.service_name.clone()).build();
        match &self.meter_provider {
            Some(provider) => provider.meter_with_scope(scope),
            None => opentelemetry::global::meter_with_scope(scope),
        }
    }

    /// OTel log bridge scoped to the service name.
    pub fn log_handle(&self) -> Option<sdklogs::Logger> {
        self.logger_provider
            .as_ref()
            .map(|provider| provider.logger(self.service_name.clone()))
    }

    /// Flush and shut down every provider. Each provider slot is cleared
    /// once its shutdown completes, so a second call is a no-op.
    ///
    /// All provider failures are logged; the first one is returned.
    pub fn shutdown(&mut self) -> Result<(), BeaconError> {
        let mut failures: Vec<BeaconError> = Vec::new();

        if let Some(provider) = self.tracer_provider.take() {
            if let Err(e) = provider.shutdown() {
                failures.push(BeaconError::teardown("telemetry-core/traces", e));
            }
        }
        if let Some(provider) = self.meter_provider.take() {
            if let Err(e) = provider.shutdown() {
                failures.push(BeaconError::teardown("telemetry-core/metrics", e));
            }
        }
        if let Some(provider) = self.logger_provider.take() {
            if let Err(e) = provider.shutdown() {
                failures.push(BeaconError::teardown("telemetry-core/logs", e));
            }
        }

        let mut failures = failures.into_iter();
        match failures.next() {
            None => Ok(()),
            Some(first) => {
                for extra in failures {
                    tracing::error!(error = %extra, "telemetry provider shutdown failed");
                }
                Err(first)
            }
        }
    }
}

/// Resource attributes following the OTel semantic conventions, plus any
/// service-level attributes declared on the identity.
fn build_resource(identity: &ServiceIdentity) -> Resource {
    let hostname = hostname::get()
        .ok()
        .and_then(|h| h.to_str().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown".to_string());

    let instance_id = env::var("BEACON_SERVICE_INSTANCE_ID")
        .unwrap_or_else(|_| uuid::Uuid::new_v4().to_string());

    let mut attributes = vec![
        KeyValue::new(SERVICE_NAME, identity.name().to_string()),
        KeyValue::new(SERVICE_VERSION, identity.version().to_string()),
        KeyValue::new(
            "deployment.environment",
            identity.environment().as_str(),
        ),
        KeyValue::new("host.name", hostname),
        KeyValue::new("service.instance.id", instance_id),
    ];
    for (key, value) in identity.attributes() {
        attributes.push(KeyValue::new(key.clone(), value.clone()));
    }

    Resource::new(attributes)
}

fn sampler_for_ratio(ratio: f64) -> Sampler {
    let ratio = ratio.clamp(0.0, 1.0);
    if ratio <= 0.0 {
        Sampler::AlwaysOff
    } else if ratio >= 1.0 {
        Sampler::AlwaysOn
    } else {
        Sampler::TraceIdRatioBased(ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::Environment;

    fn identity() -> ServiceIdentity {
        ServiceIdentity::new("core-test")
            .unwrap()
            .with_version("0.0.1")
            .with_environment(Environment::Staging)
            .with_attribute("fleet", "alpha")
    }

    #[test]
    fn resource_carries_identity_attributes() {
        let resource = build_resource(&identity());
        let lookup = |key: &str| {
            resource
                .get(opentelemetry::Key::new(key.to_string()))
                .map(|v| v.to_string())
        };
        assert_eq!(lookup("service.name").as_deref(), Some("core-test"));
        assert_eq!(lookup("service.version").as_deref(), Some("0.0.1"));
        assert_eq!(lookup("deployment.environment").as_deref(), Some("staging"));
        assert_eq!(lookup("fleet").as_deref(), Some("alpha"));
        assert!(lookup("host.name").is_some());
        assert!(lookup("service.instance.id").is_some());
    }

    #[test]
    fn disabled_core_still_resolves_instruments() {
        let core = TelemetryCore::new(&identity(), &TelemetryConfig::default()).unwrap();
        // Providers exist even though nothing is exported.
        let _tracer = core.tracer();
        let _meter = core.meter();
        assert!(core.log_handle().is_some());
    }

    #[test]
    fn disabled_core_shutdown_succeeds_and_clears_providers() {
        let mut core = TelemetryCore::new(&identity(), &TelemetryConfig::default()).unwrap();
        assert!(core.shutdown().is_ok());
        // Second call finds nothing to do.
        assert!(core.shutdown().is_ok());
        assert!(core.log_handle().is_none());
    }

    #[test]
    fn sampler_ratio_boundaries() {
        assert!(matches!(sampler_for_ratio(0.0), Sampler::AlwaysOff));
        assert!(matches!(sampler_for_ratio(-3.0), Sampler::AlwaysOff));
        assert!(matches!(sampler_for_ratio(1.0), Sampler::AlwaysOn));
        assert!(matches!(
            sampler_for_ratio(0.25),
            Sampler::TraceIdRatioBased(_)
        ));
    }
}
