//! Structured logging client
//!
//! The logger installs the process-wide `tracing` subscriber (console fmt
//! layer plus an OpenTelemetry span bridge) and offers a leveled API that
//! mirrors every record to the core's OTel log pipeline.

use opentelemetry::logs::{AnyValue, LogRecord as _, Logger as _, Severity};
use opentelemetry_sdk::logs as sdklogs;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use beacon_core::{BeaconError, ServiceIdentity};

use crate::core::TelemetryCore;

/// Severity levels for emitted log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    fn severity(&self) -> Severity {
        match self {
            LogLevel::Debug => Severity::Debug,
            LogLevel::Info => Severity::Info,
            LogLevel::Warn => Severity::Warn,
            LogLevel::Error => Severity::Error,
        }
    }
}

/// Logging client bound to the shared telemetry core.
pub struct Logger {
    service_name: String,
    otel: Option<sdklogs::Logger>,
}

impl Logger {
    /// Create the logger and install the global `tracing` subscriber.
    ///
    /// The subscriber is installed at most once per process; if another
    /// component already claimed it, the existing one is kept.
    pub fn new(identity: &ServiceIdentity, core: &TelemetryCore) -> Result<Self, BeaconError> {
        let telemetry_layer = tracing_opentelemetry::layer().with_tracer(core.tracer());

        let installed = tracing_subscriber::registry()
            .with(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,beacon=debug")),
            )
            .with(tracing_subscriber::fmt::layer())
            .with(telemetry_layer)
            .try_init();

        if installed.is_err() {
            // A subscriber from an earlier session (or the host application)
            // is already active; records still reach the OTel pipeline below.
            tracing::debug!("global tracing subscriber already installed, keeping it");
        }

        Ok(Self {
            service_name: identity.name().to_string(),
            otel: core.log_handle(),
        })
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message, &[]);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, &[]);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message, &[]);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message, &[]);
    }

    /// Emit a record at the given level with structured attributes.
    pub fn log(&self, level: LogLevel, message: &str, attributes: &[(&str, String)]) {
        match level {
            LogLevel::Debug => {
                tracing::debug!(target: "beacon", service = %self.service_name, "{message}")
            }
            LogLevel::Info => {
                tracing::info!(target: "beacon", service = %self.service_name, "{message}")
            }
            LogLevel::Warn => {
                tracing::warn!(target: "beacon", service = %self.service_name, "{message}")
            }
            LogLevel::Error => {
                tracing::error!(target: "beacon", service = %self.service_name, "{message}")
            }
        }

        if let Some(otel) = &self.otel {
            let mut record = otel.create_log_record();
            record.set_severity_number(level.severity());
            record.set_severity_text(level.as_str());
            record.set_body(AnyValue::from(message.to_string()));
            for (key, value) in attributes {
                record.add_attribute(key.to_string(), value.clone());
            }
            otel.emit(record);
        }
    }
}
