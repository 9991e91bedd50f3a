//! Tracing client
//!
//! Thin wrapper over the core's tracer: span starts, scoped spans, and error
//! recording helpers.

use std::borrow::Cow;

use opentelemetry::trace::{Span as _, Status, Tracer as _};
use opentelemetry::Context;
use opentelemetry_sdk::trace as sdktrace;

use beacon_core::{BeaconError, ServiceIdentity};

use crate::core::TelemetryCore;

/// Tracing client bound to the shared telemetry core.
pub struct Tracer {
    tracer: sdktrace::Tracer,
}

impl Tracer {
    pub fn new(_identity: &ServiceIdentity, core: &TelemetryCore) -> Result<Self, BeaconError> {
        Ok(Self {
            tracer: core.tracer(),
        })
    }

    /// Start a span as a child of the current context.
    pub fn start(&self, name: impl Into<Cow<'static, str>>) -> sdktrace::Span {
        self.tracer.start(name)
    }

    /// Run `f` inside a span of the given name, ending the span afterwards.
    pub fn in_span<T, F>(&self, name: impl Into<Cow<'static, str>>, f: F) -> T
    where
        F: FnOnce(Context) -> T,
    {
        self.tracer.in_span(name, f)
    }

    /// Record an error on the span and mark it failed.
    pub fn record_error(&self, span: &mut sdktrace::Span, error: &dyn std::error::Error) {
        span.record_error(error);
        span.set_status(Status::error(error.to_string()));
    }
}
