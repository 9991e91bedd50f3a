//! Lifecycle orchestrator
//!
//! Builds every enabled subsystem in a fixed order, hands out the aggregate
//! handle, and tears everything down in a best-effort sequence where one
//! failing step never prevents the remaining steps from running.

use tracing::{error, warn};

use beacon_core::{BeaconConfig, BeaconError, ServiceIdentity};
use beacon_infra::{Profiler, Recorder};
use beacon_telemetry::{Logger, Metrics, TelemetryCore, Tracer};

use crate::subsystem::{ProfilerHandle, RecorderHandle, TelemetryHandle};

/// Aggregate handle over all active telemetry subsystems.
///
/// Created once by [`Beacon::new`]; torn down once by [`Beacon::shutdown`].
/// The handle may be shared for reading (all client APIs take `&self`), but
/// shutdown takes `&mut self`, so callers must drain use before closing.
pub struct Beacon {
    logger: Logger,
    metrics: Metrics,
    tracer: Tracer,
    telemetry: Option<Box<dyn TelemetryHandle>>,
    profiler: Option<Box<dyn ProfilerHandle>>,
    recorder: Option<Box<dyn RecorderHandle>>,
}

impl std::fmt::Debug for Beacon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Beacon")
            .field("telemetry", &self.telemetry.is_some())
            .field("profiler", &self.profiler.is_some())
            .field("recorder", &self.recorder.is_some())
            .finish_non_exhaustive()
    }
}

impl Beacon {
    /// Build the full subsystem stack.
    ///
    /// Order: telemetry core, then logger, metrics, tracer (all three depend
    /// on the core), then profiler and recorder when their sub-config enables
    /// them. Any constructor failure aborts the sequence; subsystems already
    /// built in the same call are torn down best-effort before the error is
    /// propagated, so a failed create never leaks running resources.
    pub async fn new(
        identity: &ServiceIdentity,
        config: &BeaconConfig,
    ) -> Result<Self, BeaconError> {
        // The core always exists, even with every export disabled: the
        // logger, metrics, and tracer clients resolve against it.
        let telemetry = TelemetryCore::new(identity, &config.telemetry)?;

        let logger = match Logger::new(identity, &telemetry) {
            Ok(logger) => logger,
            Err(e) => return Err(abort_startup(telemetry, None, e).await),
        };
        let metrics = match Metrics::new(identity, &telemetry) {
            Ok(metrics) => metrics,
            Err(e) => return Err(abort_startup(telemetry, None, e).await),
        };
        let tracer = match Tracer::new(identity, &telemetry) {
            Ok(tracer) => tracer,
            Err(e) => return Err(abort_startup(telemetry, None, e).await),
        };

        let profiler = if config.profiling.enabled {
            match Profiler::new(identity, &config.profiling) {
                Ok(profiler) => Some(profiler),
                Err(e) => return Err(abort_startup(telemetry, None, e).await),
            }
        } else {
            None
        };

        let recorder = if config.recording.enabled {
            match Recorder::new(&config.recording) {
                Ok(recorder) => Some(recorder),
                Err(e) => return Err(abort_startup(telemetry, profiler, e).await),
            }
        } else {
            None
        };

        Ok(Self {
            logger,
            metrics,
            tracer,
            telemetry: Some(Box::new(telemetry)),
            profiler: profiler.map(|p| Box::new(p) as Box<dyn ProfilerHandle>),
            recorder: recorder.map(|r| Box::new(r) as Box<dyn RecorderHandle>),
        })
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    /// The profiler, when profiling was enabled at creation time.
    pub fn profiler(&self) -> Option<&dyn ProfilerHandle> {
        self.profiler.as_deref()
    }

    /// The recorder, when recording was enabled at creation time.
    pub fn recorder(&self) -> Option<&dyn RecorderHandle> {
        self.recorder.as_deref()
    }

    /// Tear down all subsystems: profiler stop, recorder close, telemetry
    /// core shutdown, in that order, continuing past individual failures.
    ///
    /// Each slot is cleared before its teardown result is inspected, so no
    /// subsystem can be torn down twice. Every failure is reported to the
    /// diagnostic sink; only the first is returned.
    pub async fn shutdown(&mut self) -> Result<(), BeaconError> {
        let mut failures: Vec<BeaconError> = Vec::new();

        if let Some(mut profiler) = self.profiler.take() {
            if let Err(e) = profiler.stop().await {
                failures.push(e);
            }
        }
        if let Some(mut recorder) = self.recorder.take() {
            if let Err(e) = recorder.close().await {
                failures.push(e);
            }
        }
        if let Some(mut telemetry) = self.telemetry.take() {
            if let Err(e) = telemetry.shutdown().await {
                failures.push(e);
            }
        }

        let mut failures = failures.into_iter();
        match failures.next() {
            None => Ok(()),
            Some(first) => {
                for extra in failures {
                    error!(error = %extra, "additional teardown failure during shutdown");
                }
                Err(first)
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn from_parts(
        logger: Logger,
        metrics: Metrics,
        tracer: Tracer,
        telemetry: Box<dyn TelemetryHandle>,
        profiler: Option<Box<dyn ProfilerHandle>>,
        recorder: Option<Box<dyn RecorderHandle>>,
    ) -> Self {
        Self {
            logger,
            metrics,
            tracer,
            telemetry: Some(telemetry),
            profiler,
            recorder,
        }
    }
}

impl Drop for Beacon {
    fn drop(&mut self) {
        if self.telemetry.is_some() {
            warn!("beacon dropped without shutdown; buffered telemetry may be lost");
        }
    }
}

/// Best-effort cleanup of subsystems already built in a failed `new` call.
/// The original startup error is what the caller gets back.
async fn abort_startup(
    mut telemetry: TelemetryCore,
    profiler: Option<Profiler>,
    cause: BeaconError,
) -> BeaconError {
    if let Some(mut profiler) = profiler {
        if let Err(e) = profiler.stop().await {
            warn!(error = %e, "profiler cleanup after failed startup");
        }
    }
    if let Err(e) = telemetry.shutdown() {
        warn!(error = %e, "telemetry cleanup after failed startup");
    }
    cause
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use beacon_core::TelemetryConfig;

    use super::*;
    use crate::subsystem::{ProfilerHandle, RecorderHandle, TelemetryHandle};

    /// Shared call journal so tests can assert teardown order.
    pub(crate) type Journal = Arc<Mutex<Vec<&'static str>>>;

    pub(crate) struct FakeTelemetry {
        pub journal: Journal,
        pub fail: bool,
        pub calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TelemetryHandle for FakeTelemetry {
        async fn shutdown(&mut self) -> Result<(), BeaconError> {
            self.journal.lock().unwrap().push("telemetry.shutdown");
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(BeaconError::teardown(
                    "telemetry-core",
                    anyhow::anyhow!("flush failed"),
                ))
            } else {
                Ok(())
            }
        }
    }

    pub(crate) struct FakeProfiler {
        pub journal: Journal,
        pub fail: bool,
    }

    #[async_trait]
    impl ProfilerHandle for FakeProfiler {
        async fn stop(&mut self) -> Result<(), BeaconError> {
            self.journal.lock().unwrap().push("profiler.stop");
            if self.fail {
                Err(BeaconError::teardown(
                    "profiler",
                    anyhow::anyhow!("sampler wedged"),
                ))
            } else {
                Ok(())
            }
        }

        fn latest_sample(&self) -> Option<beacon_infra::ProfileSample> {
            None
        }
    }

    pub(crate) struct FakeRecorder {
        pub journal: Journal,
        pub fail: bool,
    }

    #[async_trait]
    impl RecorderHandle for FakeRecorder {
        fn record(&self, _topic: &str, _payload: serde_json::Value) -> Result<(), BeaconError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), BeaconError> {
            self.journal.lock().unwrap().push("recorder.close");
            if self.fail {
                Err(BeaconError::teardown(
                    "recorder",
                    anyhow::anyhow!("disk full"),
                ))
            } else {
                Ok(())
            }
        }
    }

    pub(crate) fn beacon_with_fakes(
        journal: &Journal,
        telemetry_fails: bool,
        profiler: Option<bool>,
        recorder: Option<bool>,
    ) -> (Beacon, Arc<AtomicUsize>) {
        let identity = ServiceIdentity::new("fake-svc").unwrap();
        let core = TelemetryCore::new(&identity, &TelemetryConfig::default()).unwrap();
        let logger = Logger::new(&identity, &core).unwrap();
        let metrics = Metrics::new(&identity, &core).unwrap();
        let tracer = Tracer::new(&identity, &core).unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let beacon = Beacon::from_parts(
            logger,
            metrics,
            tracer,
            Box::new(FakeTelemetry {
                journal: Arc::clone(journal),
                fail: telemetry_fails,
                calls: Arc::clone(&calls),
            }),
            profiler.map(|fail| {
                Box::new(FakeProfiler {
                    journal: Arc::clone(journal),
                    fail,
                }) as Box<dyn ProfilerHandle>
            }),
            recorder.map(|fail| {
                Box::new(FakeRecorder {
                    journal: Arc::clone(journal),
                    fail,
                }) as Box<dyn RecorderHandle>
            }),
        );
        (beacon, calls)
    }

    #[tokio::test]
    async fn shutdown_runs_all_steps_and_returns_first_failure() {
        // Every step fails; all three must still run, and the profiler's
        // error (the first) is the one surfaced.
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));
        let (mut beacon, _) = beacon_with_fakes(&journal, true, Some(true), Some(true));

        let err = beacon.shutdown().await.unwrap_err();
        assert!(
            matches!(err, BeaconError::Teardown { subsystem: "profiler", .. }),
            "expected the profiler failure first, got: {err}"
        );
        assert_eq!(
            *journal.lock().unwrap(),
            vec!["profiler.stop", "recorder.close", "telemetry.shutdown"]
        );
    }

    #[tokio::test]
    async fn shutdown_attempts_earlier_steps_when_only_telemetry_fails() {
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));
        let (mut beacon, _) = beacon_with_fakes(&journal, true, Some(false), Some(false));

        let err = beacon.shutdown().await.unwrap_err();
        assert!(matches!(
            err,
            BeaconError::Teardown { subsystem: "telemetry-core", .. }
        ));
        assert_eq!(
            *journal.lock().unwrap(),
            vec!["profiler.stop", "recorder.close", "telemetry.shutdown"]
        );
    }

    #[tokio::test]
    async fn shutdown_with_nothing_optional_touches_only_telemetry() {
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));
        let (mut beacon, calls) = beacon_with_fakes(&journal, false, None, None);

        beacon.shutdown().await.unwrap();
        assert_eq!(*journal.lock().unwrap(), vec!["telemetry.shutdown"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn second_shutdown_finds_cleared_slots() {
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));
        let (mut beacon, calls) = beacon_with_fakes(&journal, false, Some(false), Some(false));

        beacon.shutdown().await.unwrap();
        beacon.shutdown().await.unwrap();
        // Slots were cleared by the first call; nothing ran twice.
        assert_eq!(journal.lock().unwrap().len(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
