use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use sysinfo::{Pid, System};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use beacon_core::{BeaconError, ProfilingConfig, ServiceIdentity};

/// One CPU/memory snapshot of the running process.
#[derive(Debug, Clone)]
pub struct ProfileSample {
    pub timestamp: DateTime<Utc>,
    /// Process CPU usage in percent of a single core.
    pub cpu_percent: f32,
    /// Resident memory of the process, in bytes.
    pub memory_bytes: u64,
    /// Total memory of the host, in bytes.
    pub total_memory_bytes: u64,
}

/// Continuous sampling profiler.
///
/// Runs until `stop` is called; the sampling task holds its own `System`
/// handle so refreshes never block callers.
pub struct Profiler {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    latest: Arc<Mutex<Option<ProfileSample>>>,
}

impl std::fmt::Debug for Profiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profiler")
            .field("running", &self.task.is_some())
            .finish_non_exhaustive()
    }
}

impl Profiler {
    /// Start the sampling task for this process.
    pub fn new(
        identity: &ServiceIdentity,
        config: &ProfilingConfig,
    ) -> Result<Self, BeaconError> {
        if config.sample_interval_ms == 0 {
            return Err(BeaconError::startup(
                "profiler",
                anyhow::anyhow!("sample_interval_ms must be greater than zero"),
            ));
        }

        let pid = sysinfo::get_current_pid()
            .map_err(|e| BeaconError::startup("profiler", anyhow::anyhow!("{e}")))?;

        let cancel = CancellationToken::new();
        let latest = Arc::new(Mutex::new(None));
        let task = tokio::spawn(sample_loop(
            pid,
            Duration::from_millis(config.sample_interval_ms),
            identity.name().to_string(),
            config.tags.clone(),
            cancel.clone(),
            Arc::clone(&latest),
        ));

        Ok(Self {
            cancel,
            task: Some(task),
            latest,
        })
    }

    /// The most recent sample, if any was taken yet.
    pub fn latest_sample(&self) -> Option<ProfileSample> {
        // A poisoned lock still holds a whole sample; recover it.
        self.latest
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Stop the sampling task and wait for it to finish.
    pub async fn stop(&mut self) -> Result<(), BeaconError> {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| BeaconError::teardown("profiler", e))?;
        }
        Ok(())
    }
}

async fn sample_loop(
    pid: Pid,
    interval: Duration,
    service: String,
    tags: HashMap<String, String>,
    cancel: CancellationToken,
    latest: Arc<Mutex<Option<ProfileSample>>>,
) {
    let mut system = System::new();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if let Some(sample) = take_sample(&mut system, pid) {
                    trace!(
                        target: "beacon::profiling",
                        service = %service,
                        cpu_percent = sample.cpu_percent,
                        memory_bytes = sample.memory_bytes,
                        tags = ?tags,
                        "profile sample"
                    );
                    *latest.lock().unwrap_or_else(|e| e.into_inner()) = Some(sample);
                }
            }
        }
    }
}

fn take_sample(system: &mut System, pid: Pid) -> Option<ProfileSample> {
    system.refresh_memory();
    if !system.refresh_process(pid) {
        return None;
    }
    let process = system.process(pid)?;

    Some(ProfileSample {
        timestamp: Utc::now(),
        cpu_percent: process.cpu_usage(),
        memory_bytes: process.memory(),
        total_memory_bytes: system.total_memory(),
    })
}
