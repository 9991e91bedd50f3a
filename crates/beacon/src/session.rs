//! Scoped observability session
//!
//! `with_session` builds the full stack, runs the caller's scope against it,
//! and shuts everything down on every exit path. The scope's own result is
//! what the caller gets back; a shutdown failure is logged, never allowed to
//! replace it.

use std::future::Future;
use std::pin::Pin;

use tracing::error;

use beacon_core::{BeaconConfig, ServiceIdentity};
#[cfg(test)]
use beacon_core::BeaconError;

use crate::orchestrator::Beacon;

/// Future returned by a session scope. Boxed so scopes can borrow the beacon
/// across await points.
pub type ScopeFuture<'a, T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send + 'a>>;

/// Run `scope` against a freshly built stack, shutting it down afterwards.
///
/// If creation fails the scope never runs and the startup error is returned.
/// Once the scope has run, its result stands: teardown failures after a
/// completed scope are logged and swallowed.
pub async fn with_session<T, F>(
    identity: &ServiceIdentity,
    config: &BeaconConfig,
    scope: F,
) -> anyhow::Result<T>
where
    F: for<'a> FnOnce(&'a Beacon) -> ScopeFuture<'a, T>,
{
    let beacon = Beacon::new(identity, config).await?;
    run_scoped(beacon, scope).await
}

async fn run_scoped<T, F>(mut beacon: Beacon, scope: F) -> anyhow::Result<T>
where
    F: for<'a> FnOnce(&'a Beacon) -> ScopeFuture<'a, T>,
{
    let outcome = scope(&beacon).await;
    if let Err(e) = beacon.shutdown().await {
        error!(error = %e, "session teardown failed");
    }
    outcome
}
