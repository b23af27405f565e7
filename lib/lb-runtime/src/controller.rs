//! Drives an lb-core reconciler from a kube-runtime Controller
//!
//! The Controller provides the work queue: one entry per object, at most one
//! reconcile in flight per object, redelivery on every change. This module
//! adds the deadline per invocation and the per-object backoff on errors.

use futures::StreamExt;
use kube::{Api, Resource};
use kube_runtime::controller::{self, Action};
use kube_runtime::{watcher, Controller};
use lb_api::ObjectKey;
use lb_core::{CoreError, Reconcile, ReconcileMetrics, RetryBackoff};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

#[derive(Clone, Debug)]
pub struct ControllerSettings {
    /// Upper bound on reconciles running at once across all objects
    pub concurrency: u16,
    /// Deadline of a single reconcile
    pub timeout: Duration,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            concurrency: 4,
            timeout: Duration::from_secs(30),
            backoff_base: Duration::from_secs(5),
            backoff_max: Duration::from_secs(300),
        }
    }
}

struct Context {
    reconciler: Arc<dyn Reconcile>,
    backoff: RetryBackoff,
    timeout: Duration,
    metrics: ReconcileMetrics,
}

/// Run `reconciler` for every object of `api` until the watch ends
pub async fn run_controller<K>(
    api: Api<K>,
    reconciler: Arc<dyn Reconcile>,
    settings: ControllerSettings,
    metrics: ReconcileMetrics,
) where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
{
    let name = reconciler.name();
    info!(controller = name, concurrency = settings.concurrency, "Starting controller");

    let ctx = Arc::new(Context {
        reconciler,
        backoff: RetryBackoff::new(settings.backoff_base, settings.backoff_max),
        timeout: settings.timeout,
        metrics,
    });

    let mut stream = Controller::new(api, watcher::Config::default())
        .with_config(controller::Config::default().concurrency(settings.concurrency))
        .run(reconcile::<K>, error_policy::<K>, ctx)
        .boxed();

    while let Some(item) = stream.next().await {
        match item {
            Ok((object, _)) => debug!(controller = name, %object, "Reconciled"),
            Err(e) => warn!(controller = name, error = %e, "Reconciliation stream error"),
        }
    }

    info!(controller = name, "Controller stopped");
}

async fn reconcile<K>(object: Arc<K>, ctx: Arc<Context>) -> Result<Action, CoreError>
where
    K: Resource<DynamicType = ()>,
{
    let key = ObjectKey::of(object.as_ref());
    let started = Instant::now();

    let result = match tokio::time::timeout(ctx.timeout, ctx.reconciler.reconcile(&key)).await {
        Ok(result) => result,
        Err(_) => Err(CoreError::Timeout(ctx.timeout)),
    };
    ctx.metrics.record_reconcile(
        ctx.reconciler.name(),
        result.is_ok(),
        started.elapsed().as_secs_f64(),
    );

    result?;
    ctx.backoff.reset(&key);
    Ok(Action::await_change())
}

fn error_policy<K>(object: Arc<K>, error: &CoreError, ctx: Arc<Context>) -> Action
where
    K: Resource<DynamicType = ()>,
{
    let key = ObjectKey::of(object.as_ref());
    let delay = ctx.backoff.next_delay(&key);
    error!(
        controller = ctx.reconciler.name(),
        object = %key,
        %error,
        retry_in = ?delay,
        "Reconciliation failed"
    );
    Action::requeue(delay)
}
