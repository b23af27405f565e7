//! Prometheus metrics for the reconcilers

use crate::Result;
use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};

/// Counters shared by every reconciler in the process
#[derive(Clone)]
pub struct ReconcileMetrics {
    /// Reconciliations by controller and result ("success" / "error")
    pub reconciliations_total: IntCounterVec,
    /// Reconciliation latency by controller
    pub reconcile_duration_seconds: HistogramVec,
    /// Routes announced into the fabric
    pub routes_announced_total: IntCounter,
    /// Route withdrawals issued to the fabric
    pub routes_withdrawn_total: IntCounter,
    /// Routes currently held by the local route table
    pub routes_announced: IntGauge,
    /// Finalizer patches by operation ("add" / "remove")
    pub finalizer_patches_total: IntCounterVec,
}

impl ReconcileMetrics {
    pub fn new(registry: &Registry) -> Result<Self> {
        let reconciliations_total = IntCounterVec::new(
            Opts::new("lb_reconciliations_total", "Total reconciliations"),
            &["controller", "result"],
        )?;

        let reconcile_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "lb_reconcile_duration_seconds",
                "Reconciliation latency in seconds",
            ),
            &["controller"],
        )?;

        let routes_announced_total = IntCounter::new(
            "lb_routes_announced_total",
            "Total routes announced into the fabric",
        )?;

        let routes_withdrawn_total = IntCounter::new(
            "lb_routes_withdrawn_total",
            "Total route withdrawals issued to the fabric",
        )?;

        let routes_announced = IntGauge::new(
            "lb_routes_announced",
            "Routes currently held by the local route table",
        )?;

        let finalizer_patches_total = IntCounterVec::new(
            Opts::new("lb_finalizer_patches_total", "Total finalizer patches"),
            &["operation"],
        )?;

        registry.register(Box::new(reconciliations_total.clone()))?;
        registry.register(Box::new(reconcile_duration_seconds.clone()))?;
        registry.register(Box::new(routes_announced_total.clone()))?;
        registry.register(Box::new(routes_withdrawn_total.clone()))?;
        registry.register(Box::new(routes_announced.clone()))?;
        registry.register(Box::new(finalizer_patches_total.clone()))?;

        Ok(Self {
            reconciliations_total,
            reconcile_duration_seconds,
            routes_announced_total,
            routes_withdrawn_total,
            routes_announced,
            finalizer_patches_total,
        })
    }

    /// Metrics bound to a private registry, for tests and tools
    pub fn unregistered() -> Result<Self> {
        Self::new(&Registry::new())
    }

    pub fn record_reconcile(&self, controller: &str, success: bool, seconds: f64) {
        let result = if success { "success" } else { "error" };
        self.reconciliations_total
            .with_label_values(&[controller, result])
            .inc();
        self.reconcile_duration_seconds
            .with_label_values(&[controller])
            .observe(seconds);
    }
}
