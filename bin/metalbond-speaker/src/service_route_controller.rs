//! Service controller announcing fabric routes for LoadBalancer services

use k8s_openapi::api::core::v1::Service;
use kube::{Api, Client};
use lb_core::{ReconcileMetrics, RouteReconciler};
use lb_runtime::{run_controller, ControllerSettings};
use std::sync::Arc;
use tracing::info;

pub struct ServiceRouteController {
    client: Client,
    reconciler: Arc<RouteReconciler>,
    settings: ControllerSettings,
    metrics: ReconcileMetrics,
}

impl ServiceRouteController {
    pub fn new(
        client: Client,
        reconciler: Arc<RouteReconciler>,
        settings: ControllerSettings,
        metrics: ReconcileMetrics,
    ) -> Self {
        Self {
            client,
            reconciler,
            settings,
            metrics,
        }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let config = self.reconciler.config();
        info!(
            node_address = %config.node_address,
            vni = %config.vni,
            finalizer = %config.finalizer,
            "Starting Service route reconciliation"
        );

        let services: Api<Service> = Api::all(self.client.clone());
        run_controller(
            services,
            self.reconciler.clone(),
            self.settings.clone(),
            self.metrics.clone(),
        )
        .await;

        Ok(())
    }
}
