//! Service controller publishing load balancer ingress addresses

use k8s_openapi::api::core::v1::Service;
use kube::{Api, Client};
use lb_core::{ReconcileMetrics, ServiceStatusReconciler};
use lb_runtime::{run_controller, ControllerSettings, KubeServiceStore};
use std::sync::Arc;
use tracing::info;

pub struct ServiceStatusController {
    client: Client,
    settings: ControllerSettings,
    metrics: ReconcileMetrics,
}

impl ServiceStatusController {
    pub fn new(client: Client, settings: ControllerSettings, metrics: ReconcileMetrics) -> Self {
        Self {
            client,
            settings,
            metrics,
        }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        info!("Starting Service status reconciliation");

        let store = Arc::new(KubeServiceStore::new(self.client.clone()));
        let reconciler = Arc::new(ServiceStatusReconciler::new(store));
        let services: Api<Service> = Api::all(self.client.clone());
        run_controller(services, reconciler, self.settings.clone(), self.metrics.clone()).await;

        Ok(())
    }
}
