//! Node controller assigning pod CIDRs

use k8s_openapi::api::core::v1::Node;
use kube::{Api, Client};
use lb_core::{NodeIpamReconciler, ReconcileMetrics};
use lb_runtime::{run_controller, ControllerSettings, KubeNodeStore};
use std::sync::Arc;
use tracing::info;

pub struct NodeIpamController {
    client: Client,
    mask_size: u8,
    settings: ControllerSettings,
    metrics: ReconcileMetrics,
}

impl NodeIpamController {
    pub fn new(
        client: Client,
        mask_size: u8,
        settings: ControllerSettings,
        metrics: ReconcileMetrics,
    ) -> Self {
        Self {
            client,
            mask_size,
            settings,
            metrics,
        }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        info!("Starting Node IPAM reconciliation with /{} pod CIDRs", self.mask_size);

        let store = Arc::new(KubeNodeStore::new(self.client.clone()));
        let reconciler = Arc::new(NodeIpamReconciler::new(store, self.mask_size));
        let nodes: Api<Node> = Api::all(self.client.clone());
        run_controller(nodes, reconciler, self.settings.clone(), self.metrics.clone()).await;

        Ok(())
    }
}
