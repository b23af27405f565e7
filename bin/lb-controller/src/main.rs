use anyhow::Result;
use kube::Client;
use lb_core::ReconcileMetrics;
use lb_runtime::{http, logging};
use prometheus::Registry;
use tracing::{error, info};

mod config;
mod node_ipam_controller;
mod service_status_controller;

use config::ControllerConfig;
use node_ipam_controller::NodeIpamController;
use service_status_controller::ServiceStatusController;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    info!("Starting lb-controller...");

    let config = ControllerConfig::from_env()?;
    let client = Client::try_default().await?;

    let registry = Registry::new();
    let metrics = ReconcileMetrics::new(&registry)?;

    let metrics_addr = config.metrics_addr;
    tokio::spawn(async move {
        if let Err(e) = http::serve(metrics_addr, registry).await {
            error!("Metrics server error: {}", e);
        }
    });

    let node_ipam = NodeIpamController::new(
        client.clone(),
        config.node_cidr_mask_size,
        config.controller.clone(),
        metrics.clone(),
    );
    tokio::spawn(async move {
        if let Err(e) = node_ipam.run().await {
            error!("Node IPAM controller error: {}", e);
        }
    });

    let service_status = ServiceStatusController::new(client, config.controller.clone(), metrics);
    tokio::spawn(async move {
        if let Err(e) = service_status.run().await {
            error!("Service status controller error: {}", e);
        }
    });

    // Keep the process alive
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting...");

    Ok(())
}
