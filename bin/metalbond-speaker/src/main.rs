use anyhow::Result;
use kube::Client;
use lb_core::{LocalRouteTable, ReconcileMetrics, RouteReconciler};
use lb_runtime::{http, logging, KubeServiceStore};
use prometheus::Registry;
use std::sync::Arc;
use tracing::{error, info};

mod config;
mod service_route_controller;

use config::SpeakerConfig;
use service_route_controller::ServiceRouteController;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    info!("Starting metalbond-speaker...");

    let config = SpeakerConfig::from_env()?;
    let client = Client::try_default().await?;

    let registry = Registry::new();
    let metrics = ReconcileMetrics::new(&registry)?;

    let fabric = Arc::new(LocalRouteTable::new().with_gauge(metrics.routes_announced.clone()));
    let store = Arc::new(KubeServiceStore::new(client.clone()));
    let reconciler = Arc::new(RouteReconciler::new(
        store,
        fabric.clone(),
        config.route.clone(),
        metrics.clone(),
    ));

    let metrics_addr = config.metrics_addr;
    tokio::spawn(async move {
        if let Err(e) = http::serve(metrics_addr, registry).await {
            error!("Metrics server error: {}", e);
        }
    });

    let controller =
        ServiceRouteController::new(client, reconciler, config.controller.clone(), metrics);
    tokio::spawn(async move {
        if let Err(e) = controller.run().await {
            error!("Service route controller error: {}", e);
        }
    });

    // Keep the process alive
    tokio::signal::ctrl_c().await?;
    info!(
        announced_routes = fabric.route_count().await,
        "Shutdown signal received, exiting..."
    );

    Ok(())
}
