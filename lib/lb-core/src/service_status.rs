//! Publishes the load balancer address in the status of LoadBalancer services

use crate::{CoreError, Reconcile, Result, ServiceStatusStore};
use async_trait::async_trait;
use lb_api::ObjectKey;
use std::net::{IpAddr, Ipv6Addr};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Load balancer address of a service: its cluster IP with byte 13 incremented
pub fn generate_service_ip(cluster_ip: &str) -> Result<Ipv6Addr> {
    let ip: IpAddr = cluster_ip
        .trim()
        .parse()
        .map_err(|e| CoreError::invalid_address(cluster_ip, e))?;
    let IpAddr::V6(ip) = ip else {
        return Err(CoreError::ServiceIp(format!("IPv4 is not supported: {cluster_ip}")));
    };

    let mut octets = ip.octets();
    octets[13] = octets[13].wrapping_add(1);
    if octets[13] == 0 {
        return Err(CoreError::ServiceIp(format!(
            "unsupported service range: {cluster_ip}"
        )));
    }
    Ok(Ipv6Addr::from(octets))
}

pub struct ServiceStatusReconciler {
    store: Arc<dyn ServiceStatusStore>,
}

impl ServiceStatusReconciler {
    pub fn new(store: Arc<dyn ServiceStatusStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Reconcile for ServiceStatusReconciler {
    fn name(&self) -> &'static str {
        "service-status"
    }

    #[instrument(skip(self), fields(service = %key))]
    async fn reconcile(&self, key: &ObjectKey) -> Result<()> {
        let Some(service) = self.store.get_service(key).await? else {
            return Ok(());
        };
        if service.deletion_requested || !service.is_load_balancer() {
            return Ok(());
        }
        let Some(cluster_ip) = service.routable_address() else {
            debug!("Service has no cluster IP yet");
            return Ok(());
        };

        let ip = generate_service_ip(cluster_ip)?.to_string();
        if service.ingress_ips == [ip.as_str()] {
            debug!(%ip, "Load balancer ingress already published");
            return Ok(());
        }

        self.store.patch_ingress_ip(&service, &ip).await?;
        info!(%ip, "Published load balancer ingress");
        Ok(())
    }
}
