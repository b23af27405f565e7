use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Unsupported address family for {0}: only IPv6 host routes are managed")]
    UnsupportedAddressFamily(String),

    #[error("Routing fabric error: {0}")]
    Fabric(String),

    #[error("Cannot derive service IP: {0}")]
    ServiceIp(String),

    #[error("Reconciliation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Kubernetes error: {0}")]
    KubernetesError(#[from] kube::Error),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl CoreError {
    pub fn invalid_address(address: impl Into<String>, reason: impl ToString) -> Self {
        CoreError::InvalidAddress {
            address: address.into(),
            reason: reason.to_string(),
        }
    }
}
