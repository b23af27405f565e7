use crate::Result;
use async_trait::async_trait;
use lb_api::ObjectKey;

/// A level-triggered reconciler driven by object keys
///
/// `reconcile` re-reads the object and converges towards the desired state.
/// It must tolerate redundant and out-of-order invocations; an `Err` asks the
/// dispatcher to retry later.
#[async_trait]
pub trait Reconcile: Send + Sync {
    /// Name used in logs and metric labels
    fn name(&self) -> &'static str;

    async fn reconcile(&self, key: &ObjectKey) -> Result<()>;
}
