//! Resource manager: the seam a component uses to resolve a runtime dependency
//! (credentials, a tool handle, a model client) without the scheduler knowing what
//! kind of dependency it is (§3 "Execution Context", §6 "Component contract").

use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait ResourceManager: Send + Sync {
    async fn resolve(&self, name: &str) -> Option<Value>;
}

/// A resource manager with nothing registered. The default when a run is started
/// without one.
pub struct NoopResourceManager;

#[async_trait]
impl ResourceManager for NoopResourceManager {
    async fn resolve(&self, _name: &str) -> Option<Value> {
        None
    }
}
