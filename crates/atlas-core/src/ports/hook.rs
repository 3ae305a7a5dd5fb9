//! Post-refresh hook

use crate::Result;
use async_trait::async_trait;

/// Called synchronously after a refresh batch commits, before the
/// response is produced. The production hook renders the summary
/// image; tests install [`NoopHook`] to disable the side effect.
#[async_trait]
pub trait RefreshHook: Send + Sync {
    async fn after_refresh(&self) -> Result<()>;
}

/// Hook that does nothing.
pub struct NoopHook;

#[async_trait]
impl RefreshHook for NoopHook {
    async fn after_refresh(&self) -> Result<()> {
        Ok(())
    }
}
