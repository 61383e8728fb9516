pub mod dry_run;
pub mod update_orchestrator;

use anyhow::Result;
use async_trait::async_trait;

/// Data fetches driven by the session cadence.
#[async_trait]
pub trait DataRefresher: Send + Sync {
    async fn refresh_prices(&self) -> Result<()>;
    async fn refresh_news(&self) -> Result<()>;
}
