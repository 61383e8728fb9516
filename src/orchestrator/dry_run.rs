use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::orchestrator::DataRefresher;

/// Logs what would be refreshed without calling any API.
#[derive(Debug, Default)]
pub struct DryRunRefresher {
    symbols: Vec<String>,
}

impl DryRunRefresher {
    pub fn new(symbols: Vec<String>) -> Self {
        Self {
            symbols: symbols.into_iter().map(|s| s.to_uppercase()).collect(),
        }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }
}

#[async_trait]
impl DataRefresher for DryRunRefresher {
    async fn refresh_prices(&self) -> Result<()> {
        info!(symbols = ?self.symbols, "refreshing prices");

        Ok(())
    }

    async fn refresh_news(&self) -> Result<()> {
        info!(symbols = ?self.symbols, "refreshing news");

        Ok(())
    }
}
