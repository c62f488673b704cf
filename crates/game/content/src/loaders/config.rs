//! Ledger configuration loader.

use std::path::Path;

use game_core::LedgerConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for ledger configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Missing keys fall back to [`LedgerConfig::default`]. A quick-bar size
    /// above [`LedgerConfig::MAX_QUICK_BAR_SLOTS`] is rejected.
    pub fn load(path: &Path) -> LoadResult<LedgerConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<LedgerConfig> {
        let config: LedgerConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        anyhow::ensure!(
            config.quick_bar_slots <= LedgerConfig::MAX_QUICK_BAR_SLOTS,
            "quick_bar_slots must be at most {}, got {}",
            LedgerConfig::MAX_QUICK_BAR_SLOTS,
            config.quick_bar_slots
        );
        tracing::debug!(?config, "ledger config loaded");
        Ok(config)
    }
}
