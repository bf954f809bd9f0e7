//! Balance configuration loading.

use std::{fs, path::Path};

use anyhow::{ensure, Context, Result};
use merge_farm_core::BalanceConfig;

/// Largest grid the simulation will allocate.
const MAX_GRID_SLOTS: u64 = 1 << 16;

/// Loads balance values from an optional TOML file.
///
/// Keys missing from the file keep their defaults.
pub(crate) fn load_balance(path: Option<&Path>) -> Result<BalanceConfig> {
    let Some(path) = path else {
        return Ok(BalanceConfig::default());
    };

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read balance config at {}", path.display()))?;
    parse_balance(&contents)
        .with_context(|| format!("invalid balance config at {}", path.display()))
}

fn parse_balance(contents: &str) -> Result<BalanceConfig> {
    let config: BalanceConfig =
        toml::from_str(contents).context("failed to parse balance config toml contents")?;
    ensure!(
        config.grid_columns > 0 && config.grid_rows > 0,
        "grid must have at least one slot"
    );
    let slots = u64::from(config.grid_columns) * u64::from(config.grid_rows);
    ensure!(
        slots <= MAX_GRID_SLOTS,
        "grid of {}x{} exceeds the limit of {MAX_GRID_SLOTS} slots",
        config.grid_columns,
        config.grid_rows
    );
    ensure!(config.tier_count > 0, "tier ladder must have at least one tier");
    Ok(config)
}
