//! `statik reset`: forget everything published with the selected engine.

use anyhow::{Context, Result};

use crate::config::StatikConfig;
use crate::log;

/// Replace the ledger with an empty one. The next publish uploads everything.
pub fn reset(config: &StatikConfig) -> Result<()> {
    let ledger = config.ledger()?;
    let previous = ledger
        .load()
        .with_context(|| format!("failed to read {}", ledger.path().display()))?
        .into_set()
        .len();

    ledger.clear()?;
    log!("reset"; "cleared {} ({} entries)", ledger.path().display(), previous);
    Ok(())
}
