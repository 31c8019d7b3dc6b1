//! Gap scanning
//!
//! The frontier only finds identifiers that listing pages happen to
//! reference. The gap scanner sweeps the identifier range sequentially so
//! orphaned or delisted items are still reached: every identifier in
//! `[1, upper_bound]` is eventually enqueued even if no page ever links to
//! it.

use crate::storage::Storage;
use crate::Result;

/// Advances the scan cursor to the next unarchived identifier
///
/// Identifiers that already have an archived record are skipped within the
/// same invocation; the first absent one is enqueued and the cursor stops
/// on it. When the cursor reaches the upper bound there is nothing to do
/// and nothing is persisted. The cursor move and the enqueue commit
/// together.
pub fn scan_gap<S: Storage>(storage: &mut S) -> Result<()> {
    let mut coverage = storage.coverage_state()?;

    loop {
        coverage.low_bound += 1;
        if coverage.low_bound >= coverage.upper_bound {
            tracing::debug!(
                "scan cursor caught up with upper bound {}",
                coverage.upper_bound
            );
            return Ok(());
        }
        if !storage.has_item(coverage.low_bound)? {
            break;
        }
    }

    let id = coverage.low_bound;
    storage.commit_scan_advance(&coverage, id)?;
    tracing::info!("gap scan enqueued {}", id);
    Ok(())
}
