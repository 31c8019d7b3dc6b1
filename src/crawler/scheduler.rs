//! Crawl step scheduler
//!
//! The archiver is driven by an external recurring trigger that grants one
//! step per invocation. The scheduler walks a fixed cycle of steps, with
//! node processing repeated several times per cycle so the queue drains
//! faster than it grows.
//!
//! The cursor is advanced and persisted before the step runs and is never
//! rolled back, so a step that keeps failing is skipped over on the next
//! cycle instead of wedging the whole crawl.

use crate::crawler::fetcher::Fetcher;
use crate::crawler::frontier::{discover_listing, Listing};
use crate::crawler::gap::scan_gap;
use crate::crawler::processor::process_next;
use crate::storage::Storage;
use crate::Result;
use chrono::Utc;

/// One operation in the step cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlStep {
    /// Discover identifiers from the front-page listing
    FrontPage,
    /// Discover identifiers from the newest-items listing
    Newest,
    /// Advance the sequential gap scan by one identifier
    GapScan,
    /// Fetch and parse the oldest pending item
    ProcessNode,
}

/// The fixed step cycle, biased toward draining the work queue
pub const STEP_CYCLE: [CrawlStep; 10] = [
    CrawlStep::FrontPage,
    CrawlStep::Newest,
    CrawlStep::GapScan,
    CrawlStep::ProcessNode,
    CrawlStep::ProcessNode,
    CrawlStep::ProcessNode,
    CrawlStep::ProcessNode,
    CrawlStep::ProcessNode,
    CrawlStep::ProcessNode,
    CrawlStep::ProcessNode,
];

/// Runs the next step in the cycle
///
/// Returns the step that was selected. Errors raised by the step itself
/// are caught and logged here and never propagate; the returned `Err`
/// covers only scheduler-state bookkeeping, which the trigger also treats
/// as non-fatal.
pub async fn run_next<S: Storage>(storage: &mut S, fetcher: &Fetcher) -> Result<CrawlStep> {
    let mut state = storage.scheduler_state()?;
    let step = STEP_CYCLE[state.cursor % STEP_CYCLE.len()];
    state.cursor = (state.cursor + 1) % STEP_CYCLE.len();
    storage.put_scheduler_state(&state)?;

    tracing::debug!("running step {:?} (next cursor {})", step, state.cursor);

    let outcome = match step {
        CrawlStep::FrontPage => discover_listing(storage, fetcher, Listing::FrontPage).await,
        CrawlStep::Newest => discover_listing(storage, fetcher, Listing::Newest).await,
        CrawlStep::GapScan => scan_gap(storage),
        CrawlStep::ProcessNode => process_next(storage, fetcher, Utc::now()).await,
    };

    if let Err(e) = outcome {
        tracing::error!("step {:?} failed: {}", step, e);
    }

    Ok(step)
}
