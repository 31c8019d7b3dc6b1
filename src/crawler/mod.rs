//! Crawler module for fetching and processing forum pages
//!
//! This module contains the core crawl logic, including:
//! - HTTP fetching with the fixed client identifier
//! - Item page parsing into archived records
//! - Frontier discovery and gap scanning
//! - The cyclic one-step-per-invocation scheduler

mod fetcher;
mod frontier;
mod gap;
mod parser;
mod processor;
mod scheduler;

pub use fetcher::Fetcher;
pub use frontier::{discover_listing, Listing};
pub use gap::scan_gap;
pub use parser::{extract_item_ids, parse_item_page, BlockOutcome, ParseError};
pub use processor::process_next;
pub use scheduler::{run_next, CrawlStep, STEP_CYCLE};
