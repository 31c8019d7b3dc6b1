//! Item page parser
//!
//! This module turns a fetched item page into structured records:
//! - at most one root record, from the page's title cell and the metadata
//!   row beneath it (author, score, relative age, comment count), plus any
//!   selftext rows that follow
//! - zero or more comment records, one per comment cell found anywhere on
//!   the page
//!
//! Every structural block parses to its own outcome; a malformed block never
//! aborts the rest of the page. It also extracts the full set of item
//! identifiers referenced by a page, which drives frontier and recursive
//! discovery.

use crate::storage::ArchivedItem;
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors for a single structural block
///
/// These never escape the page: the caller logs the failed block and moves
/// on to the next one.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("structural block has no metadata")]
    MissingMetadata,

    #[error("metadata carries no author link")]
    MissingAuthor,

    #[error("metadata carries no item permalink")]
    MissingPermalink,

    #[error("comment block has no text span")]
    MissingBody,

    #[error("unrecognized age unit '{0}'")]
    UnknownAgeUnit(String),

    #[error("numeric field out of range: {0}")]
    InvalidNumber(String),
}

/// Outcome of parsing one structural block
pub type BlockOutcome = Result<ArchivedItem, ParseError>;

/// Maximum ancestor hops when resolving a comment's enclosing table
const MAX_ANCESTOR_DEPTH: usize = 24;

struct Selectors {
    title_cell: Selector,
    comment_cell: Selector,
    comment_head: Selector,
    comment_text: Selector,
    row: Selector,
    anchor: Selector,
}

struct Patterns {
    item_href: Regex,
    score: Regex,
    age: Regex,
    comments: Regex,
    cell_tags: Regex,
}

/// Selectors and text patterns for the documented page layout
struct ParseContext {
    sel: Selectors,
    pat: Patterns,
}

impl ParseContext {
    fn new() -> Self {
        // All patterns are static and known-valid
        Self {
            sel: Selectors {
                title_cell: Selector::parse("td.title").expect("valid selector"),
                comment_cell: Selector::parse("td.default").expect("valid selector"),
                comment_head: Selector::parse("span.comhead").expect("valid selector"),
                comment_text: Selector::parse("span.comment").expect("valid selector"),
                row: Selector::parse("tr").expect("valid selector"),
                anchor: Selector::parse("a[href]").expect("valid selector"),
            },
            pat: Patterns {
                item_href: Regex::new(r"item\?id=(\d+)").expect("valid pattern"),
                score: Regex::new(r"(\d+) points?").expect("valid pattern"),
                age: Regex::new(r"(\d+) ([a-z]+?)s? ago").expect("valid pattern"),
                comments: Regex::new(r"(\d+) comments?").expect("valid pattern"),
                cell_tags: Regex::new(r"</?t[dr][^>]*>").expect("valid pattern"),
            },
        }
    }
}

/// Extracts the deduplicated set of item identifiers referenced on a page
pub fn extract_item_ids(doc: &Html) -> BTreeSet<u64> {
    let ctx = ParseContext::new();
    doc.select(&ctx.sel.anchor)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| ctx.pat.item_href.captures(href))
        .filter_map(|caps| caps[1].parse().ok())
        .collect()
}

/// Parses an item page into per-block outcomes
///
/// `caller_parent` is the identifier the page was fetched for; blocks that
/// show no explicit parent link inherit it. `now` anchors relative-age
/// conversion so results are deterministic under a fixed clock.
pub fn parse_item_page(doc: &Html, caller_parent: u64, now: DateTime<Utc>) -> Vec<BlockOutcome> {
    let ctx = ParseContext::new();
    let mut outcomes = Vec::new();

    // At most one root record per page
    if let Some(title_cell) = doc.select(&ctx.sel.title_cell).next() {
        outcomes.push(parse_title_block(&ctx, title_cell, caller_parent, now));
    }

    for cell in doc.select(&ctx.sel.comment_cell) {
        outcomes.push(parse_comment_block(&ctx, cell, caller_parent, now));
    }

    outcomes
}

/// Fields shared by root and comment metadata blocks
struct MetaFields {
    id: u64,
    parent: u64,
    author: String,
    score: Option<i64>,
    comment_count: Option<i64>,
    added_at: Option<DateTime<Utc>>,
}

/// Parses the root story block: title cell, adjacent metadata row, and any
/// selftext rows after it
fn parse_title_block(
    ctx: &ParseContext,
    title_cell: ElementRef,
    caller_parent: u64,
    now: DateTime<Utc>,
) -> BlockOutcome {
    let table = enclosing_table(title_cell).ok_or(ParseError::MissingMetadata)?;

    let mut rows = table.select(&ctx.sel.row);
    let meta = rows.nth(1).ok_or(ParseError::MissingMetadata)?;
    let fields = populate_from_meta(ctx, meta, caller_parent, now)?;

    let title = title_cell.text().collect::<String>().trim().to_string();
    let url = title_cell
        .select(&ctx.sel.anchor)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string);

    // Remaining rows hold the selftext, if any; drop the cell markup the
    // same way the row HTML is wrapped in it
    let fragments: String = rows
        .filter(|row| !row.text().collect::<String>().trim().is_empty())
        .map(|row| row.html())
        .collect();
    let stripped = ctx.pat.cell_tags.replace_all(&fragments, "");
    let body = match stripped.trim() {
        "" => None,
        text => Some(text.to_string()),
    };

    Ok(ArchivedItem {
        id: fields.id,
        parent: fields.parent,
        title: Some(title),
        url,
        author: Some(fields.author),
        body,
        score: fields.score,
        comment_count: fields.comment_count,
        added_at: fields.added_at,
        retrieved_at: now,
    })
}

/// Parses one comment cell
fn parse_comment_block(
    ctx: &ParseContext,
    cell: ElementRef,
    caller_parent: u64,
    now: DateTime<Utc>,
) -> BlockOutcome {
    let meta = cell
        .select(&ctx.sel.comment_head)
        .next()
        .ok_or(ParseError::MissingMetadata)?;

    // Walk up to the nearest enclosing table; a permalink there names the
    // parent, otherwise the caller's context is inherited. An explicit
    // "parent" link in the metadata still wins inside populate_from_meta.
    let fallback_parent = enclosing_table(cell)
        .and_then(|table| structural_permalink(ctx, table))
        .unwrap_or(caller_parent);

    let fields = populate_from_meta(ctx, meta, fallback_parent, now)?;

    let text_span = cell
        .select(&ctx.sel.comment_text)
        .next()
        .ok_or(ParseError::MissingBody)?;
    let body = normalize_comment_body(&text_span.inner_html());

    Ok(ArchivedItem {
        id: fields.id,
        parent: fields.parent,
        title: None,
        url: None,
        author: Some(fields.author),
        body: Some(body),
        score: fields.score,
        comment_count: fields.comment_count,
        added_at: fields.added_at,
        retrieved_at: now,
    })
}

/// Extracts the shared metadata fields from a metadata block
fn populate_from_meta(
    ctx: &ParseContext,
    meta: ElementRef,
    fallback_parent: u64,
    now: DateTime<Utc>,
) -> Result<MetaFields, ParseError> {
    let meta_text: String = meta.text().collect();

    let mut author = None;
    let mut own_id = None;
    let mut parent = None;

    for anchor in meta.select(&ctx.sel.anchor) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };

        if author.is_none() {
            if let Some(handle) = href.strip_prefix("user?id=") {
                author = Some(handle.to_string());
            }
        }

        if let Some(caps) = ctx.pat.item_href.captures(href) {
            let id: u64 = caps[1]
                .parse()
                .map_err(|_| ParseError::InvalidNumber(caps[1].to_string()))?;
            let text: String = anchor.text().collect();
            if text.trim() == "parent" {
                parent.get_or_insert(id);
            } else {
                own_id.get_or_insert(id);
            }
        }
    }

    let author = author.ok_or(ParseError::MissingAuthor)?;
    let id = own_id.ok_or(ParseError::MissingPermalink)?;

    let score = ctx
        .pat
        .score
        .captures(&meta_text)
        .and_then(|caps| caps[1].parse().ok());
    let comment_count = ctx
        .pat
        .comments
        .captures(&meta_text)
        .and_then(|caps| caps[1].parse().ok());
    let added_at = parse_relative_age(ctx, &meta_text, now)?;

    Ok(MetaFields {
        id,
        parent: parent.unwrap_or(fallback_parent),
        author,
        score,
        comment_count,
        added_at,
    })
}

/// Converts "`<n> minute|hour|day(s) ago`" text to an absolute timestamp
///
/// No match leaves the field unset; a matching phrase with an unknown unit
/// is fatal for the block.
fn parse_relative_age(
    ctx: &ParseContext,
    text: &str,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, ParseError> {
    let Some(caps) = ctx.pat.age.captures(text) else {
        return Ok(None);
    };

    let quantity: i64 = caps[1]
        .parse()
        .map_err(|_| ParseError::InvalidNumber(caps[1].to_string()))?;

    let delta = match &caps[2] {
        "minute" => Duration::minutes(quantity),
        "hour" => Duration::hours(quantity),
        "day" => Duration::days(quantity),
        unit => return Err(ParseError::UnknownAgeUnit(unit.to_string())),
    };

    Ok(Some(now - delta))
}

/// Finds the nearest enclosing table element, bounded so a pathological
/// page cannot send the walk arbitrarily far
fn enclosing_table(el: ElementRef) -> Option<ElementRef> {
    el.ancestors()
        .take(MAX_ANCESTOR_DEPTH)
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "table")
}

/// Identifier of the permalink anchor carried by a structural block, if any
fn structural_permalink(ctx: &ParseContext, block: ElementRef) -> Option<u64> {
    block
        .select(&ctx.sel.anchor)
        .find(|a| a.text().collect::<String>().trim() == "link")
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| ctx.pat.item_href.captures(href))
        .and_then(|caps| caps[1].parse().ok())
}

/// Normalizes a comment body fragment, dropping the redundant color
/// styling the site wraps comment text in
fn normalize_comment_body(html: &str) -> String {
    html.trim()
        .replace("<font color=\"#000000\">", "")
        .replace("</font>", "")
}
