//! Polling token feed: owned state, derived table projection, and the
//! refresh/countdown timer task.
//!
//! `TokenFeed` is a synchronous state machine with no timer coupling, so
//! every transition is testable without a runtime. `FeedTask` owns the
//! timers: one fetch cycle per refresh interval, one countdown tick per
//! second, both cancelled on stop (or drop).

use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::format::parse_numeric;
use crate::token_list::{FeedError, Token, TokenListSource, DEFAULT_TOKEN_LIST_URL};

pub const PAGE_SIZE: usize = 10;
pub const COUNTDOWN_SECONDS: u8 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SortKey {
    Name,
    Price,
    PercentChange24h,
    MulPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            key: SortKey::MulPoint,
            direction: SortDirection::Descending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub endpoint_url: String,
    pub refresh_interval_ms: u64,
    pub tick_interval_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_TOKEN_LIST_URL.to_string(),
            refresh_interval_ms: 30_000,
            tick_interval_ms: 1_000,
            request_timeout_ms: 10_000,
        }
    }
}

/// The filtered, sorted, paginated projection. Recomputed on every call,
/// never cached across mutations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedPage {
    pub tokens: Vec<Token>,
    pub current_page: usize,
    pub total_pages: usize,
    pub filtered_count: usize,
}

/// Feed state machine. Raw tokens survive failed refreshes; the countdown
/// is re-armed whenever a cycle settles, success or not.
#[derive(Debug)]
pub struct TokenFeed {
    raw_tokens: Vec<Token>,
    query: String,
    sort: SortConfig,
    current_page: usize,
    countdown_seconds: u8,
    loading: bool,
    refreshing: bool,
    last_error: Option<String>,
    last_success_at: Option<DateTime<Utc>>,
    first_cycle_done: bool,
}

impl TokenFeed {
    pub fn new() -> Self {
        Self {
            raw_tokens: Vec::new(),
            query: String::new(),
            sort: SortConfig::default(),
            current_page: 1,
            countdown_seconds: COUNTDOWN_SECONDS,
            loading: true,
            refreshing: false,
            last_error: None,
            last_success_at: None,
            first_cycle_done: false,
        }
    }

    /// Enter a fetch cycle: the very first cycle keeps the initial-load
    /// flag, later cycles flag a refresh instead. A pending error from the
    /// previous cycle is cleared either way.
    pub fn begin_cycle(&mut self) {
        if self.first_cycle_done {
            self.refreshing = true;
        } else {
            self.loading = true;
        }
        self.last_error = None;
    }

    /// Settle a fetch cycle. Success replaces the raw list; failure keeps
    /// the stale list visible and records a human-readable message. Both
    /// paths clear the busy flags and re-arm the countdown.
    pub fn complete_cycle(&mut self, outcome: Result<Vec<Token>, FeedError>) {
        match outcome {
            Ok(tokens) => {
                info!(event = "feed.cycle.ok", token_count = tokens.len());
                self.raw_tokens = tokens;
                self.last_success_at = Some(Utc::now());
            }
            Err(err) => {
                warn!(event = "feed.cycle.error", error = %err);
                self.last_error = Some(err.to_string());
            }
        }

        self.loading = false;
        self.refreshing = false;
        self.first_cycle_done = true;
        self.countdown_seconds = COUNTDOWN_SECONDS;
    }

    /// One second of countdown. Pauses at zero; `complete_cycle` re-arms.
    pub fn tick_countdown(&mut self) {
        self.countdown_seconds = self.countdown_seconds.saturating_sub(1);
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.current_page = 1;
    }

    /// Repeating the active key flips the direction; a new key starts
    /// ascending. Either way the view snaps back to page 1.
    pub fn request_sort(&mut self, key: SortKey) {
        if self.sort.key == key {
            self.sort.direction = match self.sort.direction {
                SortDirection::Ascending => SortDirection::Descending,
                SortDirection::Descending => SortDirection::Ascending,
            };
        } else {
            self.sort = SortConfig {
                key,
                direction: SortDirection::Ascending,
            };
        }
        self.current_page = 1;
    }

    pub fn next_page(&mut self) {
        if self.current_page < self.total_pages() {
            self.current_page += 1;
        }
    }

    pub fn prev_page(&mut self) {
        if self.current_page > 1 {
            self.current_page -= 1;
        }
    }

    /// Derived view over the current state: filter, stable sort, paginate.
    /// A page beyond the filtered bounds yields an empty slice (the page
    /// cursor is only reset by query/sort changes, never by shrinkage).
    pub fn page(&self) -> FeedPage {
        let filtered = self.filtered_sorted();
        let filtered_count = filtered.len();
        let start = (self.current_page - 1) * PAGE_SIZE;

        let tokens = if start < filtered_count {
            filtered[start..(start + PAGE_SIZE).min(filtered_count)]
                .iter()
                .map(|token| (*token).clone())
                .collect()
        } else {
            Vec::new()
        };

        FeedPage {
            tokens,
            current_page: self.current_page,
            total_pages: filtered_count.div_ceil(PAGE_SIZE),
            filtered_count,
        }
    }

    pub fn token_count(&self) -> usize {
        self.raw_tokens.len()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn sort(&self) -> SortConfig {
        self.sort
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn countdown_seconds(&self) -> u8 {
        self.countdown_seconds
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_success_at(&self) -> Option<DateTime<Utc>> {
        self.last_success_at
    }

    fn total_pages(&self) -> usize {
        self.filtered().count().div_ceil(PAGE_SIZE)
    }

    fn filtered(&self) -> impl Iterator<Item = &Token> {
        let needle = self.query.to_lowercase();
        self.raw_tokens.iter().filter(move |token| {
            needle.is_empty()
                || token.name.to_lowercase().contains(&needle)
                || token.symbol.to_lowercase().contains(&needle)
        })
    }

    fn filtered_sorted(&self) -> Vec<&Token> {
        let mut rows: Vec<&Token> = self.filtered().collect();
        let key = self.sort.key;
        let direction = self.sort.direction;

        // Vec::sort_by is stable, so ties keep their filtered order in
        // both directions.
        rows.sort_by(|a, b| {
            let ordering = compare_sort_values(sort_value(a, key), sort_value(b, key));
            match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });

        rows
    }
}

impl Default for TokenFeed {
    fn default() -> Self {
        Self::new()
    }
}

fn sort_value(token: &Token, key: SortKey) -> &str {
    match key {
        SortKey::Name => &token.name,
        SortKey::Price => &token.price,
        SortKey::PercentChange24h => &token.percent_change_24h,
        SortKey::MulPoint => &token.mul_point,
    }
}

/// Numeric comparison when both wire values parse as numbers, otherwise
/// lexicographic; a numeric value sorts before a non-numeric one.
fn compare_sort_values(a: &str, b: &str) -> Ordering {
    match (parse_numeric(a), parse_numeric(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Handle for the spawned refresh/countdown task. `stop` (or drop) cancels
/// both timers; the shared state is never touched again afterwards.
pub struct FeedTask {
    feed: Arc<RwLock<TokenFeed>>,
    stopped: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl FeedTask {
    pub fn spawn(source: Arc<dyn TokenListSource>, config: FeedConfig) -> Self {
        let feed = Arc::new(RwLock::new(TokenFeed::new()));
        let stopped = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(run_feed_loop(
            Arc::clone(&feed),
            source,
            config,
            Arc::clone(&stopped),
        ));

        Self {
            feed,
            stopped,
            handle,
        }
    }

    pub fn with_feed<R>(&self, f: impl FnOnce(&TokenFeed) -> R) -> R {
        f(&read_feed(&self.feed))
    }

    pub fn with_feed_mut<R>(&self, f: impl FnOnce(&mut TokenFeed) -> R) -> R {
        f(&mut write_feed(&self.feed))
    }

    pub fn stop(&self) {
        self.stopped.store(true, AtomicOrdering::SeqCst);
        self.handle.abort();
    }
}

impl Drop for FeedTask {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_feed_loop(
    feed: Arc<RwLock<TokenFeed>>,
    source: Arc<dyn TokenListSource>,
    config: FeedConfig,
    stopped: Arc<AtomicBool>,
) {
    let refresh_interval = Duration::from_millis(config.refresh_interval_ms.max(1));
    let tick_interval = Duration::from_millis(config.tick_interval_ms.max(1));

    loop {
        if stopped.load(AtomicOrdering::SeqCst) {
            return;
        }
        write_feed(&feed).begin_cycle();

        // The cycle awaits its own fetch, so overlapping in-flight
        // requests cannot occur.
        let outcome = source.fetch_tokens().await;
        if stopped.load(AtomicOrdering::SeqCst) {
            return;
        }
        write_feed(&feed).complete_cycle(outcome);

        let settled_at = tokio::time::Instant::now();
        while settled_at.elapsed() < refresh_interval {
            tokio::time::sleep(tick_interval).await;
            if stopped.load(AtomicOrdering::SeqCst) {
                return;
            }
            write_feed(&feed).tick_countdown();
        }
    }
}

fn read_feed(feed: &Arc<RwLock<TokenFeed>>) -> RwLockReadGuard<'_, TokenFeed> {
    feed.read().expect("feed lock should not be poisoned")
}

fn write_feed(feed: &Arc<RwLock<TokenFeed>>) -> RwLockWriteGuard<'_, TokenFeed> {
    feed.write().expect("feed lock should not be poisoned")
}
