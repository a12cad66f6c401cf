//! The crawl engine: wires the host gate, the two worker pools, the
//! visited set and the completion tracker into the recursive,
//! depth-limited crawl.

pub mod gate;
pub mod pool;
pub mod tracker;
pub mod visited;

pub use gate::HostGate;
pub use pool::WorkerPool;
pub use tracker::CompletionTracker;
pub use visited::VisitedSet;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing::{debug, info, warn};
use url::Url;

use crate::config::CrawlerConfig;
use crate::error::{Closed, ConfigError, CrawlError, HostParseError};
use crate::fetch::Fetcher;

/// Outcome of one crawl call.
///
/// Every URL that was attempted lands in exactly one of the two buckets:
/// the key sets of `downloaded` and `errors` are disjoint.
#[derive(Debug, Default)]
pub struct CrawlResult {
    pub downloaded: HashSet<String>,
    pub errors: HashMap<String, CrawlError>,
}

/// Depth-limited concurrent crawler with per-host admission control.
///
/// Downloads run on one fixed thread pool, link extraction on another,
/// so a slow host cannot starve the CPU-bound fan-out work and a page
/// with thousands of links cannot monopolize the download slots.
pub struct Crawler {
    inner: Arc<Inner>,
}

struct Inner {
    fetcher: Arc<dyn Fetcher>,
    download_pool: Arc<WorkerPool>,
    extractor_pool: Arc<WorkerPool>,
    max_per_host: usize,
    closed: AtomicBool,
}

/// State shared by every task of a single crawl call; discarded when the
/// call returns.
struct CrawlState {
    visited: VisitedSet,
    errors: Mutex<HashMap<String, CrawlError>>,
    tracker: CompletionTracker,
}

impl CrawlState {
    fn new() -> Self {
        Self {
            visited: VisitedSet::new(),
            errors: Mutex::new(HashMap::new()),
            tracker: CompletionTracker::new(),
        }
    }

    fn record_error(&self, url: &str, error: CrawlError) {
        self.errors.lock().unwrap().insert(url.to_string(), error);
    }
}

/// Runs the release/finish bookkeeping even when the job body panics;
/// completion detection must not depend on well-behaved collaborators.
struct TaskGuard {
    state: Arc<CrawlState>,
    slot: Option<(Arc<HostGate>, String)>,
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        if let Some((gate, host)) = self.slot.take() {
            gate.release(&host);
        }
        self.state.tracker.finish();
    }
}

impl Crawler {
    /// Build a crawler over `fetcher`. Pool sizes and the per-host cap
    /// come from `config` and are validated before any thread spawns.
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &CrawlerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(Inner {
                fetcher,
                download_pool: Arc::new(WorkerPool::new("download", config.downloaders)),
                extractor_pool: Arc::new(WorkerPool::new("extract", config.extractors)),
                max_per_host: config.per_host,
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Crawl outward from `seed`, following links for at most `depth`
    /// hops, and block until every transitively discovered,
    /// depth-permitted URL has resolved to success or failure.
    ///
    /// `depth` counts remaining hops: 0 attempts nothing, 1 fetches only
    /// the seed page.
    pub fn run(&self, seed: &str, depth: usize) -> Result<CrawlResult, Closed> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(Closed);
        }

        let started = Instant::now();
        let state = Arc::new(CrawlState::new());
        let gate = Arc::new(HostGate::new(
            self.inner.max_per_host,
            Arc::clone(&self.inner.download_pool),
        ));

        self.inner.schedule(&state, &gate, seed.to_string(), depth);
        state.tracker.await_zero();

        let errors = std::mem::take(&mut *state.errors.lock().unwrap());
        let mut downloaded = state.visited.snapshot();
        downloaded.retain(|url| !errors.contains_key(url));

        info!(
            downloaded = downloaded.len(),
            failed = errors.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "crawl finished"
        );
        Ok(CrawlResult { downloaded, errors })
    }

    /// Tear both worker pools down. Queued jobs are discarded and a
    /// crawl still in flight is abandoned rather than completed; later
    /// `run` calls fail with [`Closed`].
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.download_pool.shutdown();
        self.inner.extractor_pool.shutdown();
    }
}

impl Drop for Crawler {
    fn drop(&mut self) {
        self.close();
    }
}

impl Inner {
    /// One step of the recursive crawl: claim the URL, derive its host,
    /// and hand a fetch job to the gate. Fan-out always goes back
    /// through the pools, never down the native call stack, so crawl
    /// depth is not bounded by stack size.
    fn schedule(
        self: &Arc<Self>,
        state: &Arc<CrawlState>,
        gate: &Arc<HostGate>,
        url: String,
        depth: usize,
    ) {
        if depth < 1 {
            return;
        }
        if !state.visited.try_visit(&url) {
            // First claimant wins; the duplicate is not an error.
            return;
        }

        let host = match host_of(&url) {
            Ok(host) => host,
            Err(e) => {
                warn!(%url, "cannot derive host: {}", e);
                state.record_error(&url, CrawlError::HostParse(e));
                return;
            }
        };

        state.tracker.register();
        let inner = Arc::clone(self);
        let state = Arc::clone(state);
        let gate_job = Arc::clone(gate);
        let job_host = host.clone();
        gate.submit(
            &host,
            Box::new(move || inner.fetch_one(state, gate_job, url, job_host, depth)),
        );
    }

    /// Runs on the download pool. The guard releases the host slot and
    /// retires the tracker registration no matter how this exits.
    fn fetch_one(
        self: &Arc<Self>,
        state: Arc<CrawlState>,
        gate: Arc<HostGate>,
        url: String,
        host: String,
        depth: usize,
    ) {
        let _guard = TaskGuard {
            state: Arc::clone(&state),
            slot: Some((Arc::clone(&gate), host)),
        };

        match self.fetcher.fetch(&url) {
            Ok(page) => {
                debug!(%url, "downloaded");
                if depth > 1 {
                    // Register before dispatch, like every task.
                    state.tracker.register();
                    let inner = Arc::clone(self);
                    self.extractor_pool.submit(Box::new(move || {
                        let _guard = TaskGuard {
                            state: Arc::clone(&state),
                            slot: None,
                        };
                        for link in page.links() {
                            inner.schedule(&state, &gate, link, depth - 1);
                        }
                    }));
                }
            }
            Err(e) => {
                debug!(%url, "fetch failed: {}", e);
                state.record_error(&url, CrawlError::Transport(e));
            }
        }
    }
}

/// Host key for admission control: the URL's authority, lowercased.
fn host_of(url: &str) -> Result<String, HostParseError> {
    let parsed = Url::parse(url)?;
    match parsed.host_str() {
        Some(host) => Ok(host.to_ascii_lowercase()),
        None => Err(HostParseError::MissingHost),
    }
}
