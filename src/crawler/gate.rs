use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use tracing::trace;

use super::pool::{Job, WorkerPool};

/// Per-host admission state: running download count plus deferred jobs.
#[derive(Default)]
struct HostState {
    active: usize,
    pending: VecDeque<Job>,
}

/// Limits simultaneous downloads per host, queueing the overflow.
///
/// Each host owns an independent critical section, so traffic to
/// different hosts never contends on the same lock. Entries are created
/// lazily on first sight of a host and the whole gate is created fresh
/// for every crawl call.
pub struct HostGate {
    max_per_host: usize,
    pool: Arc<WorkerPool>,
    hosts: Mutex<HashMap<String, Arc<Mutex<HostState>>>>,
}

impl HostGate {
    /// `max_per_host` has already been validated as positive.
    pub fn new(max_per_host: usize, pool: Arc<WorkerPool>) -> Self {
        debug_assert!(max_per_host >= 1);
        Self {
            max_per_host,
            pool,
            hosts: Mutex::new(HashMap::new()),
        }
    }

    fn state_for(&self, host: &str) -> Arc<Mutex<HostState>> {
        let mut hosts = self.hosts.lock().unwrap();
        Arc::clone(hosts.entry(host.to_string()).or_default())
    }

    /// Dispatch `job` to the download pool now if the host has a free
    /// slot, otherwise park it behind the jobs already waiting.
    pub fn submit(&self, host: &str, job: Job) {
        let state = self.state_for(host);
        let mut state = state.lock().unwrap();
        if state.active < self.max_per_host {
            state.active += 1;
            self.pool.submit(job);
        } else {
            trace!(host, "host at capacity, queueing");
            state.pending.push_back(job);
        }
    }

    /// Give a slot back after a download ends: hand it straight to the
    /// oldest queued job for this host, or lower the active count when
    /// nothing is waiting.
    pub fn release(&self, host: &str) {
        let state = self.state_for(host);
        let mut state = state.lock().unwrap();
        match state.pending.pop_front() {
            Some(job) => self.pool.submit(job),
            None => state.active -= 1,
        }
    }
}
