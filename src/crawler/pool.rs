use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Sender};
use tracing::{debug, warn};

/// Unit of work accepted by a pool.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size pool of OS worker threads draining a FIFO job queue.
///
/// Shutdown stops the intake and discards queued-but-unstarted jobs; a
/// job already running finishes on its own. A panic inside a job is
/// caught at the worker loop so one misbehaving job cannot take a worker
/// down with it.
pub struct WorkerPool {
    sender: Mutex<Option<Sender<Job>>>,
    draining: Arc<AtomicBool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Spawn `size` named worker threads.
    pub fn new(name: &str, size: usize) -> Self {
        let (sender, receiver) = unbounded::<Job>();
        let draining = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(size);
        for i in 0..size {
            let receiver = receiver.clone();
            let draining = Arc::clone(&draining);
            let worker_name = format!("{}-{}", name, i);

            let handle = thread::Builder::new()
                .name(worker_name.clone())
                .spawn(move || {
                    while let Ok(job) = receiver.recv() {
                        if draining.load(Ordering::Acquire) {
                            // Queued before shutdown but never started;
                            // drop it unrun.
                            continue;
                        }
                        if catch_unwind(AssertUnwindSafe(job)).is_err() {
                            warn!(worker = %worker_name, "job panicked; worker continues");
                        }
                    }
                })
                .expect("failed to spawn worker thread");

            workers.push(handle);
        }

        Self {
            sender: Mutex::new(Some(sender)),
            draining,
            workers: Mutex::new(workers),
        }
    }

    /// Queue a job. Silently dropped once the pool is shut down.
    pub fn submit(&self, job: Job) {
        if let Some(sender) = self.sender.lock().unwrap().as_ref() {
            // Send only fails when every worker is gone, i.e. mid-teardown.
            let _ = sender.send(job);
        }
    }

    /// Stop intake, discard queued jobs, and join the workers.
    ///
    /// Idempotent; also invoked on drop.
    pub fn shutdown(&self) {
        self.draining.store(true, Ordering::Release);
        drop(self.sender.lock().unwrap().take());

        let workers = std::mem::take(&mut *self.workers.lock().unwrap());
        if !workers.is_empty() {
            debug!("joining {} worker threads", workers.len());
        }
        for handle in workers {
            let _ = handle.join();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::tracker::CompletionTracker;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn runs_submitted_jobs() {
        // Shutdown discards queued jobs, so wait for completion through
        // the tracker instead of using shutdown as a drain barrier.
        let pool = WorkerPool::new("test", 4);
        let tracker = Arc::new(CompletionTracker::new());
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..32 {
            let tracker_job = Arc::clone(&tracker);
            let counter = Arc::clone(&counter);
            tracker.register();
            pool.submit(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                tracker_job.finish();
            }));
        }

        tracker.await_zero();
        assert_eq!(counter.load(Ordering::SeqCst), 32);
    }

    #[test]
    fn concurrency_is_capped_by_pool_size() {
        let pool = WorkerPool::new("test", 2);
        let tracker = Arc::new(CompletionTracker::new());
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for _ in 0..12 {
            let tracker_job = Arc::clone(&tracker);
            let current = Arc::clone(&current);
            let peak = Arc::clone(&peak);
            tracker.register();
            pool.submit(Box::new(move || {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(10));
                current.fetch_sub(1, Ordering::SeqCst);
                tracker_job.finish();
            }));
        }

        tracker.await_zero();
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn panicking_job_does_not_kill_the_worker() {
        // A single worker must survive the first job's panic to reach
        // the second; block on the second job, not on shutdown.
        let pool = WorkerPool::new("test", 1);
        let tracker = Arc::new(CompletionTracker::new());
        let ran = Arc::new(AtomicBool::new(false));

        pool.submit(Box::new(|| panic!("scripted panic")));
        {
            let tracker_job = Arc::clone(&tracker);
            let ran = Arc::clone(&ran);
            tracker.register();
            pool.submit(Box::new(move || {
                ran.store(true, Ordering::SeqCst);
                tracker_job.finish();
            }));
        }

        tracker.await_zero();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn shutdown_discards_queued_jobs() {
        let pool = WorkerPool::new("test", 1);
        let ran = Arc::new(AtomicUsize::new(0));

        // Occupy the single worker, then queue work behind it.
        pool.submit(Box::new(|| thread::sleep(Duration::from_millis(50))));
        for _ in 0..8 {
            let ran = Arc::clone(&ran);
            pool.submit(Box::new(move || {
                ran.fetch_add(1, Ordering::SeqCst);
            }));
        }

        // Let the first job start before tearing down.
        thread::sleep(Duration::from_millis(10));
        pool.shutdown();
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }
}
