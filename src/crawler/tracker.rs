use std::sync::{Condvar, Mutex};

/// Dynamic join counter for a task graph whose size is unknown upfront.
///
/// A plain "wait for N tasks" barrier cannot work here: tasks register
/// more tasks while running. The counter therefore starts at 1, standing
/// for the crawl call itself, so it can never transiently read zero while
/// real work is still being registered. The usage contract is `register`
/// strictly before a task is dispatched and `finish` on a guaranteed
/// execution path once it is done, success or failure.
pub struct CompletionTracker {
    outstanding: Mutex<usize>,
    drained: Condvar,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self {
            outstanding: Mutex::new(1),
            drained: Condvar::new(),
        }
    }

    /// Account for one more task, before it is handed to a pool.
    pub fn register(&self) {
        *self.outstanding.lock().unwrap() += 1;
    }

    /// Mark one task done, waking the waiter when the count drains.
    pub fn finish(&self) {
        let mut outstanding = self.outstanding.lock().unwrap();
        *outstanding -= 1;
        if *outstanding == 0 {
            self.drained.notify_all();
        }
    }

    /// Retire the root registration and block the calling thread until
    /// every registered task has finished.
    pub fn await_zero(&self) {
        let mut outstanding = self.outstanding.lock().unwrap();
        *outstanding -= 1;
        while *outstanding > 0 {
            outstanding = self.drained.wait(outstanding).unwrap();
        }
    }
}

impl Default for CompletionTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn returns_immediately_with_no_tasks() {
        let tracker = CompletionTracker::new();
        tracker.await_zero();
    }

    #[test]
    fn waits_for_tasks_registered_before_the_wait() {
        let tracker = Arc::new(CompletionTracker::new());
        tracker.register();

        let worker = {
            let tracker = Arc::clone(&tracker);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                tracker.finish();
            })
        };

        tracker.await_zero();
        worker.join().unwrap();
    }

    #[test]
    fn waits_for_tasks_registered_by_other_tasks() {
        let tracker = Arc::new(CompletionTracker::new());
        tracker.register();

        let worker = {
            let tracker = Arc::clone(&tracker);
            thread::spawn(move || {
                // Spawn a child task from inside a running task; the
                // waiter must not wake until the child finishes too.
                tracker.register();
                let child = {
                    let tracker = Arc::clone(&tracker);
                    thread::spawn(move || {
                        thread::sleep(Duration::from_millis(30));
                        tracker.finish();
                    })
                };
                tracker.finish();
                child.join().unwrap();
            })
        };

        tracker.await_zero();
        assert_eq!(*tracker.outstanding.lock().unwrap(), 0);
        worker.join().unwrap();
    }
}
