use std::collections::HashSet;
use std::sync::Mutex;

/// URLs already claimed for download within one crawl call.
///
/// Doubles as the record of every attempted URL: the final `downloaded`
/// set is this set minus the URLs that ended up with an error.
pub struct VisitedSet {
    seen: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self {
            seen: Mutex::new(HashSet::new()),
        }
    }

    /// Atomically claim `url`. True only for the first caller; later
    /// callers (concurrent or not) get false.
    pub fn try_visit(&self, url: &str) -> bool {
        self.seen.lock().unwrap().insert(url.to_string())
    }

    /// Every URL claimed so far.
    pub fn snapshot(&self) -> HashSet<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl Default for VisitedSet {
    fn default() -> Self {
        Self::new()
    }
}
