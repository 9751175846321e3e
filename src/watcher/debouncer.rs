//! Debouncing for filesystem events.
//!
//! Editors often write a file several times per save (atomic rename,
//! formatting on save). A reload should only start once the burst is over.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Holds changed paths until they have been quiet for `window`.
#[derive(Debug)]
pub struct Debouncer {
    /// Path -> time of its latest change.
    pending: HashMap<PathBuf, Instant>,
    window: Duration,
}

impl Debouncer {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            pending: HashMap::new(),
            window: Duration::from_millis(debounce_ms),
        }
    }

    /// Record a change now. Restarts the quiet period for `path`.
    pub fn record(&mut self, path: PathBuf) {
        self.record_at(path, Instant::now());
    }

    pub fn record_at(&mut self, path: PathBuf, at: Instant) {
        let latest = self.pending.entry(path).or_insert(at);
        *latest = (*latest).max(at);
    }

    /// Release every path quiet for at least the window, sorted.
    pub fn take_ready(&mut self) -> Vec<PathBuf> {
        self.take_ready_at(Instant::now())
    }

    pub fn take_ready_at(&mut self, now: Instant) -> Vec<PathBuf> {
        let window = self.window;
        let mut ready = Vec::new();
        self.pending.retain(|path, latest| {
            let settled = now.saturating_duration_since(*latest) >= window;
            if settled {
                ready.push(path.clone());
            }
            !settled
        });
        ready.sort();
        ready
    }

    /// Put released paths back as already settled, so the next
    /// `take_ready` hands them out again. Newer events for a path win.
    pub fn requeue(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        let now = Instant::now();
        let settled = now.checked_sub(self.window).unwrap_or(now);
        for path in paths {
            self.pending.entry(path).or_insert(settled);
        }
    }

    /// Earliest instant at which some pending path settles.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().map(|latest| *latest + self.window)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_zero_window_releases_immediately() {
        let mut debouncer = Debouncer::new(0);
        debouncer.record(PathBuf::from("/app/b.rb"));
        debouncer.record(PathBuf::from("/app/a.rb"));

        assert_eq!(
            debouncer.take_ready(),
            vec![PathBuf::from("/app/a.rb"), PathBuf::from("/app/b.rb")]
        );
        assert!(!debouncer.has_pending());
    }

    #[test]
    fn test_burst_is_held_until_quiet() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(50);
        let path = PathBuf::from("/app/test_module.rb");

        debouncer.record_at(path.clone(), start);
        debouncer.record_at(path.clone(), start + ms(30));

        // 50ms after the first write, but only 20ms after the second.
        assert!(debouncer.take_ready_at(start + ms(50)).is_empty());
        assert_eq!(debouncer.next_deadline(), Some(start + ms(80)));

        assert_eq!(debouncer.take_ready_at(start + ms(80)), vec![path]);
        assert!(!debouncer.has_pending());
        assert_eq!(debouncer.next_deadline(), None);
    }

    #[test]
    fn test_requeued_paths_are_ready_again() {
        let mut debouncer = Debouncer::new(50);
        let path = PathBuf::from("/app/test_module.rb");

        debouncer.record_at(path.clone(), Instant::now() - ms(60));
        let ready = debouncer.take_ready();
        assert_eq!(ready, vec![path.clone()]);

        debouncer.requeue(ready);
        assert_eq!(debouncer.take_ready(), vec![path]);
        assert!(!debouncer.has_pending());
    }

    #[test]
    fn test_requeue_keeps_newer_event() {
        let mut debouncer = Debouncer::new(50);
        let path = PathBuf::from("/app/test_module.rb");

        debouncer.record(path.clone());
        debouncer.requeue(vec![path.clone()]);
        // Still settling from the fresh event.
        assert!(debouncer.take_ready().is_empty());
        assert!(debouncer.has_pending());
    }

    #[test]
    fn test_late_event_does_not_rewind() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(10);
        let path = PathBuf::from("/app/a.rb");

        debouncer.record_at(path.clone(), start + ms(20));
        debouncer.record_at(path.clone(), start);

        assert!(debouncer.take_ready_at(start + ms(25)).is_empty());
        assert_eq!(debouncer.take_ready_at(start + ms(30)), vec![path]);
    }
}
