//! Event-driven watcher on top of `notify`.

use std::path::PathBuf;
use std::time::Instant;

use crossbeam_channel::{Receiver, unbounded};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::{
    Debouncer, FileWatcher, PathRegistry, ReloadCallback, WatchError, WatchOptions, WatcherFactory,
};
use crate::error::AutoloadResult;

/// Watches the parent directories of the tracked files and fires once
/// a change to any tracked file has settled.
pub struct NotifyWatcher {
    paths: Vec<PathBuf>,
    registry: PathRegistry,
    debouncer: Debouncer,
    event_rx: Receiver<notify::Result<Event>>,
    _watcher: RecommendedWatcher,
    on_change: ReloadCallback,
}

impl NotifyWatcher {
    pub fn new(
        paths: Vec<PathBuf>,
        debounce_ms: u64,
        on_change: ReloadCallback,
    ) -> Result<Self, WatchError> {
        // Events carry canonical paths.
        let registry = PathRegistry::from_paths(
            paths
                .iter()
                .map(|p| p.canonicalize().unwrap_or_else(|_| p.clone())),
        );

        let (tx, rx) = unbounded();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.send(res);
        })?;

        for dir in registry.watch_dirs() {
            watcher
                .watch(dir, RecursiveMode::NonRecursive)
                .map_err(|e| WatchError::PathWatchFailed {
                    path: dir.to_path_buf(),
                    reason: e.to_string(),
                })?;
            crate::debug_event!("notify", "watching", "{}", dir.display());
        }

        crate::log_event!(
            "notify",
            "monitoring",
            "{} files in {} directories",
            registry.path_count(),
            registry.dir_count()
        );

        Ok(Self {
            paths,
            registry,
            debouncer: Debouncer::new(debounce_ms),
            event_rx: rx,
            _watcher: watcher,
            on_change,
        })
    }

    /// Move queued filesystem events into the debouncer.
    fn drain_events(&mut self) {
        for res in self.event_rx.try_iter() {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!("[notify] file watch error: {e}");
                    continue;
                }
            };

            if !matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) {
                continue;
            }

            for path in event.paths {
                let path = path.canonicalize().unwrap_or(path);
                if self.registry.contains(&path) {
                    self.debouncer.record(path);
                }
            }
        }
    }
}

impl FileWatcher for NotifyWatcher {
    fn name(&self) -> &str {
        "notify"
    }

    fn watched_paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn check_and_fire(&mut self) -> AutoloadResult<bool> {
        self.drain_events();

        let ready = self.debouncer.take_ready();
        if ready.is_empty() {
            if let Some(deadline) = self.debouncer.next_deadline() {
                let left = deadline.saturating_duration_since(Instant::now());
                crate::debug_event!("notify", "settling", "{}ms left", left.as_millis());
            }
            return Ok(false);
        }

        for path in &ready {
            crate::log_event!("notify", "modified", "{}", path.display());
        }
        // A failed reload keeps its paths so the next check retries it.
        if let Err(e) = (self.on_change)() {
            self.debouncer.requeue(ready);
            return Err(e);
        }
        Ok(true)
    }
}

pub struct NotifyWatcherFactory;

impl WatcherFactory for NotifyWatcherFactory {
    fn create(
        &self,
        paths: Vec<PathBuf>,
        options: WatchOptions,
        on_change: ReloadCallback,
    ) -> Result<Box<dyn FileWatcher>, WatchError> {
        Ok(Box::new(NotifyWatcher::new(
            paths,
            options.debounce_ms,
            on_change,
        )?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AutoloadError, LoadError};
    use std::fs;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread::sleep;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    #[test]
    fn test_quiet_watcher_does_not_fire() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("quiet.rb");
        fs::write(&file, "module Quiet\nend\n").unwrap();

        let mut watcher = NotifyWatcher::new(vec![file], 0, Box::new(|| Ok(()))).unwrap();
        assert_eq!(watcher.name(), "notify");
        assert!(!watcher.check_and_fire().unwrap());
    }

    #[test]
    fn test_fires_after_write() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("loud.rb");
        fs::write(&file, "module Loud\nend\n").unwrap();

        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let mut watcher = NotifyWatcher::new(
            vec![file.clone()],
            0,
            Box::new(move || {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        )
        .unwrap();

        fs::write(&file, "module Loud\n  def self.shout\n  end\nend\n").unwrap();

        // Event delivery is asynchronous; give the backend a moment.
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut fired = false;
        while Instant::now() < deadline {
            if watcher.check_and_fire().unwrap() {
                fired = true;
                break;
            }
            sleep(Duration::from_millis(20));
        }

        assert!(fired);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_reload_is_retried_without_new_events() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("flaky.rb");
        fs::write(&file, "module Flaky\nend\n").unwrap();

        let attempts = Arc::new(AtomicUsize::new(0));
        let seen = attempts.clone();
        let mut watcher = NotifyWatcher::new(
            vec![file.clone()],
            0,
            Box::new(move || {
                if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(AutoloadError::Load(LoadError::new("flaky.rb", 2, "missing `end`")))
                } else {
                    Ok(())
                }
            }),
        )
        .unwrap();

        fs::write(&file, "module Flaky\n  def self.ok\n  end\nend\n").unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut failed = false;
        while Instant::now() < deadline {
            match watcher.check_and_fire() {
                Err(_) => {
                    failed = true;
                    break;
                }
                Ok(fired) => assert!(!fired),
            }
            sleep(Duration::from_millis(20));
        }
        assert!(failed);

        // Retried without waiting for another write.
        assert!(watcher.check_and_fire().unwrap());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
