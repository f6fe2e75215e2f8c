use crate::error::Result;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

const DEBOUNCE: Duration = Duration::from_millis(100);

/// A debounced change to a watched file, ready for `Core::handle_change`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

/// Watches collection directories and forwards debounced changes through an
/// mpsc channel.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    /// Handle to the background thread processing events
    _thread: std::thread::JoinHandle<()>,
    /// Receiver for debounced file change events
    pub event_rx: mpsc::Receiver<WatcherEvent>,
}

impl FileWatcher {
    /// Start watching `dirs` (resolved against `root`) recursively.
    ///
    /// Only paths accepted by `filter` are reported. Events are flushed once
    /// no new event arrived for 100ms; each path is reported once per flush
    /// with its last change kind.
    pub fn start<F>(root: &Path, dirs: &[PathBuf], filter: F) -> Result<Self>
    where
        F: Fn(&Path) -> bool + Send + 'static,
    {
        let (notify_tx, notify_rx) = mpsc::channel::<notify::Result<Event>>();
        let (event_tx, event_rx) = mpsc::channel::<WatcherEvent>();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = notify_tx.send(res);
            },
            Config::default(),
        )?;

        for dir in dirs {
            let abs_dir = root.join(dir);
            if abs_dir.exists() {
                watcher.watch(&abs_dir, RecursiveMode::Recursive)?;
                log::debug!("Watching {}", abs_dir.display());
            } else {
                log::warn!("Not watching {}: directory does not exist", abs_dir.display());
            }
        }

        let thread = std::thread::spawn(move || {
            let mut pending: BTreeMap<PathBuf, ChangeKind> = BTreeMap::new();
            let mut last_event = Instant::now();

            loop {
                match notify_rx.recv_timeout(DEBOUNCE) {
                    Ok(Ok(event)) => {
                        if let Some(kind) = ChangeKind::from_event(&event.kind) {
                            for path in event.paths {
                                if filter(&path) {
                                    pending.insert(path, kind);
                                }
                            }
                        }
                        last_event = Instant::now();
                    }
                    Ok(Err(e)) => {
                        log::warn!("File watcher error: {e}");
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        if !pending.is_empty() && last_event.elapsed() >= DEBOUNCE {
                            for (path, kind) in std::mem::take(&mut pending) {
                                if event_tx.send(WatcherEvent { path, kind }).is_err() {
                                    return; // Receiver dropped
                                }
                            }
                        }
                    }
                    Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        Ok(FileWatcher {
            _watcher: watcher,
            _thread: thread,
            event_rx,
        })
    }
}

/// The kind of file change detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
}

impl ChangeKind {
    fn from_event(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(ChangeKind::Created),
            EventKind::Modify(_) => Some(ChangeKind::Modified),
            EventKind::Remove(_) => Some(ChangeKind::Deleted),
            _ => None,
        }
    }
}
