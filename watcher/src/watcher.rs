//! Live watching of a notes folder.

use std::path::PathBuf;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::WatchConfig;
use crate::error::{Result, WatcherError};
use crate::event::{DocumentEvent, DocumentEventKind};

/// Capacity of the event channel between notify and the consumer.
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Watches a notes folder and emits [`DocumentEvent`]s for note files.
///
/// Events for paths that are not notes, or that match an exclude pattern,
/// are dropped before they reach the channel.
pub struct NoteWatcher {
    config: WatchConfig,
    watcher: Option<RecommendedWatcher>,
    event_tx: mpsc::Sender<DocumentEvent>,
    event_rx: Option<mpsc::Receiver<DocumentEvent>>,
}

impl NoteWatcher {
    /// Create a watcher for the given folder.
    ///
    /// The root is canonicalized so document identifiers match the paths
    /// reported by the platform watcher.
    pub fn new(mut config: WatchConfig) -> Result<Self> {
        if !config.path.exists() {
            return Err(WatcherError::DirectoryNotFound(
                config.path.display().to_string(),
            ));
        }
        if !config.path.is_dir() {
            return Err(WatcherError::NotADirectory(config.path.display().to_string()));
        }
        config.validate()?;
        config.path = config.path.canonicalize()?;

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            config,
            watcher: None,
            event_tx,
            event_rx: Some(event_rx),
        })
    }

    /// The (canonicalized) configuration.
    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Take the event receiver. Returns `None` once it has been taken.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<DocumentEvent>> {
        self.event_rx.take()
    }

    /// Start watching.
    pub fn start(&mut self) -> Result<()> {
        if self.watcher.is_some() {
            return Err(WatcherError::AlreadyWatching(
                self.config.path.display().to_string(),
            ));
        }

        let event_tx = self.event_tx.clone();
        let config = self.config.clone();

        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    let Some(kind) = DocumentEventKind::from_notify(event.kind) else {
                        return;
                    };
                    for path in event.paths {
                        if let Some(document_event) = classify(&config, kind, path) {
                            if let Err(e) = event_tx.blocking_send(document_event) {
                                error!("Failed to send document event: {e}");
                            }
                        }
                    }
                }
                Err(e) => {
                    error!("Watch error: {e}");
                }
            },
        )?;

        let mode = if self.config.max_depth == Some(0) {
            RecursiveMode::NonRecursive
        } else {
            RecursiveMode::Recursive
        };
        watcher.watch(&self.config.path, mode)?;
        self.watcher = Some(watcher);

        info!("Watching notes in {}", self.config.path.display());
        Ok(())
    }

    /// Stop watching.
    pub fn stop(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            if let Err(e) = watcher.unwatch(&self.config.path) {
                warn!("Failed to unwatch {}: {e}", self.config.path.display());
            }
            info!("Stopped watching {}", self.config.path.display());
        }
    }

    /// Check if the watcher is running.
    pub fn is_running(&self) -> bool {
        self.watcher.is_some()
    }
}

impl Drop for NoteWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Turn a raw path into a document event if it is a note we care about.
fn classify(config: &WatchConfig, kind: DocumentEventKind, path: PathBuf) -> Option<DocumentEvent> {
    if !config.accepts(&path) {
        return None;
    }
    // A "changed" path that is not a file (e.g. the old side of a rename)
    // has nothing to read.
    if kind == DocumentEventKind::Changed && !path.is_file() {
        debug!("Ignoring change for missing file {}", path.display());
        return None;
    }
    let document_id = config.document_id(&path);
    Some(DocumentEvent::new(kind, path, document_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_watcher_rejects_missing_directory() {
        let result = NoteWatcher::new(WatchConfig::new("/nonexistent/notes/12345"));
        assert!(matches!(result, Err(WatcherError::DirectoryNotFound(_))));
    }

    #[test]
    fn test_start_and_stop() {
        let dir = TempDir::new().unwrap();
        let mut watcher = NoteWatcher::new(WatchConfig::new(dir.path())).unwrap();
        assert!(!watcher.is_running());
        assert!(watcher.take_events().is_some());
        assert!(watcher.take_events().is_none());

        watcher.start().unwrap();
        assert!(watcher.is_running());
        assert!(matches!(
            watcher.start(),
            Err(WatcherError::AlreadyWatching(_))
        ));

        watcher.stop();
        assert!(!watcher.is_running());
    }

    #[test]
    fn test_classify_filters_paths() {
        let dir = TempDir::new().unwrap();
        let config = WatchConfig::new(dir.path());
        let note = dir.path().join("idea.md");
        fs::write(&note, "[[Idea]]").unwrap();

        let event = classify(&config, DocumentEventKind::Changed, note.clone()).unwrap();
        assert_eq!(event.document_id, "idea.md");

        assert!(classify(&config, DocumentEventKind::Changed, dir.path().join("x.png")).is_none());
        assert!(
            classify(&config, DocumentEventKind::Changed, dir.path().join("gone.md")).is_none()
        );

        let removed = classify(&config, DocumentEventKind::Removed, dir.path().join("gone.md"));
        assert_eq!(removed.map(|e| e.kind), Some(DocumentEventKind::Removed));
    }

    #[tokio::test]
    async fn test_watcher_emits_change_events() {
        let dir = TempDir::new().unwrap();
        let mut watcher = NoteWatcher::new(WatchConfig::new(dir.path())).unwrap();
        let mut events = watcher.take_events().unwrap();
        watcher.start().unwrap();

        let note = watcher.config().path.join("fresh.md");
        fs::write(&note, "[[Fresh]]").unwrap();

        let event = tokio::time::timeout(std::time::Duration::from_secs(5), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.document_id, "fresh.md");
        assert_eq!(event.kind, DocumentEventKind::Changed);
    }
}
