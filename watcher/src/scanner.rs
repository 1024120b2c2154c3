//! Note discovery for a notes folder.
//!
//! `NoteScanner` walks the folder and remembers what it has seen, so a
//! rescan reports only notes that are new or modified since the last one.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::WatchConfig;
use crate::error::{Result, WatcherError};

/// A note found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteFile {
    /// Full path to the note.
    pub path: PathBuf,

    /// Identifier of the document (path relative to the notes root).
    pub document_id: String,

    /// When the note was last modified, if known.
    pub modified: Option<DateTime<Utc>>,
}

impl NoteFile {
    fn from_path(config: &WatchConfig, path: PathBuf) -> Self {
        let modified = path
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);

        Self {
            document_id: config.document_id(&path),
            path,
            modified,
        }
    }
}

/// Result of a scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanResult {
    /// Notes that are new or modified since the previous scan, sorted by path.
    pub changed: Vec<NoteFile>,

    /// Notes that disappeared since the previous scan.
    pub removed: Vec<NoteFile>,

    /// Total notes currently known.
    pub total: usize,

    /// Time taken in milliseconds.
    pub duration_ms: u64,
}

/// Walks a notes folder and tracks which notes changed.
pub struct NoteScanner {
    config: WatchConfig,
    known: HashMap<PathBuf, NoteFile>,
}

impl NoteScanner {
    /// Create a scanner for the given folder.
    pub fn new(config: WatchConfig) -> Self {
        Self {
            config,
            known: HashMap::new(),
        }
    }

    /// The scanner configuration.
    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Scan the folder.
    pub fn scan(&mut self) -> Result<ScanResult> {
        let root = &self.config.path;
        if !root.exists() {
            return Err(WatcherError::DirectoryNotFound(root.display().to_string()));
        }
        if !root.is_dir() {
            return Err(WatcherError::NotADirectory(root.display().to_string()));
        }

        let start = Instant::now();
        let mut changed = Vec::new();
        let mut current: HashSet<PathBuf> = HashSet::new();

        let walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .max_depth(self.config.max_depth.unwrap_or(usize::MAX))
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {e}");
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file() || !self.config.accepts(path) {
                continue;
            }

            let note = NoteFile::from_path(&self.config, path.to_path_buf());
            current.insert(note.path.clone());

            let is_changed = self
                .known
                .get(&note.path)
                .is_none_or(|previous| previous.modified != note.modified);
            if is_changed {
                debug!("Note changed: {}", note.document_id);
                self.known.insert(note.path.clone(), note.clone());
                changed.push(note);
            }
        }

        let mut removed: Vec<NoteFile> = Vec::new();
        self.known.retain(|path, note| {
            let keep = current.contains(path);
            if !keep {
                removed.push(note.clone());
            }
            keep
        });
        removed.sort_by(|a, b| a.path.cmp(&b.path));

        let result = ScanResult {
            changed,
            removed,
            total: self.known.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            "Scanned {} notes in {}ms (changed: {}, removed: {})",
            result.total,
            result.duration_ms,
            result.changed.len(),
            result.removed.len()
        );
        Ok(result)
    }

    /// Notes seen by the most recent scan, sorted by path.
    pub fn notes(&self) -> Vec<&NoteFile> {
        let mut notes: Vec<&NoteFile> = self.known.values().collect();
        notes.sort_by(|a, b| a.path.cmp(&b.path));
        notes
    }
}
