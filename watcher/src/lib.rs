//! # Note Watcher
//!
//! Finds note files in a folder and reports when they change.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      Note Watcher                        │
//! ├──────────────────────────────────────────────────────────┤
//! │  WatchConfig ──► NoteScanner ──► ScanResult (batch)      │
//! │       │                                                  │
//! │       └────────► NoteWatcher ──► DocumentEvent (live)    │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod scanner;
pub mod watcher;

pub use config::WatchConfig;
pub use error::{Result, WatcherError};
pub use event::{DocumentEvent, DocumentEventKind};
pub use scanner::{NoteFile, NoteScanner, ScanResult};
pub use watcher::NoteWatcher;
