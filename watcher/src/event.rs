//! Document events produced by scanning and watching.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A change to a note on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEvent {
    /// What happened to the document.
    pub kind: DocumentEventKind,

    /// Path to the affected file.
    pub path: PathBuf,

    /// Identifier of the document (path relative to the notes root).
    pub document_id: String,

    /// When the event was observed.
    pub timestamp: DateTime<Utc>,
}

impl DocumentEvent {
    /// Create a new document event.
    pub fn new(
        kind: DocumentEventKind,
        path: impl Into<PathBuf>,
        document_id: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            path: path.into(),
            document_id: document_id.into(),
            timestamp: Utc::now(),
        }
    }

    /// Whether the document content should be (re)read.
    pub fn is_change(&self) -> bool {
        self.kind == DocumentEventKind::Changed
    }
}

/// Kind of document event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentEventKind {
    /// Created, modified or renamed into place.
    Changed,

    /// Deleted or renamed away.
    Removed,
}

impl DocumentEventKind {
    /// Map a notify event kind. Access and metadata-only events are ignored.
    pub fn from_notify(kind: notify::EventKind) -> Option<Self> {
        use notify::EventKind;
        use notify::event::{ModifyKind, RenameMode};

        match kind {
            EventKind::Create(_) => Some(Self::Changed),
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(Self::Removed),
            EventKind::Modify(ModifyKind::Metadata(_)) => None,
            EventKind::Modify(_) => Some(Self::Changed),
            EventKind::Remove(_) => Some(Self::Removed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::EventKind;
    use notify::event::{
        AccessKind, CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind, RenameMode,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn test_notify_kind_mapping() {
        let cases = [
            (EventKind::Create(CreateKind::File), Some(DocumentEventKind::Changed)),
            (
                EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                Some(DocumentEventKind::Changed),
            ),
            (
                EventKind::Modify(ModifyKind::Name(RenameMode::To)),
                Some(DocumentEventKind::Changed),
            ),
            (
                EventKind::Modify(ModifyKind::Name(RenameMode::From)),
                Some(DocumentEventKind::Removed),
            ),
            (EventKind::Remove(RemoveKind::File), Some(DocumentEventKind::Removed)),
            (EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any)), None),
            (EventKind::Access(AccessKind::Any), None),
        ];

        for (kind, expected) in cases {
            assert_eq!(DocumentEventKind::from_notify(kind), expected, "{kind:?}");
        }
    }

    #[test]
    fn test_event_creation() {
        let event = DocumentEvent::new(DocumentEventKind::Changed, "/vault/a.md", "a.md");
        assert!(event.is_change());
        assert_eq!(event.document_id, "a.md");
    }
}
