//! Concept extraction from document text.
//!
//! A concept reference is written `[[name]]`. The `ConceptExtractor`
//! returns every reference in left-to-right order, duplicates included,
//! with names used verbatim.

use std::ops::Range;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// `[[` followed by at least one non-`]` character, closed by `]]`.
static REFERENCE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]]+)\]\]").ok());

/// A single concept reference found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    /// The referenced concept name.
    pub name: String,

    /// Byte span of the whole marker, brackets included.
    pub span: Range<usize>,
}

/// Extracts `[[concept]]` references from text.
///
/// Extraction is a pure filtering step:
/// - unterminated markers yield nothing
/// - empty references (`[[]]`) are discarded
/// - names are not trimmed or case-folded
#[derive(Debug, Clone, Copy, Default)]
pub struct ConceptExtractor;

impl ConceptExtractor {
    /// Create a new concept extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract concept names in document order, duplicates included.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let names: Vec<String> = self
            .mentions(text)
            .into_iter()
            .map(|mention| mention.name)
            .collect();

        debug!("Extracted {} concept references", names.len());
        names
    }

    /// Extract concept references together with their positions.
    pub fn mentions(&self, text: &str) -> Vec<Mention> {
        let Some(pattern) = REFERENCE_PATTERN.as_ref() else {
            warn!("Concept reference pattern failed to compile");
            return Vec::new();
        };

        pattern
            .captures_iter(text)
            .filter_map(|captures| {
                let whole = captures.get(0)?;
                let name = captures.get(1)?;
                Some(Mention {
                    name: name.as_str().to_string(),
                    span: whole.start()..whole.end(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extract(text: &str) -> Vec<String> {
        ConceptExtractor::new().extract(text)
    }

    #[test]
    fn test_extracts_in_order_with_duplicates() {
        assert_eq!(
            extract("[[Rust]] talks to [[Tokio]], and [[Rust]] again"),
            vec!["Rust", "Tokio", "Rust"]
        );
    }

    #[test]
    fn test_names_are_verbatim() {
        assert_eq!(
            extract("[[ padded ]] [[apple]] [[Apple]]"),
            vec![" padded ", "apple", "Apple"]
        );
    }

    #[test]
    fn test_unterminated_and_empty_markers_are_ignored() {
        assert_eq!(extract("[[open but never closed"), Vec::<String>::new());
        assert_eq!(extract("[[]] and [[ok]]"), vec!["ok"]);
        assert_eq!(extract("[[dangling [[closed]]"), vec!["dangling [[closed"]);
        assert_eq!(extract("[[a]b]] [[c]]"), vec!["c"]);
    }

    #[test]
    fn test_multiline_and_unicode_names() {
        assert_eq!(
            extract("first [[Café]]\nsecond [[multi\nline]]"),
            vec!["Café", "multi\nline"]
        );
    }

    #[test]
    fn test_mention_spans() {
        let text = "see [[Graph]] now";
        let mentions = ConceptExtractor::new().mentions(text);
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].name, "Graph");
        assert_eq!(&text[mentions[0].span.clone()], "[[Graph]]");
    }
}
