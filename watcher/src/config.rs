//! Configuration for a watched notes folder.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WatcherError};

/// Configuration for a notes folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Root of the notes folder.
    pub path: PathBuf,

    /// File extensions treated as notes (without the dot, case-insensitive).
    pub extensions: Vec<String>,

    /// Glob patterns for paths to skip.
    pub exclude_patterns: Vec<String>,

    /// Maximum depth to recurse (None = unlimited).
    pub max_depth: Option<usize>,

    /// Whether to follow symbolic links.
    pub follow_symlinks: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

impl WatchConfig {
    /// Create a config for the given folder.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            extensions: vec!["md".to_string(), "markdown".to_string(), "txt".to_string()],
            exclude_patterns: Self::default_excludes(),
            max_depth: None,
            follow_symlinks: false,
        }
    }

    /// Set the root folder.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Replace the note extensions.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Add an exclude pattern.
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Set the maximum depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Enable following symbolic links.
    pub fn follow_symlinks(mut self) -> Self {
        self.follow_symlinks = true;
        self
    }

    fn default_excludes() -> Vec<String> {
        vec![
            "**/.git/**".to_string(),
            "**/.obsidian/**".to_string(),
            "**/.trash/**".to_string(),
            "**/node_modules/**".to_string(),
            "**/.DS_Store".to_string(),
            "**/*.swp".to_string(),
            "**/*~".to_string(),
            "**/*.tmp".to_string(),
        ]
    }

    /// Check that every exclude pattern is a valid glob.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.exclude_patterns {
            glob::Pattern::new(pattern)
                .map_err(|e| WatcherError::InvalidPattern(format!("{pattern}: {e}")))?;
        }
        Ok(())
    }

    /// Check if a path should be excluded.
    pub fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.exclude_patterns.iter().any(|pattern| {
            glob::Pattern::new(pattern).is_ok_and(|glob| glob.matches(&path_str))
        })
    }

    /// Whether a path has one of the note extensions.
    pub fn is_note(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
    }

    /// Whether a path is a note that should be processed.
    pub fn accepts(&self, path: &Path) -> bool {
        self.is_note(path) && !self.should_exclude(path)
    }

    /// Document identifier for a path: relative to the root, `/`-separated.
    ///
    /// Paths outside the root keep their full form.
    pub fn document_id(&self, path: &Path) -> String {
        match path.strip_prefix(&self.path) {
            Ok(relative) => relative
                .components()
                .map(|component| component.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => path.to_string_lossy().into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_note_extensions() {
        let config = WatchConfig::new("/vault");

        assert!(config.is_note(Path::new("/vault/ideas.md")));
        assert!(config.is_note(Path::new("/vault/IDEAS.MD")));
        assert!(!config.is_note(Path::new("/vault/image.png")));
        assert!(!config.is_note(Path::new("/vault/README")));

        let config = config.with_extensions(["org"]);
        assert!(config.is_note(Path::new("/vault/todo.org")));
        assert!(!config.is_note(Path::new("/vault/ideas.md")));
    }

    #[test]
    fn test_exclude_patterns() {
        let config = WatchConfig::new("/vault").exclude("**/drafts/**");

        assert!(config.should_exclude(Path::new("/vault/.git/config")));
        assert!(config.should_exclude(Path::new("/vault/.obsidian/workspace.md")));
        assert!(config.should_exclude(Path::new("/vault/drafts/wip.md")));
        assert!(!config.should_exclude(Path::new("/vault/projects/plan.md")));
        assert!(config.accepts(Path::new("/vault/projects/plan.md")));
    }

    #[test]
    fn test_invalid_pattern() {
        let config = WatchConfig::new("/vault").exclude("[unclosed");
        assert!(config.validate().is_err());
        assert!(WatchConfig::new("/vault").validate().is_ok());
    }

    #[test]
    fn test_document_id_is_relative() {
        let config = WatchConfig::new("/vault");

        assert_eq!(
            config.document_id(Path::new("/vault/projects/plan.md")),
            "projects/plan.md"
        );
        assert_eq!(config.document_id(Path::new("/elsewhere/a.md")), "/elsewhere/a.md");
    }
}
