//! Document identity and immutable snapshots.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Stable key for a document: its URI, path, or a synthetic untitled id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(Arc<str>);

impl DocumentId {
    /// Creates a new document id.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DocumentId {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

/// Line ending convention of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
    Cr,
}

impl LineEnding {
    /// Returns the marker string.
    pub const fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
            LineEnding::Cr => "\r",
        }
    }

    /// Returns the marker length in UTF-16 code units.
    pub const fn len_utf16(self) -> u32 {
        match self {
            LineEnding::Lf | LineEnding::Cr => 1,
            LineEnding::CrLf => 2,
        }
    }

    /// Detects the line ending from the first line break in `text`.
    ///
    /// Falls back to `Lf` for single-line documents.
    pub fn detect(text: &str) -> Self {
        let bytes = text.as_bytes();
        match bytes.iter().position(|b| *b == b'\n' || *b == b'\r') {
            Some(i) if bytes[i] == b'\n' => LineEnding::Lf,
            Some(i) if bytes.get(i + 1) == Some(&b'\n') => LineEnding::CrLf,
            Some(_) => LineEnding::Cr,
            None => LineEnding::Lf,
        }
    }
}

/// Immutable capture of a document taken when a lint is requested.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    pub id: DocumentId,
    pub text: Arc<str>,
    pub line_ending: LineEnding,
    /// Syntax tag (e.g. `javascript`, `vue`, `markdown`).
    pub syntax: String,
    /// Filesystem path, `None` for untitled documents.
    pub path: Option<PathBuf>,
}

impl DocumentSnapshot {
    /// Creates an untitled snapshot; the line ending is detected from `text`.
    pub fn new(id: impl Into<DocumentId>, text: impl Into<Arc<str>>, syntax: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: id.into(),
            line_ending: LineEnding::detect(&text),
            text,
            syntax: syntax.into(),
            path: None,
        }
    }

    /// Sets the filesystem path.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Overrides the detected line ending.
    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Returns the filesystem path, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns true if the document has never been saved.
    pub fn is_untitled(&self) -> bool {
        self.path.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a\nb", LineEnding::Lf)]
    #[case("a\r\nb\r\n", LineEnding::CrLf)]
    #[case("a\rb", LineEnding::Cr)]
    #[case("single line", LineEnding::Lf)]
    #[case("", LineEnding::Lf)]
    #[case("trailing\r", LineEnding::Cr)]
    fn detects_line_ending(#[case] text: &str, #[case] expected: LineEnding) {
        assert_eq!(LineEnding::detect(text), expected);
    }

    #[test]
    fn marker_lengths() {
        assert_eq!(LineEnding::CrLf.len_utf16(), 2);
        assert_eq!(LineEnding::CrLf.as_str().len(), 2);
        assert_eq!(LineEnding::Lf.len_utf16(), 1);
    }

    #[test]
    fn snapshot_is_untitled_without_path() {
        let snapshot = DocumentSnapshot::new("untitled:1", "let a = 1;\r\n", "javascript");
        assert!(snapshot.is_untitled());
        assert_eq!(snapshot.line_ending, LineEnding::CrLf);

        let saved = snapshot.with_path("/work/a.js");
        assert!(!saved.is_untitled());
        assert_eq!(saved.path(), Some(Path::new("/work/a.js")));
    }

    #[test]
    fn document_id_display() {
        let id = DocumentId::from("file:///work/a.js");
        assert_eq!(id.to_string(), "file:///work/a.js");
        assert_eq!(id, DocumentId::new(String::from("file:///work/a.js")));
    }
}
