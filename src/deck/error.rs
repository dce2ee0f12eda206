//! Presentation parsing errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while turning a source file into a presentation.
///
/// None of these are fatal: the rebuild pipeline keeps the last good deck.
#[derive(Debug, Error)]
pub enum DeckError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("unclosed code fence opened at line {line}")]
    UnclosedFence { line: usize },

    #[error("no slides found in `{0}`")]
    Empty(PathBuf),
}

impl DeckError {
    /// Error message including the underlying cause, on one line per cause.
    pub fn detail(&self) -> String {
        use std::error::Error as _;

        let mut out = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            out.push_str("\n  caused by: ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_includes_source() {
        let err = DeckError::Io(
            PathBuf::from("talk.md"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let detail = err.detail();
        assert!(detail.starts_with("IO error when reading `talk.md`"));
        assert!(detail.contains("caused by: gone"));
    }

    #[test]
    fn test_detail_without_source() {
        let err = DeckError::UnclosedFence { line: 4 };
        assert_eq!(err.detail(), "unclosed code fence opened at line 4");
    }
}
