//! Presentation model and the parsing collaborator.
//!
//! Markdown rendering is not the interesting part of this crate: the watcher
//! and hub only need "parse file → Presentation" and
//! "Presentation → snapshot". Both live behind this module.
//!
//! - [`parse`]: `DeckParser` trait and the shipped markdown implementation
//! - [`store`]: atomically swapped last-good presentation plus diagnostics

mod error;
pub mod parse;
pub mod store;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use error::DeckError;
pub use parse::{DeckParser, MarkdownParser};
pub use store::{DeckStore, RebuildFailure};

/// A parsed presentation, immutable once installed in the [`DeckStore`].
#[derive(Debug, Clone, Default)]
pub struct Presentation {
    /// Source file this deck was parsed from
    pub source: PathBuf,
    /// Deck title (first slide title, or the file stem)
    pub title: String,
    pub slides: Vec<Slide>,
    /// Local files referenced by the deck (images), watched for changes
    pub assets: Vec<PathBuf>,
    /// Install counter assigned by the store (0 = not installed yet)
    pub version: u64,
}

/// A single slide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    /// Text of the first heading, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Rendered HTML of the whole slide
    pub html: String,
    /// Rendered HTML per pause-separated segment.
    ///
    /// Always holds at least one segment for parsed slides; only two or more
    /// segments give the slide fragment behavior.
    pub fragments: Vec<String>,
}

/// Serializable view of a presentation, served as `/snapshot.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationSnapshot {
    pub version: u64,
    pub title: String,
    pub slides: Vec<Slide>,
}

impl Presentation {
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Build the broadcastable snapshot.
    pub fn snapshot(&self) -> PresentationSnapshot {
        PresentationSnapshot {
            version: self.version,
            title: self.title.clone(),
            slides: self.slides.clone(),
        }
    }
}

impl PresentationSnapshot {
    /// Raw fragment entry count per slide, in slide order.
    pub fn fragment_counts(&self) -> Vec<usize> {
        self.slides.iter().map(|s| s.fragments.len()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide(fragments: usize) -> Slide {
        Slide {
            title: None,
            html: String::new(),
            fragments: vec![String::new(); fragments],
        }
    }

    #[test]
    fn test_snapshot_copies_slides() {
        let deck = Presentation {
            title: "Talk".into(),
            slides: vec![slide(1), slide(3)],
            version: 7,
            ..Default::default()
        };

        let snapshot = deck.snapshot();
        assert_eq!(snapshot.version, 7);
        assert_eq!(snapshot.title, "Talk");
        assert_eq!(snapshot.fragment_counts(), vec![1, 3]);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = PresentationSnapshot {
            version: 1,
            title: "T".into(),
            slides: vec![slide(0)],
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(
            json,
            r#"{"version":1,"title":"T","slides":[{"html":"","fragments":[]}]}"#
        );
    }
}
