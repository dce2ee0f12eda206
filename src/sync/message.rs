//! Sync Message Protocol
//!
//! # Message Types
//!
//! - `connected`: sent by the hub right after the handshake
//! - `reload`: a new presentation snapshot is live, clients refresh
//! - `slide`: a controller moved to another slide (`slideIndex`, 0-based)
//!
//! Receivers never fail on bad input: unknown `type` values and malformed
//! frames parse to `None` and are dropped.

use serde::{Deserialize, Serialize};

/// Sync message sent over WebSocket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SyncMessage {
    /// Connection established
    Connected,

    /// Presentation rebuilt, refresh
    Reload,

    /// Slide-level navigation
    Slide {
        #[serde(rename = "slideIndex")]
        slide_index: u32,
    },
}

impl SyncMessage {
    /// Create a slide message, saturating indices that do not fit the wire type.
    pub fn slide(slide_index: usize) -> Self {
        Self::Slide {
            slide_index: u32::try_from(slide_index).unwrap_or(u32::MAX),
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }

    /// Parse from JSON string, `None` for anything this protocol does not know
    pub fn from_json(s: &str) -> Option<Self> {
        match serde_json::from_str(s) {
            Ok(msg) => Some(msg),
            Err(e) => {
                crate::debug!("sync"; "ignored frame ({}): {}", e, truncate(s, 64));
                None
            }
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        assert_eq!(SyncMessage::Connected.to_json(), r#"{"type":"connected"}"#);
        assert_eq!(SyncMessage::Reload.to_json(), r#"{"type":"reload"}"#);
        assert_eq!(
            SyncMessage::slide(2).to_json(),
            r#"{"type":"slide","slideIndex":2}"#
        );
    }

    #[test]
    fn test_parse_slide() {
        let msg = SyncMessage::from_json(r#"{"type":"slide","slideIndex":5}"#);
        assert_eq!(msg, Some(SyncMessage::Slide { slide_index: 5 }));
    }

    #[test]
    fn test_parse_ignores_extra_fields() {
        let msg = SyncMessage::from_json(r#"{"type":"reload","reason":"talk.md changed"}"#);
        assert_eq!(msg, Some(SyncMessage::Reload));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(SyncMessage::from_json("not json"), None);
        assert_eq!(SyncMessage::from_json(r#"{"type":"patch"}"#), None);
        assert_eq!(SyncMessage::from_json(r#"{"slideIndex":1}"#), None);
        assert_eq!(SyncMessage::from_json(r#"{"type":"slide"}"#), None);
        assert_eq!(
            SyncMessage::from_json(r#"{"type":"slide","slideIndex":-1}"#),
            None
        );
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("äöü", 2), "äö");
        assert_eq!(truncate("ab", 10), "ab");
    }
}
