//! URL fragment contract: `#N` addresses slide `N`, 1-based.

/// Where the current slide is written for bookmarking and reloads.
pub trait Location {
    /// Current fragment identifier including the leading `#`, or empty.
    fn hash(&self) -> String;

    /// Replace the fragment without adding a history entry.
    fn replace_hash(&mut self, hash: &str);
}

/// In-process location, used by the terminal remote and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryLocation {
    hash: String,
}

impl MemoryLocation {
    pub fn new(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }
}

impl Location for MemoryLocation {
    fn hash(&self) -> String {
        self.hash.clone()
    }

    fn replace_hash(&mut self, hash: &str) {
        self.hash = hash.to_string();
    }
}

/// Fragment for a 0-based slide index.
pub fn format_hash(slide_index: usize) -> String {
    format!("#{}", slide_index + 1)
}

/// 0-based slide index addressed by `hash`, clamped to a deck of `total` slides.
///
/// Absent, `#`, `#0` and non-numeric fragments address the first slide;
/// numbers past the end, however large, address the last one.
pub fn parse_hash(hash: &str, total: usize) -> usize {
    let last = total.saturating_sub(1);
    let digits = hash.strip_prefix('#').unwrap_or(hash).trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }

    match digits.parse::<usize>() {
        Ok(number) => number.saturating_sub(1).min(last),
        // Only overflow is left once the text is all digits.
        Err(_) => last,
    }
}
