//! Markdown deck parser.
//!
//! Source format:
//!
//! ```text
//! # First slide
//! intro
//! ---
//! # Second slide
//! shown first
//! <!-- pause -->
//! revealed on next
//! ```
//!
//! `---` lines separate slides and `<!-- pause -->` lines separate fragments.
//! Both are ignored inside fenced code blocks.

use std::path::{Path, PathBuf};

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use super::{DeckError, Presentation, Slide};

const SLIDE_SEPARATOR: &str = "---";
const PAUSE_MARKER: &str = "<!-- pause -->";

/// Collaborator boundary: turns a source file into a presentation.
pub trait DeckParser: Send + Sync {
    fn parse(&self, path: &Path) -> Result<Presentation, DeckError>;
}

/// The built-in markdown parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownParser;

impl DeckParser for MarkdownParser {
    fn parse(&self, path: &Path) -> Result<Presentation, DeckError> {
        let source =
            std::fs::read_to_string(path).map_err(|e| DeckError::Io(path.to_path_buf(), e))?;
        let base_dir = path.parent().unwrap_or(Path::new("."));

        let mut deck = parse_str(&source, base_dir)?;
        if deck.is_empty() {
            return Err(DeckError::Empty(path.to_path_buf()));
        }

        deck.source = path.to_path_buf();
        if deck.title.is_empty() {
            deck.title = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        Ok(deck)
    }
}

/// Parse markdown text; relative asset paths resolve against `base_dir`.
pub fn parse_str(source: &str, base_dir: &Path) -> Result<Presentation, DeckError> {
    let mut slides = Vec::new();
    let mut assets = Vec::new();

    for segments in split_slides(source)? {
        let mut slide = Slide::default();
        for segment in &segments {
            let rendered = render_segment(segment);
            if slide.title.is_none() {
                slide.title = rendered.title;
            }
            for asset in rendered.images {
                let path = base_dir.join(asset);
                if !assets.contains(&path) {
                    assets.push(path);
                }
            }
            slide.html.push_str(&rendered.html);
            slide.fragments.push(rendered.html);
        }
        slides.push(slide);
    }

    let title = slides
        .first()
        .and_then(|s| s.title.clone())
        .unwrap_or_default();

    Ok(Presentation {
        title,
        slides,
        assets,
        ..Default::default()
    })
}

// ============================================================================
// Splitting
// ============================================================================

/// Open fence: marker character, marker length, 1-based line number.
struct Fence {
    marker: char,
    len: usize,
    line: usize,
}

/// Split source into slides, each slide into pause-separated segments.
///
/// Whitespace-only slides are dropped; whitespace-only segments too.
fn split_slides(source: &str) -> Result<Vec<Vec<String>>, DeckError> {
    let mut slides = Vec::new();
    let mut segments: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut fence: Option<Fence> = None;

    for (idx, line) in source.lines().enumerate() {
        let trimmed = line.trim();

        let marker = fence_marker(trimmed);
        let closes_fence = match (&fence, marker) {
            (Some(open), Some((m, len))) => {
                m == open.marker && len >= open.len && trimmed.trim_start_matches(m).is_empty()
            }
            _ => false,
        };

        if closes_fence {
            fence = None;
        } else if fence.is_none() {
            if let Some((marker, len)) = marker {
                fence = Some(Fence {
                    marker,
                    len,
                    line: idx + 1,
                });
            } else if trimmed == SLIDE_SEPARATOR {
                push_segment(&mut segments, &mut current);
                push_slide(&mut slides, &mut segments);
                continue;
            } else if trimmed == PAUSE_MARKER {
                push_segment(&mut segments, &mut current);
                continue;
            }
        }

        current.push_str(line);
        current.push('\n');
    }

    if let Some(open) = fence {
        return Err(DeckError::UnclosedFence { line: open.line });
    }

    push_segment(&mut segments, &mut current);
    push_slide(&mut slides, &mut segments);
    Ok(slides)
}

fn push_segment(segments: &mut Vec<String>, current: &mut String) {
    let segment = std::mem::take(current);
    if !segment.trim().is_empty() {
        segments.push(segment);
    }
}

fn push_slide(slides: &mut Vec<Vec<String>>, segments: &mut Vec<String>) {
    let slide = std::mem::take(segments);
    if !slide.is_empty() {
        slides.push(slide);
    }
}

/// Detect a ``` or ~~~ fence line, returning the marker and its length.
fn fence_marker(trimmed: &str) -> Option<(char, usize)> {
    let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == marker).count();
    (len >= 3).then_some((marker, len))
}

// ============================================================================
// Rendering
// ============================================================================

struct RenderedSegment {
    html: String,
    title: Option<String>,
    images: Vec<String>,
}

fn render_segment(markdown: &str) -> RenderedSegment {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES;
    let events: Vec<Event<'_>> = Parser::new_ext(markdown, options).collect();

    let mut title: Option<String> = None;
    let mut heading: Option<String> = None;
    let mut images = Vec::new();

    for event in &events {
        match event {
            Event::Start(Tag::Heading { .. }) if title.is_none() => {
                heading = Some(String::new());
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(buf) = heading.as_mut() {
                    buf.push_str(text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(text) = heading.take()
                    && title.is_none()
                {
                    title = Some(text.trim().to_string()).filter(|t| !t.is_empty());
                }
            }
            Event::Start(Tag::Image { dest_url, .. }) if is_local_asset(dest_url) => {
                images.push(dest_url.to_string());
            }
            _ => {}
        }
    }

    let mut html = String::with_capacity(markdown.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut html, events.into_iter());

    RenderedSegment {
        html,
        title,
        images,
    }
}

/// Relative file reference (not a URL, absolute path, or data URI)
fn is_local_asset(dest: &str) -> bool {
    !(dest.is_empty()
        || dest.contains("://")
        || dest.starts_with('/')
        || dest.starts_with('#')
        || dest.starts_with("data:")
        || dest.starts_with("mailto:"))
}

/// Resolve the watch set of a presentation: the source plus its assets.
pub fn watched_files(source: &Path, deck: Option<&Presentation>) -> Vec<PathBuf> {
    let mut files = vec![source.to_path_buf()];
    if let Some(deck) = deck {
        files.extend(deck.assets.iter().cloned());
    }
    files
}
