//! Deck pages: every slide rendered as a `<section>`, fragments wrapped so
//! the browser client can reveal them one at a time.

use std::fmt::Write;

use crate::deck::{Presentation, Slide};
use crate::embed::serve::{DECK_HTML, DeckPageVars};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Audience,
    Presenter,
}

impl View {
    fn mode(self) -> &'static str {
        match self {
            Self::Audience => "audience",
            Self::Presenter => "presenter",
        }
    }
}

/// Render the full page for `view`.
pub fn render_page(deck: &Presentation, view: View, ws_port: u16) -> String {
    let mut body = String::new();
    for (index, slide) in deck.slides.iter().enumerate() {
        render_slide(&mut body, index, slide);
    }

    let aside = match view {
        View::Audience => String::new(),
        View::Presenter => render_outline(deck),
    };

    DECK_HTML.render(&DeckPageVars {
        title: escape(&deck.title),
        body,
        aside,
        ws_port,
        mode: view.mode(),
    })
}

fn render_slide(out: &mut String, index: usize, slide: &Slide) {
    let _ = writeln!(out, "<section class=\"slide\" data-index=\"{index}\">");
    if slide.fragments.len() >= 2 {
        for fragment in &slide.fragments {
            let _ = writeln!(out, "<div class=\"fragment\">\n{fragment}</div>");
        }
    } else {
        out.push_str(&slide.html);
    }
    out.push_str("</section>\n");
}

/// Slide titles for the presenter sidebar.
fn render_outline(deck: &Presentation) -> String {
    let mut out = String::from("<aside><ol>\n");
    for (index, slide) in deck.slides.iter().enumerate() {
        let title = match &slide.title {
            Some(title) => escape(title),
            None => format!("Slide {}", index + 1),
        };
        let _ = writeln!(out, "<li>{title}</li>");
    }
    out.push_str("</ol></aside>");
    out
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
