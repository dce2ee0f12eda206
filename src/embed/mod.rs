//! Embedded static resources for the deck server.
//!
//! # Module Structure
//!
//! - `template` - Template types for typed variable injection
//! - `serve` - Deck page shell (deck.html) and the browser sync client (sync.js)
//!
//! # Usage
//!
//! ```ignore
//! use embed::serve::{DECK_HTML, DeckPageVars};
//!
//! let html = DECK_HTML.render(&DeckPageVars { ws_port: 35729, .. });
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};

    /// Browser side of the sync protocol, inlined into every deck page.
    pub const SYNC_JS: &str = include_str!("serve/sync.js");

    /// Placeholder prefix shared by every deck.html variable
    const PREFIX: &str = "__DECK_";

    /// Variables for deck.html.
    pub struct DeckPageVars {
        /// Already escaped
        pub title: String,
        /// Rendered slide sections
        pub body: String,
        /// Extra markup before the slides (presenter outline)
        pub aside: String,
        pub ws_port: u16,
        /// `audience` or `presenter`
        pub mode: &'static str,
    }

    impl TemplateVars for DeckPageVars {
        /// Single pass over the shell: substituted values are never rescanned,
        /// so slide content may contain placeholder text.
        fn apply(&self, content: &str) -> String {
            let ws_port = self.ws_port.to_string();
            let vars: [(&str, &str); 6] = [
                ("__DECK_SYNC_JS__", SYNC_JS),
                ("__DECK_WS_PORT__", &ws_port),
                ("__DECK_MODE__", self.mode),
                ("__DECK_TITLE__", &self.title),
                ("__DECK_ASIDE__", &self.aside),
                ("__DECK_BODY__", &self.body),
            ];

            let mut out = String::with_capacity(content.len() + self.body.len() + SYNC_JS.len());
            let mut rest = content;
            while let Some(start) = rest.find(PREFIX) {
                out.push_str(&rest[..start]);
                let tail = &rest[start..];
                match vars.iter().find(|(name, _)| tail.starts_with(name)) {
                    Some((name, value)) => {
                        out.push_str(value);
                        rest = &tail[name.len()..];
                    }
                    None => {
                        out.push_str(PREFIX);
                        rest = &tail[PREFIX.len()..];
                    }
                }
            }
            out.push_str(rest);
            out
        }
    }

    /// Deck page shell.
    pub const DECK_HTML: Template<DeckPageVars> = Template::new(include_str!("serve/deck.html"));
}

#[cfg(test)]
mod tests {
    use super::serve::{DECK_HTML, DeckPageVars, SYNC_JS};

    fn page(title: &str, body: &str, aside: &str) -> String {
        DECK_HTML.render(&DeckPageVars {
            title: title.into(),
            body: body.into(),
            aside: aside.into(),
            ws_port: 4000,
            mode: "presenter",
        })
    }

    #[test]
    fn test_deck_page_vars() {
        let html = page("Talk", "<section>__DECK_MODE__</section>", "");

        assert!(html.contains("<title>Talk</title>"));
        assert!(html.contains("data-ws-port=\"4000\""));
        assert!(html.contains("data-mode=\"presenter\""));
        // Placeholders inside slide content are left alone.
        assert!(html.contains("<section>__DECK_MODE__</section>"));
        assert!(!html.contains("__DECK_SYNC_JS__"));
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let html = page("__DECK_BODY__", "<p>body</p>", "<aside>__DECK_TITLE__</aside>");

        assert!(html.contains("<title>__DECK_BODY__</title>"));
        assert!(html.contains("<aside>__DECK_TITLE__</aside>"));
        assert_eq!(html.matches("<p>body</p>").count(), 1);
    }

    #[test]
    fn test_sync_js_hash_is_digits_only() {
        // Same contract as `client::hash::parse_hash`: `#3abc` is not slide 3.
        assert!(SYNC_JS.contains(r"/^#?\s*(\d+)\s*$/"));
        assert!(!SYNC_JS.contains("parseInt"));
    }
}
