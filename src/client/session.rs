//! Viewer session: the navigation state of one window, owned by its UI root.
//!
//! A session starts empty; `load` installs a presentation snapshot and
//! positions the viewer from the URL hash. Until then every navigation call
//! and every inbound `slide` message is a no-op.

use super::hash::Location;
use super::nav::{NavigationState, Navigator, SlideSink, Transition};
use crate::deck::PresentationSnapshot;
use crate::sync::SyncMessage;

/// What an inbound frame asks of the owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    /// Hub greeted us
    Connected,
    /// Presentation was rebuilt; re-fetch the snapshot and `load` it
    Reload,
    /// Followed a peer to this slide
    Jumped(usize),
    /// Malformed, unknown, or not applicable right now
    Ignored,
}

pub struct Session<L: Location, S: SlideSink> {
    location: L,
    sink: S,
    navigator: Option<Navigator>,
}

impl<L: Location, S: SlideSink> Session<L, S> {
    pub fn new(location: L, sink: S) -> Self {
        Self {
            location,
            sink,
            navigator: None,
        }
    }

    /// Install a snapshot, positioning from the current hash.
    ///
    /// Reloads land on the same slide because the hash survives them.
    pub fn load(&mut self, snapshot: &PresentationSnapshot) {
        let navigator = Navigator::from_hash(snapshot.fragment_counts(), &self.location.hash());
        crate::debug!("client"; "loaded v{} at slide {}", snapshot.version, navigator.state().slide_index);
        self.navigator = Some(navigator);
    }

    pub fn is_loaded(&self) -> bool {
        self.navigator.is_some()
    }

    pub fn state(&self) -> Option<NavigationState> {
        self.navigator.as_ref().map(Navigator::state)
    }

    pub fn navigator(&self) -> Option<&Navigator> {
        self.navigator.as_ref()
    }

    pub fn location(&self) -> &L {
        &self.location
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn next(&mut self) -> Transition {
        match self.navigator.as_mut() {
            Some(nav) => nav.next(&mut self.location, &mut self.sink),
            None => Transition::None,
        }
    }

    pub fn prev(&mut self) -> Transition {
        match self.navigator.as_mut() {
            Some(nav) => nav.prev(&mut self.location, &mut self.sink),
            None => Transition::None,
        }
    }

    pub fn go_to(&mut self, index: usize) -> Transition {
        match self.navigator.as_mut() {
            Some(nav) => nav.go_to(index, &mut self.location, &mut self.sink),
            None => Transition::None,
        }
    }

    /// Apply a text frame received from the hub.
    pub fn handle_frame(&mut self, text: &str) -> Inbound {
        match SyncMessage::from_json(text) {
            Some(SyncMessage::Connected) => Inbound::Connected,
            Some(SyncMessage::Reload) => Inbound::Reload,
            Some(SyncMessage::Slide { slide_index }) => {
                let Some(nav) = self.navigator.as_mut() else {
                    crate::debug!("client"; "slide {} dropped, no presentation loaded", slide_index);
                    return Inbound::Ignored;
                };
                nav.jump_silent(slide_index as usize, &mut self.location);
                Inbound::Jumped(nav.state().slide_index)
            }
            None => Inbound::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::hash::MemoryLocation;
    use crate::deck::Slide;

    #[derive(Default)]
    struct Sent(Vec<usize>);

    impl SlideSink for Sent {
        fn send_slide(&mut self, slide_index: usize) {
            self.0.push(slide_index);
        }
    }

    fn snapshot(counts: &[usize]) -> PresentationSnapshot {
        PresentationSnapshot {
            version: 1,
            title: "Talk".into(),
            slides: counts
                .iter()
                .map(|&n| Slide {
                    title: None,
                    html: String::new(),
                    fragments: vec![String::new(); n],
                })
                .collect(),
        }
    }

    fn session(hash: &str) -> Session<MemoryLocation, Sent> {
        Session::new(MemoryLocation::new(hash), Sent::default())
    }

    #[test]
    fn test_slide_without_presentation_is_dropped() {
        let mut session = session("");
        let inbound = session.handle_frame(r#"{"type":"slide","slideIndex":5}"#);

        assert_eq!(inbound, Inbound::Ignored);
        assert!(session.state().is_none());
        assert_eq!(session.location().hash(), "");
    }

    #[test]
    fn test_navigation_before_load_is_noop() {
        let mut session = session("");
        assert_eq!(session.next(), Transition::None);
        assert_eq!(session.go_to(3), Transition::None);
        assert!(session.sink().0.is_empty());
    }

    #[test]
    fn test_load_from_hash() {
        let mut session = session("#4");
        session.load(&snapshot(&[1; 6]));
        assert_eq!(session.state().unwrap().slide_index, 3);

        let mut short = self::session("#40");
        short.load(&snapshot(&[1; 6]));
        assert_eq!(short.state().unwrap().slide_index, 5);
    }

    #[test]
    fn test_inbound_slide_jumps_silently() {
        let mut session = session("");
        session.load(&snapshot(&[0, 3, 0, 0]));
        session.next();
        session.next();

        let inbound = session.handle_frame(r#"{"type":"slide","slideIndex":2}"#);
        assert_eq!(inbound, Inbound::Jumped(2));

        let state = session.state().unwrap();
        assert_eq!((state.slide_index, state.fragment_index), (2, -1));
        assert_eq!(session.location().hash(), "#3");
        assert_eq!(session.sink().0, vec![1]);
    }

    #[test]
    fn test_garbage_frames_leave_state_unchanged() {
        let mut session = session("#2");
        session.load(&snapshot(&[0, 0, 0]));
        let before = session.state();

        assert_eq!(session.handle_frame("not json"), Inbound::Ignored);
        assert_eq!(session.handle_frame(r#"{"type":"bogus"}"#), Inbound::Ignored);
        assert_eq!(
            session.handle_frame(r#"{"type":"slide","slideIndex":-1}"#),
            Inbound::Ignored
        );
        assert_eq!(session.state(), before);
    }

    #[test]
    fn test_reload_keeps_position() {
        let mut session = session("");
        session.load(&snapshot(&[0, 0, 0, 0]));
        session.go_to(2);

        assert_eq!(session.handle_frame(r#"{"type":"reload"}"#), Inbound::Reload);
        session.load(&snapshot(&[0, 0, 0, 0, 0]));
        assert_eq!(session.state().unwrap().slide_index, 2);
        assert_eq!(session.handle_frame(r#"{"type":"connected"}"#), Inbound::Connected);
    }
}
