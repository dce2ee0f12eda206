//! Navigation State Machine
//!
//! Tracks the viewer's position as `(slide_index, fragment_index)`.
//! `fragment_index == -1` means no fragment of the slide is revealed yet.
//!
//! Only slide-level moves leave the process: they rewrite the URL hash and,
//! when the slide differs from the last one sent, go out through the
//! [`SlideSink`]. Fragment reveals stay local.

use super::hash::{Location, format_hash, parse_hash};

/// Receives slide-level moves that should reach the other windows.
pub trait SlideSink {
    fn send_slide(&mut self, slide_index: usize);
}

/// Current position plus the last slide sent to peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationState {
    pub slide_index: usize,
    /// `-1` until the first fragment is revealed
    pub fragment_index: isize,
    pub last_broadcasted_slide_index: Option<usize>,
}

/// What a navigation call changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    Fragment,
    Slide,
}

/// Navigation over one loaded presentation.
#[derive(Debug, Clone)]
pub struct Navigator {
    state: NavigationState,
    fragment_counts: Vec<usize>,
}

impl Navigator {
    /// `fragment_counts` holds the raw fragment entry count of each slide.
    pub fn new(fragment_counts: Vec<usize>, start: usize) -> Self {
        let last = fragment_counts.len().saturating_sub(1);
        Self {
            state: NavigationState {
                slide_index: start.min(last),
                fragment_index: -1,
                last_broadcasted_slide_index: None,
            },
            fragment_counts,
        }
    }

    /// Start at the slide addressed by a URL fragment.
    pub fn from_hash(fragment_counts: Vec<usize>, hash: &str) -> Self {
        let start = parse_hash(hash, fragment_counts.len());
        Self::new(fragment_counts, start)
    }

    pub fn state(&self) -> NavigationState {
        self.state
    }

    pub fn total(&self) -> usize {
        self.fragment_counts.len()
    }

    /// Fragment count with fragment behavior applied: a slide needs at least
    /// two segments to reveal step by step.
    pub fn fragment_count(&self, slide_index: usize) -> usize {
        match self.fragment_counts.get(slide_index) {
            Some(&count) if count >= 2 => count,
            _ => 0,
        }
    }

    pub fn next(&mut self, location: &mut impl Location, sink: &mut impl SlideSink) -> Transition {
        if self.total() == 0 {
            return Transition::None;
        }

        let count = self.fragment_count(self.state.slide_index) as isize;
        if self.state.fragment_index < count - 1 {
            self.state.fragment_index += 1;
            return Transition::Fragment;
        }

        if self.state.slide_index + 1 < self.total() {
            self.state.slide_index += 1;
            self.state.fragment_index = -1;
            self.slide_changed(location, sink);
            return Transition::Slide;
        }

        Transition::None
    }

    pub fn prev(&mut self, location: &mut impl Location, sink: &mut impl SlideSink) -> Transition {
        if self.total() == 0 {
            return Transition::None;
        }

        if self.state.fragment_index >= 0 {
            self.state.fragment_index -= 1;
            return Transition::Fragment;
        }

        if self.state.slide_index > 0 {
            self.state.slide_index -= 1;
            // Arriving from behind shows the slide fully revealed.
            self.state.fragment_index = self.fragment_count(self.state.slide_index) as isize - 1;
            self.slide_changed(location, sink);
            return Transition::Slide;
        }

        Transition::None
    }

    pub fn go_to(
        &mut self,
        index: usize,
        location: &mut impl Location,
        sink: &mut impl SlideSink,
    ) -> Transition {
        match self.move_to(index) {
            Transition::Slide => {
                self.slide_changed(location, sink);
                Transition::Slide
            }
            other => other,
        }
    }

    /// Follow a peer's move: same as `go_to`, but nothing is sent back.
    ///
    /// The peer's index becomes the last broadcast one, so returning to the
    /// slide we were on before is sent again.
    pub fn jump_silent(&mut self, index: usize, location: &mut impl Location) -> Transition {
        let transition = self.move_to(index);
        if transition == Transition::Slide {
            location.replace_hash(&format_hash(self.state.slide_index));
        }
        if self.total() > 0 {
            self.state.last_broadcasted_slide_index = Some(self.state.slide_index);
        }
        transition
    }

    /// Clamp and move without side effects.
    fn move_to(&mut self, index: usize) -> Transition {
        if self.total() == 0 {
            return Transition::None;
        }

        let index = index.min(self.total() - 1);
        let fragment_reset = self.state.fragment_index != -1;
        self.state.fragment_index = -1;

        if index != self.state.slide_index {
            self.state.slide_index = index;
            Transition::Slide
        } else if fragment_reset {
            Transition::Fragment
        } else {
            Transition::None
        }
    }

    fn slide_changed(&mut self, location: &mut impl Location, sink: &mut impl SlideSink) {
        let slide = self.state.slide_index;
        location.replace_hash(&format_hash(slide));

        if self.state.last_broadcasted_slide_index != Some(slide) {
            sink.send_slide(slide);
            self.state.last_broadcasted_slide_index = Some(slide);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::hash::MemoryLocation;

    #[derive(Default)]
    struct Sent(Vec<usize>);

    impl SlideSink for Sent {
        fn send_slide(&mut self, slide_index: usize) {
            self.0.push(slide_index);
        }
    }

    fn position(nav: &Navigator) -> (usize, isize) {
        let state = nav.state();
        (state.slide_index, state.fragment_index)
    }

    #[test]
    fn test_next_over_fragment_slide() {
        let mut nav = Navigator::new(vec![0, 0, 3, 0], 0);
        let mut location = MemoryLocation::default();
        let mut sent = Sent::default();

        nav.next(&mut location, &mut sent);
        nav.next(&mut location, &mut sent);
        assert_eq!(position(&nav), (2, -1));
        assert_eq!(sent.0, vec![1, 2]);
        assert_eq!(location.hash(), "#3");

        // Reveals stay local.
        for expected in 0..3 {
            assert_eq!(nav.next(&mut location, &mut sent), Transition::Fragment);
            assert_eq!(position(&nav), (2, expected));
        }
        assert_eq!(sent.0, vec![1, 2]);

        assert_eq!(nav.next(&mut location, &mut sent), Transition::Slide);
        assert_eq!(position(&nav), (3, -1));
        assert_eq!(nav.next(&mut location, &mut sent), Transition::None);
        assert_eq!(sent.0, vec![1, 2, 3]);
    }

    #[test]
    fn test_single_segment_has_no_fragment_behavior() {
        let mut nav = Navigator::new(vec![1, 1], 0);
        let mut location = MemoryLocation::default();
        let mut sent = Sent::default();

        assert_eq!(nav.next(&mut location, &mut sent), Transition::Slide);
        assert_eq!(position(&nav), (1, -1));
        assert_eq!(nav.fragment_count(0), 0);
    }

    #[test]
    fn test_prev_arrives_fully_revealed() {
        let mut nav = Navigator::new(vec![0, 3, 0], 2);
        let mut location = MemoryLocation::default();
        let mut sent = Sent::default();

        assert_eq!(nav.prev(&mut location, &mut sent), Transition::Slide);
        assert_eq!(position(&nav), (1, 2));

        assert_eq!(nav.prev(&mut location, &mut sent), Transition::Fragment);
        assert_eq!(nav.prev(&mut location, &mut sent), Transition::Fragment);
        assert_eq!(nav.prev(&mut location, &mut sent), Transition::Fragment);
        assert_eq!(position(&nav), (1, -1));

        assert_eq!(nav.prev(&mut location, &mut sent), Transition::Slide);
        assert_eq!(position(&nav), (0, -1));
        assert_eq!(nav.prev(&mut location, &mut sent), Transition::None);
        assert_eq!(sent.0, vec![1, 0]);
        assert_eq!(location.hash(), "#1");
    }

    #[test]
    fn test_go_to_clamps() {
        let mut nav = Navigator::new(vec![0; 5], 0);
        let mut location = MemoryLocation::default();
        let mut sent = Sent::default();

        assert_eq!(nav.go_to(3, &mut location, &mut sent), Transition::Slide);
        assert_eq!(location.hash(), "#4");
        assert_eq!(
            Navigator::from_hash(vec![0; 5], &location.hash()).state().slide_index,
            3
        );

        assert_eq!(nav.go_to(42, &mut location, &mut sent), Transition::Slide);
        assert_eq!(position(&nav), (4, -1));
        assert_eq!(nav.go_to(4, &mut location, &mut sent), Transition::None);
        assert_eq!(sent.0, vec![3, 4]);
    }

    #[test]
    fn test_go_to_same_slide_resets_fragments() {
        let mut nav = Navigator::new(vec![3], 0);
        let mut location = MemoryLocation::default();
        let mut sent = Sent::default();

        nav.next(&mut location, &mut sent);
        assert_eq!(nav.go_to(0, &mut location, &mut sent), Transition::Fragment);
        assert_eq!(position(&nav), (0, -1));
        assert!(sent.0.is_empty());
        assert_eq!(location.hash(), "");
    }

    #[test]
    fn test_jump_silent() {
        let mut nav = Navigator::new(vec![0, 2, 0, 0], 0);
        let mut location = MemoryLocation::default();
        let mut sent = Sent::default();

        nav.go_to(1, &mut location, &mut sent);
        nav.next(&mut location, &mut sent);

        assert_eq!(nav.jump_silent(9, &mut location), Transition::Slide);
        assert_eq!(position(&nav), (3, -1));
        assert_eq!(location.hash(), "#4");
        assert_eq!(nav.state().last_broadcasted_slide_index, Some(3));

        // Moving back to slide 1 after a peer moved us is announced again.
        nav.go_to(1, &mut location, &mut sent);
        assert_eq!(sent.0, vec![1, 1]);
    }

    #[test]
    fn test_empty_deck_is_inert() {
        let mut nav = Navigator::new(Vec::new(), 3);
        let mut location = MemoryLocation::default();
        let mut sent = Sent::default();

        assert_eq!(nav.next(&mut location, &mut sent), Transition::None);
        assert_eq!(nav.prev(&mut location, &mut sent), Transition::None);
        assert_eq!(nav.go_to(2, &mut location, &mut sent), Transition::None);
        assert_eq!(nav.jump_silent(2, &mut location), Transition::None);
        assert_eq!(position(&nav), (0, -1));
        assert!(sent.0.is_empty());
    }

    #[test]
    fn test_from_hash() {
        assert_eq!(Navigator::from_hash(vec![0; 5], "#4").state().slide_index, 3);
        assert_eq!(Navigator::from_hash(vec![0; 5], "#0").state().slide_index, 0);
        assert_eq!(Navigator::from_hash(vec![0; 5], "#x").state().slide_index, 0);
        assert_eq!(Navigator::from_hash(vec![0; 5], "#77").state().slide_index, 4);
    }
}
