//! Collection slideshow / lightbox state
//!
//! Navigation is rate limited by a short transition lock, and swipes
//! shorter than `SWIPE_THRESHOLD_PX` are ignored. The collections page
//! also uses this model to render the lightbox server side.

use serde::Serialize;
use std::time::{Duration, Instant};

pub const TRANSITION: Duration = Duration::from_millis(200);
pub const SWIPE_THRESHOLD_PX: f64 = 50.0;

/// Keys the lightbox reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    ArrowLeft,
    ArrowRight,
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Escape" => Key::Escape,
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            _ => Key::Other,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Slideshow {
    len: usize,
    current_index: usize,
    transition_until: Option<Instant>,
    touch_start: Option<f64>,
    is_open: bool,
    scroll_locked: bool,
}

impl Slideshow {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            current_index: 0,
            transition_until: None,
            touch_start: None,
            is_open: false,
            scroll_locked: false,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    pub fn touch_start_x(&self) -> Option<f64> {
        self.touch_start
    }

    pub fn is_transitioning(&self, now: Instant) -> bool {
        self.transition_until.is_some_and(|until| now < until)
    }

    /// Open at `index`, clamped to the list
    pub fn open(&mut self, index: usize) {
        self.current_index = index.min(self.len.saturating_sub(1));
        self.is_open = true;
        self.scroll_locked = true;
    }

    pub fn close(&mut self) {
        self.is_open = false;
        self.scroll_locked = false;
        self.touch_start = None;
    }

    pub fn go_to_next(&mut self, now: Instant) {
        if self.begin_transition(now) {
            self.current_index = (self.current_index + 1) % self.len;
        }
    }

    pub fn go_to_prev(&mut self, now: Instant) {
        if self.begin_transition(now) {
            self.current_index = (self.current_index + self.len - 1) % self.len;
        }
    }

    pub fn handle_key(&mut self, key: Key, now: Instant) {
        match key {
            Key::Escape => self.close(),
            Key::ArrowLeft => self.go_to_prev(now),
            Key::ArrowRight => self.go_to_next(now),
            Key::Other => {}
        }
    }

    pub fn touch_start(&mut self, x: f64) {
        self.touch_start = Some(x);
    }

    /// Finish a swipe. A leftward swipe advances.
    pub fn touch_end(&mut self, x: f64, now: Instant) {
        let Some(start) = self.touch_start.take() else {
            return;
        };
        let diff = start - x;
        if diff.abs() > SWIPE_THRESHOLD_PX {
            if diff > 0.0 {
                self.go_to_next(now);
            } else {
                self.go_to_prev(now);
            }
        }
    }

    /// The filtered list changed
    pub fn set_images(&mut self, len: usize) {
        self.len = len;
        self.current_index = 0;
        self.transition_until = None;
        self.close();
    }

    fn begin_transition(&mut self, now: Instant) -> bool {
        if self.len == 0 || self.is_transitioning(now) {
            return false;
        }
        self.transition_until = Some(now + TRANSITION);
        true
    }
}

/// Lightbox position rendered by the collections page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LightboxView {
    pub index: usize,
    /// 1-based position for the counter
    pub position: usize,
    pub total: usize,
    pub prev: usize,
    pub next: usize,
}

impl LightboxView {
    /// Lightbox opened at `requested`, or None when the list is empty
    pub fn at(len: usize, requested: usize) -> Option<Self> {
        if len == 0 {
            return None;
        }
        let mut slideshow = Slideshow::new(len);
        slideshow.open(requested);
        let index = slideshow.current_index();
        Some(Self {
            index,
            position: index + 1,
            total: len,
            prev: (index + len - 1) % len,
            next: (index + 1) % len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ms(base: Instant, millis: u64) -> Instant {
        base + Duration::from_millis(millis)
    }

    #[test]
    fn test_open_clamps_and_locks_scroll() {
        let mut s = Slideshow::new(3);
        s.open(10);
        assert_eq!(s.current_index(), 2);
        assert!(s.is_open());
        assert!(s.scroll_locked());

        s.close();
        assert!(!s.is_open());
        assert!(!s.scroll_locked());
    }

    #[test]
    fn test_navigation_wraps_and_respects_lock() {
        let t0 = Instant::now();
        let mut s = Slideshow::new(3);
        s.open(2);

        s.go_to_next(t0);
        assert_eq!(s.current_index(), 0);

        s.go_to_next(ms(t0, 100));
        assert_eq!(s.current_index(), 0, "locked during transition");

        s.go_to_prev(ms(t0, 200));
        assert_eq!(s.current_index(), 2);
    }

    #[test]
    fn test_empty_list_is_a_no_op() {
        let t0 = Instant::now();
        let mut s = Slideshow::new(0);
        s.open(4);
        s.go_to_next(t0);
        s.go_to_prev(ms(t0, 500));
        assert_eq!(s.current_index(), 0);
        assert!(!s.is_transitioning(t0));
    }

    #[test]
    fn test_keys() {
        let t0 = Instant::now();
        let mut s = Slideshow::new(4);
        s.open(1);

        s.handle_key(Key::from_dom("ArrowRight"), t0);
        assert_eq!(s.current_index(), 2);
        s.handle_key(Key::from_dom("ArrowLeft"), ms(t0, 300));
        assert_eq!(s.current_index(), 1);
        s.handle_key(Key::from_dom("Enter"), ms(t0, 600));
        assert_eq!(s.current_index(), 1);
        assert!(s.is_open());
        s.handle_key(Key::from_dom("Escape"), ms(t0, 900));
        assert!(!s.is_open());
    }

    #[test]
    fn test_swipes() {
        let t0 = Instant::now();
        let mut s = Slideshow::new(5);
        s.open(0);

        s.touch_start(300.0);
        s.touch_end(200.0, t0);
        assert_eq!(s.current_index(), 1);
        assert_eq!(s.touch_start_x(), None);

        s.touch_start(100.0);
        s.touch_end(140.0, ms(t0, 300));
        assert_eq!(s.current_index(), 1, "short swipe ignored");

        s.touch_start(100.0);
        s.touch_end(151.0, ms(t0, 600));
        assert_eq!(s.current_index(), 0);

        s.touch_end(0.0, ms(t0, 900));
        assert_eq!(s.current_index(), 0, "no touch in progress");
    }

    #[test]
    fn test_set_images_resets() {
        let t0 = Instant::now();
        let mut s = Slideshow::new(6);
        s.open(4);
        s.go_to_next(t0);
        s.set_images(2);
        assert_eq!(s.current_index(), 0);
        assert!(!s.is_open());
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_lightbox_view() {
        assert_eq!(LightboxView::at(0, 3), None);

        let view = LightboxView::at(4, 0).unwrap();
        assert_eq!((view.prev, view.next, view.position), (3, 1, 1));

        let clamped = LightboxView::at(4, 99).unwrap();
        assert_eq!(clamped.index, 3);
        assert_eq!(clamped.next, 0);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Open(usize),
        Close,
        Next(u64),
        Prev(u64),
        Key(u8, u64),
        Swipe(f64, f64, u64),
        SetImages(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..20).prop_map(Op::Open),
            Just(Op::Close),
            (0u64..400).prop_map(Op::Next),
            (0u64..400).prop_map(Op::Prev),
            (0u8..4, 0u64..400).prop_map(|(k, t)| Op::Key(k, t)),
            (0.0f64..500.0, 0.0f64..500.0, 0u64..400).prop_map(|(a, b, t)| Op::Swipe(a, b, t)),
            (0usize..8).prop_map(Op::SetImages),
        ]
    }

    proptest! {
        #[test]
        fn index_stays_in_bounds(len in 0usize..8, ops in proptest::collection::vec(op(), 0..60)) {
            let mut now = Instant::now();
            let mut s = Slideshow::new(len);
            for op in ops {
                match op {
                    Op::Open(i) => s.open(i),
                    Op::Close => s.close(),
                    Op::Next(dt) => { now += Duration::from_millis(dt); s.go_to_next(now) }
                    Op::Prev(dt) => { now += Duration::from_millis(dt); s.go_to_prev(now) }
                    Op::Key(k, dt) => {
                        now += Duration::from_millis(dt);
                        let key = [Key::Escape, Key::ArrowLeft, Key::ArrowRight, Key::Other][k as usize];
                        s.handle_key(key, now);
                    }
                    Op::Swipe(a, b, dt) => {
                        now += Duration::from_millis(dt);
                        s.touch_start(a);
                        s.touch_end(b, now);
                    }
                    Op::SetImages(n) => s.set_images(n),
                }
                if s.is_empty() {
                    prop_assert_eq!(s.current_index(), 0);
                } else {
                    prop_assert!(s.current_index() < s.len());
                }
            }
        }
    }
}
