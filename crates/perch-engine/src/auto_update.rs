#![forbid(unsafe_code)]

//! Auto-update scheduling for an active popup.
//!
//! Hosts deliver raw layout events (ancestor scrolls and resizes, element
//! resizes) as they happen; a scrolling user can produce dozens per frame.
//! [`AutoUpdate`] coalesces them with a push/flush split: [`notify`] marks
//! the popup dirty, [`on_frame`] consumes the dirty flag once per frame and
//! answers whether a reposition is due. A burst of events between two
//! flushes costs exactly one reposition.
//!
//! Two passive detectors run at flush time instead of on events:
//! `layout_shift` compares the anchor's origin between frames so the popup
//! follows an anchor that moved without any scroll firing, and
//! `animation_frame` compares the whole rect for continuous tracking (drag).
//! Both use an epsilon so sub-pixel measurement jitter stays quiet.
//!
//! [`notify`]: AutoUpdate::notify
//! [`on_frame`]: AutoUpdate::on_frame

use perch_core::{ElementId, Rect};
use rustc_hash::FxHashSet;
use tracing::trace;

/// Rect deltas at or below this are measurement noise, not movement.
const MOVEMENT_EPSILON: f64 = 1e-3;

/// A layout change delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutEvent {
    /// A scroll container in either element's ancestor chain scrolled.
    AncestorScroll(ElementId),
    /// An ancestor changed size.
    AncestorResize(ElementId),
    /// The anchor or popup itself changed size.
    ElementResize(ElementId),
}

/// Which triggers cause a reposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoUpdateOptions {
    pub ancestor_scroll: bool,
    pub ancestor_resize: bool,
    pub element_resize: bool,
    /// Follow anchor origin changes with no associated event.
    pub layout_shift: bool,
    /// Reposition whenever the anchor rect changes at all, every frame.
    pub animation_frame: bool,
}

impl Default for AutoUpdateOptions {
    fn default() -> Self {
        Self {
            ancestor_scroll: true,
            ancestor_resize: true,
            element_resize: true,
            layout_shift: true,
            animation_frame: false,
        }
    }
}

/// Coalesces layout events into at most one reposition per frame.
#[derive(Debug)]
pub struct AutoUpdate {
    options: AutoUpdateOptions,
    reference: ElementId,
    floating: ElementId,
    /// Scroll ancestors of both elements; events from anything else are
    /// not ours to react to.
    watched: FxHashSet<ElementId>,
    /// A resize observer fires once on attach; that first callback for the
    /// reference describes the state we just measured, not a change.
    saw_initial_reference_resize: bool,
    dirty: bool,
    last_reference_rect: Option<Rect>,
    active: bool,
}

impl AutoUpdate {
    /// Start watching. `watched` is the combined scroll-ancestor set of the
    /// reference and floating elements, as reported by the platform.
    #[must_use]
    pub fn new(
        reference: ElementId,
        floating: ElementId,
        watched: Vec<ElementId>,
        options: AutoUpdateOptions,
    ) -> Self {
        Self {
            options,
            reference,
            floating,
            watched: watched.into_iter().collect(),
            saw_initial_reference_resize: false,
            dirty: false,
            last_reference_rect: None,
            active: true,
        }
    }

    /// Feed one layout event. Returns whether this event marked the popup
    /// dirty; repeated events before the next flush coalesce into one.
    pub fn notify(&mut self, event: LayoutEvent) -> bool {
        if !self.active {
            return false;
        }
        let relevant = match event {
            LayoutEvent::AncestorScroll(id) => {
                self.options.ancestor_scroll && self.watched.contains(&id)
            }
            LayoutEvent::AncestorResize(id) => {
                self.options.ancestor_resize && self.watched.contains(&id)
            }
            LayoutEvent::ElementResize(id) => {
                if !self.options.element_resize {
                    false
                } else if id == self.reference && !self.saw_initial_reference_resize {
                    self.saw_initial_reference_resize = true;
                    trace!(element = %id, "skipping initial reference resize callback");
                    false
                } else {
                    id == self.reference || id == self.floating
                }
            }
        };
        if relevant {
            self.dirty = true;
        }
        relevant
    }

    /// Frame flush: consume the dirty flag and run the passive rect
    /// detectors. Returns whether the popup should reposition now.
    pub fn on_frame(&mut self, reference_rect: Option<Rect>) -> bool {
        if !self.active {
            return false;
        }
        let mut fire = self.dirty;
        self.dirty = false;

        if let Some(rect) = reference_rect {
            if let Some(last) = self.last_reference_rect {
                let moved = (rect.x - last.x).abs() > MOVEMENT_EPSILON
                    || (rect.y - last.y).abs() > MOVEMENT_EPSILON;
                let resized = (rect.width - last.width).abs() > MOVEMENT_EPSILON
                    || (rect.height - last.height).abs() > MOVEMENT_EPSILON;
                if self.options.animation_frame && (moved || resized) {
                    fire = true;
                } else if self.options.layout_shift && moved {
                    fire = true;
                }
            }
            self.last_reference_rect = Some(rect);
        }

        fire
    }

    /// Whether an event has been recorded since the last flush.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.dirty
    }

    /// Stop watching. Idempotent; further events and flushes are ignored.
    pub fn stop(&mut self) {
        self.active = false;
        self.dirty = false;
        self.watched.clear();
        self.last_reference_rect = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (ElementId, ElementId, ElementId) {
        (
            ElementId::new(1).unwrap(),
            ElementId::new(2).unwrap(),
            ElementId::new(3).unwrap(),
        )
    }

    #[test]
    fn scroll_burst_coalesces_to_one_flush() {
        let (reference, floating, scroller) = ids();
        let mut auto =
            AutoUpdate::new(reference, floating, vec![scroller], AutoUpdateOptions::default());

        for _ in 0..100 {
            auto.notify(LayoutEvent::AncestorScroll(scroller));
        }
        assert!(auto.has_pending());
        assert!(auto.on_frame(None));
        // The burst is spent; the next frame is quiet.
        assert!(!auto.on_frame(None));
    }

    #[test]
    fn unwatched_ancestor_is_ignored() {
        let (reference, floating, scroller) = ids();
        let stranger = ElementId::new(99).unwrap();
        let mut auto =
            AutoUpdate::new(reference, floating, vec![scroller], AutoUpdateOptions::default());

        assert!(!auto.notify(LayoutEvent::AncestorScroll(stranger)));
        assert!(!auto.on_frame(None));
    }

    #[test]
    fn first_reference_resize_is_skipped() {
        let (reference, floating, _) = ids();
        let mut auto =
            AutoUpdate::new(reference, floating, Vec::new(), AutoUpdateOptions::default());

        assert!(!auto.notify(LayoutEvent::ElementResize(reference)));
        assert!(!auto.on_frame(None));
        // The second one is a real change.
        assert!(auto.notify(LayoutEvent::ElementResize(reference)));
        assert!(auto.on_frame(None));
    }

    #[test]
    fn floating_resize_fires_immediately() {
        let (reference, floating, _) = ids();
        let mut auto =
            AutoUpdate::new(reference, floating, Vec::new(), AutoUpdateOptions::default());

        assert!(auto.notify(LayoutEvent::ElementResize(floating)));
    }

    #[test]
    fn disabled_triggers_stay_quiet() {
        let (reference, floating, scroller) = ids();
        let options = AutoUpdateOptions {
            ancestor_scroll: false,
            ancestor_resize: false,
            element_resize: false,
            layout_shift: false,
            animation_frame: false,
        };
        let mut auto = AutoUpdate::new(reference, floating, vec![scroller], options);

        auto.notify(LayoutEvent::AncestorScroll(scroller));
        auto.notify(LayoutEvent::AncestorResize(scroller));
        auto.notify(LayoutEvent::ElementResize(floating));
        assert!(!auto.on_frame(None));
    }

    #[test]
    fn layout_shift_detects_anchor_movement() {
        let (reference, floating, _) = ids();
        let mut auto =
            AutoUpdate::new(reference, floating, Vec::new(), AutoUpdateOptions::default());

        // First observation only establishes the baseline.
        assert!(!auto.on_frame(Some(Rect::new(10.0, 10.0, 50.0, 20.0))));
        // Same rect: quiet.
        assert!(!auto.on_frame(Some(Rect::new(10.0, 10.0, 50.0, 20.0))));
        // Moved origin: fire.
        assert!(auto.on_frame(Some(Rect::new(10.0, 40.0, 50.0, 20.0))));
    }

    #[test]
    fn layout_shift_ignores_subpixel_jitter() {
        let (reference, floating, _) = ids();
        let mut auto =
            AutoUpdate::new(reference, floating, Vec::new(), AutoUpdateOptions::default());

        assert!(!auto.on_frame(Some(Rect::new(10.0, 10.0, 50.0, 20.0))));
        assert!(!auto.on_frame(Some(Rect::new(10.0005, 10.0, 50.0, 20.0))));
    }

    #[test]
    fn layout_shift_ignores_pure_resize() {
        let (reference, floating, _) = ids();
        let mut auto =
            AutoUpdate::new(reference, floating, Vec::new(), AutoUpdateOptions::default());

        assert!(!auto.on_frame(Some(Rect::new(10.0, 10.0, 50.0, 20.0))));
        // Size changed, origin did not; the resize observer path covers this.
        assert!(!auto.on_frame(Some(Rect::new(10.0, 10.0, 80.0, 20.0))));
    }

    #[test]
    fn animation_frame_tracks_any_rect_change() {
        let (reference, floating, _) = ids();
        let options = AutoUpdateOptions {
            animation_frame: true,
            ..AutoUpdateOptions::default()
        };
        let mut auto = AutoUpdate::new(reference, floating, Vec::new(), options);

        assert!(!auto.on_frame(Some(Rect::new(0.0, 0.0, 50.0, 20.0))));
        assert!(auto.on_frame(Some(Rect::new(0.0, 0.0, 60.0, 20.0))));
        assert!(!auto.on_frame(Some(Rect::new(0.0, 0.0, 60.0, 20.0))));
    }

    #[test]
    fn stop_is_idempotent_and_final() {
        let (reference, floating, scroller) = ids();
        let mut auto =
            AutoUpdate::new(reference, floating, vec![scroller], AutoUpdateOptions::default());

        auto.notify(LayoutEvent::AncestorScroll(scroller));
        auto.stop();
        auto.stop();
        assert!(!auto.has_pending());
        assert!(!auto.notify(LayoutEvent::AncestorScroll(scroller)));
        assert!(!auto.on_frame(Some(Rect::new(0.0, 0.0, 1.0, 1.0))));
    }
}
