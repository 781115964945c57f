#![forbid(unsafe_code)]

//! Boundary overflow detection.
//!
//! [`detect_overflow`] reports how far an element protrudes past a clipping
//! boundary on each side, in pixels. Positive values are protrusion, zero is
//! flush, negative values are slack. Every boundary-aware middleware (flip,
//! shift, size) is built on this single primitive.

use crate::geometry::{Rect, Sides};
use crate::middleware::MiddlewareState;
use crate::platform::Boundary;
use crate::placement::Side;

/// Pixels of protrusion past the boundary, per side.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Overflow {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Overflow {
    /// Protrusion on one side.
    #[inline]
    pub const fn side(&self, side: Side) -> f64 {
        match side {
            Side::Top => self.top,
            Side::Right => self.right,
            Side::Bottom => self.bottom,
            Side::Left => self.left,
        }
    }

    /// Sum of the positive protrusions.
    pub fn total_positive(&self) -> f64 {
        [self.top, self.right, self.bottom, self.left]
            .into_iter()
            .filter(|v| *v > 0.0)
            .sum()
    }

    /// Whether the element fits entirely inside the boundary.
    pub fn fits(&self) -> bool {
        self.top <= 0.0 && self.right <= 0.0 && self.bottom <= 0.0 && self.left <= 0.0
    }
}

/// Which element's rectangle is checked against the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementContext {
    Reference,
    #[default]
    Floating,
}

impl ElementContext {
    const fn opposite(self) -> Self {
        match self {
            Self::Reference => Self::Floating,
            Self::Floating => Self::Reference,
        }
    }
}

/// Options for [`detect_overflow`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OverflowOptions {
    /// Clipping context to check against.
    pub boundary: Boundary,
    /// Which element to check.
    pub element_context: ElementContext,
    /// Clip against the boundary of the *other* element.
    pub alt_boundary: bool,
    /// Virtual inset of the boundary; overflow is reported relative to the
    /// padded edge.
    pub padding: Sides,
}

impl OverflowOptions {
    /// Options with the given uniform padding, defaults otherwise.
    pub fn with_padding(padding: f64) -> Self {
        Self {
            padding: Sides::all(padding),
            ..Self::default()
        }
    }
}

/// Measure the checked element's protrusion past the boundary.
pub fn detect_overflow(state: &MiddlewareState<'_>, options: &OverflowOptions) -> Overflow {
    let context = if options.alt_boundary {
        options.element_context.opposite()
    } else {
        options.element_context
    };
    let clip_target = match context {
        ElementContext::Floating => state.elements.floating,
        ElementContext::Reference => state.elements.reference,
    };

    let clip = state
        .platform
        .clipping_rect(clip_target, options.boundary, state.strategy);

    // The checked rect is in the positioning space; the clip rect is in
    // viewport coordinates. Convert before comparing.
    let rect = match options.element_context {
        ElementContext::Floating => Rect::new(
            state.x,
            state.y,
            state.rects.floating.width,
            state.rects.floating.height,
        ),
        ElementContext::Reference => state.rects.reference,
    };
    let rect = state
        .platform
        .offset_to_viewport(rect, state.elements.floating, state.strategy);

    let padding = options.padding;
    Overflow {
        top: clip.top() - rect.top() + padding.top,
        bottom: rect.bottom() - clip.bottom() + padding.bottom,
        left: clip.left() - rect.left() + padding.left,
        right: rect.right() - clip.right() + padding.right,
    }
}
