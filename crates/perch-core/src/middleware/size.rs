#![forbid(unsafe_code)]

//! Size middleware: report the space available up to the boundary.
//!
//! Computes `available_width`/`available_height` for the resolved placement
//! (shift-aware: once shift has clamped an axis, the full clipped span is
//! usable) and hands them to an `apply` hook. The hook typically resizes the
//! floating element or publishes CSS variables; if the element's dimensions
//! changed as a result, the middleware requests a rects reset so the pipeline
//! re-measures at the new intrinsic size.

use std::fmt;

use crate::geometry::{Axis, Sides};
use crate::overflow::{OverflowOptions, detect_overflow};
use crate::placement::{Alignment, Side};
use crate::platform::Boundary;

use super::{Middleware, MiddlewareOutput, MiddlewareResult, MiddlewareState, Reset};

/// Hook receiving the available space for the current pass.
pub type ApplyFn = Box<dyn Fn(f64, f64)>;

/// Configuration for the size middleware.
pub struct Size {
    /// Boundary to measure against.
    pub boundary: Boundary,
    /// Padding inset on the boundary.
    pub padding: Sides,
    /// Called with `(available_width, available_height)` each pass.
    pub apply: Option<ApplyFn>,
}

impl Default for Size {
    fn default() -> Self {
        Self {
            boundary: Boundary::default(),
            padding: Sides::default(),
            apply: None,
        }
    }
}

impl fmt::Debug for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Size")
            .field("boundary", &self.boundary)
            .field("padding", &self.padding)
            .field("apply", &self.apply.as_ref().map(|_| "Fn"))
            .finish()
    }
}

impl Size {
    /// Size with uniform boundary padding.
    #[must_use]
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = Sides::all(padding);
        self
    }

    /// Install the apply hook.
    #[must_use]
    pub fn with_apply(mut self, apply: ApplyFn) -> Self {
        self.apply = Some(apply);
        self
    }
}

/// Space available to the floating element on the last pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SizeData {
    pub available_width: f64,
    pub available_height: f64,
}

impl Middleware for Size {
    fn name(&self) -> &'static str {
        "size"
    }

    fn run(&self, state: &MiddlewareState<'_>) -> MiddlewareResult {
        let overflow = detect_overflow(
            state,
            &OverflowOptions {
                boundary: self.boundary,
                padding: self.padding,
                ..OverflowOptions::default()
            },
        );

        let placement = state.placement;
        let side = placement.side;
        let alignment = placement.alignment;
        let is_y_side = side.axis() == Axis::Y;
        let rtl = state.platform.is_rtl(state.elements.floating);
        let floating = state.rects.floating;

        // The sides growth is limited on, given where the element attaches.
        let (width_side, height_side) = if is_y_side {
            let end = if rtl { Alignment::Start } else { Alignment::End };
            let width_side = if alignment == Some(end) {
                Side::Left
            } else {
                Side::Right
            };
            (width_side, side)
        } else {
            let height_side = if alignment == Some(Alignment::End) {
                Side::Top
            } else {
                Side::Bottom
            };
            (side, height_side)
        };

        let maximum_clipping_width = floating.width - overflow.left - overflow.right;
        let maximum_clipping_height = floating.height - overflow.top - overflow.bottom;

        let mut available_width = floating.width - overflow.side(width_side);
        let mut available_height = floating.height - overflow.side(height_side);

        if let Some(shift) = &state.data.shift {
            if shift.enabled_x {
                available_width = maximum_clipping_width;
            }
            if shift.enabled_y {
                available_height = maximum_clipping_height;
            }
        }

        // Centered placements without shift overflow symmetrically; both
        // protruding edges cost space.
        if state.data.shift.is_none() && alignment.is_none() {
            let x_min = overflow.left.max(0.0);
            let x_max = overflow.right.max(0.0);
            let y_min = overflow.top.max(0.0);
            let y_max = overflow.bottom.max(0.0);
            if is_y_side {
                available_width = floating.width
                    - 2.0 * if x_min != 0.0 || x_max != 0.0 {
                        x_min + x_max
                    } else {
                        overflow.left.max(overflow.right)
                    };
            } else {
                available_height = floating.height
                    - 2.0 * if y_min != 0.0 || y_max != 0.0 {
                        y_min + y_max
                    } else {
                        overflow.top.max(overflow.bottom)
                    };
            }
        }

        if let Some(apply) = &self.apply {
            apply(available_width, available_height);
        }

        let data = MiddlewareOutput::Size(SizeData {
            available_width,
            available_height,
        });

        // The hook may have resized the element; re-measure and restart if so.
        if let Ok(next) = state.platform.dimensions(state.elements.floating) {
            if next.width != floating.width || next.height != floating.height {
                return MiddlewareResult {
                    data: Some(data),
                    reset: Some(Reset::with_rects()),
                    ..MiddlewareResult::default()
                };
            }
        }

        MiddlewareResult {
            data: Some(data),
            ..MiddlewareResult::default()
        }
    }
}
