#![forbid(unsafe_code)]

//! Arrow middleware: position a pointer element along the shared edge.
//!
//! The arrow slides along the floating element's attachment edge so it points
//! at the reference, clamped to `[padding, size - arrow - padding]`. When the
//! reference is so small (or so far past the corner) that the clamped arrow
//! could not reach it, the middleware nudges the whole floating box by the
//! residual and restarts the pipeline once, recording `alignment_offset` so
//! offset and flip leave the nudge alone.

use crate::geometry::{Axis, Sides};
use crate::platform::ElementId;

use super::{Middleware, MiddlewareOutput, MiddlewareResult, MiddlewareState, Reset};

/// Configuration for the arrow middleware.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrow {
    /// The arrow element; its dimensions come from the platform.
    pub element: ElementId,
    /// Minimum distance kept from the floating element's corners.
    pub padding: Sides,
}

impl Arrow {
    /// Arrow with no corner padding.
    pub const fn new(element: ElementId) -> Self {
        Self {
            element,
            padding: Sides::all(0.0),
        }
    }

    /// Set uniform corner padding.
    #[must_use]
    pub const fn with_padding(mut self, padding: f64) -> Self {
        self.padding = Sides::all(padding);
        self
    }
}

/// Arrow middleware output.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ArrowData {
    /// Arrow offset from the floating element's left edge, when the arrow
    /// slides horizontally.
    pub x: Option<f64>,
    /// Arrow offset from the floating element's top edge, when the arrow
    /// slides vertically.
    pub y: Option<f64>,
    /// How far the clamp pulled the arrow off the reference center; zero
    /// means the arrow points exactly at it.
    pub center_offset: f64,
    /// Nudge applied to the floating box itself so the arrow could center
    /// over a reference smaller than the floating element.
    pub alignment_offset: Option<f64>,
}

impl Middleware for Arrow {
    fn name(&self) -> &'static str {
        "arrow"
    }

    fn run(&self, state: &MiddlewareState<'_>) -> MiddlewareResult {
        let Ok(arrow_dims) = state.platform.dimensions(self.element) else {
            return MiddlewareResult::default();
        };

        let placement = state.placement;
        let axis = placement.alignment_axis();
        let coord = match axis {
            Axis::X => state.x,
            Axis::Y => state.y,
        };
        let reference = state.rects.reference;
        let floating = state.rects.floating;

        let reference_start = reference.axis_start(axis);
        let reference_length = reference.length(axis);
        let floating_length = floating.length(axis);
        let arrow_length = arrow_dims.length(axis);

        let (min_padding_raw, max_padding_raw) = match axis {
            Axis::X => (self.padding.left, self.padding.right),
            Axis::Y => (self.padding.top, self.padding.bottom),
        };

        let end_diff = reference_length + reference_start - coord - floating_length;
        let start_diff = coord - reference_start;
        let center_to_reference = end_diff / 2.0 - start_diff / 2.0;

        // Padding cannot eat more than the edge minus the arrow itself.
        let client_size = floating_length;
        let largest_possible_padding = client_size / 2.0 - arrow_length / 2.0 - 1.0;
        let min_padding = min_padding_raw.min(largest_possible_padding);
        let max_padding = max_padding_raw.min(largest_possible_padding);

        let min = min_padding;
        let max = client_size - arrow_length - max_padding;
        let center = client_size / 2.0 - arrow_length / 2.0 + center_to_reference;
        let offset = min.max(center.min(max));

        // Aligned placements over a small reference: move the box instead of
        // leaving the arrow pinned off-target. Only once per computation.
        let should_nudge = state
            .data
            .arrow
            .as_ref()
            .is_none_or(|data| data.alignment_offset.is_none())
            && placement.alignment.is_some()
            && center != offset
            && reference_length / 2.0
                - if center < min { min_padding } else { max_padding }
                - arrow_length / 2.0
                < 0.0;
        let alignment_offset = if should_nudge {
            if center < min { center - min } else { center - max }
        } else {
            0.0
        };

        let mut data = ArrowData {
            x: None,
            y: None,
            center_offset: center - offset - alignment_offset,
            alignment_offset: should_nudge.then_some(alignment_offset),
        };
        let mut result = MiddlewareResult::default();
        match axis {
            Axis::X => {
                data.x = Some(offset);
                result.x = Some(coord + alignment_offset);
            }
            Axis::Y => {
                data.y = Some(offset);
                result.y = Some(coord + alignment_offset);
            }
        }
        result.data = Some(MiddlewareOutput::Arrow(data));
        if should_nudge {
            // Plain restart: keep coordinates, let earlier middleware see the
            // recorded alignment offset.
            result.reset = Some(Reset::default());
        }
        result
    }
}
