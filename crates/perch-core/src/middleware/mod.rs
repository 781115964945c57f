#![forbid(unsafe_code)]

//! The middleware pipeline.
//!
//! A middleware is a named transform over the current position. The compute
//! loop runs them in caller order; each sees the coordinates produced by the
//! previous one and may adjust them, attach data for later middleware (or the
//! caller), or request a reset (a re-measure and pipeline restart, bounded
//! by the orchestrator).
//!
//! Order matters: offset before flip (flip judges the offset position), shift
//! after flip (clamp whatever placement won), arrow last (it reads the final
//! box).

pub mod arrow;
pub mod flip;
pub mod offset;
pub mod shift;
pub mod size;

pub use arrow::{Arrow, ArrowData};
pub use flip::{FallbackStrategy, Flip, FlipData, PlacementOverflow};
pub use offset::{Offset, OffsetData};
pub use shift::{Shift, ShiftData};
pub use size::{Size, SizeData};

use crate::placement::{ElementRects, Placement};
use crate::platform::{ElementId, Platform, Strategy};

/// The element pair being positioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elements {
    pub reference: ElementId,
    pub floating: ElementId,
}

/// Pipeline state threaded through every middleware.
///
/// Created fresh per `compute_position` call and discarded once the pipeline
/// settles; nothing here persists across calls.
pub struct MiddlewareState<'a> {
    /// Current x of the floating element's top-left corner.
    pub x: f64,
    /// Current y of the floating element's top-left corner.
    pub y: f64,
    /// Placement requested by the caller.
    pub initial_placement: Placement,
    /// Placement currently in effect (a flip reset can change it).
    pub placement: Placement,
    pub strategy: Strategy,
    pub rects: ElementRects,
    pub elements: Elements,
    pub platform: &'a dyn Platform,
    /// Outputs of middleware that already ran (survives resets).
    pub data: MiddlewareData,
}

/// Accumulated middleware outputs, one slot per middleware.
///
/// Slots survive resets: flip's attempt index and arrow's alignment offset
/// must be visible on the next pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MiddlewareData {
    pub offset: Option<OffsetData>,
    pub flip: Option<FlipData>,
    pub shift: Option<ShiftData>,
    pub size: Option<SizeData>,
    pub arrow: Option<ArrowData>,
}

impl MiddlewareData {
    /// Store one middleware's output in its slot.
    pub fn merge(&mut self, output: MiddlewareOutput) {
        match output {
            MiddlewareOutput::Offset(data) => self.offset = Some(data),
            MiddlewareOutput::Flip(data) => self.flip = Some(data),
            MiddlewareOutput::Shift(data) => self.shift = Some(data),
            MiddlewareOutput::Size(data) => self.size = Some(data),
            MiddlewareOutput::Arrow(data) => self.arrow = Some(data),
        }
    }
}

/// One middleware's output payload.
#[derive(Debug, Clone, PartialEq)]
pub enum MiddlewareOutput {
    Offset(OffsetData),
    Flip(FlipData),
    Shift(ShiftData),
    Size(SizeData),
    Arrow(ArrowData),
}

/// A request to re-measure and restart the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reset {
    /// Switch to this placement before restarting.
    pub placement: Option<Placement>,
    /// Re-measure `ElementRects` (dimensions changed).
    pub rects: bool,
}

impl Reset {
    /// Reset to a new placement.
    pub const fn to_placement(placement: Placement) -> Self {
        Self {
            placement: Some(placement),
            rects: false,
        }
    }

    /// Reset with fresh rects, same placement.
    pub const fn with_rects() -> Self {
        Self {
            placement: None,
            rects: true,
        }
    }
}

/// What a middleware hands back to the loop.
#[derive(Debug, Clone, Default)]
pub struct MiddlewareResult {
    /// Replacement x, if adjusted.
    pub x: Option<f64>,
    /// Replacement y, if adjusted.
    pub y: Option<f64>,
    /// Output to store in this middleware's data slot.
    pub data: Option<MiddlewareOutput>,
    /// Restart request.
    pub reset: Option<Reset>,
}

/// A named, composable positioning transform.
pub trait Middleware {
    /// Stable name, used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Run against the current pipeline state.
    fn run(&self, state: &MiddlewareState<'_>) -> MiddlewareResult;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::{Placement, Side};

    #[test]
    fn merge_fills_the_matching_slot() {
        let mut data = MiddlewareData::default();
        data.merge(MiddlewareOutput::Offset(OffsetData {
            x: 1.0,
            y: 2.0,
            placement: Placement::base(Side::Top),
        }));
        assert!(data.offset.is_some());
        assert!(data.flip.is_none());

        data.merge(MiddlewareOutput::Shift(ShiftData {
            x: 3.0,
            y: 0.0,
            enabled_x: true,
            enabled_y: false,
        }));
        assert!(data.offset.is_some());
        assert_eq!(data.shift.unwrap().x, 3.0);
    }

    #[test]
    fn reset_constructors() {
        let reset = Reset::to_placement(Placement::base(Side::Bottom));
        assert_eq!(reset.placement, Some(Placement::base(Side::Bottom)));
        assert!(!reset.rects);
        assert!(Reset::with_rects().rects);
    }
}
