#![forbid(unsafe_code)]

//! Offset middleware: translate the floating element away from the anchor.
//!
//! `main_axis` pushes along the placement side's axis (distance from the
//! anchor), `cross_axis` slides along the other axis (skidding), and
//! `alignment_axis` overrides the cross axis for aligned placements, with the
//! sign mirrored for `end` alignments. For top/bottom placements in RTL
//! writing mode the cross-axis sign flips so skidding stays logical.

use crate::geometry::Axis;
use crate::placement::{Alignment, Placement, Side};

use super::{Middleware, MiddlewareOutput, MiddlewareResult, MiddlewareState};

/// Configuration for the offset middleware.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    /// Distance from the anchor along the placement axis.
    pub main_axis: f64,
    /// Skidding along the cross axis.
    pub cross_axis: f64,
    /// Alignment-aware cross-axis value; overrides `cross_axis` on aligned
    /// placements and negates for `end`.
    pub alignment_axis: Option<f64>,
}

impl Offset {
    /// Offset by a distance along the placement axis.
    pub const fn new(main_axis: f64) -> Self {
        Self {
            main_axis,
            cross_axis: 0.0,
            alignment_axis: None,
        }
    }

    /// Set the cross-axis skidding.
    #[must_use]
    pub const fn cross_axis(mut self, value: f64) -> Self {
        self.cross_axis = value;
        self
    }

    /// Set the alignment-axis override.
    #[must_use]
    pub const fn alignment_axis(mut self, value: f64) -> Self {
        self.alignment_axis = Some(value);
        self
    }
}

/// Translation the offset middleware applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetData {
    pub x: f64,
    pub y: f64,
    /// Placement the translation was computed for.
    pub placement: Placement,
}

impl Middleware for Offset {
    fn name(&self) -> &'static str {
        "offset"
    }

    fn run(&self, state: &MiddlewareState<'_>) -> MiddlewareResult {
        // An arrow pass that nudged alignment already includes this offset in
        // the coordinates it preserved; re-applying would double it.
        if let (Some(offset), Some(arrow)) = (&state.data.offset, &state.data.arrow) {
            if arrow.alignment_offset.is_some() && offset.placement == state.placement {
                return MiddlewareResult::default();
            }
        }

        let rtl = state.platform.is_rtl(state.elements.floating);
        let (dx, dy) = convert_to_coords(self, state.placement, rtl);

        MiddlewareResult {
            x: Some(state.x + dx),
            y: Some(state.y + dy),
            data: Some(MiddlewareOutput::Offset(OffsetData {
                x: dx,
                y: dy,
                placement: state.placement,
            })),
            reset: None,
        }
    }
}

fn convert_to_coords(offset: &Offset, placement: Placement, rtl: bool) -> (f64, f64) {
    let side = placement.side;
    let is_vertical = side.axis() == Axis::Y;
    let main_sign = if matches!(side, Side::Left | Side::Top) {
        -1.0
    } else {
        1.0
    };
    let cross_sign = if rtl && is_vertical { -1.0 } else { 1.0 };

    let main = offset.main_axis;
    let mut cross = offset.cross_axis;
    if let (Some(alignment), Some(value)) = (placement.alignment, offset.alignment_axis) {
        cross = match alignment {
            Alignment::Start => value,
            Alignment::End => -value,
        };
    }

    if is_vertical {
        (cross * cross_sign, main * main_sign)
    } else {
        (main * main_sign, cross * cross_sign)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::{Alignment, Placement, Side};

    fn coords(offset: Offset, placement: Placement, rtl: bool) -> (f64, f64) {
        convert_to_coords(&offset, placement, rtl)
    }

    #[test]
    fn distance_pushes_away_from_anchor() {
        let offset = Offset::new(10.0);
        assert_eq!(coords(offset, Placement::base(Side::Top), false), (0.0, -10.0));
        assert_eq!(coords(offset, Placement::base(Side::Bottom), false), (0.0, 10.0));
        assert_eq!(coords(offset, Placement::base(Side::Left), false), (-10.0, 0.0));
        assert_eq!(coords(offset, Placement::base(Side::Right), false), (10.0, 0.0));
    }

    #[test]
    fn skidding_slides_along_cross_axis() {
        let offset = Offset::new(0.0).cross_axis(5.0);
        assert_eq!(coords(offset, Placement::base(Side::Top), false), (5.0, 0.0));
        assert_eq!(coords(offset, Placement::base(Side::Right), false), (0.0, 5.0));
    }

    #[test]
    fn rtl_flips_cross_axis_for_vertical_placements() {
        let offset = Offset::new(0.0).cross_axis(5.0);
        assert_eq!(coords(offset, Placement::base(Side::Top), true), (-5.0, 0.0));
        // Horizontal placements keep their sign.
        assert_eq!(coords(offset, Placement::base(Side::Right), true), (0.0, 5.0));
    }

    #[test]
    fn alignment_axis_overrides_and_negates_for_end() {
        let offset = Offset::new(0.0).cross_axis(5.0).alignment_axis(7.0);
        let start = Placement::aligned(Side::Top, Alignment::Start);
        let end = Placement::aligned(Side::Top, Alignment::End);
        assert_eq!(coords(offset, start, false), (7.0, 0.0));
        assert_eq!(coords(offset, end, false), (-7.0, 0.0));
        // Base placements ignore the alignment axis.
        assert_eq!(coords(offset, Placement::base(Side::Top), false), (5.0, 0.0));
    }
}
