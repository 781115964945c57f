#![forbid(unsafe_code)]

//! Shift middleware: slide the floating element back inside the boundary.
//!
//! Clamps each checked axis independently so the element's protrusion never
//! exceeds the padding; the placement itself never changes. The main shift
//! axis is the cross axis of the placement side (a `top` popup shifts
//! horizontally).

use crate::geometry::{Axis, Sides};
use crate::overflow::{OverflowOptions, detect_overflow};
use crate::placement::Side;
use crate::platform::Boundary;

use super::{Middleware, MiddlewareOutput, MiddlewareResult, MiddlewareState};

/// Configuration for the shift middleware.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shift {
    /// Clamp along the shift axis (cross axis of the placement).
    pub main_axis: bool,
    /// Also clamp along the placement side's axis.
    pub cross_axis: bool,
    /// Boundary to clip against.
    pub boundary: Boundary,
    /// Minimum distance kept from the boundary edge.
    pub padding: Sides,
}

impl Default for Shift {
    fn default() -> Self {
        Self {
            main_axis: true,
            cross_axis: false,
            boundary: Boundary::default(),
            padding: Sides::default(),
        }
    }
}

impl Shift {
    /// Shift with uniform boundary padding.
    #[must_use]
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = Sides::all(padding);
        self
    }

    /// Also clamp the placement-side axis.
    #[must_use]
    pub const fn with_cross_axis(mut self, enabled: bool) -> Self {
        self.cross_axis = enabled;
        self
    }
}

/// Translation the shift middleware applied, and which axes it watched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShiftData {
    pub x: f64,
    pub y: f64,
    pub enabled_x: bool,
    pub enabled_y: bool,
}

impl Middleware for Shift {
    fn name(&self) -> &'static str {
        "shift"
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

        let side_axis = state.placement.side_axis();
        let shift_axis = side_axis.opposite();
        let mut x = state.x;
        let mut y = state.y;

        if self.main_axis {
            let coord = axis_coord(x, y, shift_axis);
            let (min_side, max_side) = axis_sides(shift_axis);
            let min = coord + overflow.side(min_side);
            let max = coord - overflow.side(max_side);
            set_axis_coord(&mut x, &mut y, shift_axis, clamp(min, coord, max));
        }
        if self.cross_axis {
            let coord = axis_coord(x, y, side_axis);
            let (min_side, max_side) = axis_sides(side_axis);
            let min = coord + overflow.side(min_side);
            let max = coord - overflow.side(max_side);
            set_axis_coord(&mut x, &mut y, side_axis, clamp(min, coord, max));
        }

        let enabled_x = (self.main_axis && shift_axis == Axis::X)
            || (self.cross_axis && side_axis == Axis::X);
        let enabled_y = (self.main_axis && shift_axis == Axis::Y)
            || (self.cross_axis && side_axis == Axis::Y);

        MiddlewareResult {
            x: Some(x),
            y: Some(y),
            data: Some(MiddlewareOutput::Shift(ShiftData {
                x: x - state.x,
                y: y - state.y,
                enabled_x,
                enabled_y,
            })),
            reset: None,
        }
    }
}

const fn axis_sides(axis: Axis) -> (Side, Side) {
    match axis {
        Axis::X => (Side::Left, Side::Right),
        Axis::Y => (Side::Top, Side::Bottom),
    }
}

const fn axis_coord(x: f64, y: f64, axis: Axis) -> f64 {
    match axis {
        Axis::X => x,
        Axis::Y => y,
    }
}

fn set_axis_coord(x: &mut f64, y: &mut f64, axis: Axis, value: f64) {
    match axis {
        Axis::X => *x = value,
        Axis::Y => *y = value,
    }
}

/// Clamp with the lower bound winning when the range is inverted (the element
/// is larger than the boundary; pinning to the start edge is the stable
/// choice).
fn clamp(min: f64, value: f64, max: f64) -> f64 {
    min.max(value.min(max))
}
