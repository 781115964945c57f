#![forbid(unsafe_code)]

//! Placement math and middleware pipeline for anchored floating elements.
//!
//! `perch-core` is host-agnostic: it computes where a floating element
//! (tooltip, dropdown, dialog panel) goes relative to an anchor, given
//! rectangles and boundaries supplied through the [`Platform`] trait. The
//! pipeline is a list of composable middleware ([`Offset`], [`Flip`],
//! [`Shift`], [`Size`], [`Arrow`]) run to a bounded fixed point by
//! [`compute_position`].
//!
//! Coordinate handling, style writes, and lifecycle live in `perch-engine`;
//! the in-memory reference host lives in `perch-host`.

pub mod compute;
pub mod geometry;
pub mod middleware;
pub mod overflow;
pub mod placement;
pub mod platform;

pub use compute::{ComputedPosition, MAX_RESETS, PositionError, PositionRequest, compute_position};
pub use geometry::{Axis, Dimensions, Point, Rect, Scale, Sides};
pub use middleware::{
    Arrow, ArrowData, Elements, FallbackStrategy, Flip, FlipData, Middleware, MiddlewareData,
    MiddlewareOutput, MiddlewareResult, MiddlewareState, Offset, OffsetData, PlacementOverflow,
    Reset, Shift, ShiftData, Size, SizeData,
};
pub use overflow::{ElementContext, Overflow, OverflowOptions, detect_overflow};
pub use placement::{
    ALL_PLACEMENTS, Alignment, ElementRects, ParsePlacementError, Placement, Side,
    alignment_sides, resolve_position,
};
pub use platform::{Boundary, ElementId, Platform, PlatformError, Strategy, StyleSink};
