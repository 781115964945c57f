#![forbid(unsafe_code)]

//! Perch public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users. It
//! re-exports the common types from the internal crates and offers a
//! lightweight prelude for day-to-day usage.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use perch_core::geometry::{Axis, Dimensions, Point, Rect, Scale, Sides};
pub use perch_core::middleware::{
    Arrow, FallbackStrategy, Flip, Middleware, MiddlewareData, MiddlewareResult, MiddlewareState,
    Offset, Reset, Shift, Size,
};
pub use perch_core::placement::{
    ALL_PLACEMENTS, Alignment, ElementRects, Placement, Side, resolve_position,
};
pub use perch_core::platform::{Boundary, ElementId, Platform, Strategy, StyleSink};
pub use perch_core::{ComputedPosition, PositionRequest, compute_position, detect_overflow};

// --- Engine re-exports -----------------------------------------------------

pub use perch_engine::{
    ArrowPlacement, AutoSizeAxis, AutoUpdate, AutoUpdateOptions, LayoutEvent, PopupConfig,
    PopupController, SyncAxis,
};

// --- Host re-exports -------------------------------------------------------

pub use perch_host::{HostDocument, NodeSpec, OverflowKind, PositionKind, Viewport};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for perch apps.
#[derive(Debug)]
pub enum Error {
    /// The pipeline could not run (missing element, measurement failure).
    Position(perch_core::PositionError),
    /// Configuration parse failure (placement spellings and friends).
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position(err) => write!(f, "{err}"),
            Self::Config(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Position(err) => Some(err),
            Self::Config(_) => None,
        }
    }
}

impl From<perch_core::PositionError> for Error {
    fn from(err: perch_core::PositionError) -> Self {
        Self::Position(err)
    }
}

impl From<perch_core::ParsePlacementError> for Error {
    fn from(err: perch_core::ParsePlacementError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Standard result type for perch APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Error, HostDocument, Placement, PopupConfig, PopupController, Rect, Result, Side,
        Strategy, compute_position,
    };

    pub use crate::{core, engine, host};
}

pub use perch_core as core;
pub use perch_engine as engine;
pub use perch_host as host;
