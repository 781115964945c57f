#![forbid(unsafe_code)]

//! The bounded positioning loop.
//!
//! Measures the element pair, resolves the initial position, and runs the
//! middleware in caller order. A middleware's reset restarts the pipeline:
//! an explicit loop with an iteration budget rather than recursion, so stack
//! depth stays constant and the termination bound is auditable. After
//! [`MAX_RESETS`] resets the last computed position wins silently; that is a
//! safety valve, not an error.

use std::fmt;

use crate::middleware::{Elements, Middleware, MiddlewareData, MiddlewareState};
use crate::placement::{ElementRects, Placement, resolve_position};
use crate::platform::{ElementId, Platform, PlatformError, Strategy};

/// Upper bound on pipeline restarts per computation.
pub const MAX_RESETS: usize = 50;

/// Errors surfaced at computation time.
///
/// Missing elements are configuration mistakes and fail fast with the
/// offending handle; boundary problems never reach here (the platform
/// degrades those to the viewport).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    /// The anchor element is gone or was never valid.
    MissingAnchor(ElementId),
    /// The floating element is gone or was never valid.
    MissingFloating(ElementId),
    /// The platform could not measure the pair.
    Platform(PlatformError),
}

impl fmt::Display for PositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAnchor(id) => {
                write!(f, "anchor element {id} does not exist or is detached")
            }
            Self::MissingFloating(id) => {
                write!(f, "floating element {id} does not exist or is detached")
            }
            Self::Platform(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for PositionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Platform(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PlatformError> for PositionError {
    fn from(err: PlatformError) -> Self {
        Self::Platform(err)
    }
}

/// What to compute: the preferred placement, the coordinate space, and the
/// middleware stack in execution order.
pub struct PositionRequest<'a> {
    pub placement: Placement,
    pub strategy: Strategy,
    pub middleware: &'a [Box<dyn Middleware>],
}

/// The settled result of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedPosition {
    /// Final x of the floating element in its positioning space.
    pub x: f64,
    /// Final y of the floating element in its positioning space.
    pub y: f64,
    /// Placement actually in effect (post-flip).
    pub placement: Placement,
    pub strategy: Strategy,
    /// Rects of the final pass, for style syncing.
    pub rects: ElementRects,
    /// Middleware outputs of the final pass.
    pub data: MiddlewareData,
}

/// Run the pipeline to a fixed point.
pub fn compute_position(
    reference: ElementId,
    floating: ElementId,
    request: &PositionRequest<'_>,
    platform: &dyn Platform,
) -> Result<ComputedPosition, PositionError> {
    let rtl = platform.is_rtl(floating);
    let mut rects = platform.element_rects(reference, floating, request.strategy)?;
    let mut placement = request.placement;
    let initial = resolve_position(&rects, placement, rtl);

    let mut state = MiddlewareState {
        x: initial.x,
        y: initial.y,
        initial_placement: request.placement,
        placement,
        strategy: request.strategy,
        rects,
        elements: Elements {
            reference,
            floating,
        },
        platform,
        data: MiddlewareData::default(),
    };

    let mut reset_count = 0usize;
    let mut index = 0usize;
    while index < request.middleware.len() {
        let middleware = &request.middleware[index];
        let result = middleware.run(&state);

        if let Some(x) = result.x {
            state.x = x;
        }
        if let Some(y) = result.y {
            state.y = y;
        }
        if let Some(output) = result.data {
            state.data.merge(output);
        }

        if let Some(reset) = result.reset {
            if reset_count < MAX_RESETS {
                reset_count += 1;
                if let Some(next) = reset.placement {
                    placement = next;
                    state.placement = next;
                }
                if reset.rects {
                    rects = platform.element_rects(reference, floating, request.strategy)?;
                    state.rects = rects;
                }
                // A placement or rects change invalidates the coordinates; a
                // plain restart keeps them (the middleware already adjusted
                // them and wants earlier middleware to re-run around them).
                if reset.placement.is_some() || reset.rects {
                    let coords = resolve_position(&state.rects, state.placement, rtl);
                    state.x = coords.x;
                    state.y = coords.y;
                }
                index = 0;
                continue;
            }
        }

        index += 1;
    }

    Ok(ComputedPosition {
        x: state.x,
        y: state.y,
        placement: state.placement,
        strategy: state.strategy,
        rects: state.rects,
        data: state.data,
    })
}
