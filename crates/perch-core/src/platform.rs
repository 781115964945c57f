#![forbid(unsafe_code)]

//! The host contract the positioning engine consumes.
//!
//! The engine never touches a real document tree. Everything it needs from
//! the host (bounding rectangles, clipping boundaries, scale factors,
//! writing-direction, style writes) goes through [`Platform`] and
//! [`StyleSink`], so any UI substrate that can describe its elements as
//! rectangles can drive the pipeline. `perch-host` ships the in-memory
//! reference implementation.

use std::fmt;
use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

use crate::geometry::{Dimensions, Rect, Scale};
use crate::placement::ElementRects;

/// Opaque handle to a host element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(NonZeroU64);

impl ElementId {
    /// Create a handle from a raw non-zero value.
    #[inline]
    pub const fn new(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// The raw value.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0.get())
    }
}

/// Coordinate space the floating element is positioned in.
///
/// `Absolute` positions relative to the nearest positioned ancestor,
/// `Fixed` relative to the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Absolute,
    Fixed,
}

impl Strategy {
    /// Wire spelling, as written to the host's `position` style.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Absolute => "absolute",
            Self::Fixed => "fixed",
        }
    }
}

/// The clipping context overflow is detected against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Boundary {
    /// Intersection of every overflow-clipping ancestor and the viewport.
    #[default]
    ClippingAncestors,
    /// The visual viewport (client size, scrollbar gutter excluded).
    Viewport,
    /// The whole document.
    Document,
    /// A specific element's rectangle.
    Element(ElementId),
}

/// Errors a host can report for element lookups.
///
/// Unresolvable *boundaries* never error: the platform degrades those to the
/// viewport. Lookup errors surface only where the engine must know the
/// element is gone (fail-fast validation, stale-target checks).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The handle does not name a live element.
    UnknownElement(ElementId),
    /// The element exists but is detached from the document.
    Detached(ElementId),
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownElement(id) => write!(f, "element {id} does not exist"),
            Self::Detached(id) => write!(f, "element {id} is detached from the document"),
        }
    }
}

impl std::error::Error for PlatformError {}

/// Read side of the host contract.
///
/// All rectangles are in logical pixels. `element_rects` returns the anchor
/// rectangle in the floating element's positioning space (offset-parent
/// relative for `Absolute`, viewport relative for `Fixed`); the floating
/// rectangle is at the origin with the element's current dimensions.
pub trait Platform {
    /// Measure the reference/floating pair for one pipeline run.
    fn element_rects(
        &self,
        reference: ElementId,
        floating: ElementId,
        strategy: Strategy,
    ) -> Result<ElementRects, PlatformError>;

    /// The clipping rectangle for a boundary, in viewport coordinates.
    ///
    /// Must degrade to the viewport rectangle when the boundary cannot be
    /// resolved (detached element, cross-origin frame) rather than fail.
    fn clipping_rect(&self, element: ElementId, boundary: Boundary, strategy: Strategy) -> Rect;

    /// Current width and height of an element's box.
    fn dimensions(&self, element: ElementId) -> Result<Dimensions, PlatformError>;

    /// Convert a rect in the floating element's positioning space to
    /// viewport coordinates, for overflow checks.
    fn offset_to_viewport(&self, rect: Rect, floating: ElementId, strategy: Strategy) -> Rect;

    /// Effective CSS scale of an element.
    fn scale(&self, element: ElementId) -> Scale {
        let _ = element;
        Scale::IDENTITY
    }

    /// Whether the element is in right-to-left writing mode.
    fn is_rtl(&self, element: ElementId) -> bool {
        let _ = element;
        false
    }

    /// Device pixel ratio used to round final coordinates.
    fn device_pixel_ratio(&self) -> f64 {
        1.0
    }

    /// Ancestors whose scrolling or resizing can move the element, innermost
    /// first. Drives auto-update listener registration.
    fn scroll_ancestors(&self, element: ElementId) -> Vec<ElementId> {
        let _ = element;
        Vec::new()
    }
}

/// Write side of the host contract.
///
/// The orchestrator owns the floating element's inline style and data
/// attributes while active and is the only writer during that window.
/// Implementations use interior mutability; writes to vanished elements are
/// silently dropped so teardown never fails.
pub trait StyleSink {
    /// Set an inline style property (`"left"`, `"top"`, `"width"`, ...).
    fn set_style(&self, element: ElementId, property: &str, value: &str);

    /// Remove an inline style property.
    fn clear_style(&self, element: ElementId, property: &str);

    /// Set an attribute (`"data-current-placement"`).
    fn set_attribute(&self, element: ElementId, name: &str, value: &str);

    /// Remove an attribute.
    fn remove_attribute(&self, element: ElementId, name: &str);
}
