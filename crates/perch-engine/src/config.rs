#![forbid(unsafe_code)]

//! The recognized popup option surface.
//!
//! [`PopupConfig`] is plain data: every option the controller understands,
//! with serde derives using the wire spellings (`"top-start"`, `"best-fit"`,
//! `"horizontal"`). The controller turns a config into a middleware stack in
//! a fixed order: offset, sync-size, flip, shift, auto-size, arrow.

use perch_core::{FallbackStrategy, Placement, Side, Strategy};
use serde::{Deserialize, Serialize};

/// Which axes auto-size reports available space for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoSizeAxis {
    Horizontal,
    Vertical,
    Both,
}

impl AutoSizeAxis {
    /// Whether the horizontal variable is published.
    #[must_use]
    pub const fn horizontal(self) -> bool {
        matches!(self, Self::Horizontal | Self::Both)
    }

    /// Whether the vertical variable is published.
    #[must_use]
    pub const fn vertical(self) -> bool {
        matches!(self, Self::Vertical | Self::Both)
    }
}

/// Which of the popup's dimensions mirror the anchor's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAxis {
    Width,
    Height,
    Both,
}

impl SyncAxis {
    /// Whether the width is synced.
    #[must_use]
    pub const fn width(self) -> bool {
        matches!(self, Self::Width | Self::Both)
    }

    /// Whether the height is synced.
    #[must_use]
    pub const fn height(self) -> bool {
        matches!(self, Self::Height | Self::Both)
    }
}

/// Where the arrow sits along the popup's attached edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowPlacement {
    /// Pinned at the start of the edge, `arrow_padding` in.
    Start,
    /// Pinned at the end of the edge, `arrow_padding` in.
    End,
    /// Centered on the popup edge regardless of the anchor.
    Center,
    /// Tracks the anchor via the arrow middleware's computed offset.
    #[default]
    Anchor,
}

/// Full popup configuration.
///
/// Defaults match an unconfigured popup: placed on top, absolutely
/// positioned, no collision handling. Every collision behavior is opt-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PopupConfig {
    /// Preferred placement relative to the anchor.
    pub placement: Placement,
    /// Coordinate space for the popup.
    pub strategy: Strategy,
    /// Gap between anchor and popup along the placement axis.
    pub distance: f64,
    /// Slide along the cross axis.
    pub skidding: f64,
    /// Flip to a fallback placement when the preferred one overflows.
    pub flip: bool,
    /// Explicit flip candidates; empty means "the opposite placement".
    pub flip_fallback_placements: Vec<Placement>,
    /// How flip resolves when no candidate fits.
    pub flip_fallback_strategy: FallbackStrategy,
    /// Overflow tolerance before flip engages.
    pub flip_padding: f64,
    /// Clamp the popup back inside the boundary on the cross axis.
    pub shift: bool,
    /// Minimum distance kept from the boundary while shifting.
    pub shift_padding: f64,
    /// Publish `--auto-size-available-*` variables on these axes.
    pub auto_size: Option<AutoSizeAxis>,
    /// Padding subtracted from the reported available space.
    pub auto_size_padding: f64,
    /// Mirror the anchor's dimensions onto the popup.
    pub sync: Option<SyncAxis>,
    /// Position a dedicated arrow element along the shared edge.
    pub arrow: bool,
    /// Minimum distance kept between the arrow and the popup's corners.
    pub arrow_padding: f64,
    pub arrow_placement: ArrowPlacement,
    /// Keep an invisible polygon over the anchor/popup gap so hover popups
    /// survive the pointer crossing it.
    pub hover_bridge: bool,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            placement: Placement::base(Side::Top),
            strategy: Strategy::Absolute,
            distance: 0.0,
            skidding: 0.0,
            flip: false,
            flip_fallback_placements: Vec::new(),
            flip_fallback_strategy: FallbackStrategy::BestFit,
            flip_padding: 0.0,
            shift: false,
            shift_padding: 0.0,
            auto_size: None,
            auto_size_padding: 0.0,
            sync: None,
            arrow: false,
            arrow_padding: 10.0,
            arrow_placement: ArrowPlacement::Anchor,
            hover_bridge: false,
        }
    }
}

impl PopupConfig {
    #[must_use]
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = distance;
        self
    }

    #[must_use]
    pub fn with_skidding(mut self, skidding: f64) -> Self {
        self.skidding = skidding;
        self
    }

    #[must_use]
    pub fn with_flip(mut self) -> Self {
        self.flip = true;
        self
    }

    #[must_use]
    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    #[must_use]
    pub fn with_auto_size(mut self, axis: AutoSizeAxis) -> Self {
        self.auto_size = Some(axis);
        self
    }

    #[must_use]
    pub fn with_sync(mut self, axis: SyncAxis) -> Self {
        self.sync = Some(axis);
        self
    }

    #[must_use]
    pub fn with_arrow(mut self) -> Self {
        self.arrow = true;
        self
    }

    #[must_use]
    pub fn with_hover_bridge(mut self) -> Self {
        self.hover_bridge = true;
        self
    }
}
