#![forbid(unsafe_code)]

//! Symbolic placements and the pure placement resolver.
//!
//! A [`Placement`] combines a side (`top`/`right`/`bottom`/`left`) with an
//! optional alignment (`start`/`end`); the twelve resulting values describe
//! where a floating element sits relative to its anchor. [`resolve_position`]
//! turns a placement plus two rectangles into concrete coordinates with no
//! host access, so it is unit-testable with literal rectangles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geometry::{Axis, Point, Rect};

/// The side of the anchor a floating element attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    /// The mirrored side.
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// The axis the side lies on: `top`/`bottom` are on the y axis.
    #[inline]
    pub const fn axis(self) -> Axis {
        match self {
            Self::Top | Self::Bottom => Axis::Y,
            Self::Left | Self::Right => Axis::X,
        }
    }

    /// Wire spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Right => "right",
            Self::Bottom => "bottom",
            Self::Left => "left",
        }
    }
}

/// Alignment along the cross axis of a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Start,
    End,
}

impl Alignment {
    /// The mirrored alignment.
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Start => Self::End,
            Self::End => Self::Start,
        }
    }
}

/// A side plus optional alignment; base placements are centered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Placement {
    pub side: Side,
    pub alignment: Option<Alignment>,
}

/// All twelve placements in side-major order.
pub const ALL_PLACEMENTS: [Placement; 12] = [
    Placement::base(Side::Top),
    Placement::aligned(Side::Top, Alignment::Start),
    Placement::aligned(Side::Top, Alignment::End),
    Placement::base(Side::Right),
    Placement::aligned(Side::Right, Alignment::Start),
    Placement::aligned(Side::Right, Alignment::End),
    Placement::base(Side::Bottom),
    Placement::aligned(Side::Bottom, Alignment::Start),
    Placement::aligned(Side::Bottom, Alignment::End),
    Placement::base(Side::Left),
    Placement::aligned(Side::Left, Alignment::Start),
    Placement::aligned(Side::Left, Alignment::End),
];

impl Placement {
    /// A centered placement on the given side.
    #[inline]
    pub const fn base(side: Side) -> Self {
        Self {
            side,
            alignment: None,
        }
    }

    /// An aligned placement on the given side.
    #[inline]
    pub const fn aligned(side: Side, alignment: Alignment) -> Self {
        Self {
            side,
            alignment: Some(alignment),
        }
    }

    /// Axis of the placement side.
    #[inline]
    pub const fn side_axis(self) -> Axis {
        self.side.axis()
    }

    /// Axis alignment happens on (the cross axis of the side).
    #[inline]
    pub const fn alignment_axis(self) -> Axis {
        self.side_axis().opposite()
    }

    /// Same alignment on the mirrored side (`top-start` -> `bottom-start`).
    #[inline]
    pub const fn opposite(self) -> Self {
        Self {
            side: self.side.opposite(),
            alignment: self.alignment,
        }
    }

    /// Same side with mirrored alignment (`top-start` -> `top-end`).
    pub fn opposite_alignment(self) -> Self {
        Self {
            side: self.side,
            alignment: self.alignment.map(Alignment::opposite),
        }
    }

    /// The two placements on the perpendicular axis, preserving alignment
    /// (`top` -> `left`/`right`, `left-start` -> `top-start`/`bottom-start`).
    /// Used to extend flip fallback lists across the axis.
    pub const fn opposite_axis_placements(self) -> [Self; 2] {
        match self.side.axis() {
            Axis::Y => [
                Self {
                    side: Side::Left,
                    alignment: self.alignment,
                },
                Self {
                    side: Side::Right,
                    alignment: self.alignment,
                },
            ],
            Axis::X => [
                Self {
                    side: Side::Top,
                    alignment: self.alignment,
                },
                Self {
                    side: Side::Bottom,
                    alignment: self.alignment,
                },
            ],
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.alignment {
            Some(Alignment::Start) => write!(f, "{}-start", self.side.as_str()),
            Some(Alignment::End) => write!(f, "{}-end", self.side.as_str()),
            None => f.write_str(self.side.as_str()),
        }
    }
}

/// Error parsing a placement from its wire spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePlacementError {
    input: String,
}

impl fmt::Display for ParsePlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid placement {:?}: expected a side (top/right/bottom/left) \
             with optional -start/-end suffix",
            self.input
        )
    }
}

impl std::error::Error for ParsePlacementError {}

impl FromStr for Placement {
    type Err = ParsePlacementError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let err = || ParsePlacementError {
            input: input.to_owned(),
        };
        let (side_str, alignment) = match input.split_once('-') {
            Some((side, "start")) => (side, Some(Alignment::Start)),
            Some((side, "end")) => (side, Some(Alignment::End)),
            Some(_) => return Err(err()),
            None => (input, None),
        };
        let side = match side_str {
            "top" => Side::Top,
            "right" => Side::Right,
            "bottom" => Side::Bottom,
            "left" => Side::Left,
            _ => return Err(err()),
        };
        Ok(Self { side, alignment })
    }
}

impl From<Placement> for String {
    fn from(placement: Placement) -> Self {
        placement.to_string()
    }
}

impl TryFrom<String> for Placement {
    type Error = ParsePlacementError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The two rectangles all placement math is relative to.
///
/// `reference` is the anchor in the floating element's positioning space;
/// `floating` carries the floating element's dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElementRects {
    pub reference: Rect,
    pub floating: Rect,
}

/// Compute the floating element's top-left corner for a placement.
///
/// The floating rectangle touches the reference rectangle on the placement
/// side with zero gap, centered on the cross axis unless aligned. In RTL
/// writing mode, start/end mirror for top/bottom placements.
pub fn resolve_position(rects: &ElementRects, placement: Placement, rtl: bool) -> Point {
    let reference = &rects.reference;
    let floating = &rects.floating;

    let common_x = reference.x + reference.width / 2.0 - floating.width / 2.0;
    let common_y = reference.y + reference.height / 2.0 - floating.height / 2.0;

    let mut coords = match placement.side {
        Side::Top => Point::new(common_x, reference.y - floating.height),
        Side::Bottom => Point::new(common_x, reference.y + reference.height),
        Side::Right => Point::new(reference.x + reference.width, common_y),
        Side::Left => Point::new(reference.x - floating.width, common_y),
    };

    if let Some(alignment) = placement.alignment {
        let axis = placement.alignment_axis();
        let common_align = reference.length(axis) / 2.0 - floating.length(axis) / 2.0;
        let is_vertical = placement.side_axis() == Axis::Y;
        let sign = if rtl && is_vertical { -1.0 } else { 1.0 };
        match alignment {
            Alignment::Start => *coords.axis_mut(axis) -= common_align * sign,
            Alignment::End => *coords.axis_mut(axis) += common_align * sign,
        }
    }

    coords
}

/// The sides overflow is checked on when flipping an aligned placement on its
/// cross axis.
///
/// When the reference is longer than the floating element along the alignment
/// axis, the sides swap: the floating element can slide within the reference
/// without overflowing the nominal alignment side.
pub fn alignment_sides(placement: Placement, rects: &ElementRects, rtl: bool) -> (Side, Side) {
    let axis = placement.alignment_axis();
    let start = if rtl { Alignment::End } else { Alignment::Start };

    let mut main = match axis {
        Axis::X => {
            if placement.alignment == Some(start) {
                Side::Right
            } else {
                Side::Left
            }
        }
        Axis::Y => {
            if placement.alignment == Some(Alignment::Start) {
                Side::Bottom
            } else {
                Side::Top
            }
        }
    };
    if rects.reference.length(axis) > rects.floating.length(axis) {
        main = main.opposite();
    }
    (main, main.opposite())
}
