#![forbid(unsafe_code)]

//! Flip middleware: change placement when the preferred one overflows.
//!
//! Candidates are tried in order: the initial placement, then the fallback
//! list (by default just the mirrored placement). Each attempt records its
//! per-side overflows; once every candidate has been tried without fitting,
//! the fallback strategy picks deterministically instead of cycling:
//!
//! - `BestFit`: prefer a candidate whose main axis fits, with the least
//!   cross-axis overflow; otherwise the least total positive overflow. Ties
//!   go to the first candidate in list order (stable, documented).
//! - `InitialPlacement`: revert to the caller's placement.
//!
//! Termination: the attempt index carried in [`FlipData`] only ever
//! increments, so the candidate walk visits each placement once.

use serde::{Deserialize, Serialize};

use crate::geometry::Sides;
use crate::overflow::{OverflowOptions, detect_overflow};
use crate::placement::{Placement, alignment_sides};
use crate::platform::Boundary;

use super::{Middleware, MiddlewareOutput, MiddlewareResult, MiddlewareState, Reset};

/// How to settle when no candidate placement fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackStrategy {
    #[default]
    BestFit,
    InitialPlacement,
}

/// Configuration for the flip middleware.
#[derive(Debug, Clone, PartialEq)]
pub struct Flip {
    /// Check overflow along the placement side's axis.
    pub main_axis: bool,
    /// Check overflow along the alignment axis.
    pub cross_axis: bool,
    /// Candidates tried after the initial placement; empty means the
    /// mirrored placement.
    pub fallback_placements: Vec<Placement>,
    /// Also try the perpendicular axis once the nominal candidates fail.
    pub fallback_axis: bool,
    /// Tie-break once candidates are exhausted.
    pub fallback_strategy: FallbackStrategy,
    /// Boundary to clip against.
    pub boundary: Boundary,
    /// Padding inset on the boundary.
    pub padding: Sides,
}

impl Default for Flip {
    fn default() -> Self {
        Self {
            main_axis: true,
            cross_axis: true,
            fallback_placements: Vec::new(),
            fallback_axis: false,
            fallback_strategy: FallbackStrategy::default(),
            boundary: Boundary::default(),
            padding: Sides::default(),
        }
    }
}

impl Flip {
    /// Flip with uniform boundary padding.
    #[must_use]
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = Sides::all(padding);
        self
    }

    /// Supply an explicit fallback list.
    #[must_use]
    pub fn with_fallbacks(mut self, fallbacks: Vec<Placement>) -> Self {
        self.fallback_placements = fallbacks;
        self
    }

    /// Set the exhaustion strategy.
    #[must_use]
    pub const fn with_fallback_strategy(mut self, strategy: FallbackStrategy) -> Self {
        self.fallback_strategy = strategy;
        self
    }

    /// Extend the candidate list across the perpendicular axis.
    #[must_use]
    pub const fn with_fallback_axis(mut self) -> Self {
        self.fallback_axis = true;
        self
    }

    fn candidates(&self, initial: Placement) -> Vec<Placement> {
        let mut list = Vec::with_capacity(3 + self.fallback_placements.len());
        list.push(initial);
        if self.fallback_placements.is_empty() {
            list.push(initial.opposite());
        } else {
            list.extend(self.fallback_placements.iter().copied());
        }
        if self.fallback_axis {
            for candidate in initial.opposite_axis_placements() {
                if !list.contains(&candidate) {
                    list.push(candidate);
                }
            }
        }
        list
    }
}

/// One attempted placement with its measured overflows.
///
/// `overflows[0]` is the main-axis protrusion; the remaining entries (when
/// cross-axis checking is on) are the two alignment sides.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementOverflow {
    pub placement: Placement,
    pub overflows: Vec<f64>,
}

impl PlacementOverflow {
    fn main_axis_fits(&self) -> bool {
        self.overflows.first().is_some_and(|v| *v <= 0.0)
    }

    fn cross_overflow(&self) -> f64 {
        self.overflows.get(1).copied().unwrap_or(0.0)
    }

    fn total_positive(&self) -> f64 {
        self.overflows.iter().filter(|v| **v > 0.0).sum()
    }
}

/// Flip middleware output: the attempt index and the overflow record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlipData {
    /// Index into the candidate list of the placement currently in effect.
    pub index: usize,
    /// Every attempt so far with its overflows, in trial order.
    pub overflows: Vec<PlacementOverflow>,
}

impl Middleware for Flip {
    fn name(&self) -> &'static str {
        "flip"
    }

    fn run(&self, state: &MiddlewareState<'_>) -> MiddlewareResult {
        // Arrow already committed to an alignment nudge for this placement;
        // flipping now would fight it.
        if state
            .data
            .arrow
            .as_ref()
            .is_some_and(|arrow| arrow.alignment_offset.is_some())
        {
            return MiddlewareResult::default();
        }

        let rtl = state.platform.is_rtl(state.elements.floating);
        let candidates = self.candidates(state.initial_placement);

        let overflow = detect_overflow(
            state,
            &OverflowOptions {
                boundary: self.boundary,
                padding: self.padding,
                ..OverflowOptions::default()
            },
        );

        let mut overflows = Vec::with_capacity(3);
        if self.main_axis {
            overflows.push(overflow.side(state.placement.side));
        }
        if self.cross_axis {
            let (main_side, cross_side) = alignment_sides(state.placement, &state.rects, rtl);
            overflows.push(overflow.side(main_side));
            overflows.push(overflow.side(cross_side));
        }

        let mut record = state
            .data
            .flip
            .as_ref()
            .map(|data| data.overflows.clone())
            .unwrap_or_default();
        record.push(PlacementOverflow {
            placement: state.placement,
            overflows: overflows.clone(),
        });

        if overflows.iter().all(|v| *v <= 0.0) {
            // Fits; keep the record so later passes can see it.
            return MiddlewareResult {
                data: Some(MiddlewareOutput::Flip(FlipData {
                    index: state.data.flip.as_ref().map_or(0, |data| data.index),
                    overflows: record,
                })),
                ..MiddlewareResult::default()
            };
        }

        let next_index = state.data.flip.as_ref().map_or(0, |data| data.index) + 1;
        if let Some(next) = candidates.get(next_index) {
            return MiddlewareResult {
                data: Some(MiddlewareOutput::Flip(FlipData {
                    index: next_index,
                    overflows: record,
                })),
                reset: Some(Reset::to_placement(*next)),
                ..MiddlewareResult::default()
            };
        }

        // Exhausted: settle deterministically.
        let reset_placement = match self.fallback_strategy {
            FallbackStrategy::InitialPlacement => state.initial_placement,
            FallbackStrategy::BestFit => best_fit(&record).unwrap_or(state.initial_placement),
        };

        if state.placement != reset_placement {
            return MiddlewareResult {
                data: Some(MiddlewareOutput::Flip(FlipData {
                    index: next_index,
                    overflows: record,
                })),
                reset: Some(Reset::to_placement(reset_placement)),
                ..MiddlewareResult::default()
            };
        }

        MiddlewareResult {
            data: Some(MiddlewareOutput::Flip(FlipData {
                index: next_index,
                overflows: record,
            })),
            ..MiddlewareResult::default()
        }
    }
}

/// Least-overflow selection with the documented stable tie-break: strictly
/// better replaces, equal keeps the earlier attempt.
fn best_fit(record: &[PlacementOverflow]) -> Option<Placement> {
    let mut best: Option<(&PlacementOverflow, f64)> = None;
    for attempt in record.iter().filter(|a| a.main_axis_fits()) {
        let score = attempt.cross_overflow();
        if best.is_none_or(|(_, best_score)| score < best_score) {
            best = Some((attempt, score));
        }
    }
    if let Some((attempt, _)) = best {
        return Some(attempt.placement);
    }

    let mut best: Option<(&PlacementOverflow, f64)> = None;
    for attempt in record {
        let score = attempt.total_positive();
        if best.is_none_or(|(_, best_score)| score < best_score) {
            best = Some((attempt, score));
        }
    }
    best.map(|(attempt, _)| attempt.placement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::{Alignment, Side};

    fn attempt(placement: Placement, overflows: &[f64]) -> PlacementOverflow {
        PlacementOverflow {
            placement,
            overflows: overflows.to_vec(),
        }
    }

    #[test]
    fn default_candidates_are_initial_then_mirror() {
        let flip = Flip::default();
        let initial = Placement::aligned(Side::Top, Alignment::Start);
        assert_eq!(
            flip.candidates(initial),
            vec![initial, Placement::aligned(Side::Bottom, Alignment::Start)]
        );
    }

    #[test]
    fn explicit_fallbacks_preserve_caller_order() {
        let flip = Flip::default().with_fallbacks(vec![
            Placement::base(Side::Right),
            Placement::base(Side::Left),
        ]);
        let initial = Placement::base(Side::Top);
        assert_eq!(
            flip.candidates(initial),
            vec![
                Placement::base(Side::Top),
                Placement::base(Side::Right),
                Placement::base(Side::Left),
            ]
        );
    }

    #[test]
    fn fallback_axis_appends_perpendicular_candidates() {
        let flip = Flip::default().with_fallback_axis();
        let initial = Placement::base(Side::Top);
        assert_eq!(
            flip.candidates(initial),
            vec![
                Placement::base(Side::Top),
                Placement::base(Side::Bottom),
                Placement::base(Side::Left),
                Placement::base(Side::Right),
            ]
        );
    }

    #[test]
    fn best_fit_prefers_fitting_main_axis() {
        let record = vec![
            attempt(Placement::base(Side::Top), &[5.0, 1.0, 1.0]),
            attempt(Placement::base(Side::Bottom), &[-2.0, 4.0, 0.0]),
            attempt(Placement::base(Side::Right), &[-1.0, 2.0, 0.0]),
        ];
        // Bottom and Right both fit on the main axis; Right has less cross
        // overflow.
        assert_eq!(best_fit(&record), Some(Placement::base(Side::Right)));
    }

    #[test]
    fn best_fit_falls_back_to_least_total_overflow() {
        let record = vec![
            attempt(Placement::base(Side::Top), &[5.0, 3.0, 0.0]),
            attempt(Placement::base(Side::Bottom), &[2.0, 1.0, 0.0]),
        ];
        assert_eq!(best_fit(&record), Some(Placement::base(Side::Bottom)));
    }

    #[test]
    fn best_fit_tie_break_is_first_in_list_order() {
        let record = vec![
            attempt(Placement::base(Side::Top), &[2.0, 1.0, 0.0]),
            attempt(Placement::base(Side::Bottom), &[2.0, 1.0, 0.0]),
        ];
        assert_eq!(best_fit(&record), Some(Placement::base(Side::Top)));

        let fitting = vec![
            attempt(Placement::base(Side::Left), &[-1.0, 2.0, 0.0]),
            attempt(Placement::base(Side::Right), &[-1.0, 2.0, 0.0]),
        ];
        assert_eq!(best_fit(&fitting), Some(Placement::base(Side::Left)));
    }

    #[test]
    fn fallback_strategy_serde_spelling() {
        assert_eq!(
            serde_json::to_string(&FallbackStrategy::BestFit).unwrap(),
            "\"best-fit\""
        );
        assert_eq!(
            serde_json::from_str::<FallbackStrategy>("\"initial-placement\"").unwrap(),
            FallbackStrategy::InitialPlacement
        );
    }
}
