#![forbid(unsafe_code)]

//! In-memory host document implementing the perch platform contract.
//!
//! [`HostDocument`] is a tree of positioned, scrollable, scalable, clippable
//! nodes with a viewport on top. It exists for two audiences: tests that need
//! a deterministic stand-in for a real document, and embedders who want a
//! worked example of the [`perch_core::Platform`] and [`perch_core::StyleSink`]
//! contracts before binding a real UI substrate.
//!
//! Geometry model: every node's rectangle is its border box in the parent's
//! content coordinates, pre-transform. A node's visual size is its rect
//! scaled by its own scale factors. Bounding rectangles accumulate ancestor
//! origins and subtract ancestor scroll offsets; `position: fixed` nodes skip
//! both up to their enclosing frame. Cross-origin frames deny geometry beyond
//! their boundary, so lookups degrade to the last accessible ancestor frame
//! instead of failing, and unresolvable clipping boundaries degrade to the
//! viewport.

pub mod document;

pub use document::{HostDocument, NodeSpec, OverflowKind, PositionKind, Viewport};
