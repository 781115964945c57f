#![forbid(unsafe_code)]

//! Popup orchestration on top of the `perch-core` pipeline.
//!
//! Where `perch-core` answers "where should this box go", this crate runs
//! the whole popup lifecycle: [`PopupConfig`] describes the recognized
//! option surface, [`PopupController`] activates against a host, applies
//! computed positions through the host's style sink, and [`AutoUpdate`]
//! coalesces layout events so a scroll storm costs one reposition per
//! frame.
//!
//! The host is anything implementing both [`perch_core::Platform`] and
//! [`perch_core::StyleSink`]; `perch-host` ships an in-memory one.

pub mod auto_update;
pub mod config;
pub mod controller;
pub mod hover_bridge;

pub use auto_update::{AutoUpdate, AutoUpdateOptions, LayoutEvent};
pub use config::{ArrowPlacement, AutoSizeAxis, PopupConfig, SyncAxis};
pub use controller::PopupController;
pub use hover_bridge::{clip_path, hover_bridge_polygon};
