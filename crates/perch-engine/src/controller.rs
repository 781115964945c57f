#![forbid(unsafe_code)]

//! The popup controller: config in, style writes out.
//!
//! [`PopupController`] is the stateful piece around the pure pipeline. It
//! owns the anchor/popup pair, assembles the middleware stack from a
//! [`PopupConfig`] in a fixed order (offset, sync-size, flip, shift,
//! auto-size, arrow), runs [`compute_position`], and writes the result back
//! through the host's [`StyleSink`]: `left`/`top` rounded to the device
//! pixel ratio, `data-current-placement`, the `--auto-size-available-*`
//! variables, arrow offsets, and the hover-bridge clip path.
//!
//! While active the controller exclusively owns the popup's inline style and
//! data attributes. `start` is reentrant (it stops first), `stop` is
//! idempotent and never fails, even after the elements vanished from the
//! host.

use std::cell::Cell;
use std::rc::Rc;

use perch_core::middleware::{Arrow, Flip, Middleware, Offset, Shift, Size};
use perch_core::{
    Axis, ComputedPosition, ElementId, MiddlewareResult, MiddlewareState, Platform, PositionError,
    PositionRequest, Rect, Reset, Side, StyleSink, compute_position,
};
use tracing::{debug, trace};

use crate::auto_update::{AutoUpdate, AutoUpdateOptions, LayoutEvent};
use crate::config::{ArrowPlacement, PopupConfig, SyncAxis};
use crate::hover_bridge::{clip_path, hover_bridge_polygon};

/// Positions one popup against one anchor through a host.
///
/// The host serves both sides of the contract: [`Platform`] for measuring
/// and [`StyleSink`] for writing.
pub struct PopupController<H: Platform + StyleSink + 'static> {
    host: Rc<H>,
    config: PopupConfig,
    anchor: ElementId,
    popup: ElementId,
    arrow: Option<ElementId>,
    bridge: Option<ElementId>,
    active: bool,
    /// Bumped per reposition; a result older than the current generation is
    /// stale and must not reach the sink.
    generation: Rc<Cell<u64>>,
    auto_update: Option<AutoUpdate>,
    repositions: u64,
}

impl<H: Platform + StyleSink + 'static> PopupController<H> {
    #[must_use]
    pub fn new(host: Rc<H>, anchor: ElementId, popup: ElementId, config: PopupConfig) -> Self {
        Self {
            host,
            config,
            anchor,
            popup,
            arrow: None,
            bridge: None,
            active: false,
            generation: Rc::new(Cell::new(0)),
            auto_update: None,
            repositions: 0,
        }
    }

    /// Attach the arrow element the arrow middleware positions.
    #[must_use]
    pub fn with_arrow(mut self, element: ElementId) -> Self {
        self.arrow = Some(element);
        self
    }

    /// Attach the element carrying the hover-bridge clip path.
    #[must_use]
    pub fn with_hover_bridge(mut self, element: ElementId) -> Self {
        self.bridge = Some(element);
        self
    }

    #[must_use]
    pub fn config(&self) -> &PopupConfig {
        &self.config
    }

    /// Swap the configuration; repositions immediately when active.
    pub fn set_config(&mut self, config: PopupConfig) -> Result<(), PositionError> {
        self.config = config;
        if self.active { self.reposition() } else { Ok(()) }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Completed repositions since construction. Diagnostic; useful for
    /// asserting that event bursts coalesce.
    #[must_use]
    pub fn reposition_count(&self) -> u64 {
        self.repositions
    }

    /// Activate with default auto-update triggers.
    pub fn start(&mut self) -> Result<(), PositionError> {
        self.start_with(AutoUpdateOptions::default())
    }

    /// Activate. Fully stops first, so calling while active never leaks a
    /// second set of watchers. Fails fast when either element is missing.
    pub fn start_with(&mut self, options: AutoUpdateOptions) -> Result<(), PositionError> {
        self.stop();

        self.host
            .dimensions(self.anchor)
            .map_err(|_| PositionError::MissingAnchor(self.anchor))?;
        self.host
            .dimensions(self.popup)
            .map_err(|_| PositionError::MissingFloating(self.popup))?;

        let mut watched = self.host.scroll_ancestors(self.anchor);
        for id in self.host.scroll_ancestors(self.popup) {
            if !watched.contains(&id) {
                watched.push(id);
            }
        }
        self.auto_update = Some(AutoUpdate::new(self.anchor, self.popup, watched, options));
        self.active = true;
        debug!(anchor = %self.anchor, popup = %self.popup, "popup activated");
        self.reposition()
    }

    /// Deactivate and release everything the controller wrote. Idempotent;
    /// vanished elements are fine, the sink drops those writes.
    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.generation.set(self.generation.get() + 1);
        if let Some(auto) = &mut self.auto_update {
            auto.stop();
        }
        self.auto_update = None;

        let host = &self.host;
        for property in [
            "position",
            "left",
            "top",
            "width",
            "height",
            "--auto-size-available-width",
            "--auto-size-available-height",
        ] {
            host.clear_style(self.popup, property);
        }
        host.remove_attribute(self.popup, "data-current-placement");
        if let Some(arrow) = self.arrow {
            for property in ["top", "right", "bottom", "left"] {
                host.clear_style(arrow, property);
            }
        }
        if let Some(bridge) = self.bridge {
            host.clear_style(bridge, "clip-path");
        }
        debug!(popup = %self.popup, "popup deactivated");
    }

    /// Feed a host layout event into the auto-update scheduler. Returns
    /// whether the event was recorded; the reposition itself happens on the
    /// next [`on_frame`](Self::on_frame).
    pub fn notify_layout(&mut self, event: LayoutEvent) -> bool {
        match &mut self.auto_update {
            Some(auto) => auto.notify(event),
            None => false,
        }
    }

    /// Frame flush: reposition at most once for everything that happened
    /// since the last call. Returns whether a reposition ran.
    pub fn on_frame(&mut self) -> Result<bool, PositionError> {
        if !self.active {
            return Ok(false);
        }
        let reference_rect = self
            .host
            .element_rects(self.anchor, self.popup, self.config.strategy)
            .ok()
            .map(|rects| rects.reference);
        let due = match &mut self.auto_update {
            Some(auto) => auto.on_frame(reference_rect),
            None => false,
        };
        if due {
            self.reposition()?;
        }
        Ok(due)
    }

    /// Recompute and apply the popup position.
    ///
    /// Single-flight: each call claims a new generation, and a result only
    /// reaches the sink if no newer call claimed one since (an apply hook
    /// re-entering `reposition` supersedes the outer call).
    pub fn reposition(&mut self) -> Result<(), PositionError> {
        if !self.active {
            return Ok(());
        }
        let generation = self.generation.get() + 1;
        self.generation.set(generation);

        // A scheduler flush can outlive the elements; skip quietly, stop()
        // remains the caller's decision.
        if self.host.dimensions(self.anchor).is_err() || self.host.dimensions(self.popup).is_err()
        {
            debug!(anchor = %self.anchor, popup = %self.popup, "reposition skipped, element gone");
            return Ok(());
        }

        // Non-synced axes must measure at their natural size.
        let (sync_width, sync_height) = match self.config.sync {
            Some(axis) => (axis.width(), axis.height()),
            None => (false, false),
        };
        if !sync_width {
            self.host.clear_style(self.popup, "width");
        }
        if !sync_height {
            self.host.clear_style(self.popup, "height");
        }

        let middleware = self.build_middleware();
        let computed = {
            let request = PositionRequest {
                placement: self.config.placement,
                strategy: self.config.strategy,
                middleware: &middleware,
            };
            compute_position(self.anchor, self.popup, &request, self.host.as_ref())?
        };

        if self.generation.get() != generation {
            trace!(popup = %self.popup, "stale reposition discarded");
            return Ok(());
        }

        self.apply(&computed);
        self.repositions += 1;
        Ok(())
    }

    fn build_middleware(&self) -> Vec<Box<dyn Middleware>> {
        let config = &self.config;
        let mut stack: Vec<Box<dyn Middleware>> = Vec::new();

        stack.push(Box::new(
            Offset::new(config.distance).cross_axis(config.skidding),
        ));

        if let Some(axis) = config.sync {
            stack.push(Box::new(SyncSize {
                host: Rc::clone(&self.host),
                popup: self.popup,
                axis,
            }));
        }

        if config.flip {
            let mut flip = Flip::default()
                .with_padding(config.flip_padding)
                .with_fallback_strategy(config.flip_fallback_strategy);
            if !config.flip_fallback_placements.is_empty() {
                flip = flip.with_fallbacks(config.flip_fallback_placements.clone());
            }
            stack.push(Box::new(flip));
        }

        if config.shift {
            stack.push(Box::new(Shift::default().with_padding(config.shift_padding)));
        }

        if let Some(axis) = config.auto_size {
            let host = Rc::clone(&self.host);
            let popup = self.popup;
            stack.push(Box::new(
                Size::default()
                    .with_padding(config.auto_size_padding)
                    .with_apply(Box::new(move |width, height| {
                        if axis.horizontal() {
                            host.set_style(
                                popup,
                                "--auto-size-available-width",
                                &format!("{width}px"),
                            );
                        } else {
                            host.clear_style(popup, "--auto-size-available-width");
                        }
                        if axis.vertical() {
                            host.set_style(
                                popup,
                                "--auto-size-available-height",
                                &format!("{height}px"),
                            );
                        } else {
                            host.clear_style(popup, "--auto-size-available-height");
                        }
                    })),
            ));
        } else {
            self.host.clear_style(self.popup, "--auto-size-available-width");
            self.host.clear_style(self.popup, "--auto-size-available-height");
        }

        if config.arrow {
            if let Some(arrow) = self.arrow {
                stack.push(Box::new(Arrow::new(arrow).with_padding(config.arrow_padding)));
            }
        }

        stack
    }

    fn apply(&self, computed: &ComputedPosition) {
        let dpr = self.host.device_pixel_ratio();
        let x = round_by_dpr(computed.x, dpr);
        let y = round_by_dpr(computed.y, dpr);

        let host = &self.host;
        host.set_style(self.popup, "position", computed.strategy.as_str());
        host.set_style(self.popup, "left", &format!("{x}px"));
        host.set_style(self.popup, "top", &format!("{y}px"));
        host.set_attribute(
            self.popup,
            "data-current-placement",
            &computed.placement.to_string(),
        );

        self.apply_arrow(computed);
        self.apply_hover_bridge(computed);

        trace!(
            popup = %self.popup,
            placement = %computed.placement,
            x,
            y,
            "popup repositioned"
        );
    }

    fn apply_arrow(&self, computed: &ComputedPosition) {
        let Some(arrow) = self.arrow else {
            return;
        };
        if !self.config.arrow {
            return;
        }
        let Ok(arrow_dims) = self.host.dimensions(arrow) else {
            return;
        };
        let data = computed.data.arrow.unwrap_or_default();
        let popup_dims = computed.rects.floating.dimensions();
        let rtl = self.host.is_rtl(self.popup);
        let padding = self.config.arrow_padding;

        let mut top = None;
        let mut right = None;
        let mut bottom = None;
        let mut left = None;
        match self.config.arrow_placement {
            ArrowPlacement::Start => {
                if data.x.is_some() {
                    if rtl {
                        right = Some(padding);
                    } else {
                        left = Some(padding);
                    }
                }
                if data.y.is_some() {
                    top = Some(padding);
                }
            }
            ArrowPlacement::End => {
                if data.x.is_some() {
                    if rtl {
                        left = Some(padding);
                    } else {
                        right = Some(padding);
                    }
                }
                if data.y.is_some() {
                    bottom = Some(padding);
                }
            }
            ArrowPlacement::Center => {
                if data.x.is_some() {
                    left = Some((popup_dims.width - arrow_dims.width) / 2.0);
                }
                if data.y.is_some() {
                    top = Some((popup_dims.height - arrow_dims.height) / 2.0);
                }
            }
            ArrowPlacement::Anchor => {
                left = data.x;
                top = data.y;
            }
        }

        // The side facing the anchor; the arrow overhangs it halfway.
        let static_side = computed.placement.side.opposite();
        let overhang = match static_side.axis() {
            Axis::X => arrow_dims.width,
            Axis::Y => arrow_dims.height,
        } / 2.0;
        match static_side {
            Side::Top => top = Some(-overhang),
            Side::Right => right = Some(-overhang),
            Side::Bottom => bottom = Some(-overhang),
            Side::Left => left = Some(-overhang),
        }

        self.write_or_clear(arrow, "top", top);
        self.write_or_clear(arrow, "right", right);
        self.write_or_clear(arrow, "bottom", bottom);
        self.write_or_clear(arrow, "left", left);
    }

    fn apply_hover_bridge(&self, computed: &ComputedPosition) {
        let Some(bridge) = self.bridge else {
            return;
        };
        if !self.config.hover_bridge {
            self.host.clear_style(bridge, "clip-path");
            return;
        }
        // Both rects in viewport space so the polygon matches what the
        // pointer sees.
        let anchor_rect = self.host.offset_to_viewport(
            computed.rects.reference,
            self.popup,
            computed.strategy,
        );
        let popup_rect = self.host.offset_to_viewport(
            Rect::new(
                computed.x,
                computed.y,
                computed.rects.floating.width,
                computed.rects.floating.height,
            ),
            self.popup,
            computed.strategy,
        );
        match hover_bridge_polygon(anchor_rect, popup_rect, computed.placement.side) {
            Some(points) => self.host.set_style(bridge, "clip-path", &clip_path(&points)),
            None => self.host.clear_style(bridge, "clip-path"),
        }
    }

    fn write_or_clear(&self, element: ElementId, property: &str, value: Option<f64>) {
        match value {
            Some(pixels) => self.host.set_style(element, property, &format!("{pixels}px")),
            None => self.host.clear_style(element, property),
        }
    }
}

/// Sync-size middleware: mirror the anchor's dimensions onto the popup.
///
/// Runs before flip so collision handling judges the synced size. A write
/// that changes the popup's measured dimensions requests a rects reset.
struct SyncSize<H: Platform + StyleSink> {
    host: Rc<H>,
    popup: ElementId,
    axis: SyncAxis,
}

impl<H: Platform + StyleSink> Middleware for SyncSize<H> {
    fn name(&self) -> &'static str {
        "sync-size"
    }

    fn run(&self, state: &MiddlewareState<'_>) -> MiddlewareResult {
        let reference = state.rects.reference;
        let before = state.rects.floating.dimensions();

        if self.axis.width() {
            self.host
                .set_style(self.popup, "width", &format!("{}px", reference.width));
        }
        if self.axis.height() {
            self.host
                .set_style(self.popup, "height", &format!("{}px", reference.height));
        }

        let Ok(after) = self.host.dimensions(self.popup) else {
            return MiddlewareResult::default();
        };
        if after.width != before.width || after.height != before.height {
            return MiddlewareResult {
                reset: Some(Reset::with_rects()),
                ..MiddlewareResult::default()
            };
        }
        MiddlewareResult::default()
    }
}

/// Snap a logical coordinate to the device pixel grid.
fn round_by_dpr(value: f64, dpr: f64) -> f64 {
    if dpr >= 1.0 {
        (value * dpr).round() / dpr
    } else {
        value.round()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AutoSizeAxis;
    use perch_core::{Placement, Strategy};
    use perch_host::{HostDocument, NodeSpec, OverflowKind, PositionKind};

    fn host() -> Rc<HostDocument> {
        Rc::new(HostDocument::new(800.0, 600.0))
    }

    fn popup_spec(width: f64, height: f64) -> NodeSpec {
        NodeSpec::new(Rect::new(0.0, 0.0, width, height)).position(PositionKind::Absolute)
    }

    #[test]
    fn end_to_end_top_placement_exactly_fits() {
        let host = host();
        let anchor = host.insert(NodeSpec::new(Rect::new(100.0, 100.0, 50.0, 20.0)));
        let popup = host.insert(popup_spec(200.0, 100.0));

        let config = PopupConfig::default().with_flip();
        let mut controller = PopupController::new(Rc::clone(&host), anchor, popup, config);
        controller.start().unwrap();

        // 100px tall popup above an anchor 100px from the edge: y lands on 0
        // exactly, so flip never engages.
        assert_eq!(host.style(popup, "left").as_deref(), Some("25px"));
        assert_eq!(host.style(popup, "top").as_deref(), Some("0px"));
        assert_eq!(
            host.attribute(popup, "data-current-placement").as_deref(),
            Some("top")
        );
    }

    #[test]
    fn positive_distance_flips_to_bottom() {
        let host = host();
        let anchor = host.insert(NodeSpec::new(Rect::new(100.0, 100.0, 50.0, 20.0)));
        let popup = host.insert(popup_spec(200.0, 100.0));

        let config = PopupConfig::default().with_flip().with_distance(8.0);
        let mut controller = PopupController::new(Rc::clone(&host), anchor, popup, config);
        controller.start().unwrap();

        assert_eq!(
            host.attribute(popup, "data-current-placement").as_deref(),
            Some("bottom")
        );
        assert_eq!(host.style(popup, "left").as_deref(), Some("25px"));
        // 100 (anchor top) + 20 (anchor height) + 8 (distance).
        assert_eq!(host.style(popup, "top").as_deref(), Some("128px"));
    }

    #[test]
    fn applied_position_round_trips_through_the_host() {
        let host = host();
        let anchor = host.insert(NodeSpec::new(Rect::new(100.0, 100.0, 50.0, 20.0)));
        let popup = host.insert(popup_spec(200.0, 100.0));

        let mut controller =
            PopupController::new(Rc::clone(&host), anchor, popup, PopupConfig::default());
        controller.start().unwrap();

        assert_eq!(
            host.bounding_rect(popup).unwrap(),
            Rect::new(25.0, 0.0, 200.0, 100.0)
        );
    }

    #[test]
    fn device_pixel_ratio_rounds_the_coordinates() {
        let host = host();
        host.set_device_pixel_ratio(2.0);
        // Anchor width 50.6 centers the popup at x = 25.3.
        let anchor = host.insert(NodeSpec::new(Rect::new(100.0, 300.0, 50.6, 20.0)));
        let popup = host.insert(popup_spec(200.0, 100.0));

        let mut controller =
            PopupController::new(Rc::clone(&host), anchor, popup, PopupConfig::default());
        controller.start().unwrap();

        // 25.3 snaps to 25.5 on a 2x grid (halves are representable).
        assert_eq!(host.style(popup, "left").as_deref(), Some("25.5px"));
    }

    #[test]
    fn sync_width_mirrors_the_anchor() {
        let host = host();
        let anchor = host.insert(NodeSpec::new(Rect::new(100.0, 300.0, 50.0, 20.0)));
        let popup = host.insert(popup_spec(200.0, 100.0));

        let config = PopupConfig::default().with_sync(SyncAxis::Width);
        let mut controller = PopupController::new(Rc::clone(&host), anchor, popup, config);
        controller.start().unwrap();

        assert_eq!(host.style(popup, "width").as_deref(), Some("50px"));
        assert_eq!(host.dimensions(popup).unwrap().width, 50.0);
        // Height untouched.
        assert!(host.style(popup, "height").is_none());
        // Position recomputed for the synced width: x = 100 + 25 - 25.
        assert_eq!(host.style(popup, "left").as_deref(), Some("100px"));
    }

    #[test]
    fn auto_size_publishes_available_space() {
        let host = host();
        // Anchor near the bottom edge; placing below leaves 30px of the
        // popup's 100px inside the viewport.
        let anchor = host.insert(NodeSpec::new(Rect::new(100.0, 550.0, 50.0, 20.0)));
        let popup = host.insert(popup_spec(200.0, 100.0));

        let config = PopupConfig::default()
            .with_placement(Placement::base(Side::Bottom))
            .with_auto_size(AutoSizeAxis::Vertical);
        let mut controller = PopupController::new(Rc::clone(&host), anchor, popup, config);
        controller.start().unwrap();

        assert_eq!(
            host.style(popup, "--auto-size-available-height").as_deref(),
            Some("30px")
        );
        // Horizontal axis not requested.
        assert!(host.style(popup, "--auto-size-available-width").is_none());
    }

    #[test]
    fn arrow_tracks_the_anchor_center() {
        let host = host();
        let anchor = host.insert(NodeSpec::new(Rect::new(375.0, 300.0, 50.0, 20.0)));
        let popup = host.insert(popup_spec(200.0, 100.0));
        let arrow = host
            .insert_child(popup, NodeSpec::new(Rect::new(0.0, 0.0, 10.0, 10.0)))
            .unwrap();

        let config = PopupConfig::default().with_arrow();
        let mut controller =
            PopupController::new(Rc::clone(&host), anchor, popup, config).with_arrow(arrow);
        controller.start().unwrap();

        // Anchor center 400, popup left 300: arrow at 95 centers over it.
        assert_eq!(host.style(arrow, "left").as_deref(), Some("95px"));
        // Static side faces the anchor; the arrow overhangs it halfway.
        assert_eq!(host.style(arrow, "bottom").as_deref(), Some("-5px"));
        assert!(host.style(arrow, "top").is_none());
    }

    #[test]
    fn hover_bridge_covers_the_gap() {
        let host = host();
        let anchor = host.insert(NodeSpec::new(Rect::new(100.0, 100.0, 50.0, 20.0)));
        let popup = host.insert(popup_spec(200.0, 100.0));
        let bridge = host.insert(NodeSpec::new(Rect::new(0.0, 0.0, 800.0, 600.0)));

        let config = PopupConfig::default()
            .with_distance(8.0)
            .with_hover_bridge();
        let mut controller =
            PopupController::new(Rc::clone(&host), anchor, popup, config).with_hover_bridge(bridge);
        controller.start().unwrap();

        let clip = host.style(bridge, "clip-path").unwrap();
        assert!(clip.starts_with("polygon("));
        // Popup bottom edge sits at y = 92, anchor top at y = 100.
        assert!(clip.contains("92px"));
        assert!(clip.contains("100px"));
    }

    #[test]
    fn zero_distance_needs_no_hover_bridge() {
        let host = host();
        let anchor = host.insert(NodeSpec::new(Rect::new(100.0, 100.0, 50.0, 20.0)));
        let popup = host.insert(popup_spec(200.0, 100.0));
        let bridge = host.insert(NodeSpec::new(Rect::new(0.0, 0.0, 800.0, 600.0)));

        let config = PopupConfig::default().with_hover_bridge();
        let mut controller =
            PopupController::new(Rc::clone(&host), anchor, popup, config).with_hover_bridge(bridge);
        controller.start().unwrap();

        assert!(host.style(bridge, "clip-path").is_none());
    }

    #[test]
    fn stop_releases_styles_and_attributes() {
        let host = host();
        let anchor = host.insert(NodeSpec::new(Rect::new(100.0, 100.0, 50.0, 20.0)));
        let popup = host.insert(popup_spec(200.0, 100.0));

        let mut controller =
            PopupController::new(Rc::clone(&host), anchor, popup, PopupConfig::default());
        controller.start().unwrap();
        assert!(host.style(popup, "left").is_some());

        controller.stop();
        assert!(!controller.is_active());
        assert!(host.style(popup, "left").is_none());
        assert!(host.style(popup, "top").is_none());
        assert!(host.attribute(popup, "data-current-placement").is_none());
        // Idempotent.
        controller.stop();
    }

    #[test]
    fn stop_survives_element_removal() {
        let host = host();
        let anchor = host.insert(NodeSpec::new(Rect::new(100.0, 100.0, 50.0, 20.0)));
        let popup = host.insert(popup_spec(200.0, 100.0));

        let mut controller =
            PopupController::new(Rc::clone(&host), anchor, popup, PopupConfig::default());
        controller.start().unwrap();
        host.detach(popup);
        controller.stop();
        assert!(!controller.is_active());
    }

    #[test]
    fn start_fails_fast_on_missing_anchor() {
        let host = host();
        let popup = host.insert(popup_spec(200.0, 100.0));
        let ghost = ElementId::new(999).unwrap();

        let mut controller =
            PopupController::new(Rc::clone(&host), ghost, popup, PopupConfig::default());
        assert_eq!(
            controller.start(),
            Err(PositionError::MissingAnchor(ghost))
        );
        assert!(!controller.is_active());
    }

    #[test]
    fn start_is_reentrant() {
        let host = host();
        let anchor = host.insert(NodeSpec::new(Rect::new(100.0, 100.0, 50.0, 20.0)));
        let popup = host.insert(popup_spec(200.0, 100.0));

        let mut controller =
            PopupController::new(Rc::clone(&host), anchor, popup, PopupConfig::default());
        controller.start().unwrap();
        controller.start().unwrap();
        assert!(controller.is_active());
        assert_eq!(controller.reposition_count(), 2);
    }

    #[test]
    fn scroll_burst_repositions_once_per_frame() {
        let host = host();
        let scroller = host.insert(
            NodeSpec::new(Rect::new(0.0, 0.0, 400.0, 400.0)).overflow(OverflowKind::Scroll),
        );
        let anchor = host
            .insert_child(scroller, NodeSpec::new(Rect::new(100.0, 100.0, 50.0, 20.0)))
            .unwrap();
        let popup = host.insert(popup_spec(200.0, 100.0));

        let mut controller =
            PopupController::new(Rc::clone(&host), anchor, popup, PopupConfig::default());
        controller.start().unwrap();
        let baseline = controller.reposition_count();

        for step in 1..=50 {
            host.set_scroll(scroller, perch_core::Point::new(0.0, f64::from(step)));
            controller.notify_layout(LayoutEvent::AncestorScroll(scroller));
        }
        assert!(controller.on_frame().unwrap());
        assert_eq!(controller.reposition_count(), baseline + 1);

        // Nothing new since the flush.
        assert!(!controller.on_frame().unwrap());
        assert_eq!(controller.reposition_count(), baseline + 1);
    }

    #[test]
    fn layout_shift_follows_a_moved_anchor() {
        let host = host();
        let anchor = host.insert(NodeSpec::new(Rect::new(100.0, 200.0, 50.0, 20.0)));
        let popup = host.insert(popup_spec(200.0, 100.0));

        let mut controller =
            PopupController::new(Rc::clone(&host), anchor, popup, PopupConfig::default());
        controller.start().unwrap();

        // Establish the baseline rect, then move the anchor with no event.
        assert!(!controller.on_frame().unwrap());
        host.set_rect(anchor, Rect::new(100.0, 260.0, 50.0, 20.0));
        assert!(controller.on_frame().unwrap());
        assert_eq!(host.style(popup, "top").as_deref(), Some("160px"));
    }

    #[test]
    fn set_config_repositions_while_active() {
        let host = host();
        let anchor = host.insert(NodeSpec::new(Rect::new(100.0, 200.0, 50.0, 20.0)));
        let popup = host.insert(popup_spec(200.0, 100.0));

        let mut controller =
            PopupController::new(Rc::clone(&host), anchor, popup, PopupConfig::default());
        controller.start().unwrap();
        assert_eq!(host.style(popup, "top").as_deref(), Some("100px"));

        controller
            .set_config(PopupConfig::default().with_placement(Placement::base(Side::Bottom)))
            .unwrap();
        assert_eq!(host.style(popup, "top").as_deref(), Some("220px"));
        assert_eq!(
            host.attribute(popup, "data-current-placement").as_deref(),
            Some("bottom")
        );
    }

    #[test]
    fn fixed_strategy_positions_in_viewport_space() {
        let host = host();
        let anchor = host.insert(NodeSpec::new(Rect::new(100.0, 200.0, 50.0, 20.0)));
        let popup = host.insert(
            NodeSpec::new(Rect::new(0.0, 0.0, 200.0, 100.0)).position(PositionKind::Fixed),
        );
        host.set_viewport_scroll(perch_core::Point::new(0.0, 50.0));

        let config = PopupConfig::default().with_strategy(Strategy::Fixed);
        let mut controller = PopupController::new(Rc::clone(&host), anchor, popup, config);
        controller.start().unwrap();

        // Anchor viewport top is 150 after the scroll; popup sits above it.
        assert_eq!(host.style(popup, "top").as_deref(), Some("50px"));
        assert_eq!(host.style(popup, "position").as_deref(), Some("fixed"));
    }

    #[test]
    fn round_by_dpr_snaps_to_the_grid() {
        assert_eq!(round_by_dpr(25.3, 1.0), 25.0);
        assert_eq!(round_by_dpr(25.3, 2.0), 25.5);
        assert_eq!(round_by_dpr(25.3, 0.5), 25.0);
        assert_eq!(round_by_dpr(-3.7, 1.0), -4.0);
    }
}
