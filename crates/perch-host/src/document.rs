#![forbid(unsafe_code)]

//! The host document tree and its platform implementation.

use std::cell::RefCell;

use rustc_hash::FxHashMap;
use tracing::debug;

use perch_core::geometry::{Dimensions, Point, Rect, Scale};
use perch_core::placement::ElementRects;
use perch_core::platform::{
    Boundary, ElementId, Platform, PlatformError, Strategy, StyleSink,
};

/// CSS position scheme of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionKind {
    #[default]
    Static,
    Relative,
    Absolute,
    /// Positioned against the viewport; ancestor scroll does not move it.
    Fixed,
}

/// Overflow behavior of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowKind {
    #[default]
    Visible,
    /// Clips and scrolls; registered as a scroll ancestor.
    Scroll,
    /// Clips without scrolling.
    Clip,
}

/// The top-level visual viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll: Point,
    /// Space taken by a visible scrollbar; client width excludes it.
    pub scrollbar_gutter: f64,
}

impl Viewport {
    /// Client width: the layout viewport minus the scrollbar gutter.
    #[inline]
    pub fn client_width(&self) -> f64 {
        (self.width - self.scrollbar_gutter).max(0.0)
    }

    /// Client height.
    #[inline]
    pub const fn client_height(&self) -> f64 {
        self.height
    }

    fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.client_width(), self.client_height())
    }
}

/// Declarative description of a node to insert.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeSpec {
    pub rect: Rect,
    pub position: PositionKind,
    pub overflow: OverflowKind,
    pub scale: Scale,
    /// The node embeds a nested document.
    pub frame: bool,
    /// Geometry beyond this frame boundary is not observable.
    pub cross_origin: bool,
}

impl NodeSpec {
    /// A static, visible, unscaled node with the given rect.
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            position: PositionKind::Static,
            overflow: OverflowKind::Visible,
            scale: Scale::IDENTITY,
            frame: false,
            cross_origin: false,
        }
    }

    /// Set the position scheme.
    #[must_use]
    pub const fn position(mut self, position: PositionKind) -> Self {
        self.position = position;
        self
    }

    /// Set the overflow behavior.
    #[must_use]
    pub const fn overflow(mut self, overflow: OverflowKind) -> Self {
        self.overflow = overflow;
        self
    }

    /// Set the scale factors.
    #[must_use]
    pub const fn scale(mut self, scale: Scale) -> Self {
        self.scale = scale;
        self
    }

    /// Mark as a frame boundary.
    #[must_use]
    pub const fn frame(mut self) -> Self {
        self.frame = true;
        self
    }

    /// Mark as a cross-origin frame boundary.
    #[must_use]
    pub const fn cross_origin_frame(mut self) -> Self {
        self.frame = true;
        self.cross_origin = true;
        self
    }
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<ElementId>,
    rect: Rect,
    scroll: Point,
    scale: Scale,
    position: PositionKind,
    overflow: OverflowKind,
    frame: bool,
    cross_origin: bool,
    detached: bool,
    styles: FxHashMap<String, String>,
    attributes: FxHashMap<String, String>,
}

impl Node {
    fn from_spec(parent: Option<ElementId>, spec: NodeSpec) -> Self {
        Self {
            parent,
            rect: spec.rect,
            scroll: Point::default(),
            scale: spec.scale,
            position: spec.position,
            overflow: spec.overflow,
            frame: spec.frame,
            cross_origin: spec.cross_origin,
            detached: false,
            styles: FxHashMap::default(),
            attributes: FxHashMap::default(),
        }
    }
}

#[derive(Debug)]
struct DocState {
    nodes: FxHashMap<ElementId, Node>,
    next_id: u64,
    viewport: Viewport,
    document_size: Dimensions,
    rtl: bool,
    device_pixel_ratio: f64,
}

/// An in-memory document implementing the platform contract.
///
/// All methods take `&self`; interior mutability lets one document serve as
/// both the read side (`Platform`) and the write side (`StyleSink`) of a
/// positioning run. Single-threaded by design, like the event loop it stands
/// in for.
#[derive(Debug)]
pub struct HostDocument {
    state: RefCell<DocState>,
}

impl HostDocument {
    /// A document with the given viewport size.
    pub fn new(viewport_width: f64, viewport_height: f64) -> Self {
        Self {
            state: RefCell::new(DocState {
                nodes: FxHashMap::default(),
                next_id: 1,
                viewport: Viewport {
                    width: viewport_width,
                    height: viewport_height,
                    scroll: Point::default(),
                    scrollbar_gutter: 0.0,
                },
                document_size: Dimensions::new(viewport_width, viewport_height),
                rtl: false,
                device_pixel_ratio: 1.0,
            }),
        }
    }

    /// Insert a root-level node.
    pub fn insert(&self, spec: NodeSpec) -> ElementId {
        let mut state = self.state.borrow_mut();
        let id = alloc_id(&mut state);
        state.nodes.insert(id, Node::from_spec(None, spec));
        id
    }

    /// Insert a child of an existing node.
    pub fn insert_child(&self, parent: ElementId, spec: NodeSpec) -> Result<ElementId, PlatformError> {
        let mut state = self.state.borrow_mut();
        if !state.nodes.contains_key(&parent) {
            return Err(PlatformError::UnknownElement(parent));
        }
        let id = alloc_id(&mut state);
        state.nodes.insert(id, Node::from_spec(Some(parent), spec));
        Ok(id)
    }

    /// Replace a node's rect.
    pub fn set_rect(&self, element: ElementId, rect: Rect) {
        if let Some(node) = self.state.borrow_mut().nodes.get_mut(&element) {
            node.rect = rect;
        }
    }

    /// Set a node's scroll offsets.
    pub fn set_scroll(&self, element: ElementId, scroll: Point) {
        if let Some(node) = self.state.borrow_mut().nodes.get_mut(&element) {
            node.scroll = scroll;
        }
    }

    /// Set a node's scale factors.
    pub fn set_scale(&self, element: ElementId, scale: Scale) {
        if let Some(node) = self.state.borrow_mut().nodes.get_mut(&element) {
            node.scale = scale;
        }
    }

    /// Detach a node from the document; geometry lookups on it fail until it
    /// is re-attached, and boundaries referencing it degrade to the viewport.
    pub fn detach(&self, element: ElementId) {
        if let Some(node) = self.state.borrow_mut().nodes.get_mut(&element) {
            node.detached = true;
        }
    }

    /// Re-attach a previously detached node.
    pub fn reattach(&self, element: ElementId) {
        if let Some(node) = self.state.borrow_mut().nodes.get_mut(&element) {
            node.detached = false;
        }
    }

    /// Scroll the viewport itself.
    pub fn set_viewport_scroll(&self, scroll: Point) {
        self.state.borrow_mut().viewport.scroll = scroll;
    }

    /// Set the scrollbar gutter width subtracted from the client width.
    pub fn set_scrollbar_gutter(&self, gutter: f64) {
        self.state.borrow_mut().viewport.scrollbar_gutter = gutter.max(0.0);
    }

    /// Set the full document size (for the `Document` boundary).
    pub fn set_document_size(&self, size: Dimensions) {
        self.state.borrow_mut().document_size = size;
    }

    /// Switch the writing direction.
    pub fn set_rtl(&self, rtl: bool) {
        self.state.borrow_mut().rtl = rtl;
    }

    /// Set the device pixel ratio reported to the engine.
    pub fn set_device_pixel_ratio(&self, ratio: f64) {
        self.state.borrow_mut().device_pixel_ratio = ratio.max(f64::MIN_POSITIVE);
    }

    /// Current viewport.
    pub fn viewport(&self) -> Viewport {
        self.state.borrow().viewport
    }

    /// Inline style value previously written through the sink, if any.
    pub fn style(&self, element: ElementId, property: &str) -> Option<String> {
        self.state
            .borrow()
            .nodes
            .get(&element)
            .and_then(|node| node.styles.get(property).cloned())
    }

    /// Attribute value previously written through the sink, if any.
    pub fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        self.state
            .borrow()
            .nodes
            .get(&element)
            .and_then(|node| node.attributes.get(name).cloned())
    }

    /// Bounding rectangle in viewport coordinates.
    ///
    /// Accumulates ancestor origins and subtracts ancestor scroll; fixed
    /// nodes skip both up to their enclosing frame. Past a cross-origin
    /// frame, scroll offsets are unobservable and are skipped (best-effort
    /// geometry rather than an error).
    pub fn bounding_rect(&self, element: ElementId) -> Result<Rect, PlatformError> {
        let state = self.state.borrow();
        Self::bounding_rect_inner(&state, element)
    }

    fn bounding_rect_inner(state: &DocState, element: ElementId) -> Result<Rect, PlatformError> {
        let node = state
            .nodes
            .get(&element)
            .ok_or(PlatformError::UnknownElement(element))?;
        if node.detached {
            return Err(PlatformError::Detached(element));
        }

        let mut x = node.rect.x;
        let mut y = node.rect.y;
        let width = node.rect.width * node.scale.x;
        let height = node.rect.height * node.scale.y;

        let mut in_fixed_scope = node.position == PositionKind::Fixed;
        let mut scrolls_known = true;
        let mut current = node.parent;
        while let Some(parent_id) = current {
            let Some(parent) = state.nodes.get(&parent_id) else {
                break;
            };
            if parent.frame {
                x += parent.rect.x;
                y += parent.rect.y;
                if parent.cross_origin && scrolls_known {
                    debug!(frame = %parent_id, "cross-origin frame: scroll offsets beyond this boundary are unobservable");
                    scrolls_known = false;
                }
                // Beyond the frame the element is ordinary embedded content.
                in_fixed_scope = false;
                current = parent.parent;
                continue;
            }
            if in_fixed_scope {
                current = parent.parent;
                continue;
            }
            x += parent.rect.x;
            y += parent.rect.y;
            if scrolls_known {
                x -= parent.scroll.x;
                y -= parent.scroll.y;
            }
            current = parent.parent;
        }

        if !in_fixed_scope && scrolls_known {
            x -= state.viewport.scroll.x;
            y -= state.viewport.scroll.y;
        }

        Ok(Rect::new(x, y, width, height))
    }

    /// Nearest positioned ancestor, `None` for fixed nodes and nodes whose
    /// chain reaches the document (or a frame boundary) first.
    pub fn offset_parent(&self, element: ElementId) -> Option<ElementId> {
        let state = self.state.borrow();
        let node = state.nodes.get(&element)?;
        if node.position == PositionKind::Fixed {
            return None;
        }
        let mut current = node.parent;
        while let Some(parent_id) = current {
            let parent = state.nodes.get(&parent_id)?;
            if parent.frame {
                return None;
            }
            if parent.position != PositionKind::Static {
                return Some(parent_id);
            }
            current = parent.parent;
        }
        None
    }

    fn offset_parent_shift(state: &DocState, floating: ElementId) -> (f64, f64) {
        // Translation from the floating element's positioning space to
        // viewport coordinates.
        let node = state.nodes.get(&floating);
        let fixed = node.is_some_and(|n| n.position == PositionKind::Fixed);
        if fixed {
            return (0.0, 0.0);
        }
        let op = node
            .and_then(|n| {
                let mut current = n.parent;
                while let Some(parent_id) = current {
                    let parent = state.nodes.get(&parent_id)?;
                    if parent.frame {
                        return None;
                    }
                    if parent.position != PositionKind::Static {
                        return Some(parent_id);
                    }
                    current = parent.parent;
                }
                None
            });
        match op {
            Some(op_id) => match Self::bounding_rect_inner(state, op_id) {
                Ok(op_rect) => {
                    let scroll = state
                        .nodes
                        .get(&op_id)
                        .map(|n| n.scroll)
                        .unwrap_or_default();
                    (op_rect.x - scroll.x, op_rect.y - scroll.y)
                }
                Err(_) => (0.0, 0.0),
            },
            // Document-positioned: the space is document coordinates.
            None => (-state.viewport.scroll.x, -state.viewport.scroll.y),
        }
    }
}

impl Platform for HostDocument {
    fn element_rects(
        &self,
        reference: ElementId,
        floating: ElementId,
        strategy: Strategy,
    ) -> Result<ElementRects, PlatformError> {
        let state = self.state.borrow();
        let floating_node = state
            .nodes
            .get(&floating)
            .ok_or(PlatformError::UnknownElement(floating))?;
        if floating_node.detached {
            return Err(PlatformError::Detached(floating));
        }
        let floating_dims = Dimensions::new(
            floating_node.rect.width * floating_node.scale.x,
            floating_node.rect.height * floating_node.scale.y,
        );

        let viewport_rect = Self::bounding_rect_inner(&state, reference)?;
        let reference_rect = match strategy {
            Strategy::Fixed => viewport_rect,
            Strategy::Absolute => {
                let (dx, dy) = Self::offset_parent_shift(&state, floating);
                viewport_rect.translated(-dx, -dy)
            }
        };

        Ok(ElementRects {
            reference: reference_rect,
            floating: Rect::from_dimensions(floating_dims),
        })
    }

    fn clipping_rect(&self, element: ElementId, boundary: Boundary, _strategy: Strategy) -> Rect {
        let state = self.state.borrow();
        let viewport_rect = state.viewport.rect();
        match boundary {
            Boundary::Viewport => viewport_rect,
            Boundary::Document => Rect::new(
                -state.viewport.scroll.x,
                -state.viewport.scroll.y,
                state.document_size.width.max(state.viewport.width),
                state.document_size.height.max(state.viewport.height),
            ),
            Boundary::Element(id) => match Self::bounding_rect_inner(&state, id) {
                Ok(rect) => rect,
                Err(err) => {
                    debug!(%err, "boundary element unresolvable; degrading to viewport");
                    viewport_rect
                }
            },
            Boundary::ClippingAncestors => {
                let Some(node) = state.nodes.get(&element) else {
                    debug!(%element, "clipping target unknown; degrading to viewport");
                    return viewport_rect;
                };
                if node.detached {
                    debug!(%element, "clipping target detached; degrading to viewport");
                    return viewport_rect;
                }
                let mut clip = viewport_rect;
                let mut current = node.parent;
                while let Some(parent_id) = current {
                    let Some(parent) = state.nodes.get(&parent_id) else {
                        break;
                    };
                    let clips = parent.frame || parent.overflow != OverflowKind::Visible;
                    if clips {
                        match Self::bounding_rect_inner(&state, parent_id) {
                            Ok(rect) => clip = clip.intersection(&rect),
                            Err(err) => {
                                debug!(%err, "clipping ancestor unresolvable; skipping");
                            }
                        }
                    }
                    current = parent.parent;
                }
                clip
            }
        }
    }

    fn dimensions(&self, element: ElementId) -> Result<Dimensions, PlatformError> {
        let state = self.state.borrow();
        let node = state
            .nodes
            .get(&element)
            .ok_or(PlatformError::UnknownElement(element))?;
        if node.detached {
            return Err(PlatformError::Detached(element));
        }
        Ok(Dimensions::new(
            node.rect.width * node.scale.x,
            node.rect.height * node.scale.y,
        ))
    }

    fn offset_to_viewport(&self, rect: Rect, floating: ElementId, strategy: Strategy) -> Rect {
        if strategy == Strategy::Fixed {
            return rect;
        }
        let state = self.state.borrow();
        let (dx, dy) = Self::offset_parent_shift(&state, floating);
        rect.translated(dx, dy)
    }

    fn scale(&self, element: ElementId) -> Scale {
        self.state
            .borrow()
            .nodes
            .get(&element)
            .map(|node| node.scale)
            .unwrap_or(Scale::IDENTITY)
    }

    fn is_rtl(&self, _element: ElementId) -> bool {
        self.state.borrow().rtl
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.state.borrow().device_pixel_ratio
    }

    fn scroll_ancestors(&self, element: ElementId) -> Vec<ElementId> {
        let state = self.state.borrow();
        let mut ancestors = Vec::new();
        let Some(node) = state.nodes.get(&element) else {
            return ancestors;
        };
        let mut current = node.parent;
        while let Some(parent_id) = current {
            let Some(parent) = state.nodes.get(&parent_id) else {
                break;
            };
            if parent.overflow == OverflowKind::Scroll {
                ancestors.push(parent_id);
            }
            current = parent.parent;
        }
        ancestors
    }
}

impl StyleSink for HostDocument {
    fn set_style(&self, element: ElementId, property: &str, value: &str) {
        let mut state = self.state.borrow_mut();
        let Some(node) = state.nodes.get_mut(&element) else {
            return;
        };
        // Geometry-affecting properties update the node's layout box so a
        // subsequent measurement observes the write (round-trip contract).
        if let Some(pixels) = parse_px(value) {
            match property {
                "left" => node.rect.x = pixels,
                "top" => node.rect.y = pixels,
                "width" => node.rect.width = (pixels / node.scale.x).max(0.0),
                "height" => node.rect.height = (pixels / node.scale.y).max(0.0),
                _ => {}
            }
        }
        node.styles.insert(property.to_owned(), value.to_owned());
    }

    fn clear_style(&self, element: ElementId, property: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(node) = state.nodes.get_mut(&element) {
            node.styles.remove(property);
        }
    }

    fn set_attribute(&self, element: ElementId, name: &str, value: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(node) = state.nodes.get_mut(&element) {
            node.attributes.insert(name.to_owned(), value.to_owned());
        }
    }

    fn remove_attribute(&self, element: ElementId, name: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(node) = state.nodes.get_mut(&element) {
            node.attributes.remove(name);
        }
    }
}

fn alloc_id(state: &mut DocState) -> ElementId {
    loop {
        let raw = state.next_id;
        state.next_id += 1;
        if let Some(id) = ElementId::new(raw) {
            return id;
        }
    }
}

fn parse_px(value: &str) -> Option<f64> {
    value.strip_suffix("px")?.trim().parse().ok()
}
