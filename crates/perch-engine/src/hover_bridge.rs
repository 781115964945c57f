#![forbid(unsafe_code)]

//! Hover-bridge geometry.
//!
//! A hover-triggered popup with a positive distance leaves a gap between the
//! anchor and the popup; the pointer crossing that gap would otherwise leave
//! both elements and close the popup. The bridge is an invisible element
//! clipped to the quadrilateral spanning the facing edges, so the gap counts
//! as hovered.

use perch_core::{Point, Rect, Side};

/// The quadrilateral bridging the gap between the popup and its anchor, in
/// the coordinate space of the input rects. `side` is the resolved placement
/// side (where the popup sits relative to the anchor). `None` when the rects
/// touch or overlap on that axis and no bridge is needed.
#[must_use]
pub fn hover_bridge_polygon(anchor: Rect, popup: Rect, side: Side) -> Option<[Point; 4]> {
    let gap = match side {
        Side::Top => anchor.top() - popup.bottom(),
        Side::Bottom => popup.top() - anchor.bottom(),
        Side::Left => anchor.left() - popup.right(),
        Side::Right => popup.left() - anchor.right(),
    };
    if gap <= 0.0 {
        return None;
    }

    // Vertices walk the popup's facing edge, then the anchor's, so the
    // polygon never self-intersects.
    let points = match side {
        Side::Top => [
            Point::new(popup.left(), popup.bottom()),
            Point::new(popup.right(), popup.bottom()),
            Point::new(anchor.right(), anchor.top()),
            Point::new(anchor.left(), anchor.top()),
        ],
        Side::Bottom => [
            Point::new(popup.left(), popup.top()),
            Point::new(popup.right(), popup.top()),
            Point::new(anchor.right(), anchor.bottom()),
            Point::new(anchor.left(), anchor.bottom()),
        ],
        Side::Left => [
            Point::new(popup.right(), popup.top()),
            Point::new(popup.right(), popup.bottom()),
            Point::new(anchor.left(), anchor.bottom()),
            Point::new(anchor.left(), anchor.top()),
        ],
        Side::Right => [
            Point::new(popup.left(), popup.top()),
            Point::new(popup.left(), popup.bottom()),
            Point::new(anchor.right(), anchor.bottom()),
            Point::new(anchor.right(), anchor.top()),
        ],
    };
    Some(points)
}

/// Render polygon vertices as a CSS `clip-path` value.
#[must_use]
pub fn clip_path(points: &[Point; 4]) -> String {
    let mut out = String::from("polygon(");
    for (index, point) in points.iter().enumerate() {
        if index > 0 {
            out.push_str(", ");
        }
        out.push_str(&format!("{}px {}px", point.x, point.y));
    }
    out.push(')');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridges_the_gap_above_the_anchor() {
        let anchor = Rect::new(100.0, 100.0, 50.0, 20.0);
        let popup = Rect::new(25.0, -8.0, 200.0, 100.0);
        let points = hover_bridge_polygon(anchor, popup, Side::Top).unwrap();
        assert_eq!(points[0], Point::new(25.0, 92.0));
        assert_eq!(points[1], Point::new(225.0, 92.0));
        assert_eq!(points[2], Point::new(150.0, 100.0));
        assert_eq!(points[3], Point::new(100.0, 100.0));
    }

    #[test]
    fn bridges_the_gap_right_of_the_anchor() {
        let anchor = Rect::new(100.0, 100.0, 50.0, 20.0);
        let popup = Rect::new(160.0, 60.0, 200.0, 100.0);
        let points = hover_bridge_polygon(anchor, popup, Side::Right).unwrap();
        assert_eq!(points[0], Point::new(160.0, 60.0));
        assert_eq!(points[1], Point::new(160.0, 160.0));
        assert_eq!(points[2], Point::new(150.0, 120.0));
        assert_eq!(points[3], Point::new(150.0, 100.0));
    }

    #[test]
    fn touching_rects_need_no_bridge() {
        let anchor = Rect::new(100.0, 100.0, 50.0, 20.0);
        // Zero-distance placement: popup bottom meets anchor top exactly.
        let popup = Rect::new(25.0, 0.0, 200.0, 100.0);
        assert!(hover_bridge_polygon(anchor, popup, Side::Top).is_none());
    }

    #[test]
    fn overlapping_rects_need_no_bridge() {
        let anchor = Rect::new(100.0, 100.0, 50.0, 20.0);
        let popup = Rect::new(90.0, 90.0, 200.0, 100.0);
        assert!(hover_bridge_polygon(anchor, popup, Side::Bottom).is_none());
    }

    #[test]
    fn clip_path_spelling() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 5.5),
            Point::new(0.0, 5.5),
        ];
        assert_eq!(
            clip_path(&points),
            "polygon(0px 0px, 10px 0px, 10px 5.5px, 0px 5.5px)"
        );
    }
}
