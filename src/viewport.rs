//! Camera rectangle derived from the local player, canvas and world size.
//!
//! Pure functions only; the session caches the last result and recomputes
//! it when the local player moves or the canvas is resized.

use crate::types::{Rect, Size, Vec2};

/// Center a `canvas`-sized rectangle on `focus` and clamp it into `world`.
///
/// Each axis is handled independently.  When the world is at least as large
/// as the canvas on an axis the origin is clamped to `[0, world - canvas]`;
/// when it is smaller, the rectangle stays centered on the focus, unclamped.
pub fn compute(focus: Vec2, canvas: Size, world: Size) -> Rect {
    Rect::new(
        axis_origin(focus.x, canvas.width, world.width),
        axis_origin(focus.y, canvas.height, world.height),
        canvas.width,
        canvas.height,
    )
}

fn axis_origin(center: f32, span: f32, extent: f32) -> f32 {
    let origin = center - span / 2.0;
    if extent >= span {
        origin.clamp(0.0, extent - span)
    } else {
        origin
    }
}

/// Project a world-space position into viewport (screen) space.
pub fn to_screen(viewport: &Rect, world_pos: Vec2) -> Vec2 {
    Vec2::new(world_pos.x - viewport.x, world_pos.y - viewport.y)
}

/// True if any part of the world-space rectangle is inside the viewport.
pub fn is_visible(viewport: &Rect, bounds: &Rect) -> bool {
    viewport.intersects(bounds)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const WORLD: Size = Size {
        width: 2048.0,
        height: 2048.0,
    };
    const CANVAS: Size = Size {
        width: 800.0,
        height: 600.0,
    };

    #[test]
    fn centered_when_far_from_edges() {
        let r = compute(Vec2::new(1000.0, 1000.0), CANVAS, WORLD);
        assert_eq!(r, Rect::new(600.0, 700.0, 800.0, 600.0));
    }

    #[test]
    fn clamps_at_top_left() {
        let r = compute(Vec2::new(100.0, 100.0), CANVAS, WORLD);
        assert_eq!(r.origin(), Vec2::new(0.0, 0.0));
    }

    #[test]
    fn clamps_at_bottom_right() {
        let r = compute(Vec2::new(2000.0, 2000.0), CANVAS, WORLD);
        assert_eq!(r.origin(), Vec2::new(1248.0, 1448.0));
    }

    #[test]
    fn small_world_axis_stays_centered_on_player() {
        let world = Size::new(500.0, 2048.0);
        let r = compute(Vec2::new(250.0, 100.0), CANVAS, world);
        assert_eq!(r.x, 250.0 - 400.0);
        assert_eq!(r.y, 0.0);
    }

    #[test]
    fn exact_fit_pins_origin_to_zero() {
        let r = compute(Vec2::new(10.0, 590.0), CANVAS, CANVAS);
        assert_eq!(r.origin(), Vec2::new(0.0, 0.0));
    }

    #[test]
    fn screen_projection_subtracts_origin() {
        let vp = Rect::new(1248.0, 1448.0, 800.0, 600.0);
        assert_eq!(
            to_screen(&vp, Vec2::new(2000.0, 2000.0)),
            Vec2::new(752.0, 552.0)
        );
    }

    #[test]
    fn visibility_of_world_rects() {
        let vp = Rect::new(100.0, 100.0, 800.0, 600.0);
        assert!(is_visible(&vp, &Rect::new(90.0, 90.0, 20.0, 20.0)));
        assert!(!is_visible(&vp, &Rect::new(0.0, 0.0, 50.0, 50.0)));
        assert!(!is_visible(&vp, &Rect::new(900.0, 100.0, 10.0, 10.0)));
    }
}
