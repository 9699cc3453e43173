//! Pan/zoom transform between screen and world space.
//!
//! `screen = world * scale + offset`.

use kurbo::{Point, Vec2};

pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 3.0;
/// Zoom step per wheel notch.
pub const WHEEL_ZOOM_IN: f64 = 1.1;
pub const WHEEL_ZOOM_OUT: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub offset: Vec2,
    pub scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl Viewport {
    pub fn screen_to_world(&self, p: Point) -> Point {
        ((p.to_vec2() - self.offset) / self.scale).to_point()
    }

    pub fn world_to_screen(&self, p: Point) -> Point {
        (p.to_vec2() * self.scale + self.offset).to_point()
    }

    pub fn pan(&mut self, screen_delta: Vec2) {
        self.offset += screen_delta;
    }

    /// Multiply the scale by `factor` (clamped to [`MIN_SCALE`],
    /// [`MAX_SCALE`]) while keeping the world point under `screen` fixed.
    pub fn zoom_at(&mut self, screen: Point, factor: f64) {
        let anchor = self.screen_to_world(screen);
        self.scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        self.offset = screen.to_vec2() - anchor.to_vec2() * self.scale;
    }

    /// Wheel convention: scrolling down zooms out.
    pub fn wheel(&mut self, screen: Point, delta_y: f64) {
        let factor = if delta_y > 0.0 { WHEEL_ZOOM_OUT } else { WHEEL_ZOOM_IN };
        self.zoom_at(screen, factor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        a.distance(b) < 1e-9
    }

    #[test]
    fn conversions_are_inverse() {
        let vp = Viewport {
            offset: Vec2::new(30.0, -12.0),
            scale: 1.5,
        };
        let p = Point::new(17.0, 240.0);
        assert!(close(vp.screen_to_world(vp.world_to_screen(p)), p));
    }

    #[test]
    fn zoom_keeps_cursor_anchor() {
        let mut vp = Viewport::default();
        vp.pan(Vec2::new(100.0, 50.0));
        let cursor = Point::new(400.0, 300.0);
        let before = vp.screen_to_world(cursor);
        vp.zoom_at(cursor, 2.0);
        assert_eq!(vp.scale, 2.0);
        assert!(close(vp.screen_to_world(cursor), before));
    }

    #[test]
    fn zoom_is_clamped() {
        let mut vp = Viewport::default();
        for _ in 0..50 {
            vp.wheel(Point::ZERO, -1.0);
        }
        assert_eq!(vp.scale, MAX_SCALE);
        for _ in 0..100 {
            vp.wheel(Point::ZERO, 1.0);
        }
        assert_eq!(vp.scale, MIN_SCALE);
    }
}
