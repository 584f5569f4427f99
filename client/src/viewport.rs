//! Visible world rectangle tracking the local player

use macroquad::math::{vec2, Rect, Vec2};

/// Top-left corner of the visible world region, in world pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Centres the viewport on `focus`, then clamps each axis to the world.
    pub fn recompute(&mut self, focus: Vec2, canvas: Vec2, world_size: f32) {
        self.x = clamp_axis(focus.x - canvas.x / 2.0, canvas.x, world_size);
        self.y = clamp_axis(focus.y - canvas.y / 2.0, canvas.y, world_size);
    }

    pub fn offset(&self) -> Vec2 {
        vec2(self.x, self.y)
    }

    /// World-space rectangle covered by a canvas of the given size.
    pub fn rect(&self, canvas: Vec2) -> Rect {
        Rect::new(self.x, self.y, canvas.x, canvas.y)
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        world - self.offset()
    }
}

// A canvas larger than the world inverts the interval; pin to the origin then.
fn clamp_axis(start: f32, canvas: f32, world_size: f32) -> f32 {
    let max = (world_size - canvas).max(0.0);
    start.clamp(0.0, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_centres_on_focus_when_room_allows() {
        let mut viewport = Viewport::new();
        viewport.recompute(vec2(1000.0, 1000.0), vec2(800.0, 600.0), 2048.0);
        assert_approx_eq!(viewport.x, 600.0);
        assert_approx_eq!(viewport.y, 700.0);
    }

    #[test]
    fn test_clamps_at_top_left() {
        let mut viewport = Viewport::new();
        viewport.recompute(vec2(100.0, 100.0), vec2(800.0, 600.0), 2048.0);
        assert_eq!(viewport, Viewport { x: 0.0, y: 0.0 });
    }

    #[test]
    fn test_clamps_at_bottom_right() {
        let mut viewport = Viewport::new();
        viewport.recompute(vec2(2040.0, 2047.0), vec2(800.0, 600.0), 2048.0);
        assert_approx_eq!(viewport.x, 2048.0 - 800.0);
        assert_approx_eq!(viewport.y, 2048.0 - 600.0);
    }

    #[test]
    fn test_canvas_larger_than_world_pins_to_origin() {
        let mut viewport = Viewport::new();
        viewport.recompute(vec2(300.0, 50.0), vec2(1024.0, 200.0), 512.0);
        assert_approx_eq!(viewport.x, 0.0);
        assert_approx_eq!(viewport.y, 0.0);
    }

    #[test]
    fn test_stays_within_bounds_for_sampled_inputs() {
        let canvases = [(800.0, 600.0), (1920.0, 1080.0), (3000.0, 100.0), (1.0, 1.0)];
        let worlds = [256.0, 2048.0, 4096.0];
        let mut viewport = Viewport::new();

        for &(w, h) in &canvases {
            for &world in &worlds {
                for step in -4..=24 {
                    let p = step as f32 * 200.0;
                    viewport.recompute(vec2(p, world - p), vec2(w, h), world);

                    assert!(viewport.x >= 0.0);
                    assert!(viewport.y >= 0.0);
                    assert!(viewport.x <= (world - w).max(0.0));
                    assert!(viewport.y <= (world - h).max(0.0));
                }
            }
        }
    }

    #[test]
    fn test_recompute_has_no_hidden_state() {
        let mut a = Viewport::new();
        let mut b = Viewport { x: 999.0, y: 999.0 };
        a.recompute(vec2(700.0, 900.0), vec2(640.0, 480.0), 2048.0);
        b.recompute(vec2(700.0, 900.0), vec2(640.0, 480.0), 2048.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_world_to_screen() {
        let viewport = Viewport { x: 600.0, y: 700.0 };
        let screen = viewport.world_to_screen(vec2(1000.0, 1000.0));
        assert_approx_eq!(screen.x, 400.0);
        assert_approx_eq!(screen.y, 300.0);

        let rect = viewport.rect(vec2(800.0, 600.0));
        assert_approx_eq!(rect.w, 800.0);
        assert_approx_eq!(rect.x, 600.0);
    }
}
