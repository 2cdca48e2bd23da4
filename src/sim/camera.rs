/// Smooth-follow camera. Keeps the target centered, clamps the view to
/// the world, and eases toward the target by a fixed fraction per frame.
///
/// The smoothing factor is per frame, not dt-scaled. Scaling it by dt
/// changes the ease curve with the frame rate and makes the camera feel
/// different on slow terminals; the fixed fraction is the shipped feel.

use crate::domain::entity::Rect;

const SMOOTHING: f32 = 0.1;
/// Extra world pixels kept on each side of the view when culling, so
/// entities straddling the edge still draw.
const CULL_MARGIN: f32 = 64.0;

#[derive(Clone, Debug)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    /// Viewport size in world pixels. The renderer sets this every frame
    /// from the terminal size.
    pub view_w: f32,
    pub view_h: f32,
    pub world_w: f32,
    pub world_h: f32,
}

impl Camera {
    pub fn new(world_w: f32, world_h: f32) -> Self {
        Camera {
            x: 0.0,
            y: 0.0,
            view_w: 854.0,
            view_h: 480.0,
            world_w,
            world_h,
        }
    }

    pub fn set_viewport(&mut self, w: f32, h: f32) {
        self.view_w = w;
        self.view_h = h;
    }

    /// Where the camera wants to be for this target: target centered,
    /// clamped so the view never leaves the world.
    fn desired(&self, target: &Rect) -> (f32, f32) {
        let max_x = (self.world_w - self.view_w).max(0.0);
        let max_y = (self.world_h - self.view_h).max(0.0);
        let dx = (target.center_x() - self.view_w / 2.0).clamp(0.0, max_x);
        let dy = (target.center_y() - self.view_h / 2.0).clamp(0.0, max_y);
        (dx, dy)
    }

    /// Ease one frame toward the target. Call once per rendered frame.
    /// The eased position is rounded to whole pixels; a sub-pixel camera
    /// makes everything on screen shimmer as rects straddle cell edges.
    pub fn follow(&mut self, target: &Rect) {
        let (dx, dy) = self.desired(target);
        self.x = (self.x + (dx - self.x) * SMOOTHING).round();
        self.y = (self.y + (dy - self.y) * SMOOTHING).round();
    }

    /// Jump straight to the target (level load, restart).
    pub fn snap_to(&mut self, target: &Rect) {
        let (dx, dy) = self.desired(target);
        self.x = dx;
        self.y = dy;
    }

    /// Rounded draw origin. Rendering from whole pixels avoids shimmer
    /// between entities that move together.
    pub fn draw_x(&self) -> f32 {
        self.x.round()
    }

    pub fn draw_y(&self) -> f32 {
        self.y.round()
    }

    /// Should this rect be drawn at all this frame?
    pub fn is_visible(&self, rect: &Rect) -> bool {
        rect.right() > self.x - CULL_MARGIN
            && rect.x < self.x + self.view_w + CULL_MARGIN
            && rect.bottom() > self.y - CULL_MARGIN
            && rect.y < self.y + self.view_h + CULL_MARGIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect { x, y, w, h }
    }

    #[test]
    fn eases_a_fixed_fraction_per_call() {
        let mut cam = Camera::new(2562.0, 1440.0);
        let target = r(1000.0, 700.0, 50.0, 50.0);
        let (dx, dy) = cam.desired(&target);
        cam.follow(&target);
        // 10% of the gap, to the nearest pixel
        assert!((cam.x - dx * 0.1).abs() <= 0.5);
        assert!((cam.y - dy * 0.1).abs() <= 0.5);
        let gap_before = dx - cam.x;
        cam.follow(&target);
        let gap_after = dx - cam.x;
        assert!((gap_after - gap_before * 0.9).abs() <= 0.5);
    }

    #[test]
    fn position_stays_on_whole_pixels() {
        let mut cam = Camera::new(2562.0, 1440.0);
        let target = r(1003.0, 707.0, 50.0, 50.0);
        for _ in 0..20 {
            cam.follow(&target);
            assert_eq!(cam.x.fract(), 0.0);
            assert_eq!(cam.y.fract(), 0.0);
        }
    }

    #[test]
    fn converges_on_a_still_target() {
        let mut cam = Camera::new(2562.0, 1440.0);
        let target = r(1200.0, 800.0, 50.0, 50.0);
        for _ in 0..200 {
            cam.follow(&target);
        }
        // Pixel rounding stalls the ease once a 10% step is under half a
        // pixel, so the camera parks within a few pixels of dead center
        let (dx, dy) = cam.desired(&target);
        assert!((cam.x - dx).abs() < 5.0);
        assert!((cam.y - dy).abs() < 5.0);
    }

    #[test]
    fn clamps_to_world_edges() {
        let mut cam = Camera::new(2562.0, 1440.0);
        // Target in the top-left corner: desired position is 0,0
        let corner = r(0.0, 0.0, 50.0, 50.0);
        cam.snap_to(&corner);
        assert_eq!((cam.x, cam.y), (0.0, 0.0));
        // Bottom-right corner: view flush with the far edges
        let far = r(2550.0, 1430.0, 50.0, 50.0);
        cam.snap_to(&far);
        assert_eq!(cam.x, 2562.0 - cam.view_w);
        assert_eq!(cam.y, 1440.0 - cam.view_h);
    }

    #[test]
    fn world_smaller_than_view_pins_at_origin() {
        let mut cam = Camera::new(400.0, 300.0);
        cam.snap_to(&r(200.0, 150.0, 50.0, 50.0));
        assert_eq!((cam.x, cam.y), (0.0, 0.0));
    }

    #[test]
    fn draw_origin_is_rounded() {
        let mut cam = Camera::new(2562.0, 1440.0);
        cam.x = 100.4;
        cam.y = 99.6;
        assert_eq!(cam.draw_x(), 100.0);
        assert_eq!(cam.draw_y(), 100.0);
    }

    #[test]
    fn culling_keeps_a_margin() {
        let mut cam = Camera::new(2562.0, 1440.0);
        cam.x = 500.0;
        cam.y = 0.0;
        assert!(cam.is_visible(&r(500.0, 100.0, 50.0, 50.0)));
        // Just off the left edge, inside the margin
        assert!(cam.is_visible(&r(450.0, 100.0, 40.0, 40.0)));
        // Far off screen
        assert!(!cam.is_visible(&r(0.0, 100.0, 50.0, 50.0)));
        assert!(!cam.is_visible(&r(2400.0, 100.0, 50.0, 50.0)));
    }
}
