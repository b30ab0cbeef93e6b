//! Pointer tracking.
//!
//! `PointerTracker` keeps the most recent pointer position in normalized
//! device coordinates. Older samples are simply overwritten: the frame loop
//! reads the latest value once per frame and slightly stale input is
//! visually tolerable, so there is no queue and no locking.

use glam::Vec2;
use winit::dpi::PhysicalPosition;

/// Latest pointer position in normalized device coordinates.
///
/// Origin is at the center of the window. X increases to the right,
/// Y increases upward, both in `[-1, 1]`.
#[derive(Debug)]
pub struct PointerTracker {
    ndc: Vec2,
    window_size: (u32, u32),
}

impl PointerTracker {
    /// Create a tracker for a window of the given pixel size.
    ///
    /// The pointer starts at the center of the window.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            ndc: Vec2::ZERO,
            window_size: (width, height),
        }
    }

    /// Record the viewport size used for normalization.
    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
    }

    /// Record a pointer move at the given pixel position. Last write wins.
    pub fn handle_move(&mut self, position: PhysicalPosition<f64>) {
        let (w, h) = self.window_size;
        if w > 0 && h > 0 {
            self.ndc = Vec2::new(
                (position.x as f32 / w as f32) * 2.0 - 1.0,
                -((position.y as f32 / h as f32) * 2.0 - 1.0),
            );
        }
    }

    /// The most recent pointer position in NDC.
    pub fn ndc(&self) -> Vec2 {
        self.ndc
    }
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moved(tracker: &mut PointerTracker, x: f64, y: f64) -> Vec2 {
        tracker.handle_move(PhysicalPosition::new(x, y));
        tracker.ndc()
    }

    #[test]
    fn test_corners_map_to_ndc_corners() {
        let mut tracker = PointerTracker::new(800, 600);

        // Top-left pixel is (-1, 1): X left edge, Y flipped upward.
        assert_eq!(moved(&mut tracker, 0.0, 0.0), Vec2::new(-1.0, 1.0));
        // Bottom-right pixel is (1, -1).
        assert_eq!(moved(&mut tracker, 800.0, 600.0), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn test_center_maps_to_origin() {
        let mut tracker = PointerTracker::new(800, 600);
        let ndc = moved(&mut tracker, 400.0, 300.0);
        assert!(ndc.x.abs() < 1e-6);
        assert!(ndc.y.abs() < 1e-6);
    }

    #[test]
    fn test_last_write_wins() {
        let mut tracker = PointerTracker::new(800, 600);
        moved(&mut tracker, 0.0, 0.0);
        let last = moved(&mut tracker, 800.0, 600.0);
        assert_eq!(tracker.ndc(), last);
    }

    #[test]
    fn test_resize_changes_normalization() {
        let mut tracker = PointerTracker::new(800, 600);
        moved(&mut tracker, 400.0, 300.0);
        tracker.set_window_size(400, 300);
        // Same pixel is now the bottom-right corner.
        assert_eq!(moved(&mut tracker, 400.0, 300.0), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn test_zero_size_window_is_ignored() {
        let mut tracker = PointerTracker::new(0, 0);
        moved(&mut tracker, 17.0, 3.0);
        assert_eq!(tracker.ndc(), Vec2::ZERO);
    }
}
