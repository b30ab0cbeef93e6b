//! Frame-based timing.
//!
//! The simulation clock is a monotone frame counter, not a wall clock: the
//! update shader receives `frame / 60` as its elapsed time, so the effect
//! advances deterministically one tick per display refresh regardless of
//! real frame pacing.

/// Nominal display refresh rate used to convert frames to seconds.
const NOMINAL_REFRESH_HZ: f32 = 60.0;

/// Monotone frame counter with elapsed time at the nominal refresh rate.
#[derive(Debug, Default)]
pub struct FrameClock {
    frame: u64,
}

impl FrameClock {
    /// Create a clock starting at frame zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one frame.
    pub fn tick(&mut self) {
        self.frame += 1;
    }

    /// Total frames since start.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Elapsed simulation time in seconds.
    pub fn elapsed(&self) -> f32 {
        self.frame as f32 / NOMINAL_REFRESH_HZ
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_zero() {
        let clock = FrameClock::new();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.elapsed(), 0.0);
    }

    #[test]
    fn test_elapsed_follows_frame_count() {
        let mut clock = FrameClock::new();
        for _ in 0..90 {
            clock.tick();
        }
        assert_eq!(clock.frame(), 90);
        assert!((clock.elapsed() - 1.5).abs() < 1e-6);
    }
}
