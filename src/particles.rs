//! Particle records, initial seeding, and the active-particle count.

use bytemuck::{Pod, Zeroable};
use rand::Rng;

/// One particle, exactly as laid out in the GPU storage buffers.
///
/// The field order matches the WGSL `Particle` struct and the render
/// pipeline's per-instance attribute offsets (position at 0, age at 8,
/// life at 12). Reordering fields silently corrupts the simulation.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Particle {
    pub position: [f32; 2],
    pub age: f32,
    pub life: f32,
    pub velocity: [f32; 2],
}

/// Byte stride of one particle in the storage/vertex buffers.
pub const PARTICLE_STRIDE: u64 = std::mem::size_of::<Particle>() as u64;

/// Seed `capacity` particles for a fresh simulation.
///
/// Every particle starts at the origin with zero velocity and a lifetime
/// drawn uniformly from `[min_age, max_age)`. The age is seeded to
/// `life + 1`, i.e. already expired, so each particle is emitted at the
/// pointer by the update shader the first time it enters the born window.
pub fn seed(capacity: usize, min_age: f32, max_age: f32) -> Vec<Particle> {
    let mut rng = rand::thread_rng();
    (0..capacity)
        .map(|_| {
            let life = if max_age > min_age {
                rng.gen_range(min_age..max_age)
            } else {
                min_age
            };
            Particle {
                position: [0.0, 0.0],
                age: life + 1.0,
                life,
                velocity: [0.0, 0.0],
            }
        })
        .collect()
}

/// The number of particles considered live.
///
/// Grows by a fixed increment each frame and clamps at capacity; it never
/// decreases. Particles beyond the count exist in storage but are neither
/// updated nor drawn.
#[derive(Debug)]
pub struct EmissionCounter {
    born: u32,
    capacity: u32,
    birth_rate: u32,
}

impl EmissionCounter {
    /// Create a counter starting at zero born particles.
    pub fn new(capacity: u32, birth_rate: u32) -> Self {
        Self {
            born: 0,
            capacity,
            birth_rate,
        }
    }

    /// Advance one frame's worth of emission and return the new count.
    pub fn grow(&mut self) -> u32 {
        self.born = self.capacity.min(self.born + self.birth_rate);
        self.born
    }

    /// The current number of live particles.
    pub fn born(&self) -> u32 {
        self.born
    }

    /// The fixed total particle capacity.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_initial_state() {
        let particles = seed(6400, 0.0, 30.0);
        assert_eq!(particles.len(), 6400);
        for p in &particles {
            assert_eq!(p.position, [0.0, 0.0]);
            assert_eq!(p.velocity, [0.0, 0.0]);
            assert!(p.life >= 0.0 && p.life < 30.0);
            assert_eq!(p.age, p.life + 1.0);
        }
    }

    #[test]
    fn test_seed_respects_age_range() {
        for p in seed(500, 5.0, 12.0) {
            assert!(p.life >= 5.0 && p.life < 12.0);
        }
    }

    #[test]
    fn test_particle_stride_matches_wgsl_layout() {
        assert_eq!(PARTICLE_STRIDE, 24);
    }

    #[test]
    fn test_growth_is_linear_until_capacity() {
        let mut counter = EmissionCounter::new(6400, 10);
        for k in 1..=700u32 {
            let born = counter.grow();
            assert_eq!(born, 6400.min(k * 10));
        }
    }

    #[test]
    fn test_capacity_first_reached_at_expected_frame() {
        let mut counter = EmissionCounter::new(6400, 10);
        for _ in 1..640 {
            assert!(counter.grow() < 6400);
        }
        assert_eq!(counter.grow(), 6400);
    }

    #[test]
    fn test_tiny_capacity_clamps_on_first_frame() {
        let mut counter = EmissionCounter::new(4, 10);
        assert_eq!(counter.grow(), 4);
        for _ in 0..10 {
            assert_eq!(counter.grow(), 4);
        }
    }

    #[test]
    fn test_born_is_monotone() {
        let mut counter = EmissionCounter::new(100, 7);
        let mut previous = 0;
        for _ in 0..40 {
            let born = counter.grow();
            assert!(born >= previous);
            previous = born;
        }
    }
}
