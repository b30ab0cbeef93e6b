//! # firefly
//!
//! A pointer-trailing firefly particle effect, simulated and drawn entirely
//! on the GPU.
//!
//! Each frame a compute pass advances particle state from a "read" storage
//! buffer into a "write" storage buffer, the pre-update state is drawn as
//! instanced glowing quads, and the two buffers swap roles. The number of
//! live particles grows by a fixed amount per frame until the whole buffer
//! is active, so the swarm fades in over the first few seconds.
//!
//! ## Quick Start
//!
//! ```ignore
//! use firefly::TrailEffect;
//!
//! fn main() {
//!     env_logger::init();
//!     TrailEffect::new()
//!         .with_grid(80, 80)
//!         .with_birth_rate(10)
//!         .run()
//!         .unwrap();
//! }
//! ```
//!
//! ## Core pieces
//!
//! - [`TrailEffect`] - builder with a construct/run lifecycle.
//! - [`ParticleBufferSet`] - the role-tagged double buffer; writes never
//!   alias the data being read within a frame.
//! - [`EmissionCounter`] - the monotone active-particle count.
//! - [`PointerTracker`] - latest pointer position in normalized device
//!   coordinates, last-write-wins.

pub mod buffers;
pub mod error;
mod gpu;
pub mod input;
pub mod particles;
mod simulation;
pub mod time;

pub use buffers::{ParticleBufferSet, Slot};
pub use error::{EffectError, GpuError};
pub use glam::Vec2;
pub use input::PointerTracker;
pub use particles::{seed, EmissionCounter, Particle};
pub use simulation::{FramePlan, TrailEffect, TrailState};
pub use time::FrameClock;
