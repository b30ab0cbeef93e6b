//! Effect builder and the per-frame simulation loop.
//!
//! [`TrailEffect`] is the construct/run entry point. [`TrailState`] owns all
//! frame-to-frame mutable simulation state (active count, buffer roles,
//! clock) and plans each frame; the GPU layer executes the plan. Keeping the
//! protocol on the CPU side makes the frame ordering and the
//! no-self-aliasing invariant testable without a device.

use std::sync::Arc;

use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::buffers::{ParticleBufferSet, Slot};
use crate::error::EffectError;
use crate::gpu::GpuState;
use crate::input::PointerTracker;
use crate::particles::{seed, EmissionCounter};
use crate::time::FrameClock;

/// One frame's worth of simulation work, planned by [`TrailState`] and
/// executed by the GPU layer.
///
/// `read` is both the update pass's source and the render pass's instance
/// buffer; `write` is the update destination. They are always distinct.
#[derive(Debug, Clone, Copy)]
pub struct FramePlan {
    pub born: u32,
    pub read: Slot,
    pub write: Slot,
    pub pointer: Vec2,
    pub time: f32,
}

/// Frame-to-frame simulation state.
///
/// Each frame: grow the active count, plan the passes against the current
/// buffer roles, and (once the frame's commands are submitted) rotate the
/// roles so the freshly written buffer becomes next frame's read source.
#[derive(Debug)]
pub struct TrailState {
    counter: EmissionCounter,
    buffers: ParticleBufferSet,
    clock: FrameClock,
}

impl TrailState {
    /// Create fresh state: zero particles born, slot A in the read role.
    pub fn new(capacity: u32, birth_rate: u32) -> Self {
        Self {
            counter: EmissionCounter::new(capacity, birth_rate),
            buffers: ParticleBufferSet::new(),
            clock: FrameClock::new(),
        }
    }

    /// Advance the emission counter and clock, and plan this frame's
    /// passes. The pointer position is sampled exactly once per frame,
    /// here.
    pub fn begin_frame(&mut self, pointer: Vec2) -> FramePlan {
        let born = self.counter.grow();
        self.clock.tick();
        FramePlan {
            born,
            read: self.buffers.read(),
            write: self.buffers.write(),
            pointer,
            time: self.clock.elapsed(),
        }
    }

    /// Swap buffer roles after a successfully submitted frame.
    pub fn finish_frame(&mut self) {
        self.buffers.rotate();
    }

    /// The current number of live particles.
    pub fn born(&self) -> u32 {
        self.counter.born()
    }
}

/// The firefly trail effect builder.
///
/// Use method chaining to configure, then call `.run()` to open the window
/// and start the loop. `run` blocks until the window closes and returns an
/// error only for fatal setup failures.
pub struct TrailEffect {
    cols: u32,
    rows: u32,
    min_age: f32,
    max_age: f32,
    speed: f32,
    birth_rate: u32,
}

impl TrailEffect {
    /// Create an effect with default settings: an 80x80 particle grid,
    /// lifetimes in `[0, 30)` frames, ten new particles per frame.
    pub fn new() -> Self {
        Self {
            cols: 80,
            rows: 80,
            min_age: 0.0,
            max_age: 30.0,
            speed: 0.5,
            birth_rate: 10,
        }
    }

    /// Set the particle grid size; capacity is `cols * rows` and is fixed
    /// for the lifetime of the effect.
    pub fn with_grid(mut self, cols: u32, rows: u32) -> Self {
        self.cols = cols;
        self.rows = rows;
        self
    }

    /// Set the particle lifetime range in frames. Lifetimes are drawn
    /// uniformly from `[min, max)`.
    pub fn with_age_range(mut self, min: f32, max: f32) -> Self {
        self.min_age = min;
        self.max_age = max;
        self
    }

    /// Set the fixed drift speed constant supplied to the update shader.
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Set how many particles become active per frame.
    pub fn with_birth_rate(mut self, birth_rate: u32) -> Self {
        self.birth_rate = birth_rate;
        self
    }

    /// Open the window and run the effect. Blocks until the window closes.
    pub fn run(self) -> Result<(), EffectError> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(self);
        event_loop.run_app(&mut app)?;

        match app.setup_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Default for TrailEffect {
    fn default() -> Self {
        Self::new()
    }
}

struct App {
    effect: TrailEffect,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    state: TrailState,
    pointer: PointerTracker,
    /// Fatal setup error, reported to `run`'s caller after the loop exits.
    setup_error: Option<EffectError>,
}

impl App {
    fn new(effect: TrailEffect) -> Self {
        let capacity = effect.cols * effect.rows;
        let state = TrailState::new(capacity, effect.birth_rate);
        Self {
            effect,
            window: None,
            gpu: None,
            state,
            pointer: PointerTracker::default(),
            setup_error: None,
        }
    }

    fn fail_setup(&mut self, event_loop: &ActiveEventLoop, error: EffectError) {
        log::error!("firefly initialization failed: {}", error);
        self.setup_error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("firefly")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail_setup(event_loop, e.into()),
        };

        let size = window.inner_size();
        self.pointer.set_window_size(size.width, size.height);

        let capacity = (self.effect.cols * self.effect.rows) as usize;
        let particles = seed(capacity, self.effect.min_age, self.effect.max_age);
        log::info!(
            "Seeded {} particles ({}x{} grid)",
            capacity,
            self.effect.cols,
            self.effect.rows
        );

        match pollster::block_on(GpuState::new(window.clone(), &particles, self.effect.speed)) {
            Ok(gpu) => {
                self.gpu = Some(gpu);
                self.window = Some(window);
                log::info!("GPU initialized, starting frame loop");
            }
            Err(e) => self.fail_setup(event_loop, e.into()),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                self.pointer
                    .set_window_size(physical_size.width, physical_size.height);
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(physical_size);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer.handle_move(position);
            }
            WindowEvent::RedrawRequested => {
                if let Some(gpu) = &mut self.gpu {
                    let plan = self.state.begin_frame(self.pointer.ndc());
                    match gpu.render(&plan) {
                        // Rotate only after a submitted frame, so the write
                        // pass's output becomes next frame's read source.
                        Ok(()) => self.state.finish_frame(),
                        Err(wgpu::SurfaceError::Lost) => {
                            gpu.resize(winit::dpi::PhysicalSize {
                                width: gpu.config.width,
                                height: gpu.config.height,
                            });
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
                        Err(e) => log::warn!("Render error: {:?}", e),
                    }
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_frames(state: &mut TrailState, n: u32) -> Vec<FramePlan> {
        (0..n)
            .map(|_| {
                let plan = state.begin_frame(Vec2::ZERO);
                state.finish_frame();
                plan
            })
            .collect()
    }

    #[test]
    fn test_update_never_writes_its_source() {
        let mut state = TrailState::new(6400, 10);
        for plan in run_frames(&mut state, 200) {
            assert_ne!(plan.read, plan.write);
        }
    }

    #[test]
    fn test_roles_alternate_every_frame() {
        let mut state = TrailState::new(6400, 10);
        let plans = run_frames(&mut state, 50);
        for pair in plans.windows(2) {
            assert_eq!(pair[1].read, pair[0].write);
            assert_eq!(pair[1].write, pair[0].read);
        }
    }

    #[test]
    fn test_born_growth_schedule() {
        let mut state = TrailState::new(6400, 10);
        let plans = run_frames(&mut state, 700);
        for (i, plan) in plans.iter().enumerate() {
            let k = (i + 1) as u32;
            assert_eq!(plan.born, 6400.min(k * 10));
        }
        assert_eq!(plans[638].born, 6390);
        assert_eq!(plans[639].born, 6400);
    }

    #[test]
    fn test_tiny_capacity_saturates_immediately() {
        let mut state = TrailState::new(4, 10);
        let plans = run_frames(&mut state, 10);
        for plan in plans {
            assert_eq!(plan.born, 4);
        }
    }

    #[test]
    fn test_time_advances_at_nominal_refresh() {
        let mut state = TrailState::new(100, 10);
        let plans = run_frames(&mut state, 120);
        assert!((plans[59].time - 1.0).abs() < 1e-6);
        assert!((plans[119].time - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_pointer_is_sampled_into_the_plan() {
        let mut state = TrailState::new(100, 10);
        let plan = state.begin_frame(Vec2::new(0.25, -0.5));
        assert_eq!(plan.pointer, Vec2::new(0.25, -0.5));
    }

    #[test]
    fn test_failed_frame_does_not_rotate() {
        let mut state = TrailState::new(100, 10);
        let first = state.begin_frame(Vec2::ZERO);
        // No finish_frame: the next plan re-reads the same source.
        let second = state.begin_frame(Vec2::ZERO);
        assert_eq!(second.read, first.read);
        assert_eq!(second.write, first.write);
    }
}
