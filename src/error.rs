//! Error types for the firefly effect.
//!
//! All of these are fatal setup errors: they are raised once during
//! initialization, before the frame loop is registered, and abort the
//! session. Nothing in the per-frame path reports through these types.

use std::fmt;

/// Errors that can occur during GPU initialization.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    Adapter(wgpu::RequestAdapterError),
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::Adapter(e) => write!(
                f,
                "No compatible GPU adapter found ({}). Ensure your system has a GPU with Vulkan/Metal/DX12 support.",
                e
            ),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::Adapter(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestAdapterError> for GpuError {
    fn from(e: wgpu::RequestAdapterError) -> Self {
        GpuError::Adapter(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors that can occur when starting the effect.
#[derive(Debug)]
pub enum EffectError {
    /// Failed to create the event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create the window.
    Window(winit::error::OsError),
    /// GPU initialization failed.
    Gpu(GpuError),
}

impl fmt::Display for EffectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            EffectError::Window(e) => write!(f, "Failed to create window: {}", e),
            EffectError::Gpu(e) => write!(f, "GPU error: {}", e),
        }
    }
}

impl std::error::Error for EffectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EffectError::EventLoop(e) => Some(e),
            EffectError::Window(e) => Some(e),
            EffectError::Gpu(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for EffectError {
    fn from(e: winit::error::EventLoopError) -> Self {
        EffectError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for EffectError {
    fn from(e: winit::error::OsError) -> Self {
        EffectError::Window(e)
    }
}

impl From<GpuError> for EffectError {
    fn from(e: GpuError) -> Self {
        EffectError::Gpu(e)
    }
}
