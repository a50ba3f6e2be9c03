//! GPU side of the renderer.
//!
//! - `context` owns the wgpu instance, device, and surface and rebuilds the
//!   swapchain when the window resizes.
//! - `pipeline` compiles the GLSL pair into a render pipeline and uploads the
//!   fullscreen quad.
//! - `uniforms` mirrors the shader's uniform block and advances it per frame.
//! - `state` ties them together behind the `GpuState` API used by `window`.

mod context;
mod pipeline;
mod state;
mod uniforms;

pub(crate) use state::GpuState;
#[cfg(test)]
pub(crate) use uniforms::FrameUniforms;
