//! Renderer crate for solarshade.
//!
//! Draws a procedural GLSL shader across a fullscreen quad and feeds it a
//! single control value read from a shared [`solarwind::ControlCell`] every
//! frame. The overall flow is:
//!
//! ```text
//!   solarshade CLI
//!          │ RendererConfig (preset, window mode, fps cap, ControlCell)
//!          ▼
//!   Renderer::run ──▶ WindowState ──▶ winit event loop ──▶ GpuState::render()
//!                                                │
//!                 ControlCell::get() ────────────┴─▶ FrameState::step() ─▶ GPU UBO
//! ```
//!
//! The loop never blocks on the network: whoever writes the cell (normally the
//! solar wind poller thread) runs independently, and the renderer simply picks
//! up the latest value at the next frame.

mod compile;
mod gpu;
mod preset;
mod runtime;
mod types;
mod window;

use anyhow::Result;

pub use preset::{Palette, Preset};
pub use runtime::{FrameScheduler, SystemTimeSource, TimeSample, TimeSource};
pub use types::{Antialiasing, RendererConfig, Viewport, WindowMode};

/// High-level entry point that owns the chosen configuration.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    /// Builds a renderer for the supplied configuration.
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Opens the output window and renders until it is closed.
    ///
    /// Blocks the calling thread, which must be the main thread on most
    /// platforms. Returns an error when no window or GPU device can be created,
    /// when the shaders fail to compile, or when the GPU runs out of memory.
    pub fn run(self) -> Result<()> {
        window::run_window(self.config)
    }
}
