use solarwind::ControlCell;
use winit::dpi::PhysicalSize;

use crate::preset::Preset;

/// Drawable area in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Minimized windows report a zero-sized viewport.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<PhysicalSize<u32>> for Viewport {
    fn from(size: PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

/// How the output window is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    /// Borderless fullscreen on the current monitor.
    Fullscreen,
    /// Regular decorated window with the requested inner size.
    Windowed { width: u32, height: u32 },
}

impl Default for WindowMode {
    fn default() -> Self {
        Self::Fullscreen
    }
}

/// Anti-aliasing policy for the render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Antialiasing {
    /// Pick the highest sample count supported by the surface format.
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

impl Default for Antialiasing {
    fn default() -> Self {
        Self::Auto
    }
}

/// Configuration passed to the renderer at start-up.
#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Window title.
    pub title: String,
    /// Fullscreen or windowed presentation.
    pub window: WindowMode,
    /// Palette and motion constants fed to the shader.
    pub preset: Preset,
    /// Anti-aliasing mode requested by the caller.
    pub antialiasing: Antialiasing,
    /// Optional FPS cap; `None` redraws on every display refresh.
    pub target_fps: Option<f32>,
    /// Control value read at every frame step.
    pub control: ControlCell,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            title: "solarshade".to_string(),
            window: WindowMode::default(),
            preset: Preset::default(),
            antialiasing: Antialiasing::default(),
            target_fps: None,
            control: ControlCell::default(),
        }
    }
}
