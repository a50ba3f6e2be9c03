use bytemuck::{Pod, Zeroable};

use crate::preset::Preset;
use crate::runtime::TimeSample;
use crate::types::Viewport;

/// Host mirror of the `FrameParams` std140 block in the fragment shader.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct FrameUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub energy: f32,
    pub base_color: [f32; 4],
    pub glow_color: [f32; 4],
    /// x: noise scale, y: drift speed, z: wave speed.
    pub motion: [f32; 4],
}

unsafe impl Zeroable for FrameUniforms {}
unsafe impl Pod for FrameUniforms {}

impl FrameUniforms {
    pub fn new(viewport: Viewport, preset: Preset) -> Self {
        let palette = preset.palette();
        let [br, bg, bb] = palette.base_color;
        let [gr, gg, gb] = palette.glow_color;
        Self {
            resolution: [viewport.width as f32, viewport.height as f32],
            time: 0.0,
            energy: solarwind::DEFAULT_CONTROL_VALUE,
            base_color: [br, bg, bb, 1.0],
            glow_color: [gr, gg, gb, 1.0],
            motion: [
                palette.noise_scale,
                palette.drift_speed,
                palette.wave_speed,
                0.0,
            ],
        }
    }
}

/// Per-frame shader inputs plus the viewport they were computed for.
///
/// Time only moves forward: a sample older than the last one keeps the
/// previous value.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameState {
    uniforms: FrameUniforms,
    viewport: Viewport,
}

impl FrameState {
    pub fn new(viewport: Viewport, preset: Preset) -> Self {
        Self {
            uniforms: FrameUniforms::new(viewport, preset),
            viewport,
        }
    }

    pub fn uniforms(&self) -> &FrameUniforms {
        &self.uniforms
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Records a new drawable size. Returns `false` for empty viewports,
    /// which leave the previous resolution in place.
    pub fn resize(&mut self, viewport: Viewport) -> bool {
        if viewport.is_empty() {
            return false;
        }
        self.viewport = viewport;
        self.uniforms.resolution = [viewport.width as f32, viewport.height as f32];
        true
    }

    pub fn step(&mut self, sample: TimeSample, control: f32) {
        if sample.seconds.is_finite() {
            self.uniforms.time = self.uniforms.time.max(sample.seconds);
        }
        if control.is_finite() {
            self.uniforms.energy = control.clamp(0.0, 1.0);
        }
    }
}
