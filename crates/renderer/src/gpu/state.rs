use std::time::{Duration, Instant};

use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::debug;

use crate::preset::Preset;
use crate::runtime::TimeSample;
use crate::types::{Antialiasing, Viewport};

use super::context::GpuContext;
use super::pipeline::QuadPipeline;
use super::uniforms::{FrameState, FrameUniforms};

struct MultisampleTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl MultisampleTarget {
    fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        viewport: Viewport,
        sample_count: u32,
    ) -> Self {
        let extent = wgpu::Extent3d {
            width: viewport.width.max(1),
            height: viewport.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("msaa color target"),
            size: extent,
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }

    fn for_context(context: &GpuContext) -> Option<Self> {
        (context.sample_count > 1).then(|| {
            Self::new(
                &context.device,
                context.surface_format,
                context.viewport,
                context.sample_count,
            )
        })
    }
}

/// Owns every GPU resource needed to draw the shader into a window.
pub(crate) struct GpuState {
    context: GpuContext,
    pipeline: QuadPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    frame: FrameState,
    multisample_target: Option<MultisampleTarget>,
    last_stats: Instant,
    frames_since_stats: u32,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        initial: Viewport,
        preset: Preset,
        antialiasing: Antialiasing,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, initial, antialiasing)?;
        let pipeline =
            QuadPipeline::new(&context.device, context.surface_format, context.sample_count)?;

        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame uniform buffer"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("frame uniform bind group"),
                layout: &pipeline.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

        let frame = FrameState::new(context.viewport, preset);
        context
            .queue
            .write_buffer(&uniform_buffer, 0, bytemuck::bytes_of(frame.uniforms()));

        let multisample_target = MultisampleTarget::for_context(&context);

        debug!(
            width = context.viewport.width,
            height = context.viewport.height,
            %preset,
            "GPU state ready"
        );

        Ok(Self {
            context,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            frame,
            multisample_target,
            last_stats: Instant::now(),
            frames_since_stats: 0,
        })
    }

    pub(crate) fn size(&self) -> Viewport {
        self.frame.viewport()
    }

    pub(crate) fn resize(&mut self, viewport: Viewport) {
        if !self.frame.resize(viewport) {
            return;
        }
        self.context.resize(viewport);
        self.multisample_target = MultisampleTarget::for_context(&self.context);
    }

    /// Reapplies the swapchain configuration after `Lost` or `Outdated`.
    pub(crate) fn reconfigure(&mut self) {
        self.context.reconfigure();
    }

    /// Draws one frame with the given time and control value and presents it.
    pub(crate) fn render(
        &mut self,
        sample: TimeSample,
        control: f32,
    ) -> Result<(), wgpu::SurfaceError> {
        let output = self.context.surface.get_current_texture()?;

        self.frame.step(sample, control);
        self.context.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(self.frame.uniforms()),
        );

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("frame encoder"),
                });

        {
            let (attachment_view, resolve_target) = match self.multisample_target.as_ref() {
                Some(msaa) => (&msaa.view, Some(&view)),
                None => (&view, None),
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shader pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment_view,
                    depth_slice: None,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&self.pipeline.pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.pipeline.vertex_buffer.slice(..));
            render_pass.draw(0..self.pipeline.vertex_count(), 0..1);
        }

        self.context.queue.submit(Some(encoder.finish()));
        output.present();

        self.record_stats(sample);
        Ok(())
    }

    fn record_stats(&mut self, sample: TimeSample) {
        self.frames_since_stats += 1;
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last_stats);
        if elapsed < Duration::from_secs(1) {
            return;
        }
        let uniforms = self.frame.uniforms();
        debug!(
            fps = (self.frames_since_stats as f32 / elapsed.as_secs_f32()).round(),
            frame = sample.frame_index,
            time = uniforms.time,
            energy = uniforms.energy,
            "render stats"
        );
        self.frames_since_stats = 0;
        self.last_stats = now;
    }
}
