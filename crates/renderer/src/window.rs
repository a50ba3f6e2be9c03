use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use solarwind::ControlCell;
use tracing::{debug, info, trace, warn};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Fullscreen, Window, WindowBuilder};

use crate::gpu::GpuState;
use crate::runtime::{BoxedTimeSource, FrameScheduler, SystemTimeSource, TimeSample};
use crate::types::{RendererConfig, Viewport, WindowMode};

/// Window plus the GPU state drawing into it.
pub(crate) struct WindowState {
    // Declared first so the surface is released before the window.
    gpu: GpuState,
    window: Arc<Window>,
}

impl WindowState {
    pub(crate) fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self> {
        let viewport = Viewport::from(window.inner_size());
        let gpu = GpuState::new(
            window.as_ref(),
            viewport,
            config.preset,
            config.antialiasing,
        )?;
        Ok(Self { gpu, window })
    }

    pub(crate) fn window(&self) -> &Window {
        self.window.as_ref()
    }

    pub(crate) fn size(&self) -> Viewport {
        self.gpu.size()
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.gpu.resize(Viewport::from(new_size));
    }

    pub(crate) fn reconfigure(&mut self) {
        self.gpu.reconfigure();
    }

    pub(crate) fn render_frame(
        &mut self,
        sample: TimeSample,
        control: f32,
    ) -> Result<(), wgpu::SurfaceError> {
        self.gpu.render(sample, control)
    }
}

/// Pairs the frame pacing policy with the clock feeding the shader.
pub(crate) struct FrameDriver {
    scheduler: FrameScheduler,
    time_source: BoxedTimeSource,
}

impl FrameDriver {
    pub(crate) fn new(target_fps: Option<f32>) -> Self {
        Self {
            scheduler: FrameScheduler::new(target_fps),
            time_source: Box::new(SystemTimeSource::new()),
        }
    }

    pub(crate) fn sample(&mut self) -> TimeSample {
        self.time_source.sample()
    }

    pub(crate) fn mark_rendered(&mut self, now: Instant) {
        self.scheduler.mark_rendered(now);
    }

    pub(crate) fn ready_for_frame(&self, now: Instant) -> bool {
        self.scheduler.ready_for_frame(now)
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }
}

fn is_escape(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed && event.logical_key == Key::Named(NamedKey::Escape)
}

/// Opens the output window and drives the render loop until the user closes
/// it or a fatal GPU error occurs.
pub(crate) fn run_window(config: RendererConfig) -> Result<()> {
    let event_loop =
        EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let mut builder = WindowBuilder::new().with_title(config.title.clone());
    builder = match config.window {
        WindowMode::Fullscreen => builder.with_fullscreen(Some(Fullscreen::Borderless(None))),
        WindowMode::Windowed { width, height } => {
            builder.with_inner_size(PhysicalSize::new(width.max(1), height.max(1)))
        }
    };
    let window = builder
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create output window: {err}"))?;
    let window = Arc::new(window);
    if matches!(config.window, WindowMode::Fullscreen) {
        window.set_cursor_visible(false);
    }

    let mut state = WindowState::new(window, &config)
        .map_err(|err| anyhow!("failed to initialise renderer: {err:#}"))?;
    let mut driver = FrameDriver::new(config.target_fps);
    let control: ControlCell = config.control.clone();

    let size = state.size();
    info!(
        width = size.width,
        height = size.height,
        preset = %config.preset,
        fps_cap = ?config.target_fps,
        "render loop started"
    );
    state.window().request_redraw();

    let mut fatal: Option<anyhow::Error> = None;
    let run_result = event_loop.run(|event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
            match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    debug!("window closed");
                    elwt.exit();
                }
                WindowEvent::KeyboardInput { event, .. } if is_escape(&event) => {
                    debug!("escape pressed");
                    elwt.exit();
                }
                WindowEvent::Resized(new_size) => {
                    state.resize(new_size);
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    match state.render_frame(driver.sample(), control.get()) {
                        Ok(()) => driver.mark_rendered(now),
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            debug!("surface lost or outdated; reconfiguring");
                            state.reconfigure();
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            fatal = Some(anyhow!("GPU ran out of memory while acquiring a frame"));
                            elwt.exit();
                        }
                        Err(wgpu::SurfaceError::Timeout) => {
                            warn!("surface timeout; retrying next frame");
                        }
                        Err(other) => {
                            warn!("surface error: {other:?}; retrying next frame");
                        }
                    }
                }
                _ => {}
            }
        }
        Event::AboutToWait => {
            let now = Instant::now();
            if driver.ready_for_frame(now) {
                trace!("scheduler: issuing redraw now");
                state.window().request_redraw();
                elwt.set_control_flow(ControlFlow::Wait);
            } else if let Some(deadline) = driver.next_deadline() {
                trace!(
                    deadline_ms = deadline.saturating_duration_since(now).as_millis(),
                    "scheduler: waiting until next frame"
                );
                elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
            } else {
                elwt.set_control_flow(ControlFlow::Wait);
            }
        }
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))?;
    match fatal {
        Some(err) => Err(err),
        None => {
            info!("render loop finished");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn frame_driver_samples_monotonic_time() {
        let mut driver = FrameDriver::new(None);
        let first = driver.sample();
        let second = driver.sample();
        assert!(second.seconds >= first.seconds);
        assert_eq!(second.frame_index, first.frame_index + 1);
    }

    #[test]
    fn frame_driver_respects_fps_cap() {
        let mut driver = FrameDriver::new(Some(4.0));
        let start = Instant::now();
        assert!(driver.ready_for_frame(start));
        driver.mark_rendered(start);
        assert!(!driver.ready_for_frame(start + Duration::from_millis(10)));
        assert_eq!(
            driver.next_deadline(),
            Some(start + Duration::from_millis(250))
        );
    }
}
