use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use renderer::{Antialiasing, Preset, RendererConfig, WindowMode};
use settings::{AntialiasSetting, Settings};
use solarwind::{
    ControlCell, PollerConfig, SpeedRange, DEFAULT_CONTROL_VALUE, DEFAULT_ENDPOINT,
    DEFAULT_POLL_INTERVAL,
};
use tracing::debug;

use crate::cli::RunArgs;
use crate::paths::AppPaths;

const DEFAULT_WINDOW_SIZE: (u32, u32) = (1280, 720);

/// Everything the application needs once CLI flags, the config file, and
/// built-in defaults have been merged.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub endpoint: String,
    pub poller: PollerConfig,
    pub request_timeout: Option<Duration>,
    pub offline: bool,
    pub renderer: RendererConfig,
}

impl AppConfig {
    /// Shared control value the poller writes and the renderer reads.
    pub fn control(&self) -> &ControlCell {
        &self.renderer.control
    }
}

/// Loads the config file selected by `--config` or the default location.
///
/// An explicitly requested file must exist; the default one is optional.
pub fn load_settings(args: &RunArgs) -> Result<Settings> {
    if let Some(path) = args.config.as_ref() {
        debug!(path = %path.display(), "loading explicit config file");
        return Settings::load(path)
            .with_context(|| format!("failed to load config file {}", path.display()));
    }

    let paths = AppPaths::discover()?;
    let path: PathBuf = paths.config_file();
    debug!(
        config_dir = %paths.config_dir().display(),
        exists = path.exists(),
        "loading default config file"
    );
    Settings::load_or_default(&path)
        .with_context(|| format!("failed to load config file {}", path.display()))
}

/// Merges CLI flags over file settings over defaults.
pub fn resolve(args: &RunArgs, settings: &Settings) -> Result<AppConfig> {
    let signal = &settings.signal;
    let display = &settings.display;

    let endpoint = args
        .endpoint
        .clone()
        .or_else(|| signal.endpoint.clone())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

    let interval = args
        .interval
        .or(signal.interval)
        .unwrap_or(DEFAULT_POLL_INTERVAL);
    if interval.is_zero() {
        bail!("poll interval must be greater than zero");
    }

    let range = SpeedRange::new(
        signal.speed_min.unwrap_or(SpeedRange::DEFAULT_MIN),
        signal.speed_max.unwrap_or(SpeedRange::DEFAULT_MAX),
    )
    .context("speed_max must be greater than speed_min")?;

    let preset = match (args.preset, display.preset.as_deref()) {
        (Some(preset), _) => preset,
        (None, Some(name)) => name
            .parse::<Preset>()
            .map_err(|err| anyhow::anyhow!("invalid display.preset: {err}"))?,
        (None, None) => Preset::default(),
    };

    let windowed = !args.fullscreen
        && (args.windowed || args.size.is_some() || display.fullscreen == Some(false));
    let window = if windowed {
        let (width, height) = args.size.or(display.size).unwrap_or(DEFAULT_WINDOW_SIZE);
        WindowMode::Windowed { width, height }
    } else {
        WindowMode::Fullscreen
    };

    let fps = args.fps.or(display.fps);
    if let Some(fps) = fps {
        if !fps.is_finite() || fps < 0.0 {
            bail!("fps must be zero or a positive number, got {fps}");
        }
        if fps > 0.0 && Duration::try_from_secs_f32(1.0 / fps).is_err() {
            bail!("fps {fps} is too small to schedule");
        }
    }
    let target_fps = fps.filter(|fps| *fps > 0.0);

    let antialiasing = map_antialias(args.antialias.or(display.antialias));
    let control = ControlCell::new(signal.default_value.unwrap_or(DEFAULT_CONTROL_VALUE));

    Ok(AppConfig {
        endpoint,
        poller: PollerConfig { interval, range },
        request_timeout: signal.request_timeout,
        offline: args.offline,
        renderer: RendererConfig {
            window,
            preset,
            antialiasing,
            target_fps,
            control,
            ..RendererConfig::default()
        },
    })
}

fn map_antialias(setting: Option<AntialiasSetting>) -> Antialiasing {
    match setting {
        None | Some(AntialiasSetting::Auto) => Antialiasing::Auto,
        Some(AntialiasSetting::Off) => Antialiasing::Off,
        Some(explicit) => explicit
            .samples()
            .map(Antialiasing::Samples)
            .unwrap_or(Antialiasing::Auto),
    }
}
