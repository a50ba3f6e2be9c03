use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use renderer::Preset;
use settings::AntialiasSetting;

#[derive(Parser, Debug)]
#[command(
    name = "solarshade",
    author,
    version,
    about = "Fullscreen shader animated by the live solar wind speed"
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Configuration file (defaults to `config.toml` in the user config directory).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Solar wind JSON endpoint.
    #[arg(long, value_name = "URL", env = "SOLARSHADE_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Time between fetches, in seconds or as a duration such as `5m`.
    #[arg(long, value_name = "DURATION", value_parser = settings::parse_duration)]
    pub interval: Option<Duration>,

    /// Visual preset (see `solarshade presets`).
    #[arg(long, value_name = "NAME", value_parser = parse_preset)]
    pub preset: Option<Preset>,

    /// Open a regular window instead of going fullscreen.
    #[arg(long)]
    pub windowed: bool,

    /// Go fullscreen even when the config file asks for a window.
    #[arg(long, conflicts_with_all = ["windowed", "size"])]
    pub fullscreen: bool,

    /// Window size (e.g. `1280x720`); implies `--windowed`.
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = settings::parse_size)]
    pub size: Option<(u32, u32)>,

    /// Optional FPS cap (0 = uncapped).
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Anti-aliasing policy: `auto`, `off`, or an explicit MSAA sample count (e.g. `4`).
    #[arg(long, value_name = "MODE", value_parser = settings::parse_antialias)]
    pub antialias: Option<AntialiasSetting>,

    /// Skip polling and keep the default control value.
    #[arg(long)]
    pub offline: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Run a single fetch cycle and print the latest reading.
    Probe,
    /// List the available visual presets.
    Presets,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_preset(value: &str) -> Result<Preset, String> {
    value.parse()
}
