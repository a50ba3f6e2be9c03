use anyhow::{Context, Result};
use renderer::{Preset, Renderer};
use solarwind::{poll_once, spawn_poller, HttpSource, TracingObserver};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::bootstrap::{load_settings, resolve, AppConfig};
use crate::cli::{Cli, Command};

pub fn run(cli: Cli) -> Result<()> {
    initialise_tracing();

    if cli.command == Some(Command::Presets) {
        print_presets();
        return Ok(());
    }

    let settings = load_settings(&cli.run)?;
    let config = resolve(&cli.run, &settings).context("invalid configuration")?;

    match cli.command {
        Some(Command::Probe) => probe(&config),
        _ => run_display(config),
    }
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_source(config: &AppConfig) -> Result<HttpSource> {
    HttpSource::new(&config.endpoint, config.request_timeout)
        .with_context(|| format!("invalid solar wind endpoint {}", config.endpoint))
}

fn run_display(config: AppConfig) -> Result<()> {
    info!(
        endpoint = %config.endpoint,
        interval_s = config.poller.interval.as_secs_f64(),
        preset = %config.renderer.preset,
        offline = config.offline,
        "starting solarshade"
    );

    let poller = if config.offline {
        info!(
            value = config.control().get(),
            "polling disabled (--offline); keeping default control value"
        );
        None
    } else {
        let source = build_source(&config)?;
        let handle = spawn_poller(
            source,
            TracingObserver,
            config.control().clone(),
            config.poller,
        )
        .context("failed to start solar wind poller")?;
        Some(handle)
    };

    let result = Renderer::new(config.renderer).run();

    if let Some(handle) = poller {
        if handle.is_finished() {
            warn!("solar wind poller exited before the render loop");
        }
        handle.cancel();
    }

    result
}

/// Runs one fetch cycle and prints the reading to stdout.
fn probe(config: &AppConfig) -> Result<()> {
    let source = build_source(config)?;
    let reading = poll_once(
        &source,
        &config.poller.range,
        config.control(),
        &TracingObserver,
    )
    .with_context(|| format!("failed to probe {}", config.endpoint))?;

    println!("speed: {:.1} km/s", reading.sample.speed);
    match reading.sample.observed_at {
        Some(observed_at) => println!("observed: {observed_at}"),
        None => println!("observed: unknown"),
    }
    println!("control: {:.4}", reading.value);
    Ok(())
}

fn print_presets() {
    for preset in Preset::ALL {
        if preset == Preset::default() {
            println!("{preset} (default)");
        } else {
            println!("{preset}");
        }
    }
}
