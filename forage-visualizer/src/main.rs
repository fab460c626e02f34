use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use forage_common::ViewerConfig;
use forage_visualizer::{
    AgentRetention, HttpSource, PollLoop, RasterScene, SceneStyle, SceneSynchronizer, StopReason, SystemClock,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, LevelFilter};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG: &str = "visualizer.toml";

/// Command-line arguments for the visualizer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Optional path to a visualizer.toml file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the simulation server (overrides the config file)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Seconds to wait between polls (overrides the config file)
    #[arg(long)]
    interval: Option<f32>,

    /// Directory to write one PNG frame per applied snapshot
    #[arg(long)]
    frames_dir: Option<PathBuf>,

    /// Keep agents on screen after they vanish from the snapshots
    #[arg(long)]
    keep_missing_agents: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger; RUST_LOG still overrides the Info default
    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    run_with_args(args)
}

/// Loads the config file (if any) and applies command-line overrides.
fn resolve_config(args: &Args) -> Result<ViewerConfig> {
    let mut config = match &args.config {
        Some(path) => ViewerConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => ViewerConfig::load(DEFAULT_CONFIG)?,
        None => ViewerConfig::default(),
    };
    if let Some(endpoint) = &args.endpoint {
        config.sync.endpoint = endpoint.clone();
    }
    if let Some(interval) = args.interval {
        config.sync.interval_secs = interval;
    }
    if let Some(dir) = &args.frames_dir {
        config.render.frames_dir = Some(dir.clone());
    }
    if args.keep_missing_agents {
        config.sync.despawn_missing_agents = false;
    }
    config.validate()?;
    Ok(config)
}

fn run_with_args(args: Args) -> Result<()> {
    info!("Starting Forage Visualizer...");
    let config = resolve_config(&args)?;
    debug!("Visualizer configuration: {:#?}", config);

    // --- Build the scene and place the base marker ---
    let style = SceneStyle::from_config(&config.scene)?;
    let scene = RasterScene::new(&config.render, &config.scene)?;
    let retention = if config.sync.despawn_missing_agents {
        AgentRetention::Despawn
    } else {
        AgentRetention::Keep
    };
    let sync = SceneSynchronizer::new(scene, style, retention);

    let timeout = Duration::try_from_secs_f32(config.sync.request_timeout_secs)
        .context("sync.request_timeout_secs is not a valid duration")?;
    let source = HttpSource::new(&config.sync.endpoint, timeout);
    info!(
        "Polling {} every {:.2} s (missing agents: {:?}).",
        source.url(),
        config.sync.interval_secs,
        retention
    );
    let interval = Duration::try_from_secs_f32(config.sync.interval_secs)
        .context("sync.interval_secs is not a valid duration")?;
    let mut poll_loop = PollLoop::new(sync, source, SystemClock, interval);

    // --- Poll until finished or failed ---
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));

    let mut polls = 0u64;
    let reason = poll_loop.run_with(|snapshot| {
        polls += 1;
        spinner.set_message(format!(
            "step {} | agents: {} ({} carrying) | food left: {}",
            polls,
            snapshot.agents.len(),
            snapshot.carrying_count(),
            snapshot.food.len()
        ));
    });

    let frames = poll_loop.synchronizer().scene().frames_written();
    match reason {
        StopReason::Finished => spinner.finish_with_message(format!("Simulation finished after {} steps", polls)),
        StopReason::TransportError => spinner.abandon_with_message(format!("Stopped after {} steps", polls)),
    }
    if frames > 0 {
        info!("{} frames written.", frames);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn base_args() -> Args {
        Args { config: None, endpoint: None, interval: None, frames_dir: None, keep_missing_agents: false }
    }

    #[test]
    fn cli_overrides_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sync]\nendpoint = \"http://sim:5000\"\ninterval_secs = 1.0").unwrap();

        let args = Args {
            config: Some(file.path().to_path_buf()),
            interval: Some(0.5),
            keep_missing_agents: true,
            ..base_args()
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.sync.endpoint, "http://sim:5000");
        assert!((config.sync.interval_secs - 0.5).abs() < 1e-6);
        assert!(!config.sync.despawn_missing_agents);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let args = Args { config: Some(PathBuf::from("/nonexistent/visualizer.toml")), ..base_args() };
        assert!(resolve_config(&args).is_err());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sync]").unwrap();
        let args = Args { config: Some(file.path().to_path_buf()), interval: Some(0.0), ..base_args() };
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn infinite_interval_is_rejected() {
        let args = Args::try_parse_from(["forage-visualizer", "--interval", "inf"]).unwrap();
        assert_eq!(args.interval, Some(f32::INFINITY));
        assert!(resolve_config(&args).is_err());
        assert!(run_with_args(args).is_err());
    }

    #[test]
    fn parses_flags() {
        let args = Args::try_parse_from([
            "forage-visualizer",
            "--endpoint",
            "http://127.0.0.1:5000",
            "--frames-dir",
            "out",
            "--keep-missing-agents",
        ])
        .unwrap();
        assert_eq!(args.endpoint.as_deref(), Some("http://127.0.0.1:5000"));
        assert_eq!(args.frames_dir, Some(PathBuf::from("out")));
        assert!(args.keep_missing_agents);
    }
}
