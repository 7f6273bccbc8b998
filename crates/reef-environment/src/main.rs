//! Headless reef level build.
//!
//! Loads `config.ron` (creating it on first run), generates the terrain,
//! scatters the fixed beings and optionally writes a RON summary.
//!
//! Run with: `cargo run -p reef-environment --bin reef-build -- --seed 7`

use std::time::Duration;

use clap::Parser;
use reef_config::{CliArgs, Config, default_config_dir};
use reef_environment::{
    BuildEvent, BuildRequest, BuildSettings, BuildWorker, Environment, EnvironmentError,
};
use reef_placement::{HeadlessHost, ParentHandle};
use tracing::{debug, error, info, warn};

/// Parent token the headless host attaches placed beings to.
const LEVEL_PARENT: ParentHandle = ParentHandle(1);

fn main() {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config {
            archetypes: Config::starter_archetypes(),
            ..Default::default()
        }
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    reef_log::init_logging(
        Some(&log_dir),
        cfg!(debug_assertions) && config.debug.file_logging,
        Some(&config),
    );

    if let Err(e) = run(&config) {
        error!("Reef build failed: {e}");
        eprintln!("Reef build failed: {e}");
        std::process::exit(1);
    }
}

fn run(config: &Config) -> Result<(), EnvironmentError> {
    let settings = BuildSettings::from_config(config);
    let (num_x, num_y) = settings.terrain.grid_size();
    info!(
        "Reef build: {}x{} world units, {num_x}x{num_y} grid, {} archetypes, seed {}, {} passes",
        settings.terrain.width,
        settings.terrain.height,
        settings.archetypes.len(),
        settings.placement.seed,
        settings.placement.placing_passes
    );

    let environment = Environment::new(settings.clone(), HeadlessHost::new(), LEVEL_PARENT);
    let mut worker = BuildWorker::spawn(environment);
    let id = worker.submit(BuildRequest::Terrain(settings))?;

    let mut last_logged = 0.0;
    loop {
        let Some(event) = worker.recv_event(Duration::from_millis(250))? else {
            continue;
        };
        match event {
            BuildEvent::Progress {
                fraction, message, ..
            } => {
                debug!("{:5.1}% {message}", fraction * 100.0);
                if fraction - last_logged >= 0.25 {
                    last_logged = fraction;
                    info!("{:3.0}% {message}", fraction * 100.0);
                }
            }
            BuildEvent::Finished { id: done, report } if done == id => {
                info!(
                    "Terrain bounds ({:.1}, {:.1}, {:.1}) - ({:.1}, {:.1}, {:.1})",
                    report.bounds_min.x,
                    report.bounds_min.y,
                    report.bounds_min.z,
                    report.bounds_max.x,
                    report.bounds_max.y,
                    report.bounds_max.z
                );
                info!(
                    "{} fixed beings placed from {} attempts",
                    report.placed, report.stats.attempts
                );
                break;
            }
            BuildEvent::Failed { id: done, error } if done == id => return Err(error),
            BuildEvent::Cancelled { id: done } if done == id => {
                warn!("Reef build was cancelled");
                return Ok(());
            }
            _ => {}
        }
    }

    let environment = worker.shutdown()?;
    if let Some(path) = &config.output.summary_path {
        environment.write_summary(path)?;
    }
    Ok(())
}
