//! Command-line argument parsing for reef level builds.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Reef build command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "reef-build", about = "Generate reef terrain and scatter fixed beings")]
pub struct CliArgs {
    /// Placement seed.
    #[arg(long)]
    pub seed: Option<u32>,

    /// Number of placement passes.
    #[arg(long)]
    pub passes: Option<u32>,

    /// Placement precision (higher visits more grid points).
    #[arg(long)]
    pub precision: Option<f32>,

    /// Terrain width in world units.
    #[arg(long)]
    pub width: Option<i32>,

    /// Terrain height in world units.
    #[arg(long)]
    pub height: Option<i32>,

    /// Terrain vertex density (vertices per world unit).
    #[arg(long)]
    pub density: Option<f32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Write the RON build summary to this path.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.placement.seed = seed;
        }
        if let Some(passes) = args.passes {
            self.placement.placing_passes = passes;
        }
        if let Some(precision) = args.precision {
            self.placement.placing_precision = precision;
        }
        if let Some(w) = args.width {
            self.terrain.width = w;
        }
        if let Some(h) = args.height {
            self.terrain.height = h;
        }
        if let Some(density) = args.density {
            self.terrain.density = density;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if let Some(ref path) = args.output {
            self.output.summary_path = Some(path.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            seed: Some(42),
            width: Some(2000),
            output: Some(PathBuf::from("out.ron")),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.placement.seed, 42);
        assert_eq!(config.terrain.width, 2000);
        assert_eq!(config.output.summary_path, Some(PathBuf::from("out.ron")));
        // Non-overridden fields retain defaults
        assert_eq!(config.terrain.height, 20_000);
        assert_eq!(config.placement.placing_passes, 100);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from([
            "reef-build",
            "--seed",
            "9",
            "--passes",
            "3",
            "--precision",
            "0.5",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.seed, Some(9));
        assert_eq!(args.passes, Some(3));
        assert_eq!(args.precision, Some(0.5));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.config.is_none());
    }
}
