pub mod monitor;
pub mod record;
pub mod run;
pub mod server;
pub mod shapes;

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use shapemedian_core::{
    ConfigError, DistanceSource, FixedSource, PipelineConfig, RefreshPipeline, SimulatedSource,
    SimulatedSourceConfig, parse_shape_list,
};

/// Distance source and pipeline flags shared by every command that runs cycles.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Use a constant distance instead of the simulated source
    #[arg(long, value_parser = parse_distance)]
    pub fixed: Option<f64>,

    /// Smallest simulated distance (inclusive)
    #[arg(long, default_value = "1")]
    pub min_distance: u32,

    /// Largest simulated distance (inclusive)
    #[arg(long, default_value = "4")]
    pub max_distance: u32,

    /// Shortest simulated delay in milliseconds
    #[arg(long, default_value = "200")]
    pub min_delay_ms: u64,

    /// Longest simulated delay in milliseconds (exclusive)
    #[arg(long, default_value = "2000")]
    pub max_delay_ms: u64,

    /// Comma-separated shape names, or "all"
    #[arg(long, default_value = "all")]
    pub shapes: String,

    /// Abort a cycle that takes longer than this many seconds (0 = never)
    #[arg(long, default_value = "0")]
    pub timeout_secs: u64,
}

impl Default for SourceArgs {
    fn default() -> Self {
        Self {
            fixed: None,
            min_distance: 1,
            max_distance: 4,
            min_delay_ms: 200,
            max_delay_ms: 2000,
            shapes: "all".to_string(),
            timeout_secs: 0,
        }
    }
}

/// Clap value parser for `--fixed`.
fn parse_distance(s: &str) -> Result<f64, String> {
    let d: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if d.is_finite() && d >= 0.0 {
        Ok(d)
    } else {
        Err(format!("distance must be a finite number >= 0, got {s}"))
    }
}

/// Build the distance source selected by the flags.
pub fn make_source(args: &SourceArgs) -> Result<Arc<dyn DistanceSource>, ConfigError> {
    if let Some(distance) = args.fixed {
        return Ok(Arc::new(FixedSource::new(distance)));
    }
    let config = SimulatedSourceConfig {
        min_distance: args.min_distance,
        max_distance: args.max_distance,
        min_delay: Duration::from_millis(args.min_delay_ms),
        max_delay: Duration::from_millis(args.max_delay_ms),
    };
    Ok(Arc::new(SimulatedSource::new(config)?))
}

/// Pipeline settings from the flags, normalized to declared shape order.
pub fn make_config(args: &SourceArgs) -> Result<PipelineConfig, ConfigError> {
    PipelineConfig {
        shapes: parse_shape_list(&args.shapes)?,
        cycle_timeout: (args.timeout_secs > 0).then(|| Duration::from_secs(args.timeout_secs)),
    }
    .normalized()
}

/// Build a pipeline or exit with the configuration error.
pub fn make_pipeline(args: &SourceArgs) -> RefreshPipeline {
    let built = make_source(args).and_then(|source| {
        let config = make_config(args)?;
        Ok(RefreshPipeline::with_config(source, config))
    });
    match built {
        Ok(pipeline) => pipeline,
        Err(e) => fail("invalid configuration", e),
    }
}

/// Multi-threaded runtime for commands that drive cycles.
pub fn runtime() -> tokio::runtime::Runtime {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => fail("failed to start async runtime", e),
    }
}

/// Print the error and exit non-zero.
pub fn fail(context: &str, err: impl Display) -> ! {
    eprintln!("Error: {context}: {err}");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapemedian_core::ShapeKind;

    #[test]
    fn parse_distance_accepts_non_negative() {
        assert_eq!(parse_distance("2.5"), Ok(2.5));
        assert_eq!(parse_distance("0"), Ok(0.0));
    }

    #[test]
    fn parse_distance_rejects_bad_values() {
        assert!(parse_distance("-1").is_err());
        assert!(parse_distance("inf").is_err());
        assert!(parse_distance("NaN").is_err());
        assert!(parse_distance("far").is_err());
    }

    #[test]
    fn default_source_is_simulated() {
        let source = make_source(&SourceArgs::default()).unwrap();
        assert_eq!(source.name(), "simulated");
    }

    #[test]
    fn fixed_flag_selects_fixed_source() {
        let args = SourceArgs {
            fixed: Some(3.0),
            ..Default::default()
        };
        assert_eq!(make_source(&args).unwrap().name(), "fixed");
    }

    #[test]
    fn empty_delay_range_is_rejected() {
        let args = SourceArgs {
            min_delay_ms: 500,
            max_delay_ms: 500,
            ..Default::default()
        };
        assert!(matches!(
            make_source(&args),
            Err(ConfigError::DelayRange { .. })
        ));
    }

    #[test]
    fn config_normalizes_shapes_and_timeout() {
        let args = SourceArgs {
            shapes: "ellipse,square,square".to_string(),
            timeout_secs: 5,
            ..Default::default()
        };
        let config = make_config(&args).unwrap();
        assert_eq!(config.shapes, vec![ShapeKind::Square, ShapeKind::Ellipse]);
        assert_eq!(config.cycle_timeout, Some(Duration::from_secs(5)));

        let config = make_config(&SourceArgs::default()).unwrap();
        assert_eq!(config.shapes, ShapeKind::ALL.to_vec());
        assert_eq!(config.cycle_timeout, None);
    }

    #[test]
    fn unknown_shape_is_rejected() {
        let args = SourceArgs {
            shapes: "hexagon".to_string(),
            ..Default::default()
        };
        assert_eq!(
            make_config(&args),
            Err(ConfigError::UnknownShape("hexagon".to_string()))
        );
    }
}
