use std::time::Duration;

use shapemedian_core::SharedPipeline;

use super::SourceArgs;

/// Auto refresh interval from `--interval` seconds.
fn auto_interval(secs: f64) -> Result<Duration, String> {
    if secs <= 0.0 {
        return Err(format!("{secs} is not a positive number of seconds"));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| format!("{secs}: {e}"))
}

pub fn run(interval: f64, auto: bool, args: &SourceArgs) {
    let interval = match auto_interval(interval) {
        Ok(d) => d,
        Err(e) => super::fail("invalid --interval", e),
    };
    let pipeline = SharedPipeline::new(super::make_pipeline(args));
    let rt = super::runtime();
    let mut app = crate::tui::app::App::new(pipeline, rt.handle().clone(), interval, auto);
    if let Err(e) = app.run() {
        eprintln!("TUI error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_accepts_positive_seconds() {
        assert_eq!(auto_interval(2.5), Ok(Duration::from_millis(2500)));
    }

    #[test]
    fn interval_rejects_out_of_range_values() {
        assert!(auto_interval(0.0).is_err());
        assert!(auto_interval(-1.0).is_err());
        assert!(auto_interval(f64::NAN).is_err());
        assert!(auto_interval(f64::INFINITY).is_err());
        // Larger than Duration::MAX.
        assert!(auto_interval(1e20).is_err());
    }
}
