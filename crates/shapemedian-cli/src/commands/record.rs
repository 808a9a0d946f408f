//! `shapemedian record`: run cycles and record every result to a session.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use shapemedian_core::session::{SessionConfig, SessionWriter, parse_tags};

use super::SourceArgs;

pub struct RecordCommandConfig<'a> {
    pub cycles: u64,
    pub tags: &'a [String],
    pub note: Option<&'a str>,
    pub output: Option<&'a str>,
    pub source: &'a SourceArgs,
}

pub fn run(cfg: RecordCommandConfig<'_>) {
    let mut pipeline = super::make_pipeline(cfg.source);

    let (tags, rejected) = parse_tags(cfg.tags);
    for tag in rejected {
        eprintln!("Warning: ignoring malformed tag '{tag}' (expected key:value)");
    }

    let config = SessionConfig {
        source: pipeline.source_name().to_string(),
        shapes: pipeline.config().shapes.clone(),
        output_dir: cfg.output.map_or_else(|| PathBuf::from("sessions"), PathBuf::from),
        tags,
        note: cfg.note.map(str::to_string),
    };
    let shape_names = config
        .shapes
        .iter()
        .map(|s| s.name())
        .collect::<Vec<_>>()
        .join(", ");
    let source_line = format!(
        "{} ({})",
        config.source,
        pipeline.source_info().description
    );

    let mut writer = match SessionWriter::new(config) {
        Ok(w) => w,
        Err(e) => super::fail("creating session", e),
    };

    let running = super::run::interrupt_flag();
    let rt = super::runtime();

    println!("Recording session");
    println!("  Source:    {source_line}");
    println!("  Shapes:    {shape_names}");
    if cfg.cycles == 0 {
        println!("  Cycles:    until Ctrl+C");
    } else {
        println!("  Cycles:    {}", cfg.cycles);
    }
    println!("  Output:    {}", writer.session_dir().display());
    println!();

    let mut had_write_error = false;
    let mut cycle = 0u64;
    while running.load(Ordering::SeqCst) && (cfg.cycles == 0 || cycle < cfg.cycles) {
        cycle += 1;
        match rt.block_on(pipeline.refresh_all()) {
            Ok(report) => {
                if let Err(e) = writer.write_report(&report) {
                    eprintln!("\nError writing cycle: {e}");
                    had_write_error = true;
                    break;
                }
            }
            Err(e) => eprintln!("\ncycle {cycle} failed: {e}"),
        }
        print!(
            "\r  Cycles recorded: {:<6} Elapsed: {:.1}s",
            writer.cycles_recorded(),
            writer.elapsed().as_secs_f64()
        );
        let _ = std::io::stdout().flush();
    }
    println!();

    match writer.finish() {
        Ok(dir) => {
            println!("\nSession saved to {}", dir.display());
            for summary in pipeline.registry().summary() {
                println!(
                    "  {:<12} n={:<5} median={:.2}  min={:.2}  max={:.2}",
                    summary.shape.name(),
                    summary.count,
                    summary.median,
                    summary.min,
                    summary.max
                );
            }
        }
        Err(e) => super::fail("finalizing session", e),
    }
    if had_write_error {
        std::process::exit(1);
    }
}
