//! `shapemedian run`: drive refresh cycles and print the table after each.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use shapemedian_core::{NullRenderer, RenderState, Renderer, TextTableRenderer, drive};

use super::SourceArgs;

/// Install a Ctrl+C handler that clears the returned flag.
pub fn interrupt_flag() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || r.store(false, Ordering::SeqCst)) {
        log::warn!("could not install Ctrl+C handler: {e}");
    }
    running
}

pub fn run(cycles: u64, json: bool, args: &SourceArgs) {
    let mut pipeline = super::make_pipeline(args);
    let running = interrupt_flag();
    let rt = super::runtime();

    let mut table = TextTableRenderer::new(io::stdout());
    if !json {
        table.render(&RenderState::Welcome, &[]);
    }

    let mut failures = 0u64;
    let mut cycle = 0u64;
    while running.load(Ordering::SeqCst) && (cycles == 0 || cycle < cycles) {
        cycle += 1;
        if json {
            match rt.block_on(drive(&mut pipeline, &mut NullRenderer)) {
                Ok(report) => match serde_json::to_string(&report) {
                    Ok(line) => println!("{line}"),
                    Err(e) => super::fail("failed to serialize report", e),
                },
                Err(e) => {
                    failures += 1;
                    eprintln!("cycle {cycle} failed: {e}");
                }
            }
        } else {
            if cycle > 1 {
                println!();
            }
            if rt.block_on(drive(&mut pipeline, &mut table)).is_err() {
                failures += 1;
            }
        }
    }

    let status = pipeline.status();
    log::info!(
        "{} cycle(s) completed, {} failed, {} samples requested",
        status.cycles_completed,
        status.cycles_failed,
        status.samples_requested
    );
    if failures > 0 && status.cycles_completed == 0 {
        std::process::exit(1);
    }
}
