//! Basic refresh example.
//!
//! Runs three refresh cycles against the simulated source and prints the
//! table after each one.
//!
//! Run: `cargo run --example basic`

use std::sync::Arc;

use shapemedian_core::{RefreshPipeline, SimulatedSource, TextTableRenderer, drive};

#[tokio::main]
async fn main() {
    let mut pipeline = RefreshPipeline::new(Arc::new(SimulatedSource::default()));
    let mut renderer = TextTableRenderer::new(std::io::stdout());

    for _ in 0..3 {
        if let Err(e) = drive(&mut pipeline, &mut renderer).await {
            eprintln!("refresh failed: {e}");
        }
        println!();
    }

    let status = pipeline.status();
    println!(
        "{} cycles, {} samples requested, last cycle {:.2}s",
        status.refresh_count, status.samples_requested, status.last_cycle_secs
    );
}
