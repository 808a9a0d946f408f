use shapemedian_core::SharedPipeline;

use super::SourceArgs;

pub fn run(host: &str, port: u16, args: &SourceArgs) {
    let pipeline = super::make_pipeline(args);

    let base = format!("http://{host}:{port}");
    let shapes: Vec<&str> = pipeline.config().shapes.iter().map(|s| s.name()).collect();

    println!("shapemedian server v{}", shapemedian_core::VERSION);
    println!("   {base}");
    let info = pipeline.source_info();
    println!("   source: {} ({})", info.kind, info.description);
    println!("   shapes: {}", shapes.join(", "));
    println!();
    println!("   Endpoints:");
    println!("     GET  /                 HTML table with a Refresh button");
    println!("     POST /refresh          Start a cycle (form target, redirects to /)");
    println!("     POST /api/v1/refresh   Run a cycle and return the report");
    println!("     GET  /api/v1/areas     Last completed report");
    println!("     GET  /api/v1/shapes    Per-shape min/median/max");
    println!("     GET  /health           Pipeline status");
    println!();
    println!("   Examples:");
    println!("     curl -X POST {base}/api/v1/refresh");
    println!("     curl {base}/api/v1/shapes");
    println!();

    let shared = SharedPipeline::new(pipeline);
    let rt = super::runtime();
    if let Err(e) = rt.block_on(shapemedian_server::run_server(shared, host, port)) {
        super::fail("server stopped", e);
    }
}
