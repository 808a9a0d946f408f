//! CLI for shapemedian: refresh shape areas and watch their running medians.

mod commands;
mod tui;

use clap::{Parser, Subcommand};

use commands::SourceArgs;

#[derive(Parser)]
#[command(name = "shapemedian")]
#[command(about = "shapemedian: shape areas from delayed distances, with running lower medians")]
#[command(version = shapemedian_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List shape kinds, how many distances each needs, and their formulas
    Shapes,

    /// Run refresh cycles and print the table after each one
    Run {
        /// Number of cycles (0 = until Ctrl+C)
        #[arg(long, default_value = "1")]
        cycles: u64,

        /// Print each cycle's report as JSON instead of the table
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Run refresh cycles and record every result to a session directory
    Record {
        /// Number of cycles (0 = until Ctrl+C)
        #[arg(long, default_value = "10")]
        cycles: u64,

        /// Metadata tags as key:value pairs
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Session note
        #[arg(long)]
        note: Option<String>,

        /// Output directory (default: ./sessions/)
        #[arg(long)]
        output: Option<String>,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Live interactive dashboard (TUI)
    Monitor {
        /// Seconds between cycles while auto refresh is on
        #[arg(long, default_value = "3.0")]
        interval: f64,

        /// Start with auto refresh enabled
        #[arg(long)]
        auto: bool,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Start the HTTP server (HTML table plus JSON API)
    Server {
        /// Port to listen on
        #[arg(long, default_value = "8042")]
        port: u16,

        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[command(flatten)]
        source: SourceArgs,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Shapes => commands::shapes::run(),
        Commands::Run {
            cycles,
            json,
            source,
        } => commands::run::run(cycles, json, &source),
        Commands::Record {
            cycles,
            tags,
            note,
            output,
            source,
        } => commands::record::run(commands::record::RecordCommandConfig {
            cycles,
            tags: &tags,
            note: note.as_deref(),
            output: output.as_deref(),
            source: &source,
        }),
        Commands::Monitor {
            interval,
            auto,
            source,
        } => commands::monitor::run(interval, auto, &source),
        Commands::Server { port, host, source } => commands::server::run(&host, port, &source),
    }
}
