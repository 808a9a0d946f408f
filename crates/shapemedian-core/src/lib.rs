//! # shapemedian-core
//!
//! **Running lower medians of shape areas, refreshed on demand.**
//!
//! Each refresh cycle requests distance measurements from a
//! [`DistanceSource`], computes the area of every configured shape, and
//! records the area in a per-shape sorted history whose lower median is
//! reported alongside the latest value.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use shapemedian_core::{RefreshPipeline, SimulatedSource};
//!
//! # async fn demo() -> Result<(), shapemedian_core::RefreshError> {
//! let mut pipeline = RefreshPipeline::new(Arc::new(SimulatedSource::default()));
//! let report = pipeline.refresh_all().await?;
//! for row in &report.results {
//!     println!("{} latest={:.2} median={:.2}", row.name(), row.latest_area, row.median_area);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! Source → fan-out samples → grand join → areas → median registry → renderer
//!
//! The pipeline owns all mutable state. [`SharedPipeline`] adds a
//! single-in-flight guard for callers on several tasks.

pub mod error;
pub mod median;
pub mod pipeline;
pub mod render;
pub mod session;
pub mod shape;
pub mod source;

pub use error::{ConfigError, FetchError, RefreshError};
pub use median::{MedianRegistry, ShapeSummary, lower_median_index};
pub use pipeline::{
    PipelineConfig, PipelineSnapshot, PipelineStatus, RefreshPipeline, RefreshReport,
    RefreshResult, SharedPipeline,
};
pub use render::{NullRenderer, RenderState, Renderer, TextTableRenderer, drive, format_area};
pub use session::{SessionConfig, SessionMeta, SessionWriter, parse_tags};
pub use shape::{ShapeKind, parse_shape_list};
pub use source::{
    DistanceSource, FixedSource, ScriptedSource, SimulatedSource, SimulatedSourceConfig,
    SourceInfo, SourceKind,
};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
