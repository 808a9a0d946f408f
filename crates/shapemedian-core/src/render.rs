//! Renderer boundary and the plain-text table renderer.
//!
//! The pipeline never formats anything itself. It hands a [`RenderState`]
//! and the ordered results of the last cycle to a [`Renderer`], which may
//! draw to a terminal, build HTML, or ignore the call entirely.

use std::io::Write;

use crate::error::RefreshError;
use crate::pipeline::{RefreshPipeline, RefreshReport, RefreshResult};

/// Column headers shared by every table renderer.
pub const COLUMNS: [&str; 4] = ["Shape", "Median Area", "Latest Area", "# Area Calculations"];

/// Text shown before the first cycle.
pub const WELCOME: &str = "Welcome! Trigger a refresh to calculate areas";

/// What the view should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderState {
    /// Nothing has been requested yet.
    Welcome,
    /// A cycle is in flight.
    Loading,
    /// Results of the last completed cycle are available.
    Idle,
    /// The last cycle failed with this message.
    Failed(String),
}

/// Something that can display the view-model.
pub trait Renderer {
    fn render(&mut self, state: &RenderState, data: &[RefreshResult]);
}

/// Render `Loading`, run one cycle, then render the outcome.
pub async fn drive<R: Renderer + ?Sized>(
    pipeline: &mut RefreshPipeline,
    renderer: &mut R,
) -> Result<RefreshReport, RefreshError> {
    renderer.render(&RenderState::Loading, &[]);
    match pipeline.refresh_all().await {
        Ok(report) => {
            renderer.render(&RenderState::Idle, &report.results);
            Ok(report)
        }
        Err(e) => {
            renderer.render(&RenderState::Failed(e.to_string()), &[]);
            Err(e)
        }
    }
}

/// Format an area the way every table shows it.
pub fn format_area(area: f64) -> String {
    format!("{area:.2}")
}

/// Fixed-width text table written to any `Write`.
pub struct TextTableRenderer<W: Write> {
    out: W,
}

impl<W: Write> TextTableRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_table(&mut self, data: &[RefreshResult]) -> std::io::Result<()> {
        writeln!(
            self.out,
            "{:<12} {:>12} {:>12} {:>20}",
            COLUMNS[0], COLUMNS[1], COLUMNS[2], COLUMNS[3]
        )?;
        writeln!(self.out, "{}", "-".repeat(59))?;
        for row in data {
            writeln!(
                self.out,
                "{:<12} {:>12} {:>12} {:>20}",
                row.name(),
                format_area(row.median_area),
                format_area(row.latest_area),
                row.refresh_count
            )?;
        }
        Ok(())
    }

    fn write_state(&mut self, state: &RenderState, data: &[RefreshResult]) -> std::io::Result<()> {
        match state {
            RenderState::Welcome => writeln!(self.out, "{WELCOME}")?,
            RenderState::Loading => writeln!(self.out, "Loading...")?,
            RenderState::Idle => self.write_table(data)?,
            RenderState::Failed(msg) => writeln!(self.out, "Refresh failed: {msg}")?,
        }
        self.out.flush()
    }
}

impl<W: Write> Renderer for TextTableRenderer<W> {
    fn render(&mut self, state: &RenderState, data: &[RefreshResult]) {
        if let Err(e) = self.write_state(state, data) {
            log::warn!("text renderer: {e}");
        }
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _state: &RenderState, _data: &[RefreshResult]) {}
}
