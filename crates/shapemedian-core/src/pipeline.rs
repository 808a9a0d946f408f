//! Refresh pipeline: fan out distance samples, join, compute areas, update medians.
//!
//! Architecture of one refresh cycle:
//! 1. Bump the refresh counter
//! 2. Request `dimensions()` distances per configured shape, all at once
//! 3. Wait for every sample in a single join (fail-fast)
//! 4. Evaluate each shape's area on its own distances, in request order
//! 5. Record each area in the median registry
//! 6. Emit one result per shape in declared order
//!
//! [`RefreshPipeline`] is the single writer of the registry and the counter.
//! [`SharedPipeline`] wraps it for contexts with several tasks (HTTP server,
//! dashboard) and refuses to start a cycle while another is in flight.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};

use crate::error::{ConfigError, FetchError, RefreshError};
use crate::median::{MedianRegistry, ShapeSummary};
use crate::render::RenderState;
use crate::shape::ShapeKind;
use crate::source::{DistanceSource, SourceInfo};

/// Pipeline settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Shapes measured every cycle, in declared order.
    pub shapes: Vec<ShapeKind>,
    /// Abort the cycle if the join takes longer than this.
    pub cycle_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            shapes: ShapeKind::ALL.to_vec(),
            cycle_timeout: None,
        }
    }
}

impl PipelineConfig {
    /// Sort and dedupe the shape list; reject an empty one.
    pub fn normalized(mut self) -> Result<Self, ConfigError> {
        self.shapes.sort_unstable();
        self.shapes.dedup();
        if self.shapes.is_empty() {
            return Err(ConfigError::NoShapes);
        }
        Ok(self)
    }

    /// Distance samples issued per cycle.
    pub fn samples_per_cycle(&self) -> usize {
        self.shapes.iter().map(|s| s.dimensions()).sum()
    }
}

/// One shape's row of a refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshResult {
    pub shape: ShapeKind,
    /// Distances consumed by the formula, in request order.
    pub distances: Vec<f64>,
    pub latest_area: f64,
    pub median_area: f64,
    pub refresh_count: u64,
}

impl RefreshResult {
    pub fn name(&self) -> &'static str {
        self.shape.name()
    }
}

/// Everything one successful cycle produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshReport {
    /// Refresh counter value for this cycle.
    pub cycle: u64,
    /// Wall time from the first request to the last emitted result.
    pub duration_ms: u64,
    /// One entry per configured shape, in declared order.
    pub results: Vec<RefreshResult>,
}

impl RefreshReport {
    pub fn result(&self, shape: ShapeKind) -> Option<&RefreshResult> {
        self.results.iter().find(|r| r.shape == shape)
    }
}

/// Counters kept across cycles.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineStatus {
    /// Cycles started (equals the refresh counter).
    pub refresh_count: u64,
    pub cycles_completed: u64,
    pub cycles_failed: u64,
    pub samples_requested: u64,
    /// Duration of the last finished cycle in seconds.
    pub last_cycle_secs: f64,
    pub last_error: Option<String>,
    pub source: String,
}

/// Owns the median registry and refresh counter for one session.
pub struct RefreshPipeline {
    source: Arc<dyn DistanceSource>,
    config: PipelineConfig,
    registry: MedianRegistry,
    refresh_count: u64,
    cycles_completed: u64,
    cycles_failed: u64,
    samples_requested: u64,
    last_cycle_time: Duration,
    last_error: Option<String>,
}

impl RefreshPipeline {
    /// Pipeline over all four shapes with no timeout.
    pub fn new(source: Arc<dyn DistanceSource>) -> Self {
        Self::with_config(source, PipelineConfig::default())
    }

    /// The config is used as given; call [`PipelineConfig::normalized`] first
    /// if it comes from user input.
    pub fn with_config(source: Arc<dyn DistanceSource>, config: PipelineConfig) -> Self {
        Self {
            source,
            config,
            registry: MedianRegistry::new(),
            refresh_count: 0,
            cycles_completed: 0,
            cycles_failed: 0,
            samples_requested: 0,
            last_cycle_time: Duration::ZERO,
            last_error: None,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &MedianRegistry {
        &self.registry
    }

    pub fn refresh_count(&self) -> u64 {
        self.refresh_count
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    pub fn source_info(&self) -> &SourceInfo {
        self.source.info()
    }

    /// Run one refresh cycle.
    ///
    /// The counter is bumped before any sample is requested, so a failed
    /// cycle still counts. On failure the registry is left untouched and
    /// all outstanding samples are dropped.
    pub async fn refresh_all(&mut self) -> Result<RefreshReport, RefreshError> {
        self.refresh_count += 1;
        let cycle = self.refresh_count;
        let t0 = Instant::now();
        log::debug!(
            "cycle {cycle}: requesting {} samples from {}",
            self.config.samples_per_cycle(),
            self.source.name()
        );

        match self.collect_distances().await {
            Ok(distances) => {
                let report = self.apply(cycle, &distances, t0);
                log::info!(
                    "cycle {cycle} completed in {}ms ({} shapes)",
                    report.duration_ms,
                    report.results.len()
                );
                Ok(report)
            }
            Err(e) => {
                self.note_failure(&e, t0.elapsed());
                Err(e)
            }
        }
    }

    /// Fan out every sample of the cycle and join them all at once.
    async fn collect_distances(&mut self) -> Result<Vec<f64>, RefreshError> {
        self.samples_requested += self.config.samples_per_cycle() as u64;
        let source = Arc::clone(&self.source);
        let requests = self
            .config
            .shapes
            .iter()
            .flat_map(|&shape| std::iter::repeat_n(shape, shape.dimensions()))
            .map(|shape| {
                let pending = source.sample();
                async move {
                    pending
                        .await
                        .and_then(validate_distance)
                        .map_err(|source| RefreshError::Fetch { shape, source })
                }
            });
        let join = try_join_all(requests);

        match self.config.cycle_timeout {
            Some(limit) => tokio::time::timeout(limit, join)
                .await
                .map_err(|_| RefreshError::Timeout(limit))?,
            None => join.await,
        }
    }

    /// Evaluate, record and emit. Runs without suspension points so a
    /// cancelled cycle can never leave the registry half-updated.
    fn apply(&mut self, cycle: u64, distances: &[f64], t0: Instant) -> RefreshReport {
        let mut results = Vec::with_capacity(self.config.shapes.len());
        let mut offset = 0;
        for &shape in &self.config.shapes {
            let taken = &distances[offset..offset + shape.dimensions()];
            offset += shape.dimensions();
            let latest_area = shape.area(taken);
            let median_area = self.registry.record(shape, latest_area);
            results.push(RefreshResult {
                shape,
                distances: taken.to_vec(),
                latest_area,
                median_area,
                refresh_count: cycle,
            });
        }

        self.cycles_completed += 1;
        self.last_cycle_time = t0.elapsed();
        self.last_error = None;
        RefreshReport {
            cycle,
            duration_ms: self.last_cycle_time.as_millis() as u64,
            results,
        }
    }

    pub(crate) fn note_failure(&mut self, err: &RefreshError, elapsed: Duration) {
        log::warn!("cycle {} failed: {err}", self.refresh_count);
        self.cycles_failed += 1;
        self.last_cycle_time = elapsed;
        self.last_error = Some(err.to_string());
    }

    /// Structured status snapshot.
    pub fn status(&self) -> PipelineStatus {
        PipelineStatus {
            refresh_count: self.refresh_count,
            cycles_completed: self.cycles_completed,
            cycles_failed: self.cycles_failed,
            samples_requested: self.samples_requested,
            last_cycle_secs: self.last_cycle_time.as_secs_f64(),
            last_error: self.last_error.clone(),
            source: self.source.name().to_string(),
        }
    }
}

fn validate_distance(d: f64) -> Result<f64, FetchError> {
    if d.is_finite() && d >= 0.0 {
        Ok(d)
    } else {
        Err(FetchError::Malformed(d))
    }
}

// ---------------------------------------------------------------------------
// Shared pipeline
// ---------------------------------------------------------------------------

/// What readers see without waiting for an in-flight cycle.
#[derive(Debug, Clone, Default)]
pub struct PipelineSnapshot {
    pub last_report: Option<RefreshReport>,
    pub summary: Vec<ShapeSummary>,
    pub status: PipelineStatus,
    pub shapes: Vec<ShapeKind>,
}

impl PipelineSnapshot {
    /// View state for a renderer: `Loading` while a cycle is in flight,
    /// otherwise whatever the last cycle left behind.
    pub fn render_state(&self, refreshing: bool) -> RenderState {
        if refreshing {
            RenderState::Loading
        } else if let Some(err) = &self.status.last_error {
            RenderState::Failed(err.clone())
        } else if self.last_report.is_some() {
            RenderState::Idle
        } else {
            RenderState::Welcome
        }
    }

    /// Rows of the last completed cycle, empty before the first one.
    pub fn rows(&self) -> &[RefreshResult] {
        self.last_report
            .as_ref()
            .map(|r| r.results.as_slice())
            .unwrap_or_default()
    }
}

/// Cloneable handle for triggering cycles from several tasks.
///
/// At most one cycle runs at a time; a trigger that arrives while one is in
/// flight is rejected with [`RefreshError::InProgress`].
#[derive(Clone)]
pub struct SharedPipeline {
    pipeline: Arc<Mutex<RefreshPipeline>>,
    snapshot: Arc<RwLock<PipelineSnapshot>>,
    cancel: Arc<Notify>,
}

impl SharedPipeline {
    pub fn new(pipeline: RefreshPipeline) -> Self {
        let snapshot = PipelineSnapshot {
            last_report: None,
            summary: Vec::new(),
            status: pipeline.status(),
            shapes: pipeline.config().shapes.clone(),
        };
        Self {
            pipeline: Arc::new(Mutex::new(pipeline)),
            snapshot: Arc::new(RwLock::new(snapshot)),
            cancel: Arc::new(Notify::new()),
        }
    }

    /// Start one cycle and wait for it.
    pub async fn trigger_refresh(&self) -> Result<RefreshReport, RefreshError> {
        let mut pipeline = self
            .pipeline
            .try_lock()
            .map_err(|_| RefreshError::InProgress)?;
        let t0 = Instant::now();
        let cancelled = self.cancel.notified();

        let outcome = tokio::select! {
            result = pipeline.refresh_all() => result,
            () = cancelled => Err(RefreshError::Cancelled),
        };
        if let Err(err @ RefreshError::Cancelled) = &outcome {
            pipeline.note_failure(err, t0.elapsed());
        }

        let mut snapshot = self.snapshot.write().unwrap_or_else(|e| e.into_inner());
        if let Ok(report) = &outcome {
            snapshot.last_report = Some(report.clone());
        }
        snapshot.summary = pipeline.registry().summary();
        snapshot.status = pipeline.status();
        outcome
    }

    /// Abort the cycle currently in flight, if any.
    pub fn cancel_refresh(&self) {
        self.cancel.notify_waiters();
    }

    pub fn is_refreshing(&self) -> bool {
        self.pipeline.try_lock().is_err()
    }

    /// Latest completed state. Never waits on an in-flight cycle.
    pub fn snapshot(&self) -> PipelineSnapshot {
        self.snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn last_report(&self) -> Option<RefreshReport> {
        self.snapshot().last_report
    }
}
