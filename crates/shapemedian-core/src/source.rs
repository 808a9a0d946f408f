//! Distance source trait and the bundled implementations.
//!
//! Every source implements [`DistanceSource`]: metadata via [`SourceInfo`] and
//! an asynchronous [`sample`](DistanceSource::sample) that resolves to one
//! distance. Callers may hold many samples in flight at once; each one owns
//! its own timer.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use futures::future::BoxFuture;
use rand::Rng;

use crate::error::{ConfigError, FetchError};

/// How a source produces its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Random values after random delays.
    Simulated,
    /// A constant value.
    Fixed,
    /// A pre-loaded sequence.
    Scripted,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simulated => write!(f, "simulated"),
            Self::Fixed => write!(f, "fixed"),
            Self::Scripted => write!(f, "scripted"),
        }
    }
}

/// Metadata about a distance source.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    /// Unique identifier (e.g. `"simulated"`).
    pub name: &'static str,
    /// One-line human-readable description.
    pub description: String,
    pub kind: SourceKind,
}

/// Trait that every distance source must implement.
pub trait DistanceSource: Send + Sync {
    /// Source metadata.
    fn info(&self) -> &SourceInfo;

    /// Request one distance. The returned future resolves once the
    /// measurement is available and must not block the caller.
    fn sample(&self) -> BoxFuture<'_, Result<f64, FetchError>>;

    /// Convenience: name from info.
    fn name(&self) -> &'static str {
        self.info().name
    }
}

// ---------------------------------------------------------------------------
// Simulated source
// ---------------------------------------------------------------------------

/// Ranges for the simulated source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedSourceConfig {
    /// Smallest distance, inclusive.
    pub min_distance: u32,
    /// Largest distance, inclusive.
    pub max_distance: u32,
    /// Shortest delay, inclusive.
    pub min_delay: Duration,
    /// Longest delay, exclusive.
    pub max_delay: Duration,
}

impl Default for SimulatedSourceConfig {
    fn default() -> Self {
        Self {
            min_distance: 1,
            max_distance: 4,
            min_delay: Duration::from_millis(200),
            max_delay: Duration::from_millis(2000),
        }
    }
}

impl SimulatedSourceConfig {
    /// Reject empty ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_distance > self.max_distance {
            return Err(ConfigError::DistanceRange {
                min: self.min_distance,
                max: self.max_distance,
            });
        }
        if self.min_delay >= self.max_delay {
            return Err(ConfigError::DelayRange {
                min: self.min_delay,
                max: self.max_delay,
            });
        }
        Ok(())
    }
}

/// Integer distances in `[min_distance, max_distance]`, each delivered after a
/// delay drawn uniformly from `[min_delay, max_delay)`. Never fails.
pub struct SimulatedSource {
    info: SourceInfo,
    config: SimulatedSourceConfig,
}

impl SimulatedSource {
    pub fn new(config: SimulatedSourceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            info: SourceInfo {
                name: "simulated",
                description: format!(
                    "random distance {}..={} after {}..{}ms",
                    config.min_distance,
                    config.max_distance,
                    config.min_delay.as_millis(),
                    config.max_delay.as_millis()
                ),
                kind: SourceKind::Simulated,
            },
            config,
        })
    }

    pub fn config(&self) -> &SimulatedSourceConfig {
        &self.config
    }

    /// Draw a distance and a delay. The RNG is not held across the await.
    fn draw(&self) -> (f64, Duration) {
        let mut rng = rand::rng();
        let distance = rng.random_range(self.config.min_distance..=self.config.max_distance);
        let delay = rng.random_range(self.config.min_delay..self.config.max_delay);
        (f64::from(distance), delay)
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self {
            info: SourceInfo {
                name: "simulated",
                description: "random distance 1..=4 after 200..2000ms".to_string(),
                kind: SourceKind::Simulated,
            },
            config: SimulatedSourceConfig::default(),
        }
    }
}

impl DistanceSource for SimulatedSource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    fn sample(&self) -> BoxFuture<'_, Result<f64, FetchError>> {
        let (distance, delay) = self.draw();
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            log::debug!("simulated distance {distance} after {}ms", delay.as_millis());
            Ok(distance)
        })
    }
}

// ---------------------------------------------------------------------------
// Fixed source
// ---------------------------------------------------------------------------

/// Always returns the same distance, optionally after a fixed delay.
pub struct FixedSource {
    info: SourceInfo,
    distance: f64,
    delay: Duration,
}

impl FixedSource {
    pub fn new(distance: f64) -> Self {
        Self::with_delay(distance, Duration::ZERO)
    }

    pub fn with_delay(distance: f64, delay: Duration) -> Self {
        Self {
            info: SourceInfo {
                name: "fixed",
                description: format!("constant distance {distance}"),
                kind: SourceKind::Fixed,
            },
            distance,
            delay,
        }
    }
}

impl DistanceSource for FixedSource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    fn sample(&self) -> BoxFuture<'_, Result<f64, FetchError>> {
        let (distance, delay) = (self.distance, self.delay);
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            Ok(distance)
        })
    }
}

// ---------------------------------------------------------------------------
// Scripted source
// ---------------------------------------------------------------------------

/// Hands out queued results in request order.
///
/// The value is taken when [`sample`](DistanceSource::sample) is called, not
/// when the future resolves, so request order is preserved regardless of how
/// the futures are polled. Each entry may carry its own delay, which lets
/// tests make later requests finish first.
pub struct ScriptedSource {
    info: SourceInfo,
    queue: Mutex<VecDeque<(Result<f64, FetchError>, Duration)>>,
}

impl ScriptedSource {
    pub fn new(distances: impl IntoIterator<Item = f64>) -> Self {
        Self::from_results(distances.into_iter().map(Ok))
    }

    /// Queue explicit results, including failures.
    pub fn from_results(results: impl IntoIterator<Item = Result<f64, FetchError>>) -> Self {
        Self::with_entries(results.into_iter().map(|r| (r, Duration::ZERO)))
    }

    /// Queue distances that each resolve after their own delay.
    pub fn timed(entries: impl IntoIterator<Item = (f64, Duration)>) -> Self {
        Self::with_entries(entries.into_iter().map(|(d, delay)| (Ok(d), delay)))
    }

    fn with_entries(
        entries: impl IntoIterator<Item = (Result<f64, FetchError>, Duration)>,
    ) -> Self {
        Self {
            info: SourceInfo {
                name: "scripted",
                description: "pre-loaded distance sequence".to_string(),
                kind: SourceKind::Scripted,
            },
            queue: Mutex::new(entries.into_iter().collect()),
        }
    }

    /// Append an immediate result to the end of the queue.
    pub fn push(&self, result: Result<f64, FetchError>) {
        self.lock_queue().push_back((result, Duration::ZERO));
    }

    /// Results not yet handed out.
    pub fn remaining(&self) -> usize {
        self.lock_queue().len()
    }

    fn lock_queue(
        &self,
    ) -> std::sync::MutexGuard<'_, VecDeque<(Result<f64, FetchError>, Duration)>> {
        // A poisoned queue still holds valid data.
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DistanceSource for ScriptedSource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    fn sample(&self) -> BoxFuture<'_, Result<f64, FetchError>> {
        let (next, delay) = self
            .lock_queue()
            .pop_front()
            .unwrap_or((Err(FetchError::Exhausted), Duration::ZERO));
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            next
        })
    }
}
