//! Running lower median per shape.
//!
//! Each shape keeps every area it has ever recorded in an ascending vector.
//! After an insertion of the L-th value the median is the element at
//! zero-based index `ceil(L/2) - 1`. For even L that is the lower of the two
//! middle values; the two are never averaged.

use serde::Serialize;

use crate::shape::ShapeKind;

/// Index of the lower median in a sorted sequence of `len` values.
///
/// `len` must be at least 1.
pub fn lower_median_index(len: usize) -> usize {
    debug_assert!(len >= 1);
    len.div_ceil(2) - 1
}

/// Sorted area history for every shape kind.
#[derive(Debug, Clone, Default)]
pub struct MedianRegistry {
    histories: [Vec<f64>; 4],
}

impl MedianRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `area` into the shape's history and return the median that
    /// includes it.
    pub fn record(&mut self, kind: ShapeKind, area: f64) -> f64 {
        let history = &mut self.histories[kind.index()];
        let pos = history.partition_point(|v| v.total_cmp(&area).is_le());
        history.insert(pos, area);
        history[lower_median_index(history.len())]
    }

    /// Current median, or `None` if nothing was recorded yet.
    pub fn median(&self, kind: ShapeKind) -> Option<f64> {
        let history = self.history(kind);
        if history.is_empty() {
            None
        } else {
            Some(history[lower_median_index(history.len())])
        }
    }

    /// Ascending history for a shape.
    pub fn history(&self, kind: ShapeKind) -> &[f64] {
        &self.histories[kind.index()]
    }

    /// Number of recorded areas for a shape.
    pub fn len(&self, kind: ShapeKind) -> usize {
        self.history(kind).len()
    }

    /// True if no shape has any history.
    pub fn is_empty(&self) -> bool {
        self.histories.iter().all(Vec::is_empty)
    }

    /// Per-shape summary in declared order, skipping shapes without history.
    pub fn summary(&self) -> Vec<ShapeSummary> {
        ShapeKind::ALL
            .iter()
            .filter_map(|&kind| {
                let history = self.history(kind);
                let median = self.median(kind)?;
                Some(ShapeSummary {
                    shape: kind,
                    count: history.len(),
                    min: history[0],
                    median,
                    max: history[history.len() - 1],
                })
            })
            .collect()
    }
}

/// Snapshot of one shape's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeSummary {
    pub shape: ShapeKind,
    pub count: usize,
    pub min: f64,
    pub median: f64,
    pub max: f64,
}
