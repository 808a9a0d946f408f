//! Session recording of refresh cycles.
//!
//! Records every result of every completed cycle so runs can be compared
//! offline. Recordings are write-only; the median registry is never rebuilt
//! from them.
//!
//! # Storage Format
//!
//! Each session is a directory containing:
//! - `session.json`: metadata (shapes, timing, final medians, tags)
//! - `cycles.csv`: one row per shape per cycle

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pipeline::RefreshReport;
use crate::shape::ShapeKind;

const CSV_HEADER: &str = "timestamp_ns,cycle,shape,distances,latest_area,median_area";

// ---------------------------------------------------------------------------
// Session metadata (session.json)
// ---------------------------------------------------------------------------

/// Session metadata written to session.json at the end of recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMeta {
    pub version: u32,
    pub id: String,
    pub started_at: String,
    pub ended_at: String,
    pub duration_ms: u64,
    pub source: String,
    pub shapes: Vec<ShapeKind>,
    pub cycles_recorded: u64,
    /// Last observed median per shape name.
    pub final_medians: BTreeMap<String, f64>,
    pub tags: HashMap<String, String>,
    pub note: Option<String>,
    pub shapemedian_version: String,
}

// ---------------------------------------------------------------------------
// Session config
// ---------------------------------------------------------------------------

/// Configuration for a recording session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub source: String,
    pub shapes: Vec<ShapeKind>,
    pub output_dir: PathBuf,
    pub tags: HashMap<String, String>,
    pub note: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            source: "simulated".to_string(),
            shapes: ShapeKind::ALL.to_vec(),
            output_dir: PathBuf::from("sessions"),
            tags: HashMap::new(),
            note: None,
        }
    }
}

/// Parse `key:value` tags; malformed entries are returned separately.
pub fn parse_tags(raw: &[String]) -> (HashMap<String, String>, Vec<String>) {
    let mut tags = HashMap::new();
    let mut rejected = Vec::new();
    for tag in raw {
        match tag.split_once(':') {
            Some((k, v)) if !k.is_empty() => {
                tags.insert(k.to_string(), v.to_string());
            }
            _ => rejected.push(tag.clone()),
        }
    }
    (tags, rejected)
}

// ---------------------------------------------------------------------------
// Session writer
// ---------------------------------------------------------------------------

/// Handles incremental file I/O for a recording session.
pub struct SessionWriter {
    session_dir: PathBuf,
    csv_writer: BufWriter<File>,
    cycles_recorded: u64,
    final_medians: BTreeMap<String, f64>,
    started_at: SystemTime,
    started_instant: Instant,
    session_id: String,
    config: SessionConfig,
}

impl SessionWriter {
    /// Create the session directory and `cycles.csv`.
    pub fn new(config: SessionConfig) -> std::io::Result<Self> {
        let session_id = Uuid::new_v4().to_string();
        let started_at = SystemTime::now();

        // {timestamp}-{shapes}-{id prefix}
        let ts = started_at.duration_since(UNIX_EPOCH).unwrap_or_default();
        let shapes_slug = config
            .shapes
            .iter()
            .map(|s| s.name())
            .collect::<Vec<_>>()
            .join("-");
        let dir_name = format!(
            "{}-{}-{}",
            format_iso8601_compact(ts),
            shapes_slug,
            &session_id[..8]
        );

        let session_dir = config.output_dir.join(dir_name);
        fs::create_dir_all(&session_dir)?;

        let csv_file = File::create(session_dir.join("cycles.csv"))?;
        let mut csv_writer = BufWriter::new(csv_file);
        writeln!(csv_writer, "{CSV_HEADER}")?;
        csv_writer.flush()?;

        log::info!("recording session to {}", session_dir.display());

        Ok(Self {
            session_dir,
            csv_writer,
            cycles_recorded: 0,
            final_medians: BTreeMap::new(),
            started_at,
            started_instant: Instant::now(),
            session_id,
            config,
        })
    }

    /// Append every result of one cycle.
    pub fn write_report(&mut self, report: &RefreshReport) -> std::io::Result<()> {
        let timestamp_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;

        for r in &report.results {
            let distances = r
                .distances
                .iter()
                .map(f64::to_string)
                .collect::<Vec<_>>()
                .join(";");
            writeln!(
                self.csv_writer,
                "{},{},{},{},{:.6},{:.6}",
                timestamp_ns,
                report.cycle,
                r.name(),
                distances,
                r.latest_area,
                r.median_area
            )?;
            self.final_medians.insert(r.name().to_string(), r.median_area);
        }
        self.csv_writer.flush()?;

        self.cycles_recorded += 1;
        Ok(())
    }

    /// Finalize the session, writing session.json. Call this on graceful shutdown.
    pub fn finish(mut self) -> std::io::Result<PathBuf> {
        self.csv_writer.flush()?;

        let ended_at = SystemTime::now();
        let duration = self.started_instant.elapsed();

        let meta = SessionMeta {
            version: 1,
            id: self.session_id,
            started_at: format_iso8601(
                self.started_at
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default(),
            ),
            ended_at: format_iso8601(ended_at.duration_since(UNIX_EPOCH).unwrap_or_default()),
            duration_ms: duration.as_millis() as u64,
            source: self.config.source,
            shapes: self.config.shapes,
            cycles_recorded: self.cycles_recorded,
            final_medians: self.final_medians,
            tags: self.config.tags,
            note: self.config.note,
            shapemedian_version: crate::VERSION.to_string(),
        };

        let json = serde_json::to_string_pretty(&meta).map_err(std::io::Error::other)?;
        fs::write(self.session_dir.join("session.json"), json)?;

        Ok(self.session_dir)
    }

    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    pub fn cycles_recorded(&self) -> u64 {
        self.cycles_recorded
    }

    pub fn elapsed(&self) -> Duration {
        self.started_instant.elapsed()
    }
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Compact ISO-8601 for directory names, e.g. `2026-02-15T013000Z`.
fn format_iso8601_compact(since_epoch: Duration) -> String {
    let (year, month, day, hour, min, sec) = secs_to_utc(since_epoch.as_secs());
    format!("{year:04}-{month:02}-{day:02}T{hour:02}{min:02}{sec:02}Z")
}

/// Full ISO-8601, e.g. `2026-02-15T01:30:00Z`.
fn format_iso8601(since_epoch: Duration) -> String {
    let (year, month, day, hour, min, sec) = secs_to_utc(since_epoch.as_secs());
    format!("{year:04}-{month:02}-{day:02}T{hour:02}:{min:02}:{sec:02}Z")
}

/// Seconds since the Unix epoch to (year, month, day, hour, minute, second) UTC.
/// No leap seconds.
fn secs_to_utc(secs: u64) -> (u64, u64, u64, u64, u64, u64) {
    let sec = secs % 60;
    let min = (secs / 60) % 60;
    let hour = (secs / 3600) % 24;

    let mut days = secs / 86400;
    let mut year = 1970u64;
    loop {
        let len = if is_leap(year) { 366 } else { 365 };
        if days < len {
            break;
        }
        days -= len;
        year += 1;
    }

    let feb = if is_leap(year) { 29 } else { 28 };
    let month_lengths = [31, feb, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    let mut month = 1u64;
    for len in month_lengths {
        if days < len {
            break;
        }
        days -= len;
        month += 1;
    }

    (year, month, days + 1, hour, min, sec)
}

fn is_leap(year: u64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::RefreshResult;

    fn report(cycle: u64, square_median: f64) -> RefreshReport {
        RefreshReport {
            cycle,
            duration_ms: 12,
            results: vec![
                RefreshResult {
                    shape: ShapeKind::Square,
                    distances: vec![2.0],
                    latest_area: 4.0,
                    median_area: square_median,
                    refresh_count: cycle,
                },
                RefreshResult {
                    shape: ShapeKind::Rectangle,
                    distances: vec![2.0, 3.0],
                    latest_area: 6.0,
                    median_area: 6.0,
                    refresh_count: cycle,
                },
            ],
        }
    }

    #[test]
    fn iso8601_epoch() {
        assert_eq!(format_iso8601(Duration::ZERO), "1970-01-01T00:00:00Z");
        assert_eq!(format_iso8601_compact(Duration::ZERO), "1970-01-01T000000Z");
    }

    #[test]
    fn utc_known_dates() {
        assert_eq!(secs_to_utc(946_684_800), (2000, 1, 1, 0, 0, 0));
        // 2024-02-29 12:34:56
        assert_eq!(secs_to_utc(1_709_210_096), (2024, 2, 29, 12, 34, 56));
        // 2023-12-31 23:59:59
        assert_eq!(secs_to_utc(1_704_067_199), (2023, 12, 31, 23, 59, 59));
    }

    #[test]
    fn leap_years() {
        assert!(is_leap(2000));
        assert!(is_leap(2024));
        assert!(!is_leap(1900));
        assert!(!is_leap(2023));
    }

    #[test]
    fn tags_parse() {
        let raw = vec!["site:lab".to_string(), "bogus".to_string(), ":x".to_string()];
        let (tags, rejected) = parse_tags(&raw);
        assert_eq!(tags.get("site").map(String::as_str), Some("lab"));
        assert_eq!(rejected, vec!["bogus".to_string(), ":x".to_string()]);
    }

    #[test]
    fn writer_creates_files() {
        let tmp = tempfile::tempdir().unwrap();
        let config = SessionConfig {
            output_dir: tmp.path().to_path_buf(),
            ..Default::default()
        };
        let writer = SessionWriter::new(config).unwrap();
        let dir = writer.session_dir().to_path_buf();
        assert!(dir.join("cycles.csv").exists());
        assert!(
            dir.file_name()
                .unwrap()
                .to_string_lossy()
                .contains("square-rectangle-circle-ellipse")
        );

        let finished = writer.finish().unwrap();
        assert_eq!(finished, dir);
        assert!(finished.join("session.json").exists());
    }

    #[test]
    fn writer_records_rows_and_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tags = HashMap::new();
        tags.insert("run".to_string(), "nightly".to_string());
        let config = SessionConfig {
            shapes: vec![ShapeKind::Square, ShapeKind::Rectangle],
            output_dir: tmp.path().to_path_buf(),
            tags,
            note: Some("two cycles".to_string()),
            ..Default::default()
        };

        let mut writer = SessionWriter::new(config).unwrap();
        writer.write_report(&report(1, 4.0)).unwrap();
        writer.write_report(&report(2, 3.5)).unwrap();
        assert_eq!(writer.cycles_recorded(), 2);
        let dir = writer.finish().unwrap();

        let csv = fs::read_to_string(dir.join("cycles.csv")).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines.len(), 5);
        assert!(lines[2].contains(",1,rectangle,2;3,6.000000,6.000000"));
        assert!(lines[3].contains(",2,square,2,4.000000,3.500000"));

        let meta: SessionMeta =
            serde_json::from_str(&fs::read_to_string(dir.join("session.json")).unwrap()).unwrap();
        assert_eq!(meta.version, 1);
        assert_eq!(meta.cycles_recorded, 2);
        assert_eq!(meta.shapes, vec![ShapeKind::Square, ShapeKind::Rectangle]);
        assert_eq!(meta.final_medians.get("square"), Some(&3.5));
        assert_eq!(meta.tags.get("run").map(String::as_str), Some("nightly"));
        assert_eq!(meta.note.as_deref(), Some("two cycles"));
        assert_eq!(meta.shapemedian_version, crate::VERSION);
    }
}
