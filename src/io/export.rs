//! Point-in-time report export (JSON) and history export (CSV).

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::sim::metrics::PanelMetrics;
use crate::sim::types::{BuildingState, HistoryPoint, PhaseReading, Status};

/// Number of most recent history points included in a report.
pub const REPORT_HISTORY_POINTS: usize = 10;

/// Column header for CSV history export.
const HISTORY_HEADER: [&str; 5] = ["building", "timestamp", "power_R", "power_S", "power_T"];

/// Export failure.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Downloadable snapshot of one building.
///
/// Aggregates come from [`PanelMetrics`], the same calculation the live
/// dashboard shows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerReport {
    /// Building the report describes.
    pub building: String,
    /// Generation time (RFC 3339, UTC).
    pub timestamp: String,
    /// Total power (kW).
    pub total_power: f64,
    /// Mean phase voltage (V).
    pub average_voltage: f64,
    /// Total current (A).
    pub total_current: f64,
    /// Load imbalance (% of highest phase power).
    pub load_imbalance_pct: f64,
    /// Overall health.
    pub health: Status,
    /// Current phase readings.
    pub phase_details: Vec<PhaseReading>,
    /// Most recent history points, oldest first.
    pub historical_data: Vec<HistoryPoint>,
    #[serde(skip)]
    generated_at: DateTime<Utc>,
}

impl PowerReport {
    /// Builds a report from the building's current state.
    pub fn from_building(building: &BuildingState, generated_at: DateTime<Utc>) -> Self {
        let metrics = PanelMetrics::from_phases(&building.phases);
        Self {
            building: building.name.clone(),
            timestamp: generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            total_power: metrics.total_power,
            average_voltage: metrics.avg_voltage,
            total_current: metrics.total_current,
            load_imbalance_pct: metrics.load_imbalance_pct,
            health: metrics.health,
            phase_details: building.phases.to_vec(),
            historical_data: building.recent_history(REPORT_HISTORY_POINTS),
            generated_at,
        }
    }

    /// Download file name: building slug plus epoch milliseconds.
    pub fn file_name(&self) -> String {
        report_file_name(&self.building, &self.generated_at)
    }
}

/// Builds the report file name for a building at a given instant.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use panel_sim::io::export::report_file_name;
///
/// let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
/// assert_eq!(
///     report_file_name("Engineering Faculty", &at),
///     "engineering_faculty_power_report_1700000000123.json"
/// );
/// ```
pub fn report_file_name(building: &str, at: &DateTime<Utc>) -> String {
    let slug: String = building
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{slug}_power_report_{}.json", at.timestamp_millis())
}

/// Writes a report as pretty-printed JSON to any writer.
///
/// # Errors
///
/// Returns an `ExportError` if serialization or writing fails.
pub fn write_report(report: &PowerReport, mut writer: impl Write) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Writes a report into `dir` under its download file name.
///
/// # Errors
///
/// Returns an `ExportError` if the file cannot be created or written.
pub fn export_report(report: &PowerReport, dir: &Path) -> Result<PathBuf, ExportError> {
    let path = dir.join(report.file_name());
    let file = File::create(&path)?;
    write_report(report, io::BufWriter::new(file))?;
    Ok(path)
}

/// Writes every building's history as CSV to any writer.
///
/// # Errors
///
/// Returns an `ExportError` if writing fails.
pub fn write_history_csv<'a>(
    buildings: impl IntoIterator<Item = &'a BuildingState>,
    writer: impl Write,
) -> Result<(), ExportError> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HISTORY_HEADER)?;

    for b in buildings {
        for p in &b.history {
            wtr.write_record(&[
                b.name.clone(),
                p.timestamp.clone(),
                format!("{:.2}", p.power_r),
                format!("{:.2}", p.power_s),
                format!("{:.2}", p.power_t),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Exports every building's history to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `ExportError` if file creation or writing fails.
pub fn export_history_csv<'a>(
    buildings: impl IntoIterator<Item = &'a BuildingState>,
    path: &Path,
) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_history_csv(buildings, io::BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::sim::types::{BuildingSpec, PhaseId};

    fn building(history_len: usize) -> BuildingState {
        let spec = BuildingSpec::standard("Engineering Faculty");
        BuildingState {
            name: spec.name,
            phases: spec.phases,
            history: (0..history_len)
                .map(|i| HistoryPoint {
                    timestamp: format!("12:00:{i:02}"),
                    power_r: 3.0 + i as f64 / 100.0,
                    power_s: 3.1,
                    power_t: 3.2,
                })
                .collect(),
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_123).unwrap()
    }

    #[test]
    fn report_aggregates_match_live_metrics() {
        let b = building(20);
        let report = PowerReport::from_building(&b, at());
        let metrics = PanelMetrics::from_phases(&b.phases);
        assert_eq!(report.total_power, metrics.total_power);
        assert_eq!(report.average_voltage, metrics.avg_voltage);
        assert_eq!(report.total_current, metrics.total_current);
        assert_eq!(report.health, metrics.health);
        assert_eq!(report.phase_details.len(), 3);
        assert_eq!(report.phase_details[1].name, PhaseId::S);
    }

    #[test]
    fn report_keeps_last_ten_points_in_order() {
        let b = building(20);
        let report = PowerReport::from_building(&b, at());
        assert_eq!(report.historical_data.len(), 10);
        assert_eq!(report.historical_data[0].timestamp, "12:00:10");
        assert_eq!(report.historical_data[9].timestamp, "12:00:19");

        let short = PowerReport::from_building(&building(4), at());
        assert_eq!(short.historical_data.len(), 4);
        assert_eq!(short.historical_data[0].timestamp, "12:00:00");
    }

    #[test]
    fn report_json_shape() {
        let report = PowerReport::from_building(&building(3), at());
        let mut buf = Vec::new();
        write_report(&report, &mut buf).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(json["building"], "Engineering Faculty");
        assert_eq!(json["timestamp"], "2023-11-14T22:13:20.123Z");
        assert!(json["totalPower"].is_number());
        assert!(json["averageVoltage"].is_number());
        assert!(json["totalCurrent"].is_number());
        assert_eq!(json["phaseDetails"][0]["powerFactor"], 0.95);
        assert_eq!(json["historicalData"][2]["power_S"], 3.1);
        assert!(json.get("generatedAt").is_none());
    }

    #[test]
    fn file_name_uses_slug_and_millis() {
        let report = PowerReport::from_building(&building(0), at());
        assert_eq!(
            report.file_name(),
            "engineering_faculty_power_report_1700000000123.json"
        );
    }

    #[test]
    fn export_report_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let report = PowerReport::from_building(&building(12), at());
        let path = export_report(&report, dir.path()).unwrap();
        assert!(path.ends_with(report.file_name()));

        let content = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(json["historicalData"].as_array().map(Vec::len), Some(10));
    }

    #[test]
    fn history_csv_rows_per_point() {
        let a = building(3);
        let mut b = building(2);
        b.name = "Library".to_string();

        let mut buf = Vec::new();
        write_history_csv([&a, &b], &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "building,timestamp,power_R,power_S,power_T");
        // 1 header + 5 data rows
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[1], "Engineering Faculty,12:00:00,3.00,3.10,3.20");
        assert!(lines[5].starts_with("Library,12:00:01"));
    }

    #[test]
    fn history_csv_is_deterministic() {
        let b = building(5);
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_history_csv([&b], &mut buf1).unwrap();
        write_history_csv([&b], &mut buf2).unwrap();
        assert_eq!(buf1, buf2);
    }
}
