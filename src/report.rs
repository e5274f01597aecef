use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::Result;
use crate::section::Section;

const CSV_HEADER: [&str; 8] = [
    "section",
    "presenter",
    "planned_sec",
    "actual_sec",
    "deviation_sec",
    "cumulative_planned_sec",
    "cumulative_actual_sec",
    "cumulative_deviation_sec",
];

const LOG_HEADER: [&str; 5] = [
    "date",
    "sections",
    "planned_sec",
    "actual_sec",
    "deviation_sec",
];

/// One line of the post-presentation summary. Positive deviation means the
/// section ran long.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub name: String,
    pub presenter: String,
    pub planned_sec: f64,
    pub actual_sec: f64,
    pub deviation_sec: f64,
    pub cumulative_planned_sec: f64,
    pub cumulative_actual_sec: f64,
    pub cumulative_deviation_sec: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReportTotals {
    pub planned_sec: f64,
    pub actual_sec: f64,
    pub deviation_sec: f64,
}

/// Planned vs. actual timing for a finished (or abandoned) presentation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub rows: Vec<ReportRow>,
    pub totals: ReportTotals,
}

impl Report {
    /// Fold `sections` and the parallel `history` of recorded seconds into
    /// rows with running totals. Missing history entries count as 0.
    pub fn build(sections: &[Section], history: &[Option<f64>]) -> Self {
        let rows: Vec<ReportRow> = sections
            .iter()
            .enumerate()
            .scan((0.0_f64, 0.0_f64), |(cum_planned, cum_actual), (index, section)| {
                let planned = section.planned_secs();
                let actual = history.get(index).copied().flatten().unwrap_or(0.0);
                *cum_planned += planned;
                *cum_actual += actual;

                Some(ReportRow {
                    name: if section.name.is_empty() {
                        format!("Section {}", index + 1)
                    } else {
                        section.name.clone()
                    },
                    presenter: if section.presenter.is_empty() {
                        "-".to_string()
                    } else {
                        section.presenter.clone()
                    },
                    planned_sec: planned,
                    actual_sec: actual,
                    deviation_sec: actual - planned,
                    cumulative_planned_sec: *cum_planned,
                    cumulative_actual_sec: *cum_actual,
                    cumulative_deviation_sec: *cum_actual - *cum_planned,
                })
            })
            .collect();

        let totals = rows
            .last()
            .map(|last| ReportTotals {
                planned_sec: last.cumulative_planned_sec,
                actual_sec: last.cumulative_actual_sec,
                deviation_sec: last.cumulative_deviation_sec,
            })
            .unwrap_or_default();

        Self { rows, totals }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write the full table plus a totals line as CSV
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(CSV_HEADER)?;
        for row in &self.rows {
            wtr.write_record([
                row.name.clone(),
                row.presenter.clone(),
                secs(row.planned_sec),
                secs(row.actual_sec),
                secs(row.deviation_sec),
                secs(row.cumulative_planned_sec),
                secs(row.cumulative_actual_sec),
                secs(row.cumulative_deviation_sec),
            ])?;
        }
        wtr.write_record([
            "TOTAL".to_string(),
            String::new(),
            secs(self.totals.planned_sec),
            secs(self.totals.actual_sec),
            secs(self.totals.deviation_sec),
            String::new(),
            String::new(),
            String::new(),
        ])?;
        wtr.flush()?;
        Ok(())
    }

    /// Export into `dir` as `report-<timestamp>.csv`, returning the file path
    pub fn export_csv(&self, dir: &Path, at: DateTime<Local>) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("report-{}.csv", at.format("%Y%m%d-%H%M%S")));
        let file = fs::File::create(&path)?;
        self.write_csv(file)?;
        tracing::info!(path = %path.display(), rows = self.rows.len(), "report exported");
        Ok(path)
    }

    /// Append a one-line summary to the session log, writing the header
    /// first if the log is new.
    pub fn append_to_log(&self, log_path: &Path, at: DateTime<Local>) -> Result<()> {
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let needs_header = !log_path.exists();

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(log_path)?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            wtr.write_record(LOG_HEADER)?;
        }
        wtr.write_record([
            at.format("%c").to_string(),
            self.rows.len().to_string(),
            secs(self.totals.planned_sec),
            secs(self.totals.actual_sec),
            secs(self.totals.deviation_sec),
        ])?;
        wtr.flush()?;
        Ok(())
    }
}

fn secs(value: f64) -> String {
    format!("{value:.2}")
}
