//! Terminal-age main sequence summary of every finished run, written as a
//! spreadsheet-ready CSV.

use crate::common::config::{HISTORY_FILE, LOGS_DIR};
use crate::common::{BatchLayout, format_decimal, round_to};
use crate::domain::{BatchError, BatchResult, DecodeMode, RunConfig};
use crate::modules::files::{file_name_of, list_dirs};
use crate::modules::history::{MesaTable, read_mesa_table};
use crate::modules::naming::RunNameCodec;
use crate::modules::report::ItemFailure;
use crate::modules::runner::{TimingRecord, read_timings};
use crate::modules::serialization::ensure_parent_dir;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const SUMMARY_HEADER: [&str; 14] = [
    "YOUR NAME",
    "initial mass  [Msol]",
    "initial metallicity",
    "overshoot scheme",
    "overshoot parameter (f_ov)",
    "overshoot f0",
    "",
    "log_Teff [K]",
    "log_L [Lsol]",
    "Core mass [Msol]",
    "Core radius [Rsol]",
    "Age [Myr]",
    "Runtime [s]",
    "Status",
];

pub const NOT_COMPLETED: &str = "not_completed";
const NO_OVERSHOOT_LABEL: &str = "no overshooting";
const YEARS_PER_MYR: f64 = 1e6;

const STAR_AGE: &str = "star_age";
const LOG_TEFF: &str = "log_Teff";
const LOG_L: &str = "log_L";
const HE_CORE_MASS: &str = "he_core_mass";
const CORE_RADIUS: &str = "conv_mx1_top_r";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    pub run: String,
    pub config: RunConfig,
    /// 0-based row of the history table taken as TAMS.
    pub tams_index: usize,
    pub log_teff: f64,
    pub log_l: f64,
    pub core_mass: f64,
    pub core_radius: Option<f64>,
    pub age_myr: f64,
    pub runtime_seconds: Option<f64>,
    pub status: String,
}

impl SummaryRow {
    pub fn to_record(&self) -> [String; 14] {
        let scheme = if self.config.has_overshoot() {
            self.config.scheme.as_str().to_string()
        } else {
            NO_OVERSHOOT_LABEL.to_string()
        };
        [
            String::new(),
            format_decimal(self.config.mass),
            format_decimal(self.config.metallicity),
            scheme,
            format_decimal(self.config.f_ov),
            format_decimal(self.config.f0),
            String::new(),
            format_decimal(round_to(self.log_teff, 3)),
            format_decimal(round_to(self.log_l, 3)),
            format_decimal(round_to(self.core_mass, 5)),
            self.core_radius
                .map(|radius| format_decimal(round_to(radius, 5)))
                .unwrap_or_default(),
            format_decimal(round_to(self.age_myr, 2)),
            self.runtime_seconds.map(format_decimal).unwrap_or_default(),
            self.status.clone(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    pub output: PathBuf,
    pub rows: Vec<SummaryRow>,
    pub failures: Vec<ItemFailure>,
}

/// Summarizes every run folder named `<prefix>_M...` that has a history table.
pub fn summarize_runs(
    layout: &BatchLayout,
    codec: &RunNameCodec,
    mode: DecodeMode,
) -> BatchResult<SummaryReport> {
    let timings = read_timings(&layout.timings_path())?;
    if timings.is_empty() {
        tracing::warn!(path = %layout.timings_path().display(), "no timing data; runtimes left blank");
    }

    let mut report = SummaryReport {
        output: layout.summary_path(),
        rows: Vec::new(),
        failures: Vec::new(),
    };
    for run_dir in list_dirs(&layout.runs_dir_path())? {
        let name = file_name_of(&run_dir);
        if !codec.matches(&name) || !run_dir.join(LOGS_DIR).join(HISTORY_FILE).is_file() {
            tracing::debug!(run = %name, "skipping folder without run history");
            continue;
        }
        match summarize_run(&run_dir, codec, mode, &timings) {
            Ok(row) => {
                tracing::info!(run = %name, "summarized");
                report.rows.push(row);
            }
            Err(error) => report.failures.push(ItemFailure::record(name, &error)),
        }
    }

    write_summary_csv(&report.output, &report.rows)?;
    tracing::info!(path = %report.output.display(), rows = report.rows.len(), "summary written");
    Ok(report)
}

pub fn summarize_run(
    run_dir: &Path,
    codec: &RunNameCodec,
    mode: DecodeMode,
    timings: &BTreeMap<String, TimingRecord>,
) -> BatchResult<SummaryRow> {
    let run = file_name_of(run_dir);
    let config = codec.decode(&run, mode)?;
    let history = read_mesa_table(&run_dir.join(LOGS_DIR).join(HISTORY_FILE))?;
    let tams_index = history.tams_row().ok_or_else(|| {
        BatchError::missing_field(
            "MISSING.HISTORY_ROWS",
            format!("history of '{}' has no models", run),
        )
    })?;

    let timing = timings.get(&run);
    Ok(SummaryRow {
        config,
        tams_index,
        log_teff: required(&history, tams_index, LOG_TEFF)?,
        log_l: required(&history, tams_index, LOG_L)?,
        core_mass: history.value(tams_index, HE_CORE_MASS).unwrap_or(0.0),
        core_radius: history.value(tams_index, CORE_RADIUS),
        age_myr: required(&history, tams_index, STAR_AGE)? / YEARS_PER_MYR,
        runtime_seconds: timing.map(|record| record.runtime_seconds),
        status: timing
            .map(|record| record.completion_status.as_str().to_string())
            .unwrap_or_else(|| NOT_COMPLETED.to_string()),
        run,
    })
}

fn required(history: &MesaTable, row: usize, column: &str) -> BatchResult<f64> {
    history.value(row, column).ok_or_else(|| {
        BatchError::missing_field(
            "MISSING.HISTORY_COLUMN",
            format!("history has no '{}' column", column),
        )
    })
}

pub fn write_summary_csv(path: &Path, rows: &[SummaryRow]) -> BatchResult<()> {
    ensure_parent_dir(path)?;
    let write_error = |source: csv::Error| {
        BatchError::io_system(
            "IO.SUMMARY",
            format!("failed to write summary '{}': {}", path.display(), source),
        )
    };

    let mut writer = csv::Writer::from_path(path).map_err(write_error)?;
    writer.write_record(SUMMARY_HEADER).map_err(write_error)?;
    for row in rows {
        writer.write_record(row.to_record()).map_err(write_error)?;
    }
    writer
        .flush()
        .map_err(|source| write_error(csv::Error::from(source)))
}
