//! Serial batch runner: one simulator invocation per batch inlist, each
//! archived into its own run directory.

mod executor;
mod timings;

pub use executor::{ProcessExecutor, SimulationExecutor, check_work_dir};
pub use timings::{RunStatus, TIMINGS_HEADER, TimingRecord, append_timing, read_timings};

use crate::common::config::{INLIST_EXTENSION, LOGS_DIR, MAIN_INLIST, PGSTAR_INLIST, PHOTOS_DIR, PROJECT_INLIST, RUN_LOG};
use crate::common::{BatchLayout, round_to};
use crate::domain::{BatchError, BatchResult};
use crate::modules::files::{INLIST_GLOB, copy_dir_files, copy_file, file_name_of, list_files};
use crate::modules::inlist::{Inlist, unquote};
use crate::modules::report::ItemFailure;
use crate::modules::serialization::{ensure_dir, read_text_artifact};
use crate::modules::template::SAVE_MODEL_FILENAME;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Glob over batch inlist file names.
    pub pattern: String,
    /// List the runs without launching anything.
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            pattern: INLIST_GLOB.to_string(),
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub name: String,
    pub run_dir: PathBuf,
    pub runtime_seconds: f64,
    pub status: RunStatus,
    pub model_file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub timings_file: PathBuf,
    pub planned: Vec<String>,
    pub runs: Vec<RunRecord>,
    pub failures: Vec<ItemFailure>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
            && self
                .runs
                .iter()
                .all(|run| run.status == RunStatus::Completed)
    }
}

/// Runs every matching batch inlist in name order.
///
/// The simulator reads `inlist_project` from the work directory, so runs are
/// strictly serial. A run that fails is recorded and the batch moves on.
pub fn run_batch<E: SimulationExecutor + ?Sized>(
    layout: &BatchLayout,
    executor: &E,
    options: &RunOptions,
) -> BatchResult<RunReport> {
    let batch_dir = layout.batch_dir_path();
    let inlists = list_files(&batch_dir, &options.pattern)?;
    if inlists.is_empty() {
        return Err(BatchError::missing_field(
            "MISSING.BATCH_INLISTS",
            format!(
                "no batch inlists matching '{}' in '{}'; run `make` first",
                options.pattern,
                batch_dir.display()
            ),
        ));
    }

    let mut report = RunReport {
        timings_file: layout.timings_path(),
        planned: inlists.iter().map(|path| run_name(path)).collect(),
        runs: Vec::new(),
        failures: Vec::new(),
    };
    if options.dry_run {
        tracing::info!(runs = report.planned.len(), "dry run, nothing launched");
        return Ok(report);
    }

    executor.preflight(layout)?;
    ensure_dir(&layout.runs_dir_path())?;

    let total = inlists.len();
    for (index, inlist) in inlists.iter().enumerate() {
        let name = run_name(inlist);
        tracing::info!(run = %name, "[{}/{}] starting run", index + 1, total);
        match run_one(layout, executor, inlist, &name) {
            Ok(record) => {
                if record.status == RunStatus::Failed {
                    tracing::warn!(run = %name, "simulator exited with a failure status");
                } else {
                    tracing::info!(run = %name, seconds = record.runtime_seconds, "run completed");
                }
                report.runs.push(record);
            }
            Err(error) => report.failures.push(ItemFailure::record(name, &error)),
        }
    }
    Ok(report)
}

fn run_name(inlist: &Path) -> String {
    let file_name = file_name_of(inlist);
    let extension = format!(".{}", INLIST_EXTENSION);
    match file_name.strip_suffix(extension.as_str()) {
        Some(stem) => stem.to_string(),
        None => file_name,
    }
}

fn run_one<E: SimulationExecutor + ?Sized>(
    layout: &BatchLayout,
    executor: &E,
    inlist: &Path,
    name: &str,
) -> BatchResult<RunRecord> {
    let work_dir = &layout.work_dir;
    let run_dir = layout.runs_dir_path().join(name);
    ensure_dir(&run_dir.join(LOGS_DIR))?;
    ensure_dir(&run_dir.join(PHOTOS_DIR))?;

    copy_file(inlist, &layout.project_inlist_path())?;

    let log_path = run_dir.join(RUN_LOG);
    let log = File::create(&log_path).map_err(|source| {
        BatchError::io_system(
            "IO.RUN_LOG",
            format!("failed to create '{}': {}", log_path.display(), source),
        )
    })?;

    let started = Instant::now();
    let outcome = executor.execute(work_dir, log);
    let runtime_seconds = round_to(started.elapsed().as_secs_f64(), 2);
    let status = outcome.as_ref().copied().unwrap_or(RunStatus::Failed);
    append_timing(
        &layout.timings_path(),
        &TimingRecord {
            inlist_name: name.to_string(),
            runtime_seconds,
            completion_status: status,
        },
    )?;
    outcome?;

    archive_outputs(work_dir, &run_dir)?;
    let model_file = saved_model_file(inlist)?;
    if let Some(model) = &model_file {
        let source = work_dir.join(model);
        if source.is_file() {
            copy_file(&source, &run_dir.join(model))?;
        } else {
            tracing::debug!(model = %model, "saved model not found in work directory");
        }
    }

    Ok(RunRecord {
        name: name.to_string(),
        run_dir,
        runtime_seconds,
        status,
        model_file,
    })
}

fn archive_outputs(work_dir: &Path, run_dir: &Path) -> BatchResult<()> {
    for dir in [LOGS_DIR, PHOTOS_DIR] {
        let copied = copy_dir_files(&work_dir.join(dir), &run_dir.join(dir))?;
        tracing::debug!(dir, copied, "archived simulator output");
    }
    copy_file(&work_dir.join(PROJECT_INLIST), &run_dir.join(PROJECT_INLIST))?;
    for optional in [MAIN_INLIST, PGSTAR_INLIST] {
        let source = work_dir.join(optional);
        if source.is_file() {
            copy_file(&source, &run_dir.join(optional))?;
        }
    }
    Ok(())
}

fn saved_model_file(inlist: &Path) -> BatchResult<Option<String>> {
    let parsed = Inlist::parse(&read_text_artifact(inlist)?)?;
    Ok(parsed
        .value(SAVE_MODEL_FILENAME)
        .map(unquote)
        .filter(|name| !name.is_empty()))
}
