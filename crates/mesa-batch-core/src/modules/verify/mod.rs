//! Checks finished run directories against the parameter table.

use crate::common::BatchLayout;
use crate::common::config::{PROJECT_INLIST, RUN_LOG};
use crate::domain::{BatchError, BatchResult, DecodeMode, RunConfig};
use crate::modules::batch::{describe, ensure_same};
use crate::modules::files::{file_name_of, list_dirs};
use crate::modules::inlist::Inlist;
use crate::modules::naming::RunNameCodec;
use crate::modules::params::ParameterTable;
use crate::modules::report::ItemFailure;
use crate::modules::serialization::read_text_artifact;
use crate::modules::template::read_back;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Log line MESA prints when the hydrogen stopping condition ends the run.
pub const TAMS_TERMINATION: &str = "termination code: xa_central_lower_limit";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Completed,
    Failed,
    Incomplete,
    NoLog,
}

impl CompletionStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Incomplete => "incomplete",
            Self::NoLog => "no_log",
        }
    }
}

pub fn classify_run_log(log: &str) -> CompletionStatus {
    if log.contains(TAMS_TERMINATION) {
        return CompletionStatus::Completed;
    }
    let lowered = log.to_ascii_lowercase();
    if lowered.contains("failed") || lowered.contains("error") {
        CompletionStatus::Failed
    } else {
        CompletionStatus::Incomplete
    }
}

pub fn run_completion(run_dir: &Path) -> CompletionStatus {
    match fs::read(run_dir.join(RUN_LOG)) {
        Ok(bytes) => classify_run_log(&String::from_utf8_lossy(&bytes)),
        Err(_) => CompletionStatus::NoLog,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunCheck {
    pub row: usize,
    pub name: String,
    pub status: CompletionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtraRun {
    pub name: String,
    pub config: Option<RunConfig>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RunVerification {
    pub runs_dir: PathBuf,
    pub matched: Vec<RunCheck>,
    pub missing: Vec<String>,
    pub mismatches: Vec<ItemFailure>,
    pub extra: Vec<ExtraRun>,
    pub failures: Vec<ItemFailure>,
}

impl RunVerification {
    pub fn is_success(&self) -> bool {
        self.missing.is_empty() && self.mismatches.is_empty()
    }

    pub fn status_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for check in &self.matched {
            *counts.entry(check.status.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

pub fn verify_runs(
    layout: &BatchLayout,
    table: &ParameterTable,
    codec: &RunNameCodec,
) -> BatchResult<RunVerification> {
    let runs_dir = layout.runs_dir_path();
    let present: BTreeSet<String> = list_dirs(&runs_dir)?
        .iter()
        .map(|path| file_name_of(path))
        .collect();
    tracing::info!(runs_dir = %runs_dir.display(), folders = present.len(), "verifying runs");

    let mut report = RunVerification {
        runs_dir: runs_dir.clone(),
        ..RunVerification::default()
    };
    let mut expected = BTreeSet::new();

    for row in &table.rows {
        let name = match codec.encode(&row.config) {
            Ok(name) => name,
            Err(error) => {
                report
                    .failures
                    .push(ItemFailure::record(format!("row {}", row.row), &error));
                continue;
            }
        };
        expected.insert(name.clone());

        if !present.contains(&name) {
            tracing::warn!(row = row.row, run = %name, "run folder is missing");
            report.missing.push(name);
            continue;
        }

        let run_dir = runs_dir.join(&name);
        match check_run(&run_dir, &row.config) {
            Ok(()) => {
                let status = run_completion(&run_dir);
                if status != CompletionStatus::Completed {
                    tracing::warn!(run = %name, status = status.as_str(), "run did not reach its stopping condition");
                }
                report.matched.push(RunCheck {
                    row: row.row,
                    name,
                    status,
                });
            }
            Err(error) => report.mismatches.push(ItemFailure::record(name, &error)),
        }
    }

    for name in present.difference(&expected) {
        let (config, note) = match read_run_config(&runs_dir.join(name)) {
            Ok(config) => (Some(config), None),
            Err(error) => (None, Some(error.message().to_string())),
        };
        tracing::info!(run = %name, "run folder has no table row");
        report.extra.push(ExtraRun {
            name: name.clone(),
            config,
            note,
        });
    }

    Ok(report)
}

fn project_inlist(run_dir: &Path) -> BatchResult<Inlist> {
    let path = run_dir.join(PROJECT_INLIST);
    if !path.is_file() {
        return Err(BatchError::missing_field(
            "MISSING.RUN_INLIST",
            format!("'{}' has no {} file", run_dir.display(), PROJECT_INLIST),
        ));
    }
    Inlist::parse(&read_text_artifact(&path)?)
}

fn read_run_config(run_dir: &Path) -> BatchResult<RunConfig> {
    Ok(read_back(&project_inlist(run_dir)?, DecodeMode::Tolerant)?.config)
}

fn check_run(run_dir: &Path, expected: &RunConfig) -> BatchResult<()> {
    let readback = read_back(&project_inlist(run_dir)?, DecodeMode::Strict)?;
    ensure_same("MISMATCH.RUN_INLIST", PROJECT_INLIST, &readback.config, expected)?;

    if let Some(zbase) = readback.zbase
        && zbase != readback.config.metallicity
    {
        return Err(BatchError::mismatch(
            "MISMATCH.ZBASE",
            format!(
                "Zbase {} differs from initial_z in {}",
                zbase,
                describe(&readback.config)
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{CompletionStatus, classify_run_log};

    #[test]
    fn log_classification() {
        assert_eq!(
            classify_run_log("step 812\ntermination code: xa_central_lower_limit\n"),
            CompletionStatus::Completed
        );
        assert_eq!(
            classify_run_log("ERROR: failed in do_relax"),
            CompletionStatus::Failed
        );
        assert_eq!(classify_run_log("step 10\n"), CompletionStatus::Incomplete);
    }
}
