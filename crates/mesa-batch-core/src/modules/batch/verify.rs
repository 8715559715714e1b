use crate::common::BatchLayout;
use crate::domain::{BatchError, BatchErrorCategory, BatchResult, DecodeMode, RunConfig};
use crate::modules::files::{INLIST_GLOB, file_name_of, list_files};
use crate::modules::naming::RunNameCodec;
use crate::modules::params::ParameterTable;
use crate::modules::report::ItemFailure;
use crate::modules::serialization::read_text_artifact;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct InlistVerification {
    pub batch_dir: PathBuf,
    pub matched: Vec<String>,
    pub missing: Vec<String>,
    pub extra: Vec<String>,
    pub mismatches: Vec<ItemFailure>,
    pub failures: Vec<ItemFailure>,
}

impl InlistVerification {
    pub fn is_success(&self) -> bool {
        self.missing.is_empty() && self.mismatches.is_empty() && self.failures.is_empty()
    }
}

/// Checks the batch directory against the table: one inlist per row, each
/// describing exactly the run its row asks for.
pub fn verify_inlists(
    layout: &BatchLayout,
    table: &ParameterTable,
    codec: &RunNameCodec,
) -> BatchResult<InlistVerification> {
    let batch_dir = layout.batch_dir_path();
    let present: BTreeSet<String> = list_files(&batch_dir, INLIST_GLOB)?
        .iter()
        .map(|path| file_name_of(path))
        .collect();

    let mut report = InlistVerification {
        batch_dir: batch_dir.clone(),
        ..InlistVerification::default()
    };
    let mut expected = BTreeSet::new();

    for row in &table.rows {
        let file_name = match codec.inlist_file_name(&row.config) {
            Ok(file_name) => file_name,
            Err(error) => {
                report
                    .failures
                    .push(ItemFailure::record(format!("row {}", row.row), &error));
                continue;
            }
        };
        expected.insert(file_name.clone());

        if !present.contains(&file_name) {
            tracing::warn!(row = row.row, file = %file_name, "expected inlist is missing");
            report.missing.push(file_name);
            continue;
        }

        match check_inlist(codec, &batch_dir.join(&file_name), &file_name, &row.config) {
            Ok(()) => report.matched.push(file_name),
            Err(error) if error.category() == BatchErrorCategory::MismatchError => {
                report.mismatches.push(ItemFailure::record(file_name, &error))
            }
            Err(error) => report.failures.push(ItemFailure::record(file_name, &error)),
        }
    }

    report.extra = present.difference(&expected).cloned().collect();
    for file_name in &report.extra {
        tracing::info!(file = %file_name, "inlist has no table row");
    }
    Ok(report)
}

fn check_inlist(
    codec: &RunNameCodec,
    path: &Path,
    file_name: &str,
    expected: &RunConfig,
) -> BatchResult<()> {
    let from_name = codec.decode_file_name(file_name, DecodeMode::Strict)?;
    ensure_same("MISMATCH.FILE_NAME", "file name", &from_name, expected)?;

    let text = read_text_artifact(path)?;
    let from_content = RunConfig::from_inlist(&text, DecodeMode::Strict)?;
    ensure_same("MISMATCH.INLIST", "inlist content", &from_content, expected)
}

pub(crate) fn ensure_same(
    code: &'static str,
    source: &str,
    actual: &RunConfig,
    expected: &RunConfig,
) -> BatchResult<()> {
    if actual == expected {
        return Ok(());
    }
    Err(BatchError::mismatch(
        code,
        format!(
            "{} describes {} but the table asks for {}",
            source,
            describe(actual),
            describe(expected)
        ),
    ))
}

pub(crate) fn describe(config: &RunConfig) -> String {
    if config.has_overshoot() {
        format!(
            "M={} Z={} {} f_ov={} f0={}",
            config.mass, config.metallicity, config.scheme, config.f_ov, config.f0
        )
    } else {
        format!("M={} Z={} no overshoot", config.mass, config.metallicity)
    }
}
