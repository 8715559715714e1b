use crate::common::BatchLayout;
use crate::domain::{BatchError, BatchResult, RunConfig};
use crate::modules::params::{ParameterTable, SkippedRow};
use crate::modules::report::ItemFailure;
use crate::modules::serialization::{ensure_dir, read_text_artifact, write_text_artifact};
use crate::modules::template::TemplatePatcher;
use crate::modules::naming::RunNameCodec;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedInlist {
    pub row: usize,
    pub file_name: String,
    pub path: PathBuf,
    pub config: RunConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MakeReport {
    pub template: PathBuf,
    pub batch_dir: PathBuf,
    pub created: Vec<CreatedInlist>,
    pub skipped: Vec<SkippedRow>,
    pub failures: Vec<ItemFailure>,
}

impl MakeReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Writes one patched copy of the layout's template per valid table row.
///
/// Only a missing template or an unusable batch directory aborts; row-level
/// problems are recorded and the remaining rows are still written.
pub fn make_batch(
    layout: &BatchLayout,
    table: &ParameterTable,
    patcher: &TemplatePatcher,
    codec: &RunNameCodec,
) -> BatchResult<MakeReport> {
    let template_path = layout.template_path();
    let template = read_text_artifact(&template_path)?;
    let batch_dir = layout.batch_dir_path();
    ensure_dir(&batch_dir)?;

    let mut report = MakeReport {
        template: template_path,
        batch_dir: batch_dir.clone(),
        created: Vec::new(),
        skipped: table.skipped.clone(),
        failures: table.invalid.clone(),
    };
    let mut claimed: BTreeMap<String, usize> = BTreeMap::new();

    for row in &table.rows {
        let item = format!("row {}", row.row);
        let result = codec.inlist_file_name(&row.config).and_then(|file_name| {
            if let Some(first) = claimed.get(&file_name) {
                return Err(BatchError::validation(
                    "VALIDATION.DUPLICATE_RUN",
                    format!("'{}' was already produced by row {}", file_name, first),
                ));
            }
            let content = patcher.apply(&row.config, &template)?;
            let path = batch_dir.join(&file_name);
            write_text_artifact(&path, &content)?;
            Ok((file_name, path))
        });

        match result {
            Ok((file_name, path)) => {
                tracing::info!(row = row.row, file = %file_name, "created inlist");
                claimed.insert(file_name.clone(), row.row);
                report.created.push(CreatedInlist {
                    row: row.row,
                    file_name,
                    path,
                    config: row.config.clone(),
                });
            }
            Err(error) => report.failures.push(ItemFailure::record(item, &error)),
        }
    }

    tracing::info!(
        created = report.created.len(),
        skipped = report.skipped.len(),
        failed = report.failures.len(),
        "batch inlist creation finished"
    );
    Ok(report)
}
