use super::CliError;
use anyhow::Context;
use mesa_batch_core::common::BatchLayout;
use mesa_batch_core::modules::ItemFailure;
use mesa_batch_core::modules::naming::RunNameCodec;
use mesa_batch_core::modules::params::{ParameterTable, load_parameter_table};
use mesa_batch_core::modules::serialization::write_json_report;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Where the batch lives; a `--layout` file supplies defaults that the other flags override.
#[derive(clap::Args, Debug, Default)]
pub(super) struct LayoutArgs {
    /// JSON layout file (camelCase keys, all optional)
    #[arg(long, value_name = "FILE")]
    layout: Option<PathBuf>,

    /// MESA work directory holding `inlist` and `star`
    #[arg(long, value_name = "DIR")]
    work_dir: Option<PathBuf>,

    /// Template inlist, relative to the work directory
    #[arg(long, value_name = "FILE")]
    template: Option<PathBuf>,

    /// Directory for generated batch inlists
    #[arg(long, value_name = "DIR")]
    batch_dir: Option<PathBuf>,

    /// Directory for archived runs
    #[arg(long, value_name = "DIR")]
    runs_dir: Option<PathBuf>,

    /// Simulator executable
    #[arg(long, value_name = "FILE")]
    executable: Option<PathBuf>,

    /// Run timings CSV
    #[arg(long, value_name = "FILE")]
    timings: Option<PathBuf>,

    /// Summary CSV
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,

    /// Run name prefix
    #[arg(long)]
    prefix: Option<String>,
}

impl LayoutArgs {
    pub(super) fn resolve(&self) -> Result<BatchLayout, CliError> {
        let mut layout = match &self.layout {
            Some(path) => BatchLayout::load(path)?,
            None => BatchLayout::default(),
        };
        override_with(&mut layout.work_dir, &self.work_dir);
        override_with(&mut layout.template, &self.template);
        override_with(&mut layout.batch_dir, &self.batch_dir);
        override_with(&mut layout.runs_dir, &self.runs_dir);
        override_with(&mut layout.executable, &self.executable);
        override_with(&mut layout.timings_file, &self.timings);
        override_with(&mut layout.summary_file, &self.summary);
        override_with(&mut layout.name_prefix, &self.prefix);
        tracing::debug!(?layout, "resolved batch layout");
        Ok(layout)
    }
}

fn override_with<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

pub(super) fn codec_for(layout: &BatchLayout) -> Result<RunNameCodec, CliError> {
    Ok(RunNameCodec::new(layout.name_prefix.clone())?)
}

pub(super) fn load_table(path: &Path) -> Result<ParameterTable, CliError> {
    Ok(load_parameter_table(path)?)
}

pub(super) fn write_report<T: Serialize>(path: Option<&Path>, report: &T) -> Result<(), CliError> {
    if let Some(path) = path {
        write_json_report(path, report)?;
        println!("JSON report: {}", path.display());
    }
    Ok(())
}

pub(super) fn to_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(value).context("failed to encode JSON output")?)
}

pub(super) fn print_failures(failures: &[ItemFailure]) {
    for failure in failures {
        println!("  - {}: [{}] {}", failure.item, failure.code, failure.message);
    }
}

pub(super) fn print_names(label: &str, names: &[String]) {
    if names.is_empty() {
        return;
    }
    println!("{} ({}):", label, names.len());
    for name in names {
        println!("  - {}", name);
    }
}

pub(super) const fn exit_status(success: bool) -> i32 {
    if success { 0 } else { 1 }
}

#[cfg(test)]
mod tests {
    use super::LayoutArgs;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn flags_override_layout_file() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("layout.json");
        fs::write(&path, r#"{ "workDir": "/mesa/work", "runsDir": "grid/runs" }"#)
            .expect("layout should be written");

        let args = LayoutArgs {
            layout: Some(path),
            runs_dir: Some(PathBuf::from("elsewhere")),
            prefix: Some("grid".to_string()),
            ..LayoutArgs::default()
        };
        let layout = args.resolve().expect("layout should resolve");
        assert_eq!(layout.work_dir, PathBuf::from("/mesa/work"));
        assert_eq!(layout.runs_dir, PathBuf::from("elsewhere"));
        assert_eq!(layout.name_prefix, "grid");
    }
}
