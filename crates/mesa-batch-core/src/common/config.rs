//! Directory layout of a batch: where templates, generated inlists, run
//! folders and bookkeeping files live relative to the MESA work directory.
//!
//! A layout can be loaded from a JSON file with camelCase keys; every key is
//! optional and falls back to [`BatchLayout::default`].

use crate::domain::{BatchError, BatchResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_NAME_PREFIX: &str = "inlist";
pub const INLIST_EXTENSION: &str = "inp";
pub const PROJECT_INLIST: &str = "inlist_project";
pub const MAIN_INLIST: &str = "inlist";
pub const PGSTAR_INLIST: &str = "inlist_pgstar";
pub const RUN_LOG: &str = "run.log";
pub const LOGS_DIR: &str = "LOGS";
pub const PHOTOS_DIR: &str = "photos";
pub const HISTORY_FILE: &str = "history.data";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchLayout {
    /// MESA work directory holding `inlist`, the `star` executable and `LOGS/`.
    pub work_dir: PathBuf,
    pub template: PathBuf,
    pub batch_dir: PathBuf,
    pub runs_dir: PathBuf,
    pub timings_file: PathBuf,
    pub summary_file: PathBuf,
    /// Simulator executable; relative paths are resolved against `work_dir`.
    pub executable: PathBuf,
    pub name_prefix: String,
    pub pgstar: Option<bool>,
}

impl Default for BatchLayout {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            template: PathBuf::from(PROJECT_INLIST),
            batch_dir: PathBuf::from("batch_runs/batch_inlists"),
            runs_dir: PathBuf::from("batch_runs/runs"),
            timings_file: PathBuf::from("batch_runs/run_timings.csv"),
            summary_file: PathBuf::from("batch_runs/model_summary.csv"),
            executable: PathBuf::from("star"),
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            pgstar: None,
        }
    }
}

impl BatchLayout {
    pub fn load(path: &Path) -> BatchResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| {
            BatchError::io_system(
                "IO.LAYOUT_READ",
                format!("failed to read layout '{}': {}", path.display(), source),
            )
        })?;
        serde_json::from_str::<Self>(&content).map_err(|source| {
            BatchError::parse(
                "PARSE.LAYOUT",
                format!("failed to parse layout '{}': {}", path.display(), source),
            )
        })
    }

    /// Resolves a layout path against the work directory unless it is absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.work_dir.join(path)
        }
    }

    pub fn executable_path(&self) -> PathBuf {
        self.resolve(&self.executable)
    }

    pub fn template_path(&self) -> PathBuf {
        self.resolve(&self.template)
    }

    pub fn batch_dir_path(&self) -> PathBuf {
        self.resolve(&self.batch_dir)
    }

    pub fn runs_dir_path(&self) -> PathBuf {
        self.resolve(&self.runs_dir)
    }

    pub fn timings_path(&self) -> PathBuf {
        self.resolve(&self.timings_file)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.resolve(&self.summary_file)
    }

    pub fn project_inlist_path(&self) -> PathBuf {
        self.work_dir.join(PROJECT_INLIST)
    }

    pub fn main_inlist_path(&self) -> PathBuf {
        self.work_dir.join(MAIN_INLIST)
    }
}
