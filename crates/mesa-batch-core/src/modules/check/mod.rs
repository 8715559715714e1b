//! Preflight report on the MESA installation and the batch layout.

use crate::common::BatchLayout;
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};

pub const MESA_DIR: &str = "MESA_DIR";
pub const MESASDK_ROOT: &str = "MESASDK_ROOT";
pub const OMP_NUM_THREADS: &str = "OMP_NUM_THREADS";
const FORTRAN_COMPILER: &str = "gfortran";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckItem {
    pub name: String,
    pub required: bool,
    pub ok: bool,
    pub detail: String,
}

impl CheckItem {
    fn new(name: &str, required: bool, ok: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            required,
            ok,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct EnvironmentReport {
    pub items: Vec<CheckItem>,
}

impl EnvironmentReport {
    pub fn is_ready(&self) -> bool {
        self.items.iter().all(|item| item.ok || !item.required)
    }

    pub fn problems(&self) -> impl Iterator<Item = &CheckItem> {
        self.items.iter().filter(|item| item.required && !item.ok)
    }
}

/// Checks the process environment and the layout on disk.
pub fn check_environment(layout: &BatchLayout) -> EnvironmentReport {
    check_with(layout, |name| env::var(name).ok())
}

/// Same as [`check_environment`] with variables supplied by `lookup`.
pub fn check_with<F>(layout: &BatchLayout, lookup: F) -> EnvironmentReport
where
    F: Fn(&str) -> Option<String>,
{
    let mut items = Vec::new();

    for variable in [MESA_DIR, MESASDK_ROOT] {
        items.push(match lookup(variable) {
            Some(value) if Path::new(&value).is_dir() => CheckItem::new(variable, true, true, value),
            Some(value) => CheckItem::new(
                variable,
                true,
                false,
                format!("'{}' is not a directory", value),
            ),
            None => CheckItem::new(variable, true, false, "not set"),
        });
    }

    items.push(match lookup(OMP_NUM_THREADS) {
        Some(value) if value.trim().parse::<u32>().is_ok_and(|threads| threads > 0) => {
            CheckItem::new(OMP_NUM_THREADS, false, true, value)
        }
        Some(value) => CheckItem::new(
            OMP_NUM_THREADS,
            false,
            false,
            format!("'{}' is not a positive thread count", value),
        ),
        None => CheckItem::new(OMP_NUM_THREADS, false, false, "not set; MESA picks its default"),
    });

    items.push(match lookup("PATH").and_then(|path| find_in_path(FORTRAN_COMPILER, &path)) {
        Some(found) => CheckItem::new(FORTRAN_COMPILER, false, true, found.display().to_string()),
        None => CheckItem::new(
            FORTRAN_COMPILER,
            false,
            false,
            "not on PATH; source the MESA SDK init script",
        ),
    });

    items.push(path_item("main inlist", true, &layout.main_inlist_path(), Path::is_file));
    items.push(path_item("executable", true, &layout.executable_path(), Path::is_file));
    items.push(path_item("template", true, &layout.template_path(), Path::is_file));
    items.push(path_item("batch directory", false, &layout.batch_dir_path(), Path::is_dir));
    items.push(path_item("runs directory", false, &layout.runs_dir_path(), Path::is_dir));

    for item in &items {
        if item.ok {
            tracing::debug!(check = %item.name, "{}", item.detail);
        } else if item.required {
            tracing::warn!(check = %item.name, "{}", item.detail);
        } else {
            tracing::info!(check = %item.name, "{}", item.detail);
        }
    }
    EnvironmentReport { items }
}

fn path_item(name: &str, required: bool, path: &Path, exists: fn(&Path) -> bool) -> CheckItem {
    if exists(path) {
        CheckItem::new(name, required, true, path.display().to_string())
    } else {
        CheckItem::new(name, required, false, format!("'{}' not found", path.display()))
    }
}

fn find_in_path(command: &str, path_var: &str) -> Option<PathBuf> {
    env::split_paths(path_var)
        .map(|dir| dir.join(command))
        .find(|candidate| candidate.is_file())
}
