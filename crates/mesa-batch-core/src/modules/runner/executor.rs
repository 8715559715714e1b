use super::timings::RunStatus;
use crate::common::BatchLayout;
use crate::domain::{BatchError, BatchResult};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Runs the simulator once in the shared work directory.
pub trait SimulationExecutor {
    /// Checks that the work directory can host a run at all.
    fn preflight(&self, layout: &BatchLayout) -> BatchResult<()> {
        check_work_dir(layout)
    }

    /// Runs with stdout and stderr sent to `log`. Err means the simulator could not be started.
    fn execute(&self, work_dir: &Path, log: File) -> BatchResult<RunStatus>;
}

/// The work directory must hold the main `inlist` that points MESA at `inlist_project`.
pub fn check_work_dir(layout: &BatchLayout) -> BatchResult<()> {
    let main_inlist = layout.main_inlist_path();
    if !main_inlist.is_file() {
        return Err(BatchError::missing_field(
            "MISSING.MAIN_INLIST",
            format!(
                "'{}' not found; point --work-dir at a MESA work directory",
                main_inlist.display()
            ),
        ));
    }
    Ok(())
}

/// Launches the simulator executable as a child process.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    program: PathBuf,
}

impl ProcessExecutor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn from_layout(layout: &BatchLayout) -> Self {
        Self::new(layout.executable_path())
    }
}

impl SimulationExecutor for ProcessExecutor {
    fn preflight(&self, layout: &BatchLayout) -> BatchResult<()> {
        check_work_dir(layout)?;
        if !self.program.is_file() {
            return Err(BatchError::missing_field(
                "MISSING.EXECUTABLE",
                format!(
                    "simulator '{}' not found; build it with ./mk first",
                    self.program.display()
                ),
            ));
        }
        Ok(())
    }

    fn execute(&self, work_dir: &Path, log: File) -> BatchResult<RunStatus> {
        let launch_error = |source: std::io::Error| {
            BatchError::simulation(
                "SIM.LAUNCH",
                format!("failed to launch '{}': {}", self.program.display(), source),
            )
        };
        let stderr = log.try_clone().map_err(launch_error)?;
        let status = Command::new(&self.program)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(stderr))
            .status()
            .map_err(launch_error)?;

        tracing::debug!(program = %self.program.display(), code = ?status.code(), "simulator exited");
        Ok(RunStatus::from_success(status.success()))
    }
}
