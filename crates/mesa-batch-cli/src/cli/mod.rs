mod commands;
mod helpers;

use clap::Parser;
use mesa_batch_core::domain::BatchError;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const PROGRAM_NAME: &str = "mesa-batch";

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let batch_error = error.as_batch_error();
            eprintln!("{}", batch_error.diagnostic_line());
            batch_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once(PROGRAM_NAME.to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            init_tracing(cli.quiet);
            dispatch_parsed(cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

/// Logs go to stderr so that `encode`/`decode` output stays pipeable.
/// `RUST_LOG` takes precedence over `--quiet`.
fn init_tracing(quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(quiet)));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Tracing targets are crate names, so the binary's own target follows `[[bin]] name`.
fn default_filter(quiet: bool) -> String {
    let level = if quiet { "warn" } else { "info" };
    let bin_crate = module_path!().split("::").next().unwrap_or(PROGRAM_NAME);
    format!("mesa_batch_core={level},{bin_crate}={level}")
}

#[derive(Parser)]
#[command(
    name = "mesa-batch",
    version,
    about = "Batch runs of MESA star over a grid of mass, metallicity and overshoot"
)]
struct Cli {
    /// Only log warnings and errors
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Write one patched inlist per parameter table row
    Make(commands::MakeArgs),
    /// Check the batch inlists against the parameter table
    VerifyInlists(commands::VerifyInlistsArgs),
    /// Run the simulator once per batch inlist
    Run(commands::RunArgs),
    /// Check finished runs against the parameter table
    VerifyRuns(commands::VerifyRunsArgs),
    /// Write the TAMS summary CSV of all finished runs
    Summarize(commands::SummarizeArgs),
    /// Report on the MESA environment and batch layout
    Check(commands::CheckArgs),
    /// Print the run name for a set of parameters
    Encode(commands::EncodeArgs),
    /// Print the parameters encoded in a run name as JSON
    Decode(commands::DecodeArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Make(args) => commands::run_make_command(args),
        CliCommand::VerifyInlists(args) => commands::run_verify_inlists_command(args),
        CliCommand::Run(args) => commands::run_batch_command(args),
        CliCommand::VerifyRuns(args) => commands::run_verify_runs_command(args),
        CliCommand::Summarize(args) => commands::run_summarize_command(args),
        CliCommand::Check(args) => commands::run_check_command(args),
        CliCommand::Encode(args) => commands::run_encode_command(args),
        CliCommand::Decode(args) => commands::run_decode_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Batch(#[from] BatchError),
    #[error(transparent)]
    Internal(anyhow::Error),
}

impl CliError {
    fn as_batch_error(&self) -> BatchError {
        match self {
            Self::Usage(message) => BatchError::validation("VALIDATION.CLI_USAGE", message.clone()),
            Self::Batch(error) => error.clone(),
            Self::Internal(error) => BatchError::internal("INTERNAL.CLI", format!("{error:#}")),
        }
    }
}

impl From<anyhow::Error> for CliError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast::<BatchError>() {
            Ok(batch) => Self::Batch(batch),
            Err(other) => Self::Internal(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CliError, default_filter, run};
    use mesa_batch_core::domain::{BatchError, BatchErrorCategory};

    #[test]
    fn unknown_subcommand_is_a_usage_error() {
        let error = run(["launch"]).expect_err("unknown command should fail");
        assert!(matches!(error, CliError::Usage(_)));
        assert_eq!(error.as_batch_error().exit_code(), 2);
    }

    #[test]
    fn help_exits_cleanly() {
        assert_eq!(run(["--help"]).expect("help should succeed"), 0);
    }

    #[test]
    fn anyhow_wrapped_batch_errors_keep_their_category() {
        let wrapped = anyhow::Error::new(BatchError::mismatch("MISMATCH.INLIST", "differs"));
        let error = CliError::from(wrapped);
        assert_eq!(
            error.as_batch_error().category(),
            BatchErrorCategory::MismatchError
        );

        let internal = CliError::from(anyhow::anyhow!("disk on fire"));
        assert_eq!(internal.as_batch_error().code(), "INTERNAL.CLI");
    }

    #[test]
    fn default_filter_names_the_binary_crate() {
        assert_eq!(module_path!().split("::").next(), Some("mesa_batch"));
        assert_eq!(
            default_filter(false),
            "mesa_batch_core=info,mesa_batch=info"
        );
        assert_eq!(
            default_filter(true),
            "mesa_batch_core=warn,mesa_batch=warn"
        );
    }
}
