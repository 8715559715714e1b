use super::CliError;
use super::helpers::*;
use mesa_batch_core::domain::{DecodeMode, OvershootScheme, RunConfig};
use mesa_batch_core::modules::batch::{make_batch, verify_inlists};
use mesa_batch_core::modules::check::check_environment;
use mesa_batch_core::modules::naming::RunNameCodec;
use mesa_batch_core::modules::runner::{ProcessExecutor, RunOptions, run_batch};
use mesa_batch_core::modules::summary::summarize_runs;
use mesa_batch_core::modules::template::TemplatePatcher;
use mesa_batch_core::modules::verify::verify_runs;
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct ReportFlag {
    /// Also write the full report as JSON
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct MakeArgs {
    /// Parameter table CSV (name, mass, metallicity, scheme, fov, f0)
    table: PathBuf,

    /// Switch pgstar plotting on in every generated inlist
    #[arg(long, conflicts_with = "no_pgstar")]
    pgstar: bool,

    /// Switch pgstar plotting off in every generated inlist
    #[arg(long)]
    no_pgstar: bool,

    /// Also ensure the TAMS stopping condition and the Ledoux criterion
    #[arg(long)]
    run_defaults: bool,

    #[command(flatten)]
    layout: LayoutArgs,

    #[command(flatten)]
    output: ReportFlag,
}

impl MakeArgs {
    fn pgstar(&self) -> Option<bool> {
        match (self.pgstar, self.no_pgstar) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(clap::Args)]
pub(super) struct VerifyInlistsArgs {
    /// Parameter table CSV the batch was made from
    table: PathBuf,

    #[command(flatten)]
    layout: LayoutArgs,

    #[command(flatten)]
    output: ReportFlag,
}

#[derive(clap::Args)]
pub(super) struct RunArgs {
    /// Only run batch inlists whose file name matches this glob
    #[arg(long, value_name = "GLOB")]
    only: Option<String>,

    /// List the runs that would be launched and stop
    #[arg(long)]
    dry_run: bool,

    #[command(flatten)]
    layout: LayoutArgs,

    #[command(flatten)]
    output: ReportFlag,
}

#[derive(clap::Args)]
pub(super) struct VerifyRunsArgs {
    /// Parameter table CSV the batch was made from
    table: PathBuf,

    #[command(flatten)]
    layout: LayoutArgs,

    #[command(flatten)]
    output: ReportFlag,
}

#[derive(clap::Args)]
pub(super) struct SummarizeArgs {
    /// Read run names leniently (unknown segments skipped, missing strengths as 0)
    #[arg(long)]
    tolerant: bool,

    #[command(flatten)]
    layout: LayoutArgs,

    #[command(flatten)]
    output: ReportFlag,
}

#[derive(clap::Args)]
pub(super) struct CheckArgs {
    #[command(flatten)]
    layout: LayoutArgs,

    #[command(flatten)]
    output: ReportFlag,
}

#[derive(clap::Args)]
pub(super) struct EncodeArgs {
    /// Initial mass in solar masses
    #[arg(long)]
    mass: f64,

    /// Initial metallicity Z
    #[arg(long)]
    metallicity: f64,

    /// Overshoot scheme; `none` disables overshooting
    #[arg(long, default_value = "none")]
    scheme: String,

    /// Overshoot strength f_ov
    #[arg(long, default_value_t = 0.0)]
    fov: f64,

    /// Overshoot offset f0
    #[arg(long, default_value_t = 0.0)]
    f0: f64,

    /// Run name prefix
    #[arg(long, default_value = "inlist")]
    prefix: String,

    /// Print the batch inlist file name instead of the bare run name
    #[arg(long)]
    inlist: bool,
}

#[derive(clap::Args)]
pub(super) struct DecodeArgs {
    /// Run name, run directory name or batch inlist file name
    name: String,

    /// Skip unknown segments and read missing strengths as 0
    #[arg(long)]
    tolerant: bool,

    /// Run name prefix
    #[arg(long, default_value = "inlist")]
    prefix: String,
}

fn decode_mode(tolerant: bool) -> DecodeMode {
    if tolerant {
        DecodeMode::Tolerant
    } else {
        DecodeMode::Strict
    }
}

pub(super) fn run_make_command(args: MakeArgs) -> Result<i32, CliError> {
    let layout = args.layout.resolve()?;
    let codec = codec_for(&layout)?;
    let table = load_table(&args.table)?;

    let mut patcher = TemplatePatcher::new(codec.clone()).with_run_defaults(args.run_defaults);
    if let Some(pgstar) = args.pgstar().or(layout.pgstar) {
        patcher = patcher.with_pgstar(pgstar);
    }

    let report = make_batch(&layout, &table, &patcher, &codec)?;
    println!(
        "Created {} inlist(s) in {} from {}",
        report.created.len(),
        report.batch_dir.display(),
        report.template.display()
    );
    for skipped in &report.skipped {
        println!("  skipped row {}: {}", skipped.row, skipped.reason);
    }
    print_failures(&report.failures);
    write_report(args.output.report.as_deref(), &report)?;
    Ok(exit_status(report.is_success()))
}

pub(super) fn run_verify_inlists_command(args: VerifyInlistsArgs) -> Result<i32, CliError> {
    let layout = args.layout.resolve()?;
    let codec = codec_for(&layout)?;
    let table = load_table(&args.table)?;

    let report = verify_inlists(&layout, &table, &codec)?;
    println!(
        "{} of {} inlist(s) match in {}",
        report.matched.len(),
        table.rows.len(),
        report.batch_dir.display()
    );
    print_names("Missing", &report.missing);
    print_names("Not in table", &report.extra);
    if !report.mismatches.is_empty() {
        println!("Mismatches ({}):", report.mismatches.len());
        print_failures(&report.mismatches);
    }
    print_failures(&report.failures);
    write_report(args.output.report.as_deref(), &report)?;
    Ok(exit_status(report.is_success()))
}

pub(super) fn run_batch_command(args: RunArgs) -> Result<i32, CliError> {
    let layout = args.layout.resolve()?;
    let executor = ProcessExecutor::from_layout(&layout);
    let mut options = RunOptions {
        dry_run: args.dry_run,
        ..RunOptions::default()
    };
    if let Some(pattern) = args.only {
        options.pattern = pattern;
    }

    let report = run_batch(&layout, &executor, &options)?;
    if options.dry_run {
        println!("Would run {} inlist(s):", report.planned.len());
        for name in &report.planned {
            println!("  - {}", name);
        }
    } else {
        for run in &report.runs {
            println!(
                "  {} {} ({:.2} s)",
                run.status.as_str(),
                run.name,
                run.runtime_seconds
            );
        }
        println!(
            "Finished {} of {} run(s); timings in {}",
            report.runs.len(),
            report.planned.len(),
            report.timings_file.display()
        );
    }
    print_failures(&report.failures);
    write_report(args.output.report.as_deref(), &report)?;
    Ok(exit_status(report.is_success()))
}

pub(super) fn run_verify_runs_command(args: VerifyRunsArgs) -> Result<i32, CliError> {
    let layout = args.layout.resolve()?;
    let codec = codec_for(&layout)?;
    let table = load_table(&args.table)?;

    let report = verify_runs(&layout, &table, &codec)?;
    println!(
        "{} of {} run(s) match in {}",
        report.matched.len(),
        table.rows.len(),
        report.runs_dir.display()
    );
    for (status, count) in report.status_counts() {
        println!("  {}: {}", status, count);
    }
    print_names("Missing", &report.missing);
    if !report.extra.is_empty() {
        println!("Not in table ({}):", report.extra.len());
        for extra in &report.extra {
            match &extra.note {
                Some(note) => println!("  - {} ({})", extra.name, note),
                None => println!("  - {}", extra.name),
            }
        }
    }
    if !report.mismatches.is_empty() {
        println!("Mismatches ({}):", report.mismatches.len());
        print_failures(&report.mismatches);
    }
    print_failures(&report.failures);
    write_report(args.output.report.as_deref(), &report)?;
    Ok(exit_status(report.is_success()))
}

pub(super) fn run_summarize_command(args: SummarizeArgs) -> Result<i32, CliError> {
    let layout = args.layout.resolve()?;
    let codec = codec_for(&layout)?;

    let report = summarize_runs(&layout, &codec, decode_mode(args.tolerant))?;
    println!(
        "Summarized {} run(s) into {}",
        report.rows.len(),
        report.output.display()
    );
    print_failures(&report.failures);
    write_report(args.output.report.as_deref(), &report)?;
    Ok(exit_status(report.failures.is_empty()))
}

pub(super) fn run_check_command(args: CheckArgs) -> Result<i32, CliError> {
    let layout = args.layout.resolve()?;
    let report = check_environment(&layout);
    for item in &report.items {
        let mark = match (item.ok, item.required) {
            (true, _) => "ok",
            (false, true) => "MISSING",
            (false, false) => "warn",
        };
        println!("[{:>7}] {}: {}", mark, item.name, item.detail);
    }
    write_report(args.output.report.as_deref(), &report)?;
    Ok(exit_status(report.is_ready()))
}

pub(super) fn run_encode_command(args: EncodeArgs) -> Result<i32, CliError> {
    let codec = RunNameCodec::new(args.prefix)?;
    let config = RunConfig::new(
        args.mass,
        args.metallicity,
        OvershootScheme::from_label(&args.scheme),
        args.fov,
        args.f0,
    )?;
    let name = if args.inlist {
        codec.inlist_file_name(&config)?
    } else {
        codec.encode(&config)?
    };
    println!("{}", name);
    Ok(0)
}

pub(super) fn run_decode_command(args: DecodeArgs) -> Result<i32, CliError> {
    let codec = RunNameCodec::new(args.prefix)?;
    let config = codec.decode_file_name(&args.name, decode_mode(args.tolerant))?;
    println!("{}", to_json(&config)?);
    Ok(0)
}
