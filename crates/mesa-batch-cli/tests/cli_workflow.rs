use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const TABLE: &str = "\
name,mass,metallicity,scheme,fov,f0
alice,5,0.014,exponential,0.02,0.005
bob,15,0.02,none,,
";

const TEMPLATE: &str = "\
&star_job
    pgstar_flag = .true.
/ ! end of star_job namelist

&kap
    Zbase = 0.02
/ ! end of kap namelist

&controls
    ! starting specifications
    initial_mass = 1
    initial_z = 0.02
/ ! end of controls namelist
";

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mesa-batch"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("mesa-batch should run")
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent directory should be created");
    }
    fs::write(path, content).expect("file should be written");
}

fn prepared_work_dir() -> TempDir {
    let temp = TempDir::new().expect("tempdir should be created");
    write_file(&temp.path().join("inlist"), "&star_job\n/\n");
    write_file(&temp.path().join("inlist_project"), TEMPLATE);
    write_file(&temp.path().join("grid.csv"), TABLE);
    temp
}

#[test]
fn encode_prints_the_run_name() {
    let output = run_cli(&[
        "encode",
        "--mass",
        "5",
        "--metallicity",
        "0.014",
        "--scheme",
        "exponential",
        "--fov",
        "0.02",
        "--f0",
        "0.005",
    ]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(
        stdout_of(&output).trim(),
        "inlist_M5_Z0.014_exponential_fov0.02_f00.005"
    );

    let output = run_cli(&[
        "encode", "--mass", "15", "--metallicity", "0.02", "--inlist",
    ]);
    assert_eq!(stdout_of(&output).trim(), "inlist_M15_Z0.02_noovs.inp");
}

#[test]
fn decode_prints_json() {
    let output = run_cli(&["decode", "inlist_M5_Z0.014_exponential_fov0.02_f00.005.inp"]);
    assert!(output.status.success(), "{output:?}");
    let value: Value = serde_json::from_str(&stdout_of(&output)).expect("decode output is JSON");
    assert_eq!(value["mass"], 5.0);
    assert_eq!(value["metallicity"], 0.014);
    assert_eq!(value["scheme"], "exponential");
    assert_eq!(value["f0"], 0.005);
}

#[test]
fn decode_rejects_a_foreign_prefix() {
    let output = run_cli(&["decode", "grid_M5_Z0.014_noovs"]);
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[PARSE.RUN_NAME_PREFIX]"), "{stderr}");
}

#[test]
fn unknown_flag_is_a_usage_error() {
    let output = run_cli(&["summarize", "--bogus"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[VALIDATION.CLI_USAGE]"), "{stderr}");
}

#[test]
fn make_then_verify_inlists() {
    let temp = prepared_work_dir();
    let work_dir = temp.path().to_str().expect("utf-8 temp path");
    let table = temp.path().join("grid.csv");
    let table = table.to_str().expect("utf-8 table path");
    let report = temp.path().join("reports/make.json");

    let output = run_cli(&[
        "make",
        table,
        "--work-dir",
        work_dir,
        "--no-pgstar",
        "--report",
        report.to_str().expect("utf-8 report path"),
    ]);
    assert!(output.status.success(), "{output:?}");
    assert!(stdout_of(&output).contains("Created 2 inlist(s)"));

    let made: Value =
        serde_json::from_str(&fs::read_to_string(&report).expect("report should exist"))
            .expect("report is JSON");
    assert_eq!(made["created"].as_array().map(Vec::len), Some(2));

    let generated = fs::read_to_string(
        temp.path()
            .join("batch_runs/batch_inlists/inlist_M15_Z0.02_noovs.inp"),
    )
    .expect("generated inlist");
    assert!(generated.contains("pgstar_flag = .false."));
    assert!(generated.contains("initial_mass = 15"));

    let output = run_cli(&["verify-inlists", table, "--work-dir", work_dir]);
    assert!(output.status.success(), "{output:?}");
    assert!(stdout_of(&output).contains("2 of 2 inlist(s) match"));

    fs::remove_file(
        temp.path()
            .join("batch_runs/batch_inlists/inlist_M15_Z0.02_noovs.inp"),
    )
    .expect("remove inlist");
    let output = run_cli(&["verify-inlists", table, "--work-dir", work_dir]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout_of(&output).contains("inlist_M15_Z0.02_noovs.inp"));
}

#[test]
fn dry_run_lists_planned_runs_without_an_executable() {
    let temp = prepared_work_dir();
    let work_dir = temp.path().to_str().expect("utf-8 temp path");
    let table = temp.path().join("grid.csv");

    let output = run_cli(&[
        "make",
        table.to_str().expect("utf-8 table path"),
        "--work-dir",
        work_dir,
    ]);
    assert!(output.status.success(), "{output:?}");

    let output = run_cli(&[
        "run",
        "--work-dir",
        work_dir,
        "--dry-run",
        "--only",
        "*noovs*",
    ]);
    assert!(output.status.success(), "{output:?}");
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Would run 1 inlist(s)"), "{stdout}");
    assert!(stdout.contains("inlist_M15_Z0.02_noovs"), "{stdout}");
    assert!(!temp.path().join("batch_runs/runs").exists());
}

#[test]
fn run_without_batch_inlists_reports_missing_input() {
    let temp = prepared_work_dir();
    let output = run_cli(&[
        "run",
        "--work-dir",
        temp.path().to_str().expect("utf-8 temp path"),
    ]);
    assert_eq!(output.status.code(), Some(4));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[MISSING.BATCH_INLISTS]"), "{stderr}");
}
