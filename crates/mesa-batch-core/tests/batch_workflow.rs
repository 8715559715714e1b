use mesa_batch_core::common::BatchLayout;
use mesa_batch_core::domain::{BatchResult, DecodeMode};
use mesa_batch_core::modules::batch::{make_batch, verify_inlists};
use mesa_batch_core::modules::naming::RunNameCodec;
use mesa_batch_core::modules::params::parse_parameter_table;
use mesa_batch_core::modules::runner::{RunOptions, RunStatus, SimulationExecutor, run_batch};
use mesa_batch_core::modules::summary::summarize_runs;
use mesa_batch_core::modules::template::TemplatePatcher;
use mesa_batch_core::modules::verify::{CompletionStatus, verify_runs};
use mesa_batch_core::modules::inlist::Inlist;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

const TABLE: &str = "\
name,mass,metallicity,scheme,fov,f0
alice,5,0.014,exponential,0.02,0.005
bob,15,0.02,none,,
short,1
";

const TEMPLATE: &str = "\
&star_job
    create_pre_main_sequence_model = .true.
/ ! end of star_job namelist

&kap
    Zbase = 0.02
/ ! end of kap namelist

&controls
    ! starting specifications
    initial_mass = 1
    initial_z = 0.02

    ! mixing
/ ! end of controls namelist
";

/// Stands in for `star`: writes a history whose values depend on the inlist.
struct FakeStar;

impl SimulationExecutor for FakeStar {
    fn execute(&self, work_dir: &Path, mut log: File) -> BatchResult<RunStatus> {
        let project = fs::read_to_string(work_dir.join("inlist_project")).expect("project inlist");
        let inlist = Inlist::parse(&project).expect("project inlist parses");
        let mass: f64 = inlist
            .value("initial_mass")
            .and_then(|value| value.parse().ok())
            .expect("initial mass");

        fs::create_dir_all(work_dir.join("LOGS")).expect("LOGS");
        let history = format!(
            "1 2\nversion_number initial_mass\n\"r23.05.1\" {mass}\n\n1 2 3 4 5 6\n\
             model_number star_age center_h1 log_Teff log_L he_core_mass\n\
             1 1.0E+04 0.70 3.70 {l0} 0.0\n\
             2 9.5E+06 0.0009 4.25 {l1} 0.75\n\
             3 9.6E+06 0.0001 4.10 {l2} 0.80\n",
            l0 = mass.log10(),
            l1 = mass.log10() + 0.5,
            l2 = mass.log10() + 0.6,
        );
        fs::write(work_dir.join("LOGS/history.data"), history).expect("history");
        writeln!(log, "termination code: xa_central_lower_limit").expect("log");
        Ok(RunStatus::Completed)
    }
}

fn prepared_layout(temp: &TempDir) -> BatchLayout {
    let layout = BatchLayout {
        work_dir: temp.path().to_path_buf(),
        ..BatchLayout::default()
    };
    fs::write(layout.main_inlist_path(), "&star_job\n    read_extra_star_job_inlist(1) = .true.\n/\n")
        .expect("main inlist");
    fs::write(layout.template_path(), TEMPLATE).expect("template");
    layout
}

#[test]
fn table_to_summary() {
    let temp = TempDir::new().expect("tempdir should be created");
    let layout = prepared_layout(&temp);
    let codec = RunNameCodec::default();
    let table = parse_parameter_table(TABLE.as_bytes()).expect("table");
    assert_eq!(table.skipped.len(), 1);

    let patcher = TemplatePatcher::new(codec.clone()).with_pgstar(false);
    let made = make_batch(&layout, &table, &patcher, &codec).expect("make");
    assert!(made.is_success());
    let names: Vec<&str> = made.created.iter().map(|c| c.file_name.as_str()).collect();
    assert_eq!(
        names,
        [
            "inlist_M5_Z0.014_exponential_fov0.02_f00.005.inp",
            "inlist_M15_Z0.02_noovs.inp"
        ]
    );

    let inlists = verify_inlists(&layout, &table, &codec).expect("verify inlists");
    assert!(inlists.is_success(), "{inlists:?}");
    assert_eq!(inlists.matched.len(), 2);

    let runs = run_batch(&layout, &FakeStar, &RunOptions::default()).expect("run");
    assert!(runs.is_success(), "{runs:?}");
    assert_eq!(runs.runs.len(), 2);

    let verified = verify_runs(&layout, &table, &codec).expect("verify runs");
    assert!(verified.is_success(), "{verified:?}");
    assert!(
        verified
            .matched
            .iter()
            .all(|check| check.status == CompletionStatus::Completed)
    );

    let summary = summarize_runs(&layout, &codec, DecodeMode::Strict).expect("summarize");
    assert!(summary.failures.is_empty(), "{:?}", summary.failures);
    assert_eq!(summary.rows.len(), 2);
    for row in &summary.rows {
        assert_eq!(row.tams_index, 1);
        assert_eq!(row.age_myr, 9.5);
        assert_eq!(row.core_mass, 0.75);
        assert_eq!(row.status, "completed");
        assert!(row.runtime_seconds.is_some());
    }

    let csv = fs::read_to_string(layout.summary_path()).expect("summary csv");
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some(
            "YOUR NAME,initial mass  [Msol],initial metallicity,overshoot scheme,\
             overshoot parameter (f_ov),overshoot f0,,log_Teff [K],log_L [Lsol],\
             Core mass [Msol],Core radius [Rsol],Age [Myr],Runtime [s],Status"
        )
    );
    assert!(csv.contains(",15,0.02,no overshooting,0,0,,4.25,"));
}

#[test]
fn tampered_inlist_is_a_mismatch() {
    let temp = TempDir::new().expect("tempdir should be created");
    let layout = prepared_layout(&temp);
    let codec = RunNameCodec::default();
    let table = parse_parameter_table(TABLE.as_bytes()).expect("table");
    make_batch(&layout, &table, &TemplatePatcher::default(), &codec).expect("make");

    let target = layout.batch_dir_path().join("inlist_M15_Z0.02_noovs.inp");
    let text = fs::read_to_string(&target).expect("inlist");
    fs::write(&target, text.replace("initial_mass = 15", "initial_mass = 14")).expect("tamper");
    fs::write(layout.batch_dir_path().join("inlist_M2_Z0.02_noovs.inp"), TEMPLATE).expect("extra");
    fs::remove_file(
        layout
            .batch_dir_path()
            .join("inlist_M5_Z0.014_exponential_fov0.02_f00.005.inp"),
    )
    .expect("remove");

    let report = verify_inlists(&layout, &table, &codec).expect("verify");
    assert!(!report.is_success());
    assert_eq!(report.missing, ["inlist_M5_Z0.014_exponential_fov0.02_f00.005.inp"]);
    assert_eq!(report.extra, ["inlist_M2_Z0.02_noovs.inp"]);
    assert_eq!(report.mismatches.len(), 1);
    assert_eq!(report.mismatches[0].code, "MISMATCH.INLIST");
}

#[test]
fn runs_without_rows_are_listed_as_extra() {
    let temp = TempDir::new().expect("tempdir should be created");
    let layout = prepared_layout(&temp);
    let codec = RunNameCodec::default();
    let table = parse_parameter_table(TABLE.as_bytes()).expect("table");

    let stray = layout.runs_dir_path().join("inlist_M9_Z0.02_noovs");
    fs::create_dir_all(&stray).expect("stray run");
    fs::write(
        stray.join("inlist_project"),
        "&controls\n    initial_mass = 9\n    initial_z = 0.02\n/\n",
    )
    .expect("stray inlist");

    let report = verify_runs(&layout, &table, &codec).expect("verify runs");
    assert_eq!(report.missing.len(), 2);
    assert_eq!(report.extra.len(), 1);
    assert_eq!(
        report.extra[0].config.as_ref().map(|config| config.mass),
        Some(9.0)
    );
}
