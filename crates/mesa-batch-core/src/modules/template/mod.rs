//! Injects a [`RunConfig`] into a template inlist and reads it back out.

mod readback;

pub use readback::{InlistReadback, read_back};

use crate::common::format_decimal;
use crate::domain::{BatchResult, RunConfig};
use crate::modules::inlist::{Inlist, Placement, logical, quoted};
use crate::modules::naming::RunNameCodec;

pub const INITIAL_MASS: &str = "initial_mass";
pub const INITIAL_Z: &str = "initial_z";
pub const ZBASE: &str = "Zbase";
pub const SAVE_MODEL_FILENAME: &str = "save_model_filename";
pub const SAVE_MODEL_WHEN_TERMINATE: &str = "save_model_when_terminate";
pub const SAVE_PHOTO_WHEN_TERMINATE: &str = "save_photo_when_terminate";
pub const PGSTAR_FLAG: &str = "pgstar_flag";
pub const OVERSHOOT_SCHEME: &str = "overshoot_scheme(1)";
pub const OVERSHOOT_ZONE_TYPE: &str = "overshoot_zone_type(1)";
pub const OVERSHOOT_ZONE_LOC: &str = "overshoot_zone_loc(1)";
pub const OVERSHOOT_BDY_LOC: &str = "overshoot_bdy_loc(1)";
pub const OVERSHOOT_F: &str = "overshoot_f(1)";
pub const OVERSHOOT_F0: &str = "overshoot_f0(1)";
pub const USE_LEDOUX: &str = "use_Ledoux_criterion";
pub const STOP_SPECIES: &str = "xa_central_lower_limit_species(1)";
pub const STOP_LIMIT: &str = "xa_central_lower_limit(1)";

/// Array names of every overshoot key, disabled wholesale when overshoot is off.
pub const OVERSHOOT_KEYS: [&str; 6] = [
    "overshoot_scheme",
    "overshoot_zone_type",
    "overshoot_zone_loc",
    "overshoot_bdy_loc",
    "overshoot_f",
    "overshoot_f0",
];

const STARTING: Placement = Placement::under("controls", "starting specifications", true);
const MIXING: Placement = Placement::under("controls", "mixing", false);
const WHEN_TO_STOP: Placement = Placement::under("controls", "when to stop", true);
const KAP: Placement = Placement::end_of("kap");
const STAR_JOB: Placement = Placement::end_of("star_job");

const ZONE_TYPE: &str = "any";
const ZONE_LOC: &str = "core";
const BDY_LOC: &str = "top";
const STOP_AT_SPECIES: &str = "h1";
const STOP_AT_ABUNDANCE: &str = "1d-3";

/// Rewrites template inlists for one run of the grid.
#[derive(Debug, Clone, Default)]
pub struct TemplatePatcher {
    codec: RunNameCodec,
    pgstar: Option<bool>,
    run_defaults: bool,
}

impl TemplatePatcher {
    pub fn new(codec: RunNameCodec) -> Self {
        Self {
            codec,
            pgstar: None,
            run_defaults: false,
        }
    }

    /// Sets `pgstar_flag` in every patched inlist.
    pub fn with_pgstar(mut self, enabled: bool) -> Self {
        self.pgstar = Some(enabled);
        self
    }

    /// Also ensures the main-sequence stopping condition and the Ledoux criterion.
    pub fn with_run_defaults(mut self, enabled: bool) -> Self {
        self.run_defaults = enabled;
        self
    }

    pub fn apply(&self, config: &RunConfig, template: &str) -> BatchResult<String> {
        let mut inlist = Inlist::parse(template)?;
        self.patch(config, &mut inlist)?;
        Ok(inlist.render())
    }

    pub fn patch(&self, config: &RunConfig, inlist: &mut Inlist) -> BatchResult<()> {
        config.validate()?;
        let model_file = self.codec.model_file_name(config)?;
        let metallicity = format_decimal(config.metallicity);

        inlist.set(INITIAL_MASS, &format_decimal(config.mass), STARTING);
        inlist.set(INITIAL_Z, &metallicity, STARTING);
        inlist.set(ZBASE, &metallicity, KAP);

        let had_model_filename = !inlist.occurrences(SAVE_MODEL_FILENAME).is_empty();
        inlist.set(SAVE_MODEL_FILENAME, &quoted(&model_file), STAR_JOB);
        if !had_model_filename {
            inlist.set(SAVE_MODEL_WHEN_TERMINATE, logical(true), STAR_JOB);
            if inlist.get(SAVE_PHOTO_WHEN_TERMINATE).is_none() {
                inlist.set(SAVE_PHOTO_WHEN_TERMINATE, logical(true), STAR_JOB);
            }
        }

        if let Some(enabled) = self.pgstar {
            inlist.set(PGSTAR_FLAG, logical(enabled), STAR_JOB);
        }

        if config.has_overshoot() {
            inlist.set(OVERSHOOT_SCHEME, &quoted(config.scheme.as_str()), MIXING);
            inlist.set(OVERSHOOT_ZONE_TYPE, &quoted(ZONE_TYPE), MIXING);
            inlist.set(OVERSHOOT_ZONE_LOC, &quoted(ZONE_LOC), MIXING);
            inlist.set(OVERSHOOT_BDY_LOC, &quoted(BDY_LOC), MIXING);
            inlist.set(OVERSHOOT_F, &fortran_real(config.f_ov), MIXING);
            inlist.set(OVERSHOOT_F0, &fortran_real(config.f0), MIXING);
        } else {
            let disabled: usize = OVERSHOOT_KEYS
                .iter()
                .map(|key| inlist.disable_all(key))
                .sum();
            tracing::debug!(disabled, "overshoot disabled in inlist");
        }

        if self.run_defaults {
            if inlist.get(STOP_SPECIES).is_none() {
                inlist.set(STOP_SPECIES, &quoted(STOP_AT_SPECIES), WHEN_TO_STOP);
            }
            if inlist.get(STOP_LIMIT).is_none() {
                inlist.set(STOP_LIMIT, STOP_AT_ABUNDANCE, WHEN_TO_STOP);
            }
            inlist.set(USE_LEDOUX, logical(true), MIXING);
        }

        Ok(())
    }
}

/// Patches `template` with the default codec and no optional settings.
pub fn apply(config: &RunConfig, template: &str) -> BatchResult<String> {
    TemplatePatcher::default().apply(config, template)
}

/// Double-precision literal, e.g. `0.016d0`.
fn fortran_real(value: f64) -> String {
    format!("{}d0", format_decimal(value))
}

#[cfg(test)]
mod tests {
    use super::{OVERSHOOT_KEYS, TemplatePatcher, apply};
    use crate::domain::{DecodeMode, OvershootScheme, RunConfig};
    use crate::modules::inlist::Inlist;
    use crate::modules::naming::RunNameCodec;

    const TEMPLATE: &str = "\
&star_job
    create_pre_main_sequence_model = .true.
    pgstar_flag = .true.
/ ! end of star_job namelist

&kap
    Zbase = 0.02d0
/ ! end of kap namelist

&controls
    ! starting specifications
    initial_mass = 1.0 ! in Msun units
    initial_z = 0.02

    ! mixing
    overshoot_scheme(1) = 'exponential'
    overshoot_zone_type(1) = 'any'
    overshoot_zone_loc(1) = 'core'
    overshoot_bdy_loc(1) = 'top'
    overshoot_f(1) = 0.016d0
    overshoot_f0(1) = 0.008d0
/ ! end of controls namelist
";

    fn step_config() -> RunConfig {
        RunConfig::new(3.0, 0.014, OvershootScheme::Step, 0.01, 0.0).expect("config should be valid")
    }

    #[test]
    fn existing_assignments_are_rewritten_in_place() {
        let config = RunConfig::new(5.0, 0.014, OvershootScheme::Exponential, 0.02, 0.005)
            .expect("config should be valid");
        let patched = apply(&config, TEMPLATE).expect("template should patch");

        assert!(patched.contains("    initial_mass = 5 ! in Msun units\n"));
        assert!(patched.contains("    initial_z = 0.014\n"));
        assert!(patched.contains("    Zbase = 0.014\n"));
        assert!(patched.contains("    overshoot_f(1) = 0.02d0\n"));
        assert!(patched.contains("    overshoot_f0(1) = 0.005d0\n"));
        assert!(patched.contains("save_model_filename = 'M5_Z0.014_exponential_fov0.02_f00.005.mod'"));
        assert!(patched.contains("save_model_when_terminate = .true."));
        assert!(patched.contains("    pgstar_flag = .true.\n"));
    }

    #[test]
    fn disabled_scheme_comments_out_every_overshoot_line() {
        let config = RunConfig::without_overshoot(15.0, 0.02).expect("config should be valid");
        let patched = apply(&config, TEMPLATE).expect("template should patch");
        let inlist = Inlist::parse(&patched).expect("patched inlist should parse");

        for key in OVERSHOOT_KEYS {
            let active = inlist
                .namelists()
                .iter()
                .flat_map(|namelist| namelist.assignments())
                .filter(|assignment| assignment.base_name() == key && assignment.is_enabled())
                .count();
            assert_eq!(active, 0, "{key} should be disabled");
        }
        assert!(patched.contains("    !overshoot_f(1) = 0.016d0\n"));
    }

    #[test]
    fn overshoot_keys_are_inserted_under_a_new_mixing_comment() {
        let template = "&controls\n    initial_mass = 1\n/ ! end of controls namelist\n";
        let patched = apply(&step_config(), template).expect("template should patch");
        let inlist = Inlist::parse(&patched).expect("patched inlist should parse");

        for key in [
            "overshoot_scheme(1)",
            "overshoot_zone_type(1)",
            "overshoot_zone_loc(1)",
            "overshoot_bdy_loc(1)",
            "overshoot_f(1)",
            "overshoot_f0(1)",
        ] {
            let occurrences = inlist.occurrences(key);
            assert_eq!(occurrences.len(), 1, "{key} should appear once");
            assert!(occurrences[0].is_enabled());
        }
        assert_eq!(inlist.value("overshoot_scheme(1)"), Some("'step'"));

        let scheme_at = patched.find("overshoot_scheme(1)").expect("scheme line");
        let f0_at = patched.find("overshoot_f0(1)").expect("f0 line");
        let mixing_at = patched.find("! mixing").expect("mixing comment");
        assert!(mixing_at < scheme_at && scheme_at < f0_at);
    }

    #[test]
    fn missing_namelists_are_created() {
        let patched = apply(&step_config(), "").expect("empty template should patch");
        let inlist = Inlist::parse(&patched).expect("patched inlist should parse");
        let names: Vec<&str> = inlist.namelists().iter().map(|n| n.name()).collect();
        assert_eq!(names, ["star_job", "kap", "controls"]);
        assert_eq!(inlist.value("zbase"), Some("0.014"));
    }

    #[test]
    fn duplicate_assignments_leave_one_active() {
        let template = "&controls\n    initial_mass = 1\n    !initial_mass = 2\n    initial_mass = 3\n/\n";
        let patched = apply(&step_config(), template).expect("template should patch");
        assert!(patched.contains("    initial_mass = 3\n    !initial_mass = 2\n    !initial_mass = 3\n"));
    }

    #[test]
    fn applying_twice_changes_nothing() {
        let patcher = TemplatePatcher::new(RunNameCodec::default())
            .with_pgstar(false)
            .with_run_defaults(true);
        for config in [step_config(), RunConfig::without_overshoot(2.0, 0.001).expect("valid")] {
            let once = patcher.apply(&config, TEMPLATE).expect("first pass");
            let twice = patcher.apply(&config, &once).expect("second pass");
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn run_defaults_add_stopping_condition() {
        let patcher = TemplatePatcher::default().with_run_defaults(true);
        let patched = patcher.apply(&step_config(), TEMPLATE).expect("template should patch");
        let inlist = Inlist::parse(&patched).expect("patched inlist should parse");
        assert_eq!(inlist.value("xa_central_lower_limit_species(1)"), Some("'h1'"));
        assert_eq!(inlist.value("xa_central_lower_limit(1)"), Some("1d-3"));
        assert_eq!(inlist.value("use_ledoux_criterion"), Some(".true."));

        let config = RunConfig::from_inlist(&patched, DecodeMode::Strict).expect("read back");
        assert_eq!(config, step_config());
    }
}
