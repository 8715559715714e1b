use super::{INITIAL_MASS, INITIAL_Z, OVERSHOOT_F, OVERSHOOT_F0, OVERSHOOT_SCHEME, PGSTAR_FLAG, SAVE_MODEL_FILENAME, ZBASE};
use crate::common::parse_fortran_real;
use crate::domain::{BatchError, BatchResult, DecodeMode, OvershootScheme, RunConfig};
use crate::modules::inlist::{Inlist, parse_logical, unquote};
use serde::Serialize;

/// Everything a patched inlist says about its run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlistReadback {
    pub config: RunConfig,
    pub zbase: Option<f64>,
    pub save_model_filename: Option<String>,
    pub pgstar: Option<bool>,
}

impl RunConfig {
    /// Recovers the run parameters from inlist text.
    pub fn from_inlist(text: &str, mode: DecodeMode) -> BatchResult<Self> {
        let inlist = Inlist::parse(text)?;
        Ok(read_back(&inlist, mode)?.config)
    }
}

pub fn read_back(inlist: &Inlist, mode: DecodeMode) -> BatchResult<InlistReadback> {
    let mass = required_real(inlist, INITIAL_MASS)?;
    let metallicity = required_real(inlist, INITIAL_Z)?;

    let scheme = inlist
        .value(OVERSHOOT_SCHEME)
        .map(|value| OvershootScheme::from_label(&unquote(value)))
        .unwrap_or_default();

    let (f_ov, f0) = if scheme.is_none() {
        (0.0, 0.0)
    } else {
        (
            strength(inlist, OVERSHOOT_F, mode)?,
            strength(inlist, OVERSHOOT_F0, mode)?,
        )
    };

    Ok(InlistReadback {
        config: RunConfig::new(mass, metallicity, scheme, f_ov, f0)?,
        zbase: optional_real(inlist, ZBASE)?,
        save_model_filename: inlist.value(SAVE_MODEL_FILENAME).map(unquote),
        pgstar: inlist.value(PGSTAR_FLAG).and_then(parse_logical),
    })
}

fn required_real(inlist: &Inlist, key: &str) -> BatchResult<f64> {
    optional_real(inlist, key)?.ok_or_else(|| {
        BatchError::missing_field(
            "MISSING.INLIST_KEY",
            format!("inlist has no active '{}' assignment", key),
        )
    })
}

fn optional_real(inlist: &Inlist, key: &str) -> BatchResult<Option<f64>> {
    let Some(value) = inlist.value(key) else {
        return Ok(None);
    };
    let literal = value.trim().trim_end_matches(',');
    parse_fortran_real(literal).map(Some).ok_or_else(|| {
        BatchError::parse(
            "PARSE.INLIST_VALUE",
            format!("'{}' is not a real number: '{}'", key, value),
        )
    })
}

fn strength(inlist: &Inlist, key: &str, mode: DecodeMode) -> BatchResult<f64> {
    match (optional_real(inlist, key)?, mode) {
        (Some(value), _) => Ok(value),
        (None, DecodeMode::Tolerant) => Ok(0.0),
        (None, DecodeMode::Strict) => Err(BatchError::missing_field(
            "MISSING.INLIST_STRENGTH",
            format!("overshoot scheme is set but '{}' is not", key),
        )),
    }
}
