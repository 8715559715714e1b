pub mod errors;

pub use errors::{BatchError, BatchErrorCategory, BatchResult};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Marker that replaces the overshoot segments of a run name when overshoot is disabled.
pub const NO_OVERSHOOT_MARKER: &str = "noovs";

const NONE_LABELS: [&str; 3] = ["none", "no overshoot", "no overshooting"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OvershootScheme {
    #[default]
    None,
    Exponential,
    Step,
    Other(String),
}

impl OvershootScheme {
    /// Maps a free-form label (parameter tables, inlist values, run names) onto a scheme.
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().trim_matches(['\'', '"']).trim().to_lowercase();
        if NONE_LABELS.contains(&normalized.as_str()) {
            return Self::None;
        }
        match normalized.as_str() {
            "exponential" => Self::Exponential,
            "step" => Self::Step,
            _ => Self::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "none",
            Self::Exponential => "exponential",
            Self::Step => "step",
            Self::Other(name) => name,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    fn validate(&self) -> BatchResult<()> {
        let Self::Other(name) = self else {
            return Ok(());
        };

        if name.is_empty() {
            return Err(BatchError::validation(
                "VALIDATION.SCHEME_EMPTY",
                "overshoot scheme name must not be empty",
            ));
        }
        if let Some(bad) = name
            .chars()
            .find(|ch| *ch == '_' || *ch == '/' || *ch == '\\' || ch.is_whitespace() || ch.is_control())
        {
            return Err(BatchError::validation(
                "VALIDATION.SCHEME_SEPARATOR",
                format!(
                    "overshoot scheme '{}' contains reserved character {:?}",
                    name, bad
                ),
            ));
        }
        if name.chars().any(|ch| ch.is_uppercase()) {
            return Err(BatchError::validation(
                "VALIDATION.SCHEME_CASE",
                format!("overshoot scheme '{}' must be lowercase", name),
            ));
        }
        if name.contains(NO_OVERSHOOT_MARKER)
            || NONE_LABELS.contains(&name.as_str())
            || name == "exponential"
            || name == "step"
        {
            return Err(BatchError::validation(
                "VALIDATION.SCHEME_RESERVED",
                format!("overshoot scheme '{}' collides with a reserved name", name),
            ));
        }
        Ok(())
    }
}

impl Display for OvershootScheme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for OvershootScheme {
    fn from(value: String) -> Self {
        Self::from_label(&value)
    }
}

impl From<OvershootScheme> for String {
    fn from(value: OvershootScheme) -> Self {
        value.as_str().to_string()
    }
}

/// How forgiving read-back from a run name or inlist is about absent fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DecodeMode {
    #[default]
    Strict,
    /// Missing overshoot strengths read as 0 and unknown name segments are skipped.
    Tolerant,
}

/// One simulation instance of the parameter grid.
///
/// A config with [`OvershootScheme::None`] always carries `f_ov == f0 == 0`;
/// [`RunConfig::validate`] rejects anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub mass: f64,
    pub metallicity: f64,
    pub scheme: OvershootScheme,
    pub f_ov: f64,
    pub f0: f64,
}

impl RunConfig {
    /// Builds a validated config. Strengths given alongside a disabled scheme are
    /// dropped and negative zeros are stored as `0.0`.
    pub fn new(
        mass: f64,
        metallicity: f64,
        scheme: OvershootScheme,
        f_ov: f64,
        f0: f64,
    ) -> BatchResult<Self> {
        let (f_ov, f0) = if scheme.is_none() { (0.0, 0.0) } else { (f_ov, f0) };
        // `+ 0.0` folds `-0.0` into `0.0`
        let config = Self {
            mass: mass + 0.0,
            metallicity: metallicity + 0.0,
            scheme,
            f_ov: f_ov + 0.0,
            f0: f0 + 0.0,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn without_overshoot(mass: f64, metallicity: f64) -> BatchResult<Self> {
        Self::new(mass, metallicity, OvershootScheme::None, 0.0, 0.0)
    }

    pub fn has_overshoot(&self) -> bool {
        !self.scheme.is_none()
    }

    pub fn validate(&self) -> BatchResult<()> {
        if !self.mass.is_finite() || self.mass <= 0.0 {
            return Err(BatchError::validation(
                "VALIDATION.MASS",
                format!("mass must be a positive finite number, got {}", self.mass),
            ));
        }
        ensure_non_negative("metallicity", self.metallicity)?;
        ensure_non_negative("f_ov", self.f_ov)?;
        ensure_non_negative("f0", self.f0)?;
        self.scheme.validate()?;

        if self.scheme.is_none() && (self.f_ov != 0.0 || self.f0 != 0.0) {
            return Err(BatchError::validation(
                "VALIDATION.DISABLED_OVERSHOOT",
                format!(
                    "overshoot scheme none requires f_ov = f0 = 0, got f_ov={} f0={}",
                    self.f_ov, self.f0
                ),
            ));
        }
        Ok(())
    }
}

fn ensure_non_negative(field: &str, value: f64) -> BatchResult<()> {
    if value.is_finite() && value >= 0.0 {
        return Ok(());
    }
    Err(BatchError::validation(
        "VALIDATION.NEGATIVE_FIELD",
        format!("{} must be a non-negative finite number, got {}", field, value),
    ))
}
