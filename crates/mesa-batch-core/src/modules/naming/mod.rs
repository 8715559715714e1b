//! Canonical run names: `<prefix>_M<mass>_Z<metallicity>[_<scheme>_fov<f_ov>_f0<f0>]`,
//! with the bracketed part replaced by `_noovs` when overshoot is disabled.
//!
//! Encoding and decoding both walk the same segment tables below, so the
//! two directions cannot drift apart.

use crate::common::config::{DEFAULT_NAME_PREFIX, INLIST_EXTENSION};
use crate::common::numeric::{format_decimal, parse_plain_decimal};
use crate::domain::{
    BatchError, BatchResult, DecodeMode, NO_OVERSHOOT_MARKER, OvershootScheme, RunConfig,
};

const SEPARATOR: char = '_';
const MODEL_EXTENSION: &str = "mod";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Mass,
    Metallicity,
    OvershootF,
    OvershootF0,
}

impl Field {
    const fn label(self) -> &'static str {
        match self {
            Self::Mass => "mass",
            Self::Metallicity => "metallicity",
            Self::OvershootF => "f_ov",
            Self::OvershootF0 => "f0",
        }
    }

    fn read(self, config: &RunConfig) -> f64 {
        match self {
            Self::Mass => config.mass,
            Self::Metallicity => config.metallicity,
            Self::OvershootF => config.f_ov,
            Self::OvershootF0 => config.f0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Segment {
    Tagged { tag: &'static str, field: Field },
    Scheme,
}

/// Always present, strictly positional.
const BASE_SEGMENTS: [Segment; 2] = [
    Segment::Tagged {
        tag: "M",
        field: Field::Mass,
    },
    Segment::Tagged {
        tag: "Z",
        field: Field::Metallicity,
    },
];

/// Present when overshoot is enabled. The scheme is positional; tagged
/// strengths after it are matched by tag in any order.
const OVERSHOOT_SEGMENTS: [Segment; 3] = [
    Segment::Scheme,
    Segment::Tagged {
        tag: "fov",
        field: Field::OvershootF,
    },
    Segment::Tagged {
        tag: "f0",
        field: Field::OvershootF0,
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunNameCodec {
    prefix: String,
}

impl Default for RunNameCodec {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_NAME_PREFIX.to_string(),
        }
    }
}

impl RunNameCodec {
    pub fn new(prefix: impl Into<String>) -> BatchResult<Self> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(BatchError::validation(
                "VALIDATION.RUN_NAME_PREFIX",
                "run name prefix must not be empty",
            ));
        }
        if prefix
            .chars()
            .any(|ch| ch == '/' || ch == '\\' || ch.is_whitespace() || ch.is_control())
        {
            return Err(BatchError::validation(
                "VALIDATION.RUN_NAME_PREFIX",
                format!(
                    "run name prefix '{}' must not contain path separators or whitespace",
                    prefix
                ),
            ));
        }
        Ok(Self { prefix })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn encode(&self, config: &RunConfig) -> BatchResult<String> {
        Ok(format!(
            "{}{}{}",
            self.prefix,
            SEPARATOR,
            self.encode_body(config)?
        ))
    }

    /// The name without its prefix, e.g. `M5_Z0.014_noovs`.
    pub fn encode_body(&self, config: &RunConfig) -> BatchResult<String> {
        config.validate()?;

        let mut segments: Vec<String> = BASE_SEGMENTS
            .iter()
            .map(|segment| render_segment(*segment, config))
            .collect();
        if config.has_overshoot() {
            segments.extend(
                OVERSHOOT_SEGMENTS
                    .iter()
                    .map(|segment| render_segment(*segment, config)),
            );
        } else {
            segments.push(NO_OVERSHOOT_MARKER.to_string());
        }
        let separator = SEPARATOR.to_string();
        Ok(segments.join(separator.as_str()))
    }

    pub fn inlist_file_name(&self, config: &RunConfig) -> BatchResult<String> {
        Ok(format!("{}.{}", self.encode(config)?, INLIST_EXTENSION))
    }

    /// File the simulator saves its final model to, e.g. `M5_Z0.014_noovs.mod`.
    pub fn model_file_name(&self, config: &RunConfig) -> BatchResult<String> {
        Ok(format!("{}.{}", self.encode_body(config)?, MODEL_EXTENSION))
    }

    /// Whether `name` looks like a run name of this codec (prefix followed by a mass tag).
    pub fn matches(&self, name: &str) -> bool {
        name.strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix(SEPARATOR))
            .is_some_and(|body| body.starts_with('M'))
    }

    pub fn decode(&self, name: &str, mode: DecodeMode) -> BatchResult<RunConfig> {
        let body = name
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix(SEPARATOR))
            .ok_or_else(|| {
                BatchError::parse(
                    "PARSE.RUN_NAME_PREFIX",
                    format!(
                        "run name '{}' does not start with '{}{}'",
                        name, self.prefix, SEPARATOR
                    ),
                )
            })?;
        let segments: Vec<&str> = body.split(SEPARATOR).collect();

        let mass = decode_positional(name, &segments, 0)?;
        let metallicity = decode_positional(name, &segments, 1)?;

        if body.contains(NO_OVERSHOOT_MARKER) {
            return RunConfig::without_overshoot(mass, metallicity);
        }

        let scheme_text = segments
            .get(2)
            .copied()
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| {
                BatchError::missing_field(
                    "MISSING.RUN_NAME_SCHEME",
                    format!(
                        "run name '{}' has neither an overshoot scheme nor '{}'",
                        name, NO_OVERSHOOT_MARKER
                    ),
                )
            })?;
        let scheme = OvershootScheme::from_label(scheme_text);
        if scheme.is_none() {
            if mode == DecodeMode::Tolerant {
                return RunConfig::without_overshoot(mass, metallicity);
            }
            return Err(BatchError::parse(
                "PARSE.RUN_NAME_SCHEME",
                format!(
                    "run name '{}' spells a disabled scheme as '{}' instead of '{}'",
                    name, scheme_text, NO_OVERSHOOT_MARKER
                ),
            ));
        }

        let mut f_ov = None;
        let mut f0 = None;
        for segment in &segments[3..] {
            let Some((tag, field)) = match_tagged_segment(segment) else {
                if mode == DecodeMode::Strict {
                    return Err(BatchError::parse(
                        "PARSE.RUN_NAME_SEGMENT",
                        format!("run name '{}' has unrecognized segment '{}'", name, segment),
                    ));
                }
                tracing::debug!(name, segment, "ignoring unrecognized run name segment");
                continue;
            };

            let slot = match field {
                Field::OvershootF => &mut f_ov,
                Field::OvershootF0 => &mut f0,
                Field::Mass | Field::Metallicity => continue,
            };
            if slot.is_some() {
                if mode == DecodeMode::Strict {
                    return Err(BatchError::parse(
                        "PARSE.RUN_NAME_DUPLICATE",
                        format!(
                            "run name '{}' repeats the '{}' segment",
                            name, tag
                        ),
                    ));
                }
                continue;
            }
            *slot = Some(parse_tagged_value(name, segment, tag, field)?);
        }

        let f_ov = resolve_strength(name, f_ov, Field::OvershootF, mode)?;
        let f0 = resolve_strength(name, f0, Field::OvershootF0, mode)?;
        RunConfig::new(mass, metallicity, scheme, f_ov, f0)
    }

    /// Decodes an inlist file name; only a literal `.inp` extension is removed.
    pub fn decode_file_name(&self, file_name: &str, mode: DecodeMode) -> BatchResult<RunConfig> {
        let suffix = format!(".{}", INLIST_EXTENSION);
        let stem = file_name.strip_suffix(suffix.as_str()).unwrap_or(file_name);
        self.decode(stem, mode)
    }
}

pub fn encode(config: &RunConfig) -> BatchResult<String> {
    RunNameCodec::default().encode(config)
}

pub fn decode(name: &str) -> BatchResult<RunConfig> {
    RunNameCodec::default().decode(name, DecodeMode::Strict)
}

fn render_segment(segment: Segment, config: &RunConfig) -> String {
    match segment {
        Segment::Tagged { tag, field } => format!("{}{}", tag, format_decimal(field.read(config))),
        Segment::Scheme => config.scheme.as_str().to_string(),
    }
}

fn decode_positional(name: &str, segments: &[&str], index: usize) -> BatchResult<f64> {
    let Segment::Tagged { tag, field } = BASE_SEGMENTS[index] else {
        return Err(BatchError::internal(
            "INTERNAL.RUN_NAME_SCHEMA",
            format!("base segment {} is not tagged", index),
        ));
    };
    let segment = segments
        .get(index)
        .copied()
        .filter(|segment| segment.starts_with(tag))
        .ok_or_else(|| {
            BatchError::parse(
                "PARSE.RUN_NAME_TAG",
                format!(
                    "run name '{}' is missing the '{}' {} segment at position {}",
                    name,
                    tag,
                    field.label(),
                    index
                ),
            )
        })?;
    parse_tagged_value(name, segment, tag, field)
}

fn match_tagged_segment(segment: &str) -> Option<(&'static str, Field)> {
    OVERSHOOT_SEGMENTS
        .iter()
        .filter_map(|candidate| match candidate {
            Segment::Tagged { tag, field } if segment.starts_with(tag) => Some((*tag, *field)),
            _ => None,
        })
        .max_by_key(|(tag, _)| tag.len())
}

fn parse_tagged_value(name: &str, segment: &str, tag: &str, field: Field) -> BatchResult<f64> {
    let text = &segment[tag.len()..];
    parse_plain_decimal(text).ok_or_else(|| {
        BatchError::parse(
            "PARSE.RUN_NAME_DECIMAL",
            format!(
                "run name '{}' has invalid {} value '{}'",
                name,
                field.label(),
                text
            ),
        )
    })
}

fn resolve_strength(
    name: &str,
    value: Option<f64>,
    field: Field,
    mode: DecodeMode,
) -> BatchResult<f64> {
    match (value, mode) {
        (Some(value), _) => Ok(value),
        (None, DecodeMode::Tolerant) => Ok(0.0),
        (None, DecodeMode::Strict) => Err(BatchError::missing_field(
            "MISSING.RUN_NAME_STRENGTH",
            format!("run name '{}' has no {} segment", name, field.label()),
        )),
    }
}
