use crate::domain::RunConfig;
use crate::modules::report::ItemFailure;
use serde::Serialize;

/// Fields a parameter row must carry: name, mass, metallicity, scheme, f_ov, f0.
pub const PARAMETER_FIELDS: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterRow {
    /// 1-based line number, the header being line 1.
    pub row: usize,
    pub name: String,
    pub config: RunConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterTable {
    pub rows: Vec<ParameterRow>,
    /// Incomplete rows, ignored with a warning.
    pub skipped: Vec<SkippedRow>,
    /// Complete rows whose values do not form a valid run.
    pub invalid: Vec<ItemFailure>,
}

impl ParameterTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
