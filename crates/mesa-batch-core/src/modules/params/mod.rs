//! CSV table of grid points: `name, mass, metallicity, scheme, f_ov, f0`.

mod model;
mod parser;

pub use model::{PARAMETER_FIELDS, ParameterRow, ParameterTable, SkippedRow};
pub use parser::{ParameterTableError, load_parameter_table, parse_parameter_table};
