//! Reader for MESA `.data` output tables (`history.data`, profiles).
//!
//! Layout: line 2 holds header names, line 3 their values, line 6 the
//! column names, and every following non-blank line one numeric row.

mod model;
mod parser;

pub use model::{CENTER_H1, MesaTable, TAMS_CENTER_H1};
pub use parser::{MesaTableError, parse_mesa_table, read_mesa_table};
