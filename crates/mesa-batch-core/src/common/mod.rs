pub mod config;
pub mod numeric;

pub use config::BatchLayout;
pub use numeric::{format_decimal, parse_decimal, parse_fortran_real, parse_plain_decimal, round_to};
