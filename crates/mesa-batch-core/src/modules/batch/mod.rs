//! Batch inlist generation from a parameter table and its verification.

mod make;
mod verify;

pub use make::{CreatedInlist, MakeReport, make_batch};
pub use verify::{InlistVerification, verify_inlists};
pub(crate) use verify::{describe, ensure_same};
