//! Parameter-grid batch tooling for the MESA stellar evolution code.
//!
//! The heart of the crate is the run configuration codec: a [`domain::RunConfig`]
//! maps to a canonical run name ([`modules::naming`]) and to assignments in a
//! template inlist ([`modules::template`]), and both representations decode
//! back to the same record. The batch drivers in [`modules`] build on it.

pub mod common;
pub mod domain;
pub mod modules;
