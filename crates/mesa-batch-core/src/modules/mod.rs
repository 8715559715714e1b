pub mod batch;
pub mod check;
pub mod files;
pub mod history;
pub mod inlist;
pub mod naming;
pub mod params;
pub mod report;
pub mod runner;
pub mod serialization;
pub mod summary;
pub mod template;
pub mod verify;

pub use naming::{RunNameCodec, decode, encode};
pub use report::ItemFailure;
pub use template::{TemplatePatcher, apply};
