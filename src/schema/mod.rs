//! Schema module - Design, configuration and result types for elite search runs.

mod config;
mod design;
mod run;

pub use config::*;
pub use design::*;
pub use run::*;
