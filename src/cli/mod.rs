//! Command-line interface for pdfarena.

mod commands;

pub use commands::{is_verbose, run};
