//! Service layer for pdfarena business logic.
//!
//! Domain logic separated from transport concerns; services are used by the
//! CLI and the web server alike.

pub mod processor;

pub use processor::{PdfProcessor, ProcessorError};
