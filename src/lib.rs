//! pdfarena - PDF extraction model comparison service.
//!
//! Accepts a PDF, routes it to one or more pluggable extraction backends
//! (Docling, MinerU, Surya), and returns normalized markdown, structural
//! elements, and quantitative metrics. Multi-backend requests additionally
//! produce a deterministic cross-backend comparison (fastest, most
//! elements, longest output).
//!
//! The interesting part is the orchestration core:
//! - `backends` — the adapter trait and registry for opaque extraction
//!   models
//! - `metrics` — backend-agnostic metrics over heterogeneous outputs
//! - `comparison` — input-order-deterministic cross-backend rankings
//! - `services::processor` — task lifecycle, isolation, and fan-out
//!
//! The CLI and the axum server are thin transports over that core.

pub mod backends;
pub mod cli;
pub mod comparison;
pub mod config;
pub mod metrics;
pub mod models;
pub mod server;
pub mod services;
pub mod storage;
pub mod utils;
