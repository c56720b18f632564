//! Embeddable core library for bincompat.
//!
//! Provides a clap-free, I/O-abstracted entry point suitable for linking
//! into a build tool or other host process.
//!
//! # Port traits
//!
//! All I/O is abstracted behind port traits in [`ports`]:
//! - [`DeclSource`](ports::DeclSource) - load declaration documents
//! - [`WritePort`](ports::WritePort) - write files and create directories
//!
//! The [`adapters`] module provides default filesystem-backed implementations.
//!
//! # Entry points
//!
//! - [`run_plan`](pipeline::run_plan) - generate a plan + report
//! - [`write_plan_artifacts`](pipeline::write_plan_artifacts) - persist them

pub mod adapters;
pub mod pipeline;
pub mod ports;
pub mod settings;

// Re-export loader types so embedders don't need bincompat-decls directly.
pub use bincompat_decls::{DeclLoadError, LoadedDecls};
