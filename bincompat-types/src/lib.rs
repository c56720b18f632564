//! Shared DTOs (schemas-as-code) for the bincompat workspace.
//!
//! # Design constraints
//! - Declaration documents and plans are serialized to disk.
//! - Be conservative with breaking changes.
//! - Prefer adding optional fields over changing semantics.

pub mod config;
pub mod decl;
pub mod model;
pub mod plan;
pub mod report;

/// Schema identifiers.
pub mod schema {
    pub const BINCOMPAT_DECLS_V1: &str = "bincompat.decls.v1";
    pub const BINCOMPAT_PLAN_V1: &str = "bincompat.plan.v1";
    pub const BINCOMPAT_REPORT_V1: &str = "bincompat.report.v1";
}
