//! Domain logic: turn shape declarations into a deterministic construction plan.
//!
//! This crate owns *what* every versioned shape must expose to stay binary
//! compatible. It never emits source text; that is left to whoever consumes
//! the plan.

pub mod assembler;
pub mod builder;
pub mod construction;
pub mod entries;
pub mod error;
pub mod fingerprint;
pub mod identity;
pub mod interpret;
pub mod naming;
pub mod normalize;
mod planner;
pub mod versions;

pub use assembler::{Assembly, assemble};
pub use error::{ConsistencyReason, PlanError, SchemaErrorKind, StructuralErrorKind};
pub use interpret::{Instance, InterpretError, Interpreter, SetCall};
pub use planner::{PlanContext, Planner};
