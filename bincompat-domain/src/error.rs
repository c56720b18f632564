//! Planning defects.
//!
//! Three families, each scoped to what it aborts:
//! - schema: contradictory field metadata, aborts one shape
//! - structural: the declaration itself does not qualify, aborts one shape
//! - consistency: a child references a parent that was never planned, aborts the family

use bincompat_types::decl::DeclKind;
use bincompat_types::model::Mutability;
use bincompat_types::plan::{ErrorFamily, PlanFailure};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("schema error in {shape}{}: {kind}", field_suffix(.field))]
    Schema {
        shape: String,
        field: Option<String>,
        kind: SchemaErrorKind,
    },

    #[error("structural error in {shape}: {kind}")]
    Structural {
        shape: String,
        kind: StructuralErrorKind,
    },

    #[error("consistency error: {child} references parent {parent}: {reason}")]
    Consistency {
        parent: String,
        child: String,
        reason: ConsistencyReason,
    },
}

fn field_suffix(field: &Option<String>) -> String {
    field
        .as_deref()
        .map(|f| format!(".{f}"))
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaErrorKind {
    /// Both an independent default and a version requirement were declared.
    #[error("field declares both a default value and a version requirement")]
    ConflictingDefaults,

    #[error("since_version must be greater than 1, got {0}")]
    InvalidSinceVersion(i64),

    #[error("field name is declared more than once")]
    DuplicateField,

    /// Frozen fields collapse to their literal, so one is required.
    #[error("{} field has no default literal", .0.as_str())]
    MissingFrozenDefault(Mutability),

    #[error("version requirement has an empty default literal")]
    EmptyRequirementDefault,

    /// Two entry points erase to the same signature.
    #[error("entry points {first} and {second} share the erased signature ({signature})")]
    AmbiguousOverloads {
        first: String,
        second: String,
        signature: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralErrorKind {
    #[error("cannot target a non-interface declaration ({})", .0.as_str())]
    NotAnInterface(DeclKind),

    #[error("declaration must not have type parameters")]
    HasTypeParameters,

    #[error("name must end with the '{suffix}' suffix or set a generated name")]
    MissingSuffix { suffix: String },

    #[error("sealed parent cannot be nested in {enclosing}")]
    NestedSealedParent { enclosing: String },

    #[error("enclosing declaration {enclosing} is not a sealed parent")]
    NestedInPlainShape { enclosing: String },

    #[error("declared more than once")]
    DuplicateShape,

    #[error("output name {output} is claimed by more than one declaration")]
    DuplicateOutputName { output: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyReason {
    #[error("parent was never declared")]
    ParentNotDeclared,

    #[error("parent failed to plan")]
    ParentNotPlanned,
}

impl PlanError {
    pub fn family(&self) -> ErrorFamily {
        match self {
            PlanError::Schema { .. } => ErrorFamily::Schema,
            PlanError::Structural { .. } => ErrorFamily::Structural,
            PlanError::Consistency { .. } => ErrorFamily::Consistency,
        }
    }

    /// Stable machine-readable code, e.g. `schema.conflicting_defaults`.
    pub fn code(&self) -> String {
        let tail = match self {
            PlanError::Schema { kind, .. } => match kind {
                SchemaErrorKind::ConflictingDefaults => "conflicting_defaults",
                SchemaErrorKind::InvalidSinceVersion(_) => "invalid_since_version",
                SchemaErrorKind::DuplicateField => "duplicate_field",
                SchemaErrorKind::MissingFrozenDefault(_) => "missing_frozen_default",
                SchemaErrorKind::EmptyRequirementDefault => "empty_requirement_default",
                SchemaErrorKind::AmbiguousOverloads { .. } => "ambiguous_overloads",
            },
            PlanError::Structural { kind, .. } => match kind {
                StructuralErrorKind::NotAnInterface(_) => "not_an_interface",
                StructuralErrorKind::HasTypeParameters => "type_parameters",
                StructuralErrorKind::MissingSuffix { .. } => "missing_suffix",
                StructuralErrorKind::NestedSealedParent { .. } => "nested_sealed_parent",
                StructuralErrorKind::NestedInPlainShape { .. } => "nested_in_plain_shape",
                StructuralErrorKind::DuplicateShape => "duplicate_shape",
                StructuralErrorKind::DuplicateOutputName { .. } => "duplicate_output_name",
            },
            PlanError::Consistency { reason, .. } => match reason {
                ConsistencyReason::ParentNotDeclared => "parent_not_declared",
                ConsistencyReason::ParentNotPlanned => "parent_not_planned",
            },
        };
        format!("{}.{}", self.family().as_str(), tail)
    }

    /// The shape the defect is reported against.
    pub fn shape(&self) -> &str {
        match self {
            PlanError::Schema { shape, .. } | PlanError::Structural { shape, .. } => shape,
            PlanError::Consistency { child, .. } => child,
        }
    }

    pub fn field(&self) -> Option<&str> {
        match self {
            PlanError::Schema { field, .. } => field.as_deref(),
            _ => None,
        }
    }

    pub fn to_failure(&self) -> PlanFailure {
        PlanFailure {
            shape: self.shape().to_string(),
            family: self.family(),
            code: self.code(),
            field: self.field().map(str::to_string),
            message: self.to_string(),
        }
    }
}

pub(crate) fn schema(shape: &str, field: Option<&str>, kind: SchemaErrorKind) -> PlanError {
    PlanError::Schema {
        shape: shape.to_string(),
        field: field.map(str::to_string),
        kind,
    }
}

pub(crate) fn structural(shape: &str, kind: StructuralErrorKind) -> PlanError {
    PlanError::Structural {
        shape: shape.to_string(),
        kind,
    }
}
