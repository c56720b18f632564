//! Full construction plan of one shape: versioned overloads plus the private
//! constructors, the copy plan and the optional factory function.

use crate::entries::{attach_entries, check_ambiguity};
use crate::error::PlanError;
use crate::normalize::NULL_LITERAL;
use crate::versions::{plan_overloads, version_table};
use bincompat_types::config::ConstructionStyle;
use bincompat_types::model::{Mutability, Shape};
use bincompat_types::plan::{
    ArgValue, Assignment, BuilderBackedConstructor, BuilderTier, CallbackArg, ConstructionPlan,
    CopyPlan, Delegation, DelegationTarget, FactoryFunction, PrimaryConstructor, TypedName,
    ValueSource,
};
use tracing::debug;

/// Name of the hidden trailing parameter on the primary constructor.
pub const PRIMARY_MARKER: &str = "builderMarker";

pub fn plan_construction(
    shape: &Shape,
    owner: &str,
    style: ConstructionStyle,
) -> Result<ConstructionPlan, PlanError> {
    let mut overloads = plan_overloads(shape);
    attach_entries(shape, style, &mut overloads);
    check_ambiguity(&shape.declared_qualified_name(), &overloads)?;

    debug!(
        shape = %owner,
        style = style.as_str(),
        "version table\n{}",
        version_table(&overloads)
    );

    let factory = match style {
        ConstructionStyle::Callback => Some(factory_function(shape, owner)),
        ConstructionStyle::Overload => None,
    };

    Ok(ConstructionPlan {
        style,
        overloads,
        primary: primary_constructor(shape),
        from_builder: builder_backed(shape),
        copy: copy_plan(shape),
        factory,
    })
}

fn primary_constructor(shape: &Shape) -> PrimaryConstructor {
    PrimaryConstructor {
        params: shape
            .fields
            .iter()
            .map(|f| TypedName {
                name: f.name.clone(),
                ty: f.type_name(),
            })
            .collect(),
        marker: PRIMARY_MARKER.to_string(),
    }
}

fn builder_backed(shape: &Shape) -> BuilderBackedConstructor {
    BuilderBackedConstructor {
        assignments: shape
            .fields
            .iter()
            .map(|f| {
                let source = if f.is_frozen() {
                    ValueSource::Literal {
                        literal: f.literal().unwrap_or(NULL_LITERAL).to_string(),
                    }
                } else {
                    ValueSource::Storage
                };
                Assignment {
                    field: f.name.clone(),
                    source,
                }
            })
            .collect(),
    }
}

fn copy_plan(shape: &Shape) -> CopyPlan {
    CopyPlan {
        builder_args: shape
            .fields
            .iter()
            .filter(|f| f.is_constructor_relevant())
            .map(|f| f.name.clone())
            .collect(),
        setters: shape
            .fields
            .iter()
            .filter(|f| !f.is_builder_constructor_param() && f.mutability == Mutability::Mutable)
            .map(|f| f.name.clone())
            .collect(),
        callback: BuilderTier::Full,
    }
}

fn factory_function(shape: &Shape, owner: &str) -> FactoryFunction {
    let params: Vec<TypedName> = shape
        .fields
        .iter()
        .filter(|f| f.is_constructor_relevant())
        .map(|f| TypedName {
            name: f.name.clone(),
            ty: f.type_name(),
        })
        .collect();
    let args = params
        .iter()
        .map(|p| ArgValue::Param {
            name: p.name.clone(),
        })
        .collect();

    FactoryFunction {
        name: shape.output_name.clone(),
        owner: owner.to_string(),
        params,
        callback: BuilderTier::Full,
        delegation: Delegation {
            target: DelegationTarget::ConcreteBuilder,
            args,
            callback: CallbackArg::Forward,
        },
    }
}
