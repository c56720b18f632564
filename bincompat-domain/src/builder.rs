//! Three-tier builder synthesis: optional tier, full tier, concrete storage.

use crate::normalize::NULL_LITERAL;
use bincompat_types::model::{Field, Shape};
use bincompat_types::plan::{
    BuilderProperty, BuilderSpec, BuilderTier, ConcreteBuilderSpec, SetterKind, StorageInit,
    StorageSlot, TierSpec, TypedName,
};

pub fn synthesize_builder(shape: &Shape) -> BuilderSpec {
    let optional_props: Vec<BuilderProperty> = shape
        .fields
        .iter()
        .filter(|f| f.is_optional_tier())
        .map(|f| property(f, false))
        .collect();

    let optional = (!optional_props.is_empty()).then(|| TierSpec {
        tier: BuilderTier::Optional,
        extends: None,
        properties: optional_props,
    });

    let full = TierSpec {
        tier: BuilderTier::Full,
        extends: optional.as_ref().map(|t| t.tier),
        properties: shape
            .fields
            .iter()
            .filter(|f| f.has_builder_storage())
            .map(|f| property(f, f.is_optional_tier()))
            .collect(),
    };

    BuilderSpec {
        optional,
        full,
        concrete: concrete(shape),
    }
}

fn property(field: &Field, overrides_parent: bool) -> BuilderProperty {
    let setter = if field.has_inert_setter() {
        SetterKind::Inert
    } else if field.is_settable() {
        SetterKind::Live
    } else {
        SetterKind::None
    };
    BuilderProperty {
        name: field.name.clone(),
        ty: field.type_name(),
        setter,
        overrides_parent,
        doc: field.doc.clone(),
    }
}

fn concrete(shape: &Shape) -> ConcreteBuilderSpec {
    let stored: Vec<&Field> = shape
        .fields
        .iter()
        .filter(|f| f.has_builder_storage())
        .collect();

    let constructor_params: Vec<TypedName> = stored
        .iter()
        .filter(|f| f.is_builder_constructor_param())
        .map(|f| TypedName {
            name: f.name.clone(),
            ty: f.type_name(),
        })
        .collect();

    let storage = stored
        .iter()
        .map(|f| StorageSlot {
            name: f.name.clone(),
            ty: f.type_name(),
            init: if f.is_builder_constructor_param() {
                StorageInit::ConstructorParam
            } else {
                StorageInit::Literal {
                    literal: f.literal().unwrap_or(NULL_LITERAL).to_string(),
                }
            },
        })
        .collect();

    ConcreteBuilderSpec {
        public_no_arg: constructor_params.is_empty(),
        constructor_params,
        storage,
    }
}
