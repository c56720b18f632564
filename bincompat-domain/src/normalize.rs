//! Declarations -> normalized [`Schema`].
//!
//! Every defect is collected per shape. A shape with any defect is left out of
//! the schema; the others are unaffected.

use crate::error::{PlanError, SchemaErrorKind, StructuralErrorKind, schema, structural};
use crate::naming::{output_name, output_package};
use bincompat_types::config::PlannerConfig;
use bincompat_types::decl::{DeclKind, DeclMarker, FieldDecl, ShapeDecl};
use bincompat_types::model::{
    DefaultValueSpec, Field, Mutability, ParentLink, Schema, Shape, ShapeId, ShapeKind,
    VersionRequirement,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Literal used for nullable fields without a declared default.
pub const NULL_LITERAL: &str = "null";

#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub schema: Schema,
    pub errors: Vec<PlanError>,
}

pub fn normalize(decls: &[ShapeDecl], config: &PlannerConfig) -> Normalized {
    let mut sorted: Vec<&ShapeDecl> = decls.iter().collect();
    sorted.sort_by_key(|d| d.qualified_name());

    let markers: BTreeMap<String, DeclMarker> = sorted
        .iter()
        .map(|d| (d.qualified_name(), d.marker))
        .collect();

    let mut out = Normalized::default();
    let mut seen = BTreeSet::new();

    for decl in sorted {
        let qualified = decl.qualified_name();
        if !seen.insert(qualified.clone()) {
            out.errors
                .push(structural(&qualified, StructuralErrorKind::DuplicateShape));
            continue;
        }

        if let Err(err) = check_structure(decl, &qualified, config, &markers) {
            debug!(shape = %qualified, error = %err, "declaration does not qualify");
            out.errors.push(err);
            continue;
        }

        match normalize_fields(&qualified, &decl.fields) {
            Ok(fields) => {
                let shape = build_shape(decl, fields, config);
                out.schema.push(shape);
            }
            Err(mut errs) => out.errors.append(&mut errs),
        }
    }

    link_parents(&mut out.schema);
    out
}

fn check_structure(
    decl: &ShapeDecl,
    qualified: &str,
    config: &PlannerConfig,
    markers: &BTreeMap<String, DeclMarker>,
) -> Result<(), PlanError> {
    if decl.kind != DeclKind::Interface {
        return Err(structural(
            qualified,
            StructuralErrorKind::NotAnInterface(decl.kind),
        ));
    }

    if !decl.type_parameters.is_empty() {
        return Err(structural(qualified, StructuralErrorKind::HasTypeParameters));
    }

    if output_name(
        &decl.name,
        decl.generated_name.as_deref(),
        &config.required_suffix,
    )
    .is_none()
    {
        return Err(structural(
            qualified,
            StructuralErrorKind::MissingSuffix {
                suffix: config.required_suffix.clone(),
            },
        ));
    }

    if let Some(enclosing) = &decl.parent {
        if decl.marker == DeclMarker::SealedParent {
            return Err(structural(
                qualified,
                StructuralErrorKind::NestedSealedParent {
                    enclosing: enclosing.clone(),
                },
            ));
        }
        if markers.get(enclosing) == Some(&DeclMarker::DataClass) {
            return Err(structural(
                qualified,
                StructuralErrorKind::NestedInPlainShape {
                    enclosing: enclosing.clone(),
                },
            ));
        }
    }

    Ok(())
}

fn normalize_fields(shape: &str, decls: &[FieldDecl]) -> Result<Vec<Field>, Vec<PlanError>> {
    let mut errors = Vec::new();
    let mut names = BTreeSet::new();
    let mut fields = Vec::with_capacity(decls.len());

    for decl in decls {
        if !names.insert(decl.name.as_str()) {
            errors.push(schema(
                shape,
                Some(&decl.name),
                SchemaErrorKind::DuplicateField,
            ));
            continue;
        }
        match normalize_field(shape, decl) {
            Ok(field) => fields.push(field),
            Err(err) => errors.push(err),
        }
    }

    if errors.is_empty() {
        Ok(fields)
    } else {
        Err(errors)
    }
}

fn normalize_field(shape: &str, decl: &FieldDecl) -> Result<Field, PlanError> {
    let err = |kind| schema(shape, Some(&decl.name), kind);

    let declared_default = decl.default.as_ref().and_then(|d| d.literal());

    let (default, requirement) = match &decl.new_required {
        Some(_) if declared_default.is_some() => {
            return Err(err(SchemaErrorKind::ConflictingDefaults));
        }
        Some(req) => {
            let since = u32::try_from(req.since_version)
                .ok()
                .filter(|v| *v > 1)
                .ok_or_else(|| err(SchemaErrorKind::InvalidSinceVersion(req.since_version)))?;
            let literal = req
                .default
                .literal()
                .ok_or_else(|| err(SchemaErrorKind::EmptyRequirementDefault))?;
            (
                Some(DefaultValueSpec::new(literal)),
                Some(VersionRequirement {
                    since_version: since,
                    previously_optional: req.previously_optional,
                }),
            )
        }
        None => {
            let default = declared_default
                .or_else(|| decl.nullable.then(|| NULL_LITERAL.to_string()))
                .map(DefaultValueSpec::new);
            (default, None)
        }
    };

    if decl.mutability != Mutability::Mutable && default.is_none() {
        return Err(err(SchemaErrorKind::MissingFrozenDefault(decl.mutability)));
    }

    Ok(Field {
        name: decl.name.clone(),
        ty: decl.ty.clone(),
        nullable: decl.nullable,
        mutability: decl.mutability,
        default,
        requirement,
        equality: !decl.exclude_from_equality,
        overrides: decl.overrides,
        doc: decl.doc.clone(),
    })
}

fn build_shape(decl: &ShapeDecl, fields: Vec<Field>, config: &PlannerConfig) -> Shape {
    let kind = match decl.marker {
        DeclMarker::DataClass => ShapeKind::Plain,
        DeclMarker::SealedParent => ShapeKind::SealedParent,
    };

    let output_name = output_name(
        &decl.name,
        decl.generated_name.as_deref(),
        &config.required_suffix,
    )
    .unwrap_or_else(|| decl.name.clone());

    let mut imports = decl.imports.clone();
    imports.sort();
    imports.dedup();

    Shape {
        id: ShapeId(0),
        kind,
        declared_name: decl.name.clone(),
        declared_package: decl.package.clone(),
        output_name,
        output_package: output_package(&decl.package, &config.drop_package_suffixes),
        version: decl.version,
        parent: decl.parent.as_ref().map(|p| ParentLink {
            declared: p.clone(),
            id: None,
        }),
        fields,
        interfaces: decl.interfaces.clone(),
        annotations: decl.annotations.clone(),
        imports,
        doc: decl.doc.clone(),
    }
}

fn link_parents(schema: &mut Schema) {
    let ids: BTreeMap<String, ShapeId> = schema
        .iter()
        .map(|s| (s.declared_qualified_name(), s.id))
        .collect();

    let children: Vec<(ShapeId, ShapeId)> = schema
        .iter()
        .filter_map(|s| {
            let link = s.parent.as_ref()?;
            ids.get(&link.declared).map(|parent| (s.id, *parent))
        })
        .collect();

    for (child, parent) in children {
        if let Some(link) = schema.get_mut(child).and_then(|s| s.parent.as_mut()) {
            link.id = Some(parent);
        }
    }
}
