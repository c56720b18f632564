//! Two-phase shape assembly.
//!
//! Phase 1 plans every normalized shape on its own and records its output name
//! in a [`NameTable`]. Phase 2 starts once every shape was planned, reads the
//! table and merges sealed families into one [`OutputUnit`] each.

use crate::builder::synthesize_builder;
use crate::construction::plan_construction;
use crate::error::{ConsistencyReason, PlanError, StructuralErrorKind, structural};
use crate::fingerprint::fingerprint;
use crate::identity::synthesize_identity;
use crate::naming::{NameTable, OutputName};
use crate::normalize::{NULL_LITERAL, normalize};
use bincompat_types::config::{ConstructionStyle, PlannerConfig};
use bincompat_types::decl::{ShapeDecl, qualify};
use bincompat_types::model::{Field, Mutability, ParentLink, Shape, ShapeKind};
use bincompat_types::plan::{FieldPlan, FieldRole, OutputUnit, ShapePlan};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Result of assembling one batch of declarations.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    /// Sorted by output qualified name.
    pub units: Vec<OutputUnit>,
    pub failures: Vec<PlanError>,
    pub names: NameTable,
}

struct Planned {
    plan: ShapePlan,
    package: String,
    imports: Vec<String>,
    parent: Option<ParentLink>,
}

pub fn assemble(decls: &[ShapeDecl], config: &PlannerConfig) -> Assembly {
    let normalized = normalize(decls, config);
    let mut failures = normalized.errors;
    let declared: BTreeSet<String> = decls.iter().map(ShapeDecl::qualified_name).collect();

    // Phase 1: independent per-shape planning.
    let mut planned: Vec<Planned> = Vec::new();
    for shape in normalized.schema.iter() {
        match plan_shape(shape, config.construction_style) {
            Ok(plan) => planned.push(Planned {
                plan,
                package: shape.output_package.clone(),
                imports: shape.imports.clone(),
                parent: shape.parent.clone(),
            }),
            Err(err) => {
                debug!(shape = %shape.declared_qualified_name(), error = %err, "shape not planned");
                failures.push(err);
            }
        }
    }
    let planned = reject_duplicate_outputs(planned, &mut failures);

    let mut names = NameTable::default();
    for p in &planned {
        names.register(
            p.plan.declared_name.clone(),
            OutputName {
                package: p.package.clone(),
                nested_name: p.plan.name.clone(),
            },
        );
    }

    // Phase 2: merge families. Every name is registered by now.
    let (roots, children): (Vec<Planned>, Vec<Planned>) =
        planned.into_iter().partition(|p| p.parent.is_none());

    let mut units: BTreeMap<String, OutputUnit> = roots
        .into_iter()
        .map(|p| {
            let unit = OutputUnit {
                qualified_name: p.plan.qualified_name.clone(),
                package: p.package,
                shape: p.plan,
                children: vec![],
                shared_statics: vec![],
                imports: p.imports,
            };
            (unit.shape.declared_name.clone(), unit)
        })
        .collect();

    for mut child in children {
        let Some(link) = child.parent.take() else {
            continue;
        };
        let parent_output = names.resolve(&link.declared).cloned();
        let (Some(parent_output), Some(unit)) = (parent_output, units.get_mut(&link.declared))
        else {
            let reason = if declared.contains(&link.declared) {
                ConsistencyReason::ParentNotPlanned
            } else {
                ConsistencyReason::ParentNotDeclared
            };
            failures.push(PlanError::Consistency {
                parent: link.declared.clone(),
                child: child.plan.declared_name.clone(),
                reason,
            });
            continue;
        };

        let nested = OutputName {
            package: parent_output.package.clone(),
            nested_name: format!("{}.{}", parent_output.nested_name, child.plan.name),
        };
        child.plan.qualified_name = nested.qualified();
        names.register(child.plan.declared_name.clone(), nested);

        if let Some(mut factory) = child
            .plan
            .construction
            .as_mut()
            .and_then(|c| c.factory.take())
        {
            factory.owner = child.plan.qualified_name.clone();
            unit.shared_statics.push(factory);
        }
        unit.imports.extend(child.imports);
        unit.children.push(child.plan);
    }

    let mut units: Vec<OutputUnit> = units.into_values().collect();
    for unit in units.iter_mut() {
        unit.imports.sort();
        unit.imports.dedup();
        unit.children
            .sort_by(|a, b| a.qualified_name.cmp(&b.qualified_name));
        unit.shared_statics.sort_by(|a, b| a.owner.cmp(&b.owner));
    }
    units.sort_by(|a, b| a.qualified_name.cmp(&b.qualified_name));

    failures.sort_by_key(failure_sort_key);

    Assembly {
        units,
        failures,
        names,
    }
}

/// Drops every shape whose final output name is claimed by another shape.
///
/// Roots collide on their qualified name, children on `Parent.Child` under
/// their parent's output name.
fn reject_duplicate_outputs(planned: Vec<Planned>, failures: &mut Vec<PlanError>) -> Vec<Planned> {
    let qualified: BTreeMap<&str, &str> = planned
        .iter()
        .map(|p| (p.plan.declared_name.as_str(), p.plan.qualified_name.as_str()))
        .collect();
    let outputs: Vec<String> = planned
        .iter()
        .map(|p| match &p.parent {
            None => p.plan.qualified_name.clone(),
            Some(link) => {
                let parent = qualified
                    .get(link.declared.as_str())
                    .copied()
                    .unwrap_or(link.declared.as_str());
                format!("{parent}.{}", p.plan.name)
            }
        })
        .collect();

    let mut claims: BTreeMap<&str, usize> = BTreeMap::new();
    for output in &outputs {
        *claims.entry(output.as_str()).or_default() += 1;
    }

    let mut kept = Vec::with_capacity(planned.len());
    for (p, output) in planned.into_iter().zip(outputs.iter()) {
        if claims.get(output.as_str()).copied().unwrap_or_default() > 1 {
            debug!(shape = %p.plan.declared_name, output = %output, "output name collision");
            failures.push(structural(
                &p.plan.declared_name,
                StructuralErrorKind::DuplicateOutputName {
                    output: output.clone(),
                },
            ));
        } else {
            kept.push(p);
        }
    }
    kept
}

fn failure_sort_key(err: &PlanError) -> String {
    format!(
        "{}|{}|{}|{}",
        err.shape(),
        err.code(),
        err.field().unwrap_or_default(),
        err
    )
}

/// Normalized content a shape plan is fingerprinted over.
#[derive(Serialize)]
struct ShapeContent<'a> {
    declared: String,
    output_name: &'a str,
    output_package: &'a str,
    version: u32,
    kind: ShapeKind,
    parent: Option<&'a str>,
    fields: &'a [Field],
    interfaces: &'a [String],
    annotations: &'a [String],
    style: ConstructionStyle,
}

fn plan_shape(shape: &Shape, style: ConstructionStyle) -> Result<ShapePlan, PlanError> {
    let qualified = qualify(&shape.output_package, &shape.output_name);

    let (construction, builder, identity) = match shape.kind {
        ShapeKind::SealedParent => (None, None, None),
        ShapeKind::Plain => (
            Some(plan_construction(shape, &qualified, style)?),
            Some(synthesize_builder(shape)),
            Some(synthesize_identity(shape, &qualified)),
        ),
    };

    let content = ShapeContent {
        declared: shape.declared_qualified_name(),
        output_name: &shape.output_name,
        output_package: &shape.output_package,
        version: shape.version,
        kind: shape.kind,
        parent: shape.parent.as_ref().map(|p| p.declared.as_str()),
        fields: &shape.fields,
        interfaces: &shape.interfaces,
        annotations: &shape.annotations,
        style,
    };
    let fingerprint = fingerprint_or_empty(&qualified, &content);

    Ok(ShapePlan {
        declared_name: shape.declared_qualified_name(),
        name: shape.output_name.clone(),
        qualified_name: qualified,
        kind: shape.kind,
        version: shape.version,
        fingerprint,
        fields: shape.fields.iter().map(field_plan).collect(),
        interfaces: shape.interfaces.clone(),
        annotations: shape.annotations.clone(),
        doc: shape.doc.clone(),
        construction,
        builder,
        identity,
    })
}

fn fingerprint_or_empty<T: Serialize>(shape: &str, content: &T) -> String {
    fingerprint(content).unwrap_or_else(|err| {
        warn!(shape = %shape, error = %err, "could not fingerprint shape content");
        String::new()
    })
}

fn field_plan(field: &Field) -> FieldPlan {
    let literal = || field.literal().unwrap_or(NULL_LITERAL).to_string();
    let role = match (field.mutability, field.requirement, field.literal()) {
        (Mutability::Immutable, _, _) => FieldRole::Frozen { literal: literal() },
        (Mutability::ImmutableRecently, _, _) => FieldRole::FrozenRecently { literal: literal() },
        (Mutability::Mutable, Some(req), _) => FieldRole::RequiredSince {
            version: req.since_version,
            previous_default: literal(),
        },
        (Mutability::Mutable, None, None) => FieldRole::Required,
        (Mutability::Mutable, None, Some(default)) => FieldRole::Optional {
            default: default.to_string(),
        },
    };

    FieldPlan {
        name: field.name.clone(),
        ty: field.type_name(),
        mutability: field.mutability,
        default: field.literal().map(str::to_string),
        mandatory_since: field.mandatory_since(),
        role,
        equality: field.equality,
        overrides: field.overrides,
        doc: field.doc.clone(),
    }
}
