//! Constructor version planning: watermarks, per-version slots and resolved arguments.

use crate::normalize::NULL_LITERAL;
use bincompat_types::model::{Field, Mutability, Shape};
use bincompat_types::plan::{ArgValue, ParamSlot, ResolvedArg, SlotKind, VersionOverload};
use std::collections::BTreeSet;
use tracing::debug;

/// Distinct version watermarks, newest first. Always ends with version 1.
pub fn watermarks(shape: &Shape) -> Vec<u32> {
    let mut marks = BTreeSet::from([1u32]);
    for field in shape.fields.iter().filter(|f| f.is_constructor_relevant()) {
        if let Some(req) = field.requirement {
            marks.insert(req.since_version);
        }
    }

    for field in &shape.fields {
        if let Some(req) = field.requirement
            && !marks.contains(&req.since_version)
        {
            debug!(
                shape = %shape.declared_qualified_name(),
                field = %field.name,
                since = req.since_version,
                "since_version holds no constructor parameter, no overload generated"
            );
        }
    }

    marks.into_iter().rev().collect()
}

/// One overload per watermark, oldest first. Entry points are attached later.
pub fn plan_overloads(shape: &Shape) -> Vec<VersionOverload> {
    let marks = watermarks(shape);
    let relevant: Vec<&Field> = shape
        .fields
        .iter()
        .filter(|f| f.is_constructor_relevant())
        .collect();

    let mut overloads: Vec<VersionOverload> = marks
        .iter()
        .enumerate()
        .map(|(idx, &version)| {
            let newer = idx.checked_sub(1).and_then(|i| marks.get(i)).copied();
            let slots: Vec<ParamSlot> = relevant
                .iter()
                .filter_map(|f| slot_for(f, version, newer))
                .collect();
            let resolved = resolve(&relevant, &slots);
            VersionOverload {
                version,
                slots,
                resolved,
                entries: vec![],
            }
        })
        .collect();

    overloads.sort_by_key(|o| o.version);
    overloads
}

/// `newer` is the adjacent newer watermark; `None` for the newest overload.
fn slot_for(field: &Field, version: u32, newer: Option<u32>) -> Option<ParamSlot> {
    let since = field.watermark();
    let kind = if Some(since) == newer {
        SlotKind::Defaulted {
            literal: literal_of(field),
        }
    } else if since <= version {
        if field.mutability == Mutability::ImmutableRecently && newer.is_some() {
            SlotKind::Deprecated {
                literal: literal_of(field),
            }
        } else {
            SlotKind::Param
        }
    } else {
        return None;
    };

    Some(ParamSlot {
        field: field.name.clone(),
        ty: field.type_name(),
        kind,
    })
}

fn resolve(relevant: &[&Field], slots: &[ParamSlot]) -> Vec<ResolvedArg> {
    relevant
        .iter()
        .map(|f| {
            let live = slots
                .iter()
                .any(|s| s.field == f.name && s.kind == SlotKind::Param);
            let value = if live {
                ArgValue::Param {
                    name: f.name.clone(),
                }
            } else {
                ArgValue::Literal {
                    literal: literal_of(f),
                }
            };
            ResolvedArg {
                field: f.name.clone(),
                value,
            }
        })
        .collect()
}

fn literal_of(field: &Field) -> String {
    field.literal().unwrap_or(NULL_LITERAL).to_string()
}

/// `1.(a,c): (a,"x",c)` lines, oldest first, for logs and explain output.
pub fn version_table(overloads: &[VersionOverload]) -> String {
    overloads
        .iter()
        .map(|o| {
            let params: Vec<&str> = o.params().map(|s| s.field.as_str()).collect();
            let call: Vec<String> = o
                .slots
                .iter()
                .map(|s| match s.kind.literal() {
                    Some(literal) => literal.to_string(),
                    None => s.field.clone(),
                })
                .collect();
            format!("{}.({}): ({})", o.version, params.join(","), call.join(","))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
