//! Public entry points per overload, their delegation chain and ambiguity checks.

use crate::error::{PlanError, SchemaErrorKind, schema};
use bincompat_types::config::ConstructionStyle;
use bincompat_types::model::Shape;
use bincompat_types::plan::{
    ArgValue, BuilderTier, CallbackArg, Delegation, DelegationTarget, EntryParam, EntryPoint,
    EntryVariant, SlotKind, VersionOverload,
};
use std::collections::BTreeMap;

/// Fills `entries` on every overload. `overloads` must be oldest first.
pub fn attach_entries(shape: &Shape, style: ConstructionStyle, overloads: &mut [VersionOverload]) {
    let has_optional = shape.has_optional_tier();
    let newer_versions: Vec<Option<u32>> = (0..overloads.len())
        .map(|i| overloads.get(i + 1).map(|o| o.version))
        .collect();

    for (overload, newer) in overloads.iter_mut().zip(newer_versions) {
        overload.entries = entries_for(overload, newer, has_optional, style);
    }

    let has_builder_args = shape.fields.iter().any(|f| f.is_constructor_relevant());
    let has_zero_arg = overloads
        .iter()
        .flat_map(|o| o.entries.iter())
        .any(|e| e.params.is_empty() && e.callback.is_none());

    if !has_builder_args
        && !has_zero_arg
        && let Some(newest) = overloads.last_mut()
    {
        newest.entries.push(EntryPoint {
            variant: EntryVariant::NoArg,
            params: vec![],
            callback: None,
            delegation: Delegation {
                target: DelegationTarget::ConcreteBuilder,
                args: vec![],
                callback: CallbackArg::None,
            },
        });
    }
}

fn entries_for(
    overload: &VersionOverload,
    newer: Option<u32>,
    has_optional: bool,
    style: ConstructionStyle,
) -> Vec<EntryPoint> {
    if overload.slots.is_empty() {
        let entry = if has_optional {
            EntryPoint {
                variant: EntryVariant::CallbackOnly,
                params: vec![],
                callback: Some(BuilderTier::Optional),
                delegation: Delegation {
                    target: DelegationTarget::ConcreteBuilder,
                    args: vec![],
                    callback: CallbackArg::Forward,
                },
            }
        } else {
            EntryPoint {
                variant: EntryVariant::MandatoryOnly,
                params: vec![],
                callback: None,
                delegation: Delegation {
                    target: DelegationTarget::ConcreteBuilder,
                    args: vec![],
                    callback: CallbackArg::None,
                },
            }
        };
        return vec![entry];
    }

    let params: Vec<EntryParam> = overload
        .params()
        .map(|s| EntryParam {
            name: s.field.clone(),
            ty: s.ty.clone(),
            deprecated: matches!(s.kind, SlotKind::Deprecated { .. }),
        })
        .collect();

    if !has_optional {
        return vec![EntryPoint {
            variant: EntryVariant::MandatoryOnly,
            params,
            callback: None,
            delegation: chain(overload, newer, EntryVariant::MandatoryOnly, CallbackArg::None),
        }];
    }

    let with_callback = EntryPoint {
        variant: EntryVariant::WithOptionalCallback,
        params: params.clone(),
        callback: Some(BuilderTier::Optional),
        delegation: chain(
            overload,
            newer,
            EntryVariant::WithOptionalCallback,
            CallbackArg::Forward,
        ),
    };

    match style {
        ConstructionStyle::Callback => vec![with_callback],
        ConstructionStyle::Overload => {
            let args = params
                .iter()
                .map(|p| ArgValue::Param {
                    name: p.name.clone(),
                })
                .collect();
            let defaulted = EntryPoint {
                variant: EntryVariant::DefaultedOptionals,
                params,
                callback: None,
                delegation: Delegation {
                    target: DelegationTarget::Overload {
                        version: overload.version,
                        variant: EntryVariant::WithOptionalCallback,
                    },
                    args,
                    callback: CallbackArg::Empty,
                },
            };
            vec![defaulted, with_callback]
        }
    }
}

/// Non-terminal overloads forward every slot to the adjacent newer overload;
/// the newest one hands its resolved arguments to the concrete builder.
fn chain(
    overload: &VersionOverload,
    newer: Option<u32>,
    variant: EntryVariant,
    callback: CallbackArg,
) -> Delegation {
    match newer {
        Some(version) => Delegation {
            target: DelegationTarget::Overload { version, variant },
            args: overload
                .slots
                .iter()
                .map(|s| match &s.kind {
                    SlotKind::Param | SlotKind::Deprecated { .. } => ArgValue::Param {
                        name: s.field.clone(),
                    },
                    SlotKind::Defaulted { literal } => ArgValue::Literal {
                        literal: literal.clone(),
                    },
                })
                .collect(),
            callback,
        },
        None => Delegation {
            target: DelegationTarget::ConcreteBuilder,
            args: overload.resolved.iter().map(|r| r.value.clone()).collect(),
            callback,
        },
    }
}

/// Erased parameter types of an entry point, as the target runtime sees them.
pub fn erased_signature(entry: &EntryPoint) -> Vec<String> {
    let mut sig: Vec<String> = entry.params.iter().map(|p| erase_type(&p.ty)).collect();
    if entry.callback.is_some() {
        sig.push("Function1".to_string());
    }
    sig
}

/// Reports the first pair of entry points sharing an erased signature.
pub fn check_ambiguity(shape_name: &str, overloads: &[VersionOverload]) -> Result<(), PlanError> {
    let mut seen: BTreeMap<Vec<String>, String> = BTreeMap::new();
    for overload in overloads {
        for entry in &overload.entries {
            let label = format!("v{}/{}", overload.version, entry.variant.as_str());
            let sig = erased_signature(entry);
            if let Some(first) = seen.get(&sig) {
                return Err(schema(
                    shape_name,
                    None,
                    SchemaErrorKind::AmbiguousOverloads {
                        first: first.clone(),
                        second: label,
                        signature: sig.join(", "),
                    },
                ));
            }
            seen.insert(sig, label);
        }
    }
    Ok(())
}

/// Drops nullability and type arguments; function types become `FunctionN`.
pub fn erase_type(ty: &str) -> String {
    let t = ty.trim();
    let t = t.strip_suffix('?').unwrap_or(t).trim();

    if let Some(arity) = function_arity(t) {
        return format!("Function{arity}");
    }
    if let Some(inner) = unwrap_parens(t) {
        return erase_type(inner);
    }

    let mut out = String::with_capacity(t.len());
    let mut depth = 0usize;
    for c in t.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            c if depth == 0 && !c.is_whitespace() => out.push(c),
            _ => {}
        }
    }
    out
}

fn matching_paren(t: &str) -> Option<usize> {
    if !t.starts_with('(') {
        return None;
    }
    let mut depth = 0usize;
    for (i, c) in t.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn function_arity(t: &str) -> Option<usize> {
    let close = matching_paren(t)?;
    if !t[close + 1..].trim_start().starts_with("->") {
        return None;
    }
    let args = t[1..close].trim();
    if args.is_empty() {
        return Some(0);
    }
    let mut depth = 0usize;
    let mut count = 1;
    for c in args.chars() {
        match c {
            '(' | '<' => depth += 1,
            ')' | '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => count += 1,
            _ => {}
        }
    }
    Some(count)
}

fn unwrap_parens(t: &str) -> Option<&str> {
    let close = matching_paren(t)?;
    (close == t.len() - 1).then(|| &t[1..close])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erase_type_strips_generics_and_nullability() {
        assert_eq!(erase_type("List<String>?"), "List");
        assert_eq!(erase_type("Map<String, List<Int>>"), "Map");
        assert_eq!(erase_type(" Int "), "Int");
        assert_eq!(erase_type("kotlin.String?"), "kotlin.String");
    }

    #[test]
    fn erase_type_maps_function_types() {
        assert_eq!(erase_type("(String) -> Unit"), "Function1");
        assert_eq!(erase_type("() -> Unit"), "Function0");
        assert_eq!(erase_type("(Map<A, B>, (Int) -> Unit) -> Int"), "Function2");
        assert_eq!(erase_type("((String) -> Unit)?"), "Function1");
        assert_eq!(erase_type("(Int)"), "Int");
    }

    fn entry(params: &[&str], callback: bool) -> EntryPoint {
        EntryPoint {
            variant: EntryVariant::MandatoryOnly,
            params: params
                .iter()
                .enumerate()
                .map(|(i, ty)| EntryParam {
                    name: format!("p{i}"),
                    ty: ty.to_string(),
                    deprecated: false,
                })
                .collect(),
            callback: callback.then_some(BuilderTier::Optional),
            delegation: Delegation {
                target: DelegationTarget::ConcreteBuilder,
                args: vec![],
                callback: CallbackArg::None,
            },
        }
    }

    #[test]
    fn erased_signature_appends_callback() {
        assert_eq!(
            erased_signature(&entry(&["List<Int>", "String?"], true)),
            vec!["List", "String", "Function1"]
        );
        assert!(erased_signature(&entry(&[], false)).is_empty());
    }

    #[test]
    fn ambiguity_names_both_entries() {
        let overloads = vec![
            VersionOverload {
                version: 1,
                slots: vec![],
                resolved: vec![],
                entries: vec![entry(&["List<Int>"], false)],
            },
            VersionOverload {
                version: 2,
                slots: vec![],
                resolved: vec![],
                entries: vec![entry(&["List<String>"], false)],
            },
        ];
        let err = check_ambiguity("test.Sample", &overloads).unwrap_err();
        assert_eq!(err.code(), "schema.ambiguous_overloads");
        assert!(err.to_string().contains("v1/mandatory_only and v2/mandatory_only"));
    }
}
