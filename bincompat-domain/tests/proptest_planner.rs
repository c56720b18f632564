//! Property-based tests for the constructor version planner.
//!
//! These tests verify that, for arbitrary valid field schemas:
//! - one overload exists per distinct watermark
//! - the oldest overload takes exactly the version-1 parameters
//! - frozen fields never become parameters and always hold their literal
//! - the newest overload stores supplied parameters and callback values
//! - equality ignores excluded fields and is reflexive and symmetric

use bincompat_domain::{Instance, Interpreter, SetCall, assemble};
use bincompat_types::config::{ConstructionStyle, PlannerConfig};
use bincompat_types::decl::ShapeDecl;
use bincompat_types::plan::{ShapePlan, SlotKind};
use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
struct FieldSpec {
    name: String,
    mutability: &'static str,
    since: Option<u32>,
    has_default: bool,
    equality: bool,
}

impl FieldSpec {
    fn literal(&self) -> String {
        format!("d_{}", self.name)
    }

    fn is_immutable(&self) -> bool {
        self.mutability == "immutable"
    }

    fn is_frozen(&self) -> bool {
        self.mutability != "mutable"
    }

    /// Ends up with a default literal after normalization.
    fn defaulted(&self) -> bool {
        self.since.is_some() || self.has_default || self.is_frozen()
    }

    /// Exposed on the optional-properties builder tier.
    fn optional_tier(&self) -> bool {
        !self.is_immutable() && self.defaulted() && self.since.is_none()
    }

    fn constructor_relevant(&self) -> bool {
        !self.is_immutable()
            && (!self.defaulted() || self.since.is_some() || self.mutability == "immutable_recently")
    }
}

fn arb_fields() -> impl Strategy<Value = Vec<FieldSpec>> {
    prop::collection::vec(
        (0usize..3, prop::option::of(2u32..6), any::<bool>(), any::<bool>()),
        0..8,
    )
    .prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, (m, since, has_default, equality))| FieldSpec {
                name: format!("f{i}"),
                mutability: ["mutable", "immutable", "immutable_recently"][m],
                since,
                has_default,
                equality,
            })
            .collect()
    })
}

fn to_decl(fields: &[FieldSpec]) -> ShapeDecl {
    let fields: Vec<serde_json::Value> = fields
        .iter()
        .map(|f| {
            let mut v = json!({
                "name": f.name,
                "type": "String",
                "mutability": f.mutability,
                "exclude_from_equality": !f.equality,
            });
            if let Some(since) = f.since {
                v["new_required"] = json!({
                    "since_version": since,
                    "default": { "raw": f.literal() }
                });
            } else if f.defaulted() {
                v["default"] = json!({ "raw": f.literal() });
            }
            v
        })
        .collect();
    serde_json::from_value(json!({
        "name": "GenDBC",
        "package": "prop",
        "fields": fields
    }))
    .expect("valid declaration")
}

fn plan(fields: &[FieldSpec], style: ConstructionStyle) -> ShapePlan {
    let cfg = PlannerConfig {
        construction_style: style,
        ..PlannerConfig::default()
    };
    let assembly = assemble(&[to_decl(fields)], &cfg);
    assert!(assembly.failures.is_empty(), "{:?}", assembly.failures);
    assembly.units[0].shape.clone()
}

fn arb_style() -> impl Strategy<Value = ConstructionStyle> {
    prop_oneof![
        Just(ConstructionStyle::Callback),
        Just(ConstructionStyle::Overload)
    ]
}

fn callback_value(name: &str) -> String {
    format!("cb_{name}")
}

/// Calls the newest overload, setting every optional-tier property through
/// its callback when the entry takes one.
fn newest_instance(shape: &ShapePlan) -> Instance {
    let interp = Interpreter::new(shape).unwrap();
    let construction = shape.construction.as_ref().unwrap();
    let newest = construction.newest().unwrap();
    let entry = newest
        .entries
        .iter()
        .find(|e| e.callback.is_some())
        .unwrap_or(&newest.entries[0]);
    let args: Vec<String> = entry.params.iter().map(|p| format!("v_{}", p.name)).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let callback: Vec<SetCall> = match entry.callback {
        Some(_) => optional_tier(shape)
            .into_iter()
            .map(|name| SetCall::new(name, callback_value(name)))
            .collect(),
        None => vec![],
    };
    interp
        .invoke(newest.version, entry.variant, &args, &callback)
        .unwrap()
}

fn optional_tier(shape: &ShapePlan) -> Vec<&str> {
    shape
        .builder
        .as_ref()
        .unwrap()
        .optional
        .iter()
        .flat_map(|t| t.properties.iter())
        .map(|p| p.name.as_str())
        .collect()
}

proptest! {
    #[test]
    fn one_overload_per_watermark(fields in arb_fields(), style in arb_style()) {
        let shape = plan(&fields, style);
        let construction = shape.construction.as_ref().unwrap();

        let mut expected: BTreeSet<u32> = BTreeSet::from([1]);
        expected.extend(
            fields
                .iter()
                .filter(|f| f.constructor_relevant())
                .filter_map(|f| f.since),
        );
        let actual: Vec<u32> = construction.overloads.iter().map(|o| o.version).collect();
        prop_assert_eq!(actual, expected.into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn oldest_overload_takes_version_one_fields(fields in arb_fields(), style in arb_style()) {
        let shape = plan(&fields, style);
        let oldest = &shape.construction.as_ref().unwrap().overloads[0];

        let params: Vec<&str> = oldest.params().map(|s| s.field.as_str()).collect();
        let expected: Vec<&str> = fields
            .iter()
            .filter(|f| f.constructor_relevant() && f.since.is_none())
            .map(|f| f.name.as_str())
            .collect();
        prop_assert_eq!(params, expected);
    }

    #[test]
    fn immutable_fields_are_never_parameters(fields in arb_fields(), style in arb_style()) {
        let shape = plan(&fields, style);
        let immutable: BTreeSet<&str> = fields
            .iter()
            .filter(|f| f.is_immutable())
            .map(|f| f.name.as_str())
            .collect();
        let construction = shape.construction.as_ref().unwrap();
        for overload in &construction.overloads {
            for slot in &overload.slots {
                prop_assert!(!immutable.contains(slot.field.as_str()));
            }
            for entry in &overload.entries {
                for param in &entry.params {
                    prop_assert!(!immutable.contains(param.name.as_str()));
                }
            }
        }
    }

    #[test]
    fn newest_overload_round_trips_supplied_values(fields in arb_fields()) {
        for style in [ConstructionStyle::Callback, ConstructionStyle::Overload] {
            let shape = plan(&fields, style);
            let expected_tier: Vec<&str> = fields
                .iter()
                .filter(|f| f.optional_tier())
                .map(|f| f.name.as_str())
                .collect();
            prop_assert_eq!(optional_tier(&shape), expected_tier);

            let instance = newest_instance(&shape);
            for f in &fields {
                let expected = if f.is_frozen() {
                    f.literal()
                } else if f.optional_tier() {
                    callback_value(&f.name)
                } else if f.constructor_relevant() {
                    format!("v_{}", f.name)
                } else {
                    f.literal()
                };
                prop_assert_eq!(instance.get(&f.name), Some(expected.as_str()), "{:?}", style);
            }
        }
    }

    #[test]
    fn deprecated_slots_only_hold_recently_frozen_fields(fields in arb_fields()) {
        let shape = plan(&fields, ConstructionStyle::Overload);
        let construction = shape.construction.as_ref().unwrap();
        let newest = construction.newest().unwrap().version;
        for overload in &construction.overloads {
            for slot in &overload.slots {
                if let SlotKind::Deprecated { .. } = slot.kind {
                    prop_assert!(overload.version != newest);
                    let spec = fields.iter().find(|f| f.name == slot.field).unwrap();
                    prop_assert_eq!(spec.mutability, "immutable_recently");
                }
            }
        }
    }

    #[test]
    fn equality_ignores_excluded_fields(fields in arb_fields()) {
        let shape = plan(&fields, ConstructionStyle::Callback);
        let interp = Interpreter::new(&shape).unwrap();
        let a = newest_instance(&shape);

        let mut b = a.clone();
        for (name, value) in b.values.iter_mut() {
            let spec = fields.iter().find(|f| f.name == *name).unwrap();
            if !spec.equality {
                value.push_str("_changed");
            }
        }

        prop_assert!(interp.equals(&a, &a));
        prop_assert!(interp.equals(&a, &b));
        prop_assert!(interp.equals(&b, &a));
        prop_assert_eq!(interp.hash(&a), interp.hash(&b));
    }

    #[test]
    fn planning_is_deterministic(fields in arb_fields(), style in arb_style()) {
        let first = serde_json::to_string(&plan(&fields, style)).unwrap();
        let second = serde_json::to_string(&plan(&fields, style)).unwrap();
        prop_assert_eq!(first, second);
    }
}
