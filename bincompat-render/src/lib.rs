//! Rendering helpers (markdown) for human-readable artifacts.

use bincompat_types::plan::{
    ArgValue, BincompatPlan, BuilderSpec, CallbackArg, ConstructionPlan, DelegationTarget,
    EntryPoint, FactoryFunction, FieldRole, HashSpec, IdentitySpec, SetterKind, ShapePlan,
    SlotKind, TierSpec, VersionOverload,
};

pub fn render_plan_md(plan: &BincompatPlan) -> String {
    let mut out = String::new();
    out.push_str("# bincompat plan\n\n");
    out.push_str(&format!(
        "- Shapes: {} planned of {}\n",
        plan.summary.shapes_planned, plan.summary.shapes_total
    ));
    out.push_str(&format!("- Units: {}\n", plan.summary.units));
    out.push_str(&format!("- Overloads: {}\n", plan.summary.overloads));
    out.push_str(&format!("- Entry points: {}\n", plan.summary.entry_points));
    out.push_str(&format!("- Failures: {}\n", plan.summary.failures));
    out.push_str(&format!(
        "- Style: `{}`\n",
        plan.config.construction_style.as_str()
    ));

    let unreadable: Vec<_> = plan.inputs.iter().filter(|i| i.error.is_some()).collect();
    out.push_str(&format!(
        "- Inputs: {} ({} unreadable)\n\n",
        plan.inputs.len(),
        unreadable.len()
    ));

    if !unreadable.is_empty() {
        out.push_str("## Unreadable inputs\n\n");
        for input in unreadable {
            out.push_str(&format!(
                "- `{}`: {}\n",
                input.path,
                input.error.as_deref().unwrap_or_default()
            ));
        }
        out.push('\n');
    }

    if !plan.failures.is_empty() {
        out.push_str("## Failures\n\n");
        for f in &plan.failures {
            let field = f
                .field
                .as_ref()
                .map(|f| format!(".{f}"))
                .unwrap_or_default();
            out.push_str(&format!(
                "- `{}` `{}{}`: {}\n",
                f.code, f.shape, field, f.message
            ));
        }
        out.push('\n');
    }

    out.push_str("## Units\n\n");
    if plan.units.is_empty() {
        out.push_str("_No units planned._\n");
        return out;
    }

    for (i, unit) in plan.units.iter().enumerate() {
        out.push_str(&format!("### {}. {}\n\n", i + 1, unit.qualified_name));
        if !unit.imports.is_empty() {
            out.push_str(&format!("- Imports: {}\n", code_list(&unit.imports)));
        }
        if !unit.shared_statics.is_empty() {
            out.push_str("- Factory functions:\n");
            for factory in &unit.shared_statics {
                out.push_str(&format!("  - {}\n", factory_signature(factory)));
            }
        }
        out.push('\n');

        render_shape_body(&mut out, &unit.shape, "####");
        for child in &unit.children {
            out.push_str(&format!("#### {}\n\n", child.qualified_name));
            render_shape_body(&mut out, child, "#####");
        }
    }

    out
}

/// Everything known about one shape, for `bincompat explain`.
pub fn render_shape_md(shape: &ShapePlan) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", shape.qualified_name));
    render_shape_body(&mut out, shape, "##");
    out
}

/// Markdown table of the overloads, oldest first.
pub fn render_version_table(construction: &ConstructionPlan) -> String {
    let mut out = String::new();
    out.push_str("| Version | Parameters | Passes |\n");
    out.push_str("|---|---|---|\n");
    for overload in &construction.overloads {
        out.push_str(&format!(
            "| {} | {} | ({}) |\n",
            overload.version,
            overload_params(overload),
            overload_call(overload)
        ));
    }
    out
}

fn render_shape_body(out: &mut String, shape: &ShapePlan, heading: &str) {
    out.push_str(&format!("- Declared: `{}`\n", shape.declared_name));
    out.push_str(&format!("- Version: {}\n", shape.version));
    out.push_str(&format!("- Fingerprint: `{}`\n", short(&shape.fingerprint)));
    if !shape.interfaces.is_empty() {
        out.push_str(&format!("- Implements: {}\n", code_list(&shape.interfaces)));
    }
    if let Some(doc) = &shape.doc {
        out.push_str(&format!("\n{}\n", doc));
    }
    out.push('\n');

    let Some(construction) = &shape.construction else {
        out.push_str("_Sealed parent: no construction of its own._\n\n");
        return;
    };

    out.push_str(&format!("{heading} Fields\n\n"));
    out.push_str("| Field | Type | Mutability | Role | Equality |\n");
    out.push_str("|---|---|---|---|---|\n");
    for f in &shape.fields {
        out.push_str(&format!(
            "| `{}` | `{}` | {} | {} | {} |\n",
            f.name,
            f.ty,
            f.mutability.as_str(),
            role_label(&f.role),
            if f.equality { "yes" } else { "excluded" }
        ));
    }
    out.push('\n');

    out.push_str(&format!(
        "{heading} Versions (`{}`)\n\n",
        construction.style.as_str()
    ));
    out.push_str(&render_version_table(construction));
    out.push('\n');

    out.push_str(&format!("{heading} Entry points\n\n"));
    for (overload, entry) in construction.entry_points() {
        out.push_str(&format!(
            "- v{} {}\n",
            overload.version,
            entry_signature(entry)
        ));
    }
    if let Some(factory) = &construction.factory {
        out.push_str(&format!("- factory {}\n", factory_signature(factory)));
    }
    out.push('\n');

    if let Some(builder) = &shape.builder {
        out.push_str(&format!("{heading} Builder\n\n"));
        render_builder(out, builder);
        out.push('\n');
    }

    if let Some(identity) = &shape.identity {
        out.push_str(&format!("{heading} Identity\n\n"));
        render_identity(out, identity);
        out.push('\n');
    }
}

fn render_builder(out: &mut String, builder: &BuilderSpec) {
    if let Some(optional) = &builder.optional {
        out.push_str(&tier_line(optional));
    }
    out.push_str(&tier_line(&builder.full));

    let params: Vec<String> = builder
        .concrete
        .constructor_params
        .iter()
        .map(|p| format!("{}: {}", p.name, p.ty))
        .collect();
    out.push_str(&format!(
        "- `BuilderImpl({})`{}\n",
        params.join(", "),
        if builder.concrete.public_no_arg {
            ", public no-arg constructor"
        } else {
            ""
        }
    ));
}

fn tier_line(tier: &TierSpec) -> String {
    let extends = tier
        .extends
        .map(|t| format!(" extends `{}`", t.type_name()))
        .unwrap_or_default();
    let props: Vec<String> = tier
        .properties
        .iter()
        .map(|p| {
            let mark = match p.setter {
                SetterKind::Live => "",
                SetterKind::Inert => " (inert)",
                SetterKind::None => " (read-only)",
            };
            format!("`{}`{}", p.name, mark)
        })
        .collect();
    format!(
        "- `{}`{}: {}\n",
        tier.tier.type_name(),
        extends,
        if props.is_empty() {
            "_none_".to_string()
        } else {
            props.join(", ")
        }
    )
}

fn render_identity(out: &mut String, identity: &IdentitySpec) {
    out.push_str(&format!(
        "- equals: {}\n",
        if identity.equality.is_empty() {
            "type only".to_string()
        } else {
            code_list(&identity.equality)
        }
    ));
    let hash = match &identity.hash {
        HashSpec::Fields { fields } => code_list(fields),
        HashSpec::TypeMarker { type_name } => format!("type marker `{type_name}`"),
    };
    out.push_str(&format!("- hashCode: {}\n", hash));
    out.push_str(&format!(
        "- toString: `{}({})`\n",
        identity.display.type_name,
        identity.display.fields.join(", ")
    ));
}

fn overload_params(overload: &VersionOverload) -> String {
    let params: Vec<String> = overload
        .params()
        .map(|s| match s.kind {
            SlotKind::Deprecated { .. } => format!("`{}` (deprecated)", s.field),
            _ => format!("`{}`", s.field),
        })
        .collect();
    if params.is_empty() {
        "_none_".to_string()
    } else {
        params.join(", ")
    }
}

fn overload_call(overload: &VersionOverload) -> String {
    overload
        .slots
        .iter()
        .map(|s| s.kind.literal().unwrap_or(s.field.as_str()).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn entry_signature(entry: &EntryPoint) -> String {
    let mut params: Vec<String> = entry
        .params
        .iter()
        .map(|p| {
            let deprecated = if p.deprecated { " (deprecated)" } else { "" };
            format!("{}: {}{}", p.name, p.ty, deprecated)
        })
        .collect();
    if let Some(tier) = entry.callback {
        params.push(format!("init: {}.() -> Unit", tier.type_name()));
    }

    let target = match entry.delegation.target {
        DelegationTarget::Overload { version, variant } => {
            format!("v{} `{}`", version, variant.as_str())
        }
        DelegationTarget::ConcreteBuilder => "`BuilderImpl`".to_string(),
    };
    let callback = match entry.delegation.callback {
        CallbackArg::None => "",
        CallbackArg::Forward => " + callback",
        CallbackArg::Empty => " + empty callback",
    };

    format!(
        "`{}`({}) -> {}({}){}",
        entry.variant.as_str(),
        params.join(", "),
        target,
        args_list(&entry.delegation.args),
        callback
    )
}

fn factory_signature(factory: &FactoryFunction) -> String {
    let params: Vec<String> = factory
        .params
        .iter()
        .map(|p| format!("{}: {}", p.name, p.ty))
        .chain(std::iter::once(format!(
            "init: {}.() -> Unit",
            factory.callback.type_name()
        )))
        .collect();
    format!(
        "`{}({})` builds `{}`",
        factory.name,
        params.join(", "),
        factory.owner
    )
}

fn args_list(args: &[ArgValue]) -> String {
    args.iter()
        .map(|a| match a {
            ArgValue::Param { name } => name.as_str(),
            ArgValue::Literal { literal } => literal.as_str(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn role_label(role: &FieldRole) -> String {
    match role {
        FieldRole::Required => "required".to_string(),
        FieldRole::RequiredSince {
            version,
            previous_default,
        } => format!("required since v{version} (was `{previous_default}`)"),
        FieldRole::Optional { default } => format!("optional (`{default}`)"),
        FieldRole::Frozen { literal } => format!("frozen (`{literal}`)"),
        FieldRole::FrozenRecently { literal } => format!("recently frozen (`{literal}`)"),
    }
}

fn code_list(items: &[String]) -> String {
    items
        .iter()
        .map(|i| format!("`{i}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn short(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bincompat_types::config::{ConstructionStyle, PlannerConfig};
    use bincompat_types::plan::{
        BuilderBackedConstructor, CopyPlan, Delegation, EntryParam, EntryVariant, ParamSlot,
        PlanFailure, PlanInput, PrimaryConstructor, ToolInfo,
    };
    use bincompat_types::plan::{BuilderTier, ErrorFamily};
    use pretty_assertions::assert_eq;

    fn slot(field: &str, kind: SlotKind) -> ParamSlot {
        ParamSlot {
            field: field.to_string(),
            ty: "String".to_string(),
            kind,
        }
    }

    fn entry(params: &[&str], target: DelegationTarget) -> EntryPoint {
        EntryPoint {
            variant: EntryVariant::WithOptionalCallback,
            params: params
                .iter()
                .map(|p| EntryParam {
                    name: p.to_string(),
                    ty: "String".to_string(),
                    deprecated: false,
                })
                .collect(),
            callback: Some(BuilderTier::Optional),
            delegation: Delegation {
                target,
                args: params
                    .iter()
                    .map(|p| ArgValue::Param {
                        name: p.to_string(),
                    })
                    .collect(),
                callback: CallbackArg::Forward,
            },
        }
    }

    fn construction() -> ConstructionPlan {
        ConstructionPlan {
            style: ConstructionStyle::Callback,
            overloads: vec![
                VersionOverload {
                    version: 1,
                    slots: vec![
                        slot("a", SlotKind::Param),
                        slot(
                            "c",
                            SlotKind::Defaulted {
                                literal: "0".to_string(),
                            },
                        ),
                    ],
                    resolved: vec![],
                    entries: vec![entry(
                        &["a"],
                        DelegationTarget::Overload {
                            version: 3,
                            variant: EntryVariant::WithOptionalCallback,
                        },
                    )],
                },
                VersionOverload {
                    version: 3,
                    slots: vec![slot("a", SlotKind::Param), slot("c", SlotKind::Param)],
                    resolved: vec![],
                    entries: vec![entry(&["a", "c"], DelegationTarget::ConcreteBuilder)],
                },
            ],
            primary: PrimaryConstructor {
                params: vec![],
                marker: "builderMarker".to_string(),
            },
            from_builder: BuilderBackedConstructor {
                assignments: vec![],
            },
            copy: CopyPlan {
                builder_args: vec![],
                setters: vec![],
                callback: BuilderTier::Full,
            },
            factory: None,
        }
    }

    #[test]
    fn version_table_lists_parameters_and_passed_values() {
        assert_eq!(
            render_version_table(&construction()),
            "| Version | Parameters | Passes |\n\
             |---|---|---|\n\
             | 1 | `a` | (a, 0) |\n\
             | 3 | `a`, `c` | (a, c) |\n"
        );
    }

    #[test]
    fn entry_signature_shows_delegation_target() {
        let c = construction();
        let oldest = entry_signature(&c.overloads[0].entries[0]);
        assert_eq!(
            oldest,
            "`with_optional_callback`(a: String, init: OptionalPropertiesBuilder.() -> Unit) \
             -> v3 `with_optional_callback`(a) + callback"
        );
        let newest = entry_signature(&c.overloads[1].entries[0]);
        assert!(newest.contains("-> `BuilderImpl`(a, c)"));
    }

    #[test]
    fn empty_plan_renders_placeholder() {
        let tool = ToolInfo {
            name: "bincompat".to_string(),
            version: None,
        };
        let mut plan = BincompatPlan::new(tool, PlannerConfig::default());
        plan.inputs.push(PlanInput {
            path: "broken.json".to_string(),
            shapes: 0,
            error: Some("json parse error: eof".to_string()),
        });
        plan.failures.push(PlanFailure {
            shape: "com.acme.BadDBC".to_string(),
            family: ErrorFamily::Schema,
            code: "schema.duplicate_field".to_string(),
            field: Some("x".to_string()),
            message: "field name is declared more than once".to_string(),
        });

        let md = render_plan_md(&plan);
        assert!(md.starts_with("# bincompat plan\n"));
        assert!(md.contains("- Inputs: 1 (1 unreadable)"));
        assert!(md.contains("- `broken.json`: json parse error: eof"));
        assert!(md.contains(
            "- `schema.duplicate_field` `com.acme.BadDBC.x`: field name is declared more than once"
        ));
        assert!(md.ends_with("_No units planned._\n"));
    }

    #[test]
    fn role_labels_are_readable() {
        assert_eq!(role_label(&FieldRole::Required), "required");
        assert_eq!(
            role_label(&FieldRole::RequiredSince {
                version: 3,
                previous_default: "0".to_string()
            }),
            "required since v3 (was `0`)"
        );
        assert_eq!(short("abcdef0123456789"), "abcdef012345");
        assert_eq!(short("abc"), "abc");
    }
}
