//! Shape lookup for the `bincompat explain` command.
//!
//! A shape is matched by output qualified name, declared qualified name or
//! simple output name. Shapes that failed to plan are matched against the
//! failures instead, so the user sees why nothing was planned.

use bincompat_render::render_shape_md;
use bincompat_types::plan::{BincompatPlan, PlanFailure, ShapePlan};

#[derive(Debug)]
pub enum Lookup<'a> {
    Planned(&'a ShapePlan),
    Failed(Vec<&'a PlanFailure>),
    Unknown,
}

pub fn lookup_shape<'a>(plan: &'a BincompatPlan, name: &str) -> Lookup<'a> {
    if let Some(shape) = plan.find_shape(name) {
        return Lookup::Planned(shape);
    }

    let suffix = format!(".{name}");
    let failures: Vec<&PlanFailure> = plan
        .failures
        .iter()
        .filter(|f| f.shape == name || f.shape.ends_with(&suffix))
        .collect();
    if failures.is_empty() {
        Lookup::Unknown
    } else {
        Lookup::Failed(failures)
    }
}

pub fn explain_planned(shape: &ShapePlan) -> String {
    render_shape_md(shape)
}

pub fn explain_failed(name: &str, failures: &[&PlanFailure]) -> String {
    let mut out = format!("# {name}\n\nNot planned:\n\n");
    for f in failures {
        out.push_str(&format!("- `{}`: {}\n", f.code, f.message));
    }
    out
}

/// Every name `lookup_shape` would find, sorted.
pub fn known_shapes(plan: &BincompatPlan) -> Vec<&str> {
    let mut names: Vec<&str> = plan
        .shape_plans()
        .map(|s| s.qualified_name.as_str())
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use bincompat_types::config::PlannerConfig;
    use bincompat_types::model::ShapeKind;
    use bincompat_types::plan::{ErrorFamily, OutputUnit, ToolInfo};

    fn shape(declared: &str, qualified: &str, name: &str) -> ShapePlan {
        ShapePlan {
            declared_name: declared.to_string(),
            name: name.to_string(),
            qualified_name: qualified.to_string(),
            kind: ShapeKind::Plain,
            version: 1,
            fingerprint: "0".repeat(64),
            fields: vec![],
            interfaces: vec![],
            annotations: vec![],
            doc: None,
            construction: None,
            builder: None,
            identity: None,
        }
    }

    fn plan() -> BincompatPlan {
        let tool = ToolInfo {
            name: "bincompat".to_string(),
            version: None,
        };
        let mut plan = BincompatPlan::new(tool, PlannerConfig::default());
        plan.units.push(OutputUnit {
            qualified_name: "com.acme.Person".to_string(),
            package: "com.acme".to_string(),
            shape: shape("com.acme.PersonDBC", "com.acme.Person", "Person"),
            children: vec![],
            shared_statics: vec![],
            imports: vec![],
        });
        plan.failures.push(PlanFailure {
            shape: "com.acme.BadDBC".to_string(),
            family: ErrorFamily::Schema,
            code: "schema.duplicate_field".to_string(),
            field: Some("x".to_string()),
            message: "field name is declared more than once".to_string(),
        });
        plan
    }

    #[test]
    fn finds_planned_shapes_by_any_name() {
        let plan = plan();
        for name in ["com.acme.Person", "com.acme.PersonDBC", "Person"] {
            assert!(matches!(lookup_shape(&plan, name), Lookup::Planned(_)), "{name}");
        }
    }

    #[test]
    fn finds_failed_shapes_by_declared_name() {
        let plan = plan();
        let Lookup::Failed(failures) = lookup_shape(&plan, "BadDBC") else {
            panic!("expected failures");
        };
        let text = explain_failed("BadDBC", &failures);
        assert!(text.contains("`schema.duplicate_field`"));
    }

    #[test]
    fn unknown_names_are_unknown() {
        let plan = plan();
        assert!(matches!(lookup_shape(&plan, "Nope"), Lookup::Unknown));
        assert_eq!(known_shapes(&plan), vec!["com.acme.Person"]);
    }
}
