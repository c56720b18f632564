use bincompat_types::model::Shape;
use bincompat_types::plan::{DisplaySpec, HashSpec, IdentitySpec};

/// Equality and hash over participating fields; display over every field.
pub fn synthesize_identity(shape: &Shape, type_name: &str) -> IdentitySpec {
    let equality: Vec<String> = shape
        .fields
        .iter()
        .filter(|f| f.equality)
        .map(|f| f.name.clone())
        .collect();

    let hash = if equality.is_empty() {
        HashSpec::TypeMarker {
            type_name: type_name.to_string(),
        }
    } else {
        HashSpec::Fields {
            fields: equality.clone(),
        }
    };

    IdentitySpec {
        equality,
        hash,
        display: DisplaySpec {
            type_name: shape.output_name.clone(),
            fields: shape.fields.iter().map(|f| f.name.clone()).collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bincompat_types::model::{Field, Mutability, ShapeId, ShapeKind};

    fn shape(fields: Vec<(&str, bool)>) -> Shape {
        Shape {
            id: ShapeId(0),
            kind: ShapeKind::Plain,
            declared_name: "PointDBC".to_string(),
            declared_package: "geo".to_string(),
            output_name: "Point".to_string(),
            output_package: "geo".to_string(),
            version: 1,
            parent: None,
            fields: fields
                .into_iter()
                .map(|(name, equality)| Field {
                    name: name.to_string(),
                    ty: "Int".to_string(),
                    nullable: false,
                    mutability: Mutability::Mutable,
                    default: None,
                    requirement: None,
                    equality,
                    overrides: false,
                    doc: None,
                })
                .collect(),
            interfaces: vec![],
            annotations: vec![],
            imports: vec![],
            doc: None,
        }
    }

    #[test]
    fn excluded_fields_only_appear_in_display() {
        let spec = synthesize_identity(&shape(vec![("x", true), ("cache", false)]), "geo.Point");
        assert_eq!(spec.equality, vec!["x"]);
        assert_eq!(
            spec.hash,
            HashSpec::Fields {
                fields: vec!["x".to_string()]
            }
        );
        assert_eq!(spec.display.fields, vec!["x", "cache"]);
        assert_eq!(spec.display.type_name, "Point");
    }

    #[test]
    fn hash_falls_back_to_type_marker() {
        let spec = synthesize_identity(&shape(vec![]), "geo.Point");
        assert!(spec.equality.is_empty());
        assert_eq!(
            spec.hash,
            HashSpec::TypeMarker {
                type_name: "geo.Point".to_string()
            }
        );
    }
}
