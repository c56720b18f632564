//! Normalized field schema model.
//!
//! A [`Schema`] is built once from declarations and then only read. Shapes live
//! in an arena and refer to each other through [`ShapeId`] indexes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutability {
    #[default]
    Mutable,
    Immutable,
    /// Frozen now, was mutable. Keeps inert setters and parameters.
    ImmutableRecently,
}

impl Mutability {
    pub fn as_str(self) -> &'static str {
        match self {
            Mutability::Mutable => "mutable",
            Mutability::Immutable => "immutable",
            Mutability::ImmutableRecently => "immutable_recently",
        }
    }
}

/// Opaque literal used when a field is not supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultValueSpec {
    pub literal: String,
}

impl DefaultValueSpec {
    pub fn new(literal: impl Into<String>) -> Self {
        Self {
            literal: literal.into(),
        }
    }
}

/// Marks a field that became mandatory after version 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRequirement {
    pub since_version: u32,
    pub previously_optional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: String,
    pub nullable: bool,
    pub mutability: Mutability,

    /// For a field with a requirement this is the requirement's own default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValueSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement: Option<VersionRequirement>,

    pub equality: bool,
    pub overrides: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl Field {
    pub fn literal(&self) -> Option<&str> {
        self.default.as_ref().map(|d| d.literal.as_str())
    }

    /// Declared type with its nullability marker.
    pub fn type_name(&self) -> String {
        if self.nullable && !self.ty.ends_with('?') {
            format!("{}?", self.ty)
        } else {
            self.ty.clone()
        }
    }

    /// Version from which callers must supply the field. `None` means never.
    pub fn mandatory_since(&self) -> Option<u32> {
        match (&self.default, &self.requirement) {
            (None, _) => Some(1),
            (Some(_), Some(req)) => Some(req.since_version),
            (Some(_), None) => None,
        }
    }

    /// Watermark the field contributes to; optional fields count as version 1.
    pub fn watermark(&self) -> u32 {
        self.mandatory_since().unwrap_or(1)
    }

    /// Takes part in the versioned constructor overloads.
    pub fn is_constructor_relevant(&self) -> bool {
        self.mutability != Mutability::Immutable && self.is_builder_constructor_param()
    }

    /// Must be handed to the concrete builder's constructor when it has storage.
    pub fn is_builder_constructor_param(&self) -> bool {
        self.default.is_none()
            || self.requirement.is_some()
            || self.mutability == Mutability::ImmutableRecently
    }

    /// Has storage in the concrete builder.
    pub fn has_builder_storage(&self) -> bool {
        self.mutability != Mutability::Immutable
    }

    /// Exposed on the optional-properties builder tier.
    pub fn is_optional_tier(&self) -> bool {
        self.mutability != Mutability::Immutable
            && self.default.is_some()
            && self
                .requirement
                .map(|req| req.previously_optional)
                .unwrap_or(true)
    }

    /// A setter exists on the builder tiers.
    pub fn is_settable(&self) -> bool {
        matches!(
            self.mutability,
            Mutability::Mutable | Mutability::ImmutableRecently
        )
    }

    /// The setter exists but discards its argument.
    pub fn has_inert_setter(&self) -> bool {
        self.mutability == Mutability::ImmutableRecently
    }

    /// Stored value is always the default literal.
    pub fn is_frozen(&self) -> bool {
        self.mutability != Mutability::Mutable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(pub usize);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    #[default]
    Plain,
    SealedParent,
}

/// Link from a nested shape to its enclosing sealed parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentLink {
    /// Qualified declared name of the parent.
    pub declared: String,

    /// Arena index, when the parent normalized successfully.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ShapeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    pub id: ShapeId,
    pub kind: ShapeKind,
    pub declared_name: String,
    pub declared_package: String,
    pub output_name: String,
    pub output_package: String,
    pub version: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentLink>,

    pub fields: Vec<Field>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl Shape {
    pub fn declared_qualified_name(&self) -> String {
        crate::decl::qualify(&self.declared_package, &self.declared_name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_optional_tier(&self) -> bool {
        self.fields.iter().any(Field::is_optional_tier)
    }
}

/// Arena of normalized shapes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    shapes: Vec<Shape>,
}

impl Schema {
    /// Appends a shape, assigning its id from its arena position.
    pub fn push(&mut self, mut shape: Shape) -> ShapeId {
        let id = ShapeId(self.shapes.len());
        shape.id = id;
        self.shapes.push(shape);
        id
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(id.0)
    }

    pub fn get_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn find_declared(&self, qualified: &str) -> Option<&Shape> {
        self.shapes
            .iter()
            .find(|s| s.declared_qualified_name() == qualified)
    }

    pub fn children_of(&self, parent: ShapeId) -> impl Iterator<Item = &Shape> {
        self.shapes
            .iter()
            .filter(move |s| s.parent.as_ref().and_then(|p| p.id) == Some(parent))
    }
}
