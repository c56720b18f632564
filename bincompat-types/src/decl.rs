//! Declaration documents: already-extracted shape declarations, as read from disk.
//!
//! Declarations are intentionally loose. Every contradiction is reported by the
//! normalizer in `bincompat-domain`, never rejected at parse time.

use crate::model::Mutability;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeclDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default)]
    pub shapes: Vec<ShapeDecl>,
}

/// Kind of the declaration the marker was attached to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    #[default]
    Interface,
    Class,
    Object,
    Enum,
}

impl DeclKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeclKind::Interface => "interface",
            DeclKind::Class => "class",
            DeclKind::Object => "object",
            DeclKind::Enum => "enum",
        }
    }
}

/// Which marker the declaration carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclMarker {
    #[default]
    DataClass,
    SealedParent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeDecl {
    /// Simple declared name, e.g. `PersonDBC`.
    pub name: String,

    #[serde(default)]
    pub package: String,

    #[serde(default)]
    pub kind: DeclKind,

    #[serde(default)]
    pub marker: DeclMarker,

    /// Overrides the suffix-derived output name when non-empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_name: Option<String>,

    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_parameters: Vec<String>,

    /// Qualified declared name of the enclosing declaration, if nested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,

    #[serde(default)]
    pub fields: Vec<FieldDecl>,
}

fn default_version() -> u32 {
    1
}

impl ShapeDecl {
    pub fn qualified_name(&self) -> String {
        qualify(&self.package, &self.name)
    }
}

/// Joins a package and a simple name, tolerating the root package.
pub fn qualify(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{package}.{name}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: String,

    #[serde(default)]
    pub nullable: bool,

    #[serde(default)]
    pub mutability: Mutability,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultDecl>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_required: Option<NewRequiredDecl>,

    #[serde(default)]
    pub exclude_from_equality: bool,

    #[serde(default)]
    pub overrides: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

/// A default value as declared: a raw expression or a plain string value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultDecl {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub raw: String,

    /// Quoted into a string literal when `raw` is empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub string: String,
}

impl DefaultDecl {
    pub fn raw(expr: impl Into<String>) -> Self {
        Self {
            raw: expr.into(),
            string: String::new(),
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self {
            raw: String::new(),
            string: value.into(),
        }
    }

    /// Resolves the literal; `None` when both forms are empty.
    pub fn literal(&self) -> Option<String> {
        if !self.raw.is_empty() {
            Some(self.raw.clone())
        } else if !self.string.is_empty() {
            Some(format!("\"{}\"", self.string))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRequiredDecl {
    /// Signed so that nonsense input is reported instead of failing to parse.
    pub since_version: i64,

    #[serde(default)]
    pub previously_optional: bool,

    #[serde(default)]
    pub default: DefaultDecl,
}
