use crate::config::{ConstructionStyle, PlannerConfig};
use crate::model::{Mutability, ShapeKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BincompatPlan {
    pub schema: String,
    pub tool: ToolInfo,

    /// Deterministic id derived from the planned content.
    #[serde(default)]
    pub plan_id: String,

    pub config: PlannerConfig,

    #[serde(default)]
    pub inputs: Vec<PlanInput>,

    #[serde(default)]
    pub units: Vec<OutputUnit>,

    #[serde(default)]
    pub failures: Vec<PlanFailure>,

    #[serde(default)]
    pub summary: PlanSummary,
}

impl BincompatPlan {
    pub fn new(tool: ToolInfo, config: PlannerConfig) -> Self {
        Self {
            schema: crate::schema::BINCOMPAT_PLAN_V1.to_string(),
            tool,
            plan_id: String::new(),
            config,
            inputs: vec![],
            units: vec![],
            failures: vec![],
            summary: PlanSummary::default(),
        }
    }

    /// Every shape plan, parents first, in unit order.
    pub fn shape_plans(&self) -> impl Iterator<Item = &ShapePlan> {
        self.units
            .iter()
            .flat_map(|u| std::iter::once(&u.shape).chain(u.children.iter()))
    }

    /// Looks a shape up by output qualified name, declared name or simple name.
    pub fn find_shape(&self, name: &str) -> Option<&ShapePlan> {
        self.shape_plans()
            .find(|s| s.qualified_name == name || s.declared_name == name)
            .or_else(|| self.shape_plans().find(|s| s.name == name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanInput {
    pub path: String,

    #[serde(default)]
    pub shapes: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub shapes_total: u64,
    pub shapes_planned: u64,
    pub units: u64,
    pub overloads: u64,
    pub entry_points: u64,
    pub failures: u64,
}

/// One assembled output: a standalone shape or a sealed family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputUnit {
    pub qualified_name: String,
    pub package: String,
    pub shape: ShapePlan,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ShapePlan>,

    /// Child factory functions re-homed onto the parent.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_statics: Vec<FactoryFunction>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapePlan {
    /// Qualified declared name.
    pub declared_name: String,
    /// Simple output name.
    pub name: String,
    /// Output name, including the enclosing parent when nested.
    pub qualified_name: String,
    pub kind: ShapeKind,
    pub version: u32,
    pub fingerprint: String,
    pub fields: Vec<FieldPlan>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,

    /// Absent for sealed parents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub construction: Option<ConstructionPlan>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builder: Option<BuilderSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentitySpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPlan {
    pub name: String,
    pub ty: String,
    pub mutability: Mutability,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mandatory_since: Option<u32>,

    pub role: FieldRole,
    pub equality: bool,
    pub overrides: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

/// Role annotation carried on the primary constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum FieldRole {
    Required,
    RequiredSince { version: u32, previous_default: String },
    Optional { default: String },
    Frozen { literal: String },
    FrozenRecently { literal: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedName {
    pub name: String,
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionPlan {
    pub style: ConstructionStyle,

    /// Oldest first.
    pub overloads: Vec<VersionOverload>,

    pub primary: PrimaryConstructor,
    pub from_builder: BuilderBackedConstructor,
    pub copy: CopyPlan,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory: Option<FactoryFunction>,
}

impl ConstructionPlan {
    pub fn overload(&self, version: u32) -> Option<&VersionOverload> {
        self.overloads.iter().find(|o| o.version == version)
    }

    pub fn newest(&self) -> Option<&VersionOverload> {
        self.overloads.last()
    }

    pub fn entry_points(&self) -> impl Iterator<Item = (&VersionOverload, &EntryPoint)> {
        self.overloads
            .iter()
            .flat_map(|o| o.entries.iter().map(move |e| (o, e)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionOverload {
    pub version: u32,
    pub slots: Vec<ParamSlot>,

    /// Value each constructor-relevant field reaches the builder with.
    pub resolved: Vec<ResolvedArg>,

    pub entries: Vec<EntryPoint>,
}

impl VersionOverload {
    /// Slots that are real parameters (live or deprecated).
    pub fn params(&self) -> impl Iterator<Item = &ParamSlot> {
        self.slots.iter().filter(|s| s.kind.is_param())
    }

    pub fn entry(&self, variant: EntryVariant) -> Option<&EntryPoint> {
        self.entries.iter().find(|e| e.variant == variant)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSlot {
    pub field: String,
    pub ty: String,

    #[serde(flatten)]
    pub kind: SlotKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "slot", rename_all = "snake_case")]
pub enum SlotKind {
    Param,
    /// Present for link compatibility; the value is discarded.
    Deprecated { literal: String },
    /// Not a parameter here; the literal is passed to the next newer overload.
    Defaulted { literal: String },
}

impl SlotKind {
    pub fn is_param(&self) -> bool {
        matches!(self, SlotKind::Param | SlotKind::Deprecated { .. })
    }

    pub fn literal(&self) -> Option<&str> {
        match self {
            SlotKind::Param => None,
            SlotKind::Deprecated { literal } | SlotKind::Defaulted { literal } => Some(literal),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedArg {
    pub field: String,
    pub value: ArgValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "from", rename_all = "snake_case")]
pub enum ArgValue {
    Param { name: String },
    Literal { literal: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryVariant {
    /// Mandatory parameters only; the shape has no optional tier.
    MandatoryOnly,
    /// Mandatory parameters, optionals at their literals, no callback.
    DefaultedOptionals,
    /// Mandatory parameters plus a trailing optional-tier callback.
    WithOptionalCallback,
    /// No parameters besides the optional-tier callback.
    CallbackOnly,
    /// Public no-argument entry when nothing is mandatory.
    NoArg,
}

impl EntryVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryVariant::MandatoryOnly => "mandatory_only",
            EntryVariant::DefaultedOptionals => "defaulted_optionals",
            EntryVariant::WithOptionalCallback => "with_optional_callback",
            EntryVariant::CallbackOnly => "callback_only",
            EntryVariant::NoArg => "no_arg",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoint {
    pub variant: EntryVariant,
    pub params: Vec<EntryParam>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<BuilderTier>,

    pub delegation: Delegation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryParam {
    pub name: String,
    pub ty: String,

    #[serde(default)]
    pub deprecated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub target: DelegationTarget,
    pub args: Vec<ArgValue>,
    pub callback: CallbackArg,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "to", rename_all = "snake_case")]
pub enum DelegationTarget {
    Overload { version: u32, variant: EntryVariant },
    /// Construct the concrete builder with `args`, apply the callback, build.
    ConcreteBuilder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackArg {
    None,
    Forward,
    Empty,
}

/// Private constructor listing every field plus a hidden marker parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryConstructor {
    pub params: Vec<TypedName>,
    pub marker: String,
}

/// Private constructor taking the concrete builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderBackedConstructor {
    pub assignments: Vec<Assignment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub field: String,
    pub source: ValueSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "from", rename_all = "snake_case")]
pub enum ValueSource {
    Storage,
    Literal { literal: String },
}

/// Rebuild from current values, then apply a full-tier callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyPlan {
    pub builder_args: Vec<String>,
    pub setters: Vec<String>,
    pub callback: BuilderTier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryFunction {
    pub name: String,
    /// Output qualified name of the shape it builds.
    pub owner: String,
    pub params: Vec<TypedName>,
    pub callback: BuilderTier,
    pub delegation: Delegation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuilderTier {
    Optional,
    Full,
    Concrete,
}

impl BuilderTier {
    pub fn type_name(self) -> &'static str {
        match self {
            BuilderTier::Optional => "OptionalPropertiesBuilder",
            BuilderTier::Full => "Builder",
            BuilderTier::Concrete => "BuilderImpl",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderSpec {
    /// Elided when no field is optional-tier eligible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<TierSpec>,

    pub full: TierSpec,
    pub concrete: ConcreteBuilderSpec,
}

impl BuilderSpec {
    pub fn tier(&self, tier: BuilderTier) -> Option<&TierSpec> {
        match tier {
            BuilderTier::Optional => self.optional.as_ref(),
            BuilderTier::Full => Some(&self.full),
            BuilderTier::Concrete => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSpec {
    pub tier: BuilderTier,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<BuilderTier>,

    pub properties: Vec<BuilderProperty>,
}

impl TierSpec {
    pub fn property(&self, name: &str) -> Option<&BuilderProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderProperty {
    pub name: String,
    pub ty: String,
    pub setter: SetterKind,

    /// Re-declared from the tier this one extends.
    #[serde(default)]
    pub overrides_parent: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetterKind {
    None,
    Live,
    /// Deprecated, returns the builder unchanged.
    Inert,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcreteBuilderSpec {
    pub constructor_params: Vec<TypedName>,
    pub storage: Vec<StorageSlot>,

    /// The shape exposes a public no-argument constructor.
    pub public_no_arg: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSlot {
    pub name: String,
    pub ty: String,
    pub init: StorageInit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "init", rename_all = "snake_case")]
pub enum StorageInit {
    ConstructorParam,
    Literal { literal: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySpec {
    /// Compared in order, short-circuiting on the first mismatch.
    pub equality: Vec<String>,
    pub hash: HashSpec,
    pub display: DisplaySpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "hash", rename_all = "snake_case")]
pub enum HashSpec {
    Fields { fields: Vec<String> },
    TypeMarker { type_name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySpec {
    pub type_name: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorFamily {
    Schema,
    Structural,
    Consistency,
}

impl ErrorFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorFamily::Schema => "schema",
            ErrorFamily::Structural => "structural",
            ErrorFamily::Consistency => "consistency",
        }
    }
}

/// A static-input defect, surfaced once per offending shape or family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanFailure {
    pub shape: String,
    pub family: ErrorFamily,
    pub code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    pub message: String,
}
