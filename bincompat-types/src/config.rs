use serde::{Deserialize, Serialize};

/// Suffix a declaration name must carry when no generated name is given.
pub const DEFAULT_REQUIRED_SUFFIX: &str = "DBC";

/// How public construction entry points are laid out per version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructionStyle {
    /// One callback-taking entry per version plus a factory function.
    #[default]
    Callback,
    /// Split entries per version: defaulted optionals and optional callback.
    Overload,
}

impl ConstructionStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            ConstructionStyle::Callback => "callback",
            ConstructionStyle::Overload => "overload",
        }
    }
}

impl std::str::FromStr for ConstructionStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "callback" | "dsl" => Ok(ConstructionStyle::Callback),
            "overload" | "constructor" => Ok(ConstructionStyle::Overload),
            other => Err(format!("unknown construction style '{other}'")),
        }
    }
}

/// Process-wide planner configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Dropped from declared names when forming output names.
    pub required_suffix: String,

    /// Stripped from declared packages when forming output packages.
    #[serde(default)]
    pub drop_package_suffixes: Vec<String>,

    #[serde(default)]
    pub construction_style: ConstructionStyle,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            required_suffix: DEFAULT_REQUIRED_SUFFIX.to_string(),
            drop_package_suffixes: Vec::new(),
            construction_style: ConstructionStyle::default(),
        }
    }
}
