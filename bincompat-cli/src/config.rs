//! Configuration file loading for bincompat.
//!
//! Discovers and loads `bincompat.toml` from the project root.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use bincompat_types::config::{ConstructionStyle, PlannerConfig};
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "bincompat.toml";

/// Top-level configuration from bincompat.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BincompatConfig {
    pub planner: PlannerSection,
    pub output: OutputSection,
}

/// Planner section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlannerSection {
    /// Suffix dropped from declared names (default `DBC`).
    pub required_suffix: Option<String>,

    /// Package suffixes stripped when forming output packages.
    pub drop_package_suffixes: Vec<String>,

    pub construction_style: Option<ConstructionStyle>,
}

/// Output section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// Relative paths are resolved against the project root.
    pub out_dir: Option<Utf8PathBuf>,
}

/// Discover the bincompat.toml config file in the project root.
pub fn discover_config(root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a bincompat.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<BincompatConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<BincompatConfig> {
    let config: BincompatConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from the project root, or return default if not found.
pub fn load_or_default(root: &Utf8Path) -> anyhow::Result<BincompatConfig> {
    match discover_config(root) {
        Some(path) => load_config(&path),
        None => Ok(BincompatConfig::default()),
    }
}

/// Merged configuration combining config file and CLI arguments.
#[derive(Debug, Clone, Default)]
pub struct MergedConfig {
    pub planner: PlannerConfig,
    pub out_dir: Option<Utf8PathBuf>,
}

/// Planner flags given on the command line.
#[derive(Debug, Clone, Default)]
pub struct PlannerOverrides {
    pub required_suffix: Option<String>,
    pub drop_package_suffixes: Vec<String>,
    pub construction_style: Option<ConstructionStyle>,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: BincompatConfig,
}

impl ConfigMerger {
    pub fn new(config: BincompatConfig) -> Self {
        Self { config }
    }

    /// CLI suffix and style override the file; CLI package suffixes extend it.
    pub fn merge(self, cli: &PlannerOverrides) -> MergedConfig {
        let defaults = PlannerConfig::default();
        let section = self.config.planner;

        let mut drop_package_suffixes = section.drop_package_suffixes;
        for suffix in &cli.drop_package_suffixes {
            if !drop_package_suffixes.contains(suffix) {
                drop_package_suffixes.push(suffix.clone());
            }
        }

        let planner = PlannerConfig {
            required_suffix: cli
                .required_suffix
                .clone()
                .or(section.required_suffix)
                .unwrap_or(defaults.required_suffix),
            drop_package_suffixes,
            construction_style: cli
                .construction_style
                .or(section.construction_style)
                .unwrap_or(defaults.construction_style),
        };

        MergedConfig {
            planner,
            out_dir: self.config.output.out_dir,
        }
    }
}
