//! Clap-free settings for the plan pipeline.

use bincompat_types::config::PlannerConfig;
use camino::Utf8PathBuf;

/// Settings for the plan pipeline.
#[derive(Debug, Clone)]
pub struct PlanSettings {
    /// Root of the declaration documents; input paths are reported relative to it.
    pub decls_dir: Utf8PathBuf,
    pub out_dir: Utf8PathBuf,
    pub planner: PlannerConfig,
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            decls_dir: Utf8PathBuf::from("decls"),
            out_dir: Utf8PathBuf::from("artifacts/bincompat"),
            planner: PlannerConfig::default(),
        }
    }
}
