//! Output naming and the declared-to-output name table.

use bincompat_types::decl::qualify;
use std::collections::BTreeMap;

/// Output simple name: the generated name if set, else the declared name minus the suffix.
///
/// Returns `None` when neither applies.
pub fn output_name(declared: &str, generated: Option<&str>, suffix: &str) -> Option<String> {
    if let Some(generated) = generated.map(str::trim).filter(|g| !g.is_empty()) {
        return Some(generated.to_string());
    }
    declared
        .strip_suffix(suffix)
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
}

/// Output package: the declared package with the longest matching dropped suffix removed.
pub fn output_package(declared: &str, drop_suffixes: &[String]) -> String {
    let mut candidates: Vec<&str> = drop_suffixes
        .iter()
        .map(|s| s.trim().trim_start_matches('.'))
        .filter(|s| !s.is_empty())
        .collect();
    candidates.sort_by_key(|s| std::cmp::Reverse(s.len()));

    for suffix in candidates {
        if declared == suffix {
            return String::new();
        }
        if let Some(stem) = declared.strip_suffix(suffix)
            && let Some(stem) = stem.strip_suffix('.')
        {
            return stem.to_string();
        }
    }
    declared.to_string()
}

/// Resolved output name of one shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputName {
    pub package: String,
    /// Simple name, or `Parent.Child` when nested.
    pub nested_name: String,
}

impl OutputName {
    pub fn qualified(&self) -> String {
        qualify(&self.package, &self.nested_name)
    }
}

/// Declared qualified name -> output name.
///
/// Written once per shape while planning, read while merging families.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    entries: BTreeMap<String, OutputName>,
}

impl NameTable {
    pub fn register(&mut self, declared: impl Into<String>, output: OutputName) {
        self.entries.insert(declared.into(), output);
    }

    pub fn resolve(&self, declared: &str) -> Option<&OutputName> {
        self.entries.get(declared)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
