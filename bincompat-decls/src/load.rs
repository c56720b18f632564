use anyhow::Context;
use bincompat_types::decl::DeclDocument;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use glob::glob;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct LoadedDecls {
    pub path: Utf8PathBuf,
    pub document: Result<DeclDocument, DeclLoadError>,
}

impl LoadedDecls {
    pub fn shape_count(&self) -> usize {
        self.document.as_ref().map(|d| d.shapes.len()).unwrap_or(0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeclLoadError {
    #[error("io error: {message}")]
    Io { message: String },

    #[error("json parse error: {message}")]
    Json { message: String },

    #[error("unsupported schema '{schema}'")]
    Schema { schema: String },
}

/// Loads every `*.json` document under `decls_dir`, recursively.
///
/// A missing directory yields no documents.
pub fn load_decls(decls_dir: &Utf8Path) -> anyhow::Result<Vec<LoadedDecls>> {
    let pattern = decls_dir.join("**/*.json");
    let pattern_str = pattern.as_str();

    debug!(pattern = %pattern_str, "scanning for declaration documents");

    let mut out = Vec::new();
    for entry in glob(pattern_str).context("glob declarations/**/*.json")? {
        let path = entry
            .map_err(|e| anyhow::anyhow!("glob error: {e}"))?
            .to_string_lossy()
            .to_string();
        let utf8_path = Utf8PathBuf::from(path);

        let document = match fs::read_to_string(&utf8_path) {
            Ok(s) => parse_document(&s),
            Err(e) => Err(DeclLoadError::Io {
                message: e.to_string(),
            }),
        };

        if let Err(err) = &document {
            warn!(path = %utf8_path, error = %err, "skipping declaration document");
        }

        out.push(LoadedDecls {
            path: utf8_path,
            document,
        });
    }

    // Deterministic order matters.
    out.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(out)
}

fn parse_document(contents: &str) -> Result<DeclDocument, DeclLoadError> {
    let doc =
        serde_json::from_str::<DeclDocument>(contents).map_err(|e| DeclLoadError::Json {
            message: e.to_string(),
        })?;

    match doc.schema.as_deref() {
        None => Ok(doc),
        Some(s) if s == bincompat_types::schema::BINCOMPAT_DECLS_V1 => Ok(doc),
        Some(other) => Err(DeclLoadError::Schema {
            schema: other.to_string(),
        }),
    }
}
