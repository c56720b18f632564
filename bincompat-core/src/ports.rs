//! Port traits abstracting all I/O away from the pipeline.

use bincompat_decls::LoadedDecls;
use camino::Utf8Path;

/// Source of declaration documents.
pub trait DeclSource {
    fn load_decls(&self) -> anyhow::Result<Vec<LoadedDecls>>;
}

/// File-system write operations.
pub trait WritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()>;
}
