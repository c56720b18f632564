//! Default filesystem-backed port implementations.

use crate::ports::{DeclSource, WritePort};
use anyhow::Context;
use bincompat_decls::LoadedDecls;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;

/// Loads declaration documents via `bincompat_decls::load_decls`.
#[derive(Debug, Clone)]
pub struct FsDeclSource {
    pub decls_dir: Utf8PathBuf,
}

impl FsDeclSource {
    pub fn new(decls_dir: Utf8PathBuf) -> Self {
        Self { decls_dir }
    }
}

impl DeclSource for FsDeclSource {
    fn load_decls(&self) -> anyhow::Result<Vec<LoadedDecls>> {
        bincompat_decls::load_decls(&self.decls_dir)
            .with_context(|| format!("load declarations from {}", self.decls_dir))
    }
}

/// In-memory declaration source for embedding and testing.
///
/// Sorts by path on construction to match `FsDeclSource`'s ordering.
#[derive(Debug, Clone)]
pub struct InMemoryDeclSource {
    decls: Vec<LoadedDecls>,
}

impl InMemoryDeclSource {
    pub fn new(mut decls: Vec<LoadedDecls>) -> Self {
        decls.sort_by(|a, b| a.path.cmp(&b.path));
        Self { decls }
    }
}

impl DeclSource for InMemoryDeclSource {
    fn load_decls(&self) -> anyhow::Result<Vec<LoadedDecls>> {
        Ok(self.decls.clone())
    }
}

/// Filesystem write operations.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create parent dir for {}", path))?;
        }
        fs::write(path, contents).with_context(|| format!("write {}", path))
    }

    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()> {
        fs::create_dir_all(path).with_context(|| format!("create_dir_all {}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bincompat_decls::DeclLoadError;
    use tempfile::TempDir;

    fn broken(path: &str) -> LoadedDecls {
        LoadedDecls {
            path: Utf8PathBuf::from(path),
            document: Err(DeclLoadError::Io {
                message: "stub".to_string(),
            }),
        }
    }

    fn utf8_temp() -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 path");
        (temp, root)
    }

    #[test]
    fn in_memory_sorts_by_path() {
        let source = InMemoryDeclSource::new(vec![
            broken("decls/z.json"),
            broken("decls/a.json"),
            broken("decls/m/b.json"),
        ]);
        let loaded = source.load_decls().unwrap();
        let paths: Vec<&str> = loaded.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["decls/a.json", "decls/m/b.json", "decls/z.json"]);
    }

    #[test]
    fn in_memory_preserves_errors() {
        let source = InMemoryDeclSource::new(vec![broken("decls/bad.json")]);
        let loaded = source.load_decls().unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].document.is_err());
    }

    #[test]
    fn fs_source_reads_nested_documents() {
        let (_temp, root) = utf8_temp();
        std::fs::create_dir_all(root.join("nested")).unwrap();
        std::fs::write(
            root.join("nested").join("person.json"),
            r#"{ "shapes": [ { "name": "PersonDBC", "package": "com.acme" } ] }"#,
        )
        .unwrap();
        std::fs::write(root.join("notes.txt"), "ignored").unwrap();

        let loaded = FsDeclSource::new(root.clone()).load_decls().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].shape_count(), 1);
    }

    #[test]
    fn fs_write_port_creates_parents() {
        let (_temp, root) = utf8_temp();
        let target = root.join("a").join("b").join("plan.md");
        FsWritePort.write_file(&target, b"# plan\n").unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "# plan\n");
    }
}
