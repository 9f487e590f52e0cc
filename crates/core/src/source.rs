//! Where procedure text comes from.
//!
//! Parsing itself only ever sees a `&str`; the [`SourceProvider`] trait lets
//! callers feed it from disk ([`FileSystemProvider`]) or from memory
//! ([`InMemoryProvider`], used by tests and editor integrations).

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use crate::ast::SourceFile;
use crate::error::Diagnostic;

pub trait SourceProvider {
    /// Full UTF-8 text of the source at `path`.
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error>;
}

/// Reads sources with `std::fs`.
pub struct FileSystemProvider;

impl SourceProvider for FileSystemProvider {
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error> {
        std::fs::read_to_string(path)
    }
}

/// Path-to-text map. Lookups normalise `.` and `..` first.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    files: HashMap<PathBuf, String>,
}

impl InMemoryProvider {
    pub fn new(files: HashMap<PathBuf, String>) -> Self {
        let files = files
            .into_iter()
            .map(|(p, text)| (normalize_path(&p), text))
            .collect();
        Self { files }
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, text: impl Into<String>) -> Self {
        self.files.insert(normalize_path(path.as_ref()), text.into());
        self
    }
}

impl SourceProvider for InMemoryProvider {
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error> {
        let normalized = normalize_path(path);
        self.files.get(&normalized).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no in-memory source at {}", normalized.display()),
            )
        })
    }
}

/// Resolve `.` and `..` without touching the filesystem.
fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                components.pop();
            }
            other => components.push(other),
        }
    }
    components.iter().collect()
}

/// Failure to obtain or parse a source file.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: {diagnostic}", path.display())]
    Parse { path: PathBuf, diagnostic: Diagnostic },
}

/// Read `path` through `provider` and parse it strictly.
pub fn parse_path(provider: &dyn SourceProvider, path: &Path) -> Result<SourceFile, SourceError> {
    let text = provider.read_source(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    crate::parse_source(&text).map_err(|diagnostic| SourceError::Parse {
        path: path.to_path_buf(),
        diagnostic,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagnosticKind;

    #[test]
    fn normalize_path_resolves_dot_and_dotdot() {
        assert_eq!(
            normalize_path(Path::new("/ops/eps/../aocs/./Deploy.pluto")),
            PathBuf::from("/ops/aocs/Deploy.pluto")
        );
    }

    #[test]
    fn in_memory_lookup_is_normalised() {
        let provider = InMemoryProvider::default().with_file("/ops/Deploy.pluto", "procedure P main end main end procedure");
        let text = provider
            .read_source(Path::new("/ops/x/../Deploy.pluto"))
            .unwrap();
        assert!(text.starts_with("procedure"));
    }

    #[test]
    fn in_memory_missing_is_not_found() {
        let err = InMemoryProvider::default()
            .read_source(Path::new("/missing.pluto"))
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn parse_path_parses_in_memory_source() {
        let mut files = HashMap::new();
        files.insert(
            PathBuf::from("/a/ok.pluto"),
            "procedure P main initiate Go end main end procedure".to_string(),
        );
        let provider = InMemoryProvider::new(files);
        let file = parse_path(&provider, Path::new("/a/ok.pluto")).unwrap();
        assert_eq!(file.procedures().count(), 1);
    }

    #[test]
    fn parse_path_reports_io_and_parse_errors() {
        let provider = InMemoryProvider::default().with_file("bad.pluto", "procedure P\nmain\nend main");
        match parse_path(&provider, Path::new("bad.pluto")) {
            Err(SourceError::Parse { diagnostic, .. }) => {
                assert_eq!(diagnostic.kind, DiagnosticKind::UnterminatedBlock)
            }
            other => panic!("expected parse error, got {:?}", other),
        }
        assert!(matches!(
            parse_path(&provider, Path::new("nope.pluto")),
            Err(SourceError::Io { .. })
        ));
    }

    #[test]
    fn file_system_provider_reads_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("p.pluto");
        std::fs::write(&path, "type Id u8").unwrap();
        let file = parse_path(&FileSystemProvider, &path).unwrap();
        assert_eq!(file.declarations().count(), 1);
    }
}
