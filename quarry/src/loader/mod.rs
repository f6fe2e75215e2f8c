//! One transformation contract for every host integration.
//!
//! A [`Loader`] turns a file (plus its query) into module code. The adapters
//! in [`host`] translate that contract into the shapes individual build tools
//! expect without changing what the loader computes.

pub mod host;
pub mod mdx;
pub mod meta;

pub use mdx::{CompileRequest, CompiledMdx, MdxCompiler, MdxLoader};
pub use meta::MetaLoader;

use crate::error::{QuarryError, Result};
use crate::maybe_async::MaybeAsync;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Parsed `?key=value` pairs. Repeated keys keep every value in order.
pub type Query = BTreeMap<String, Vec<String>>;

pub fn parse_query(query: &str) -> Query {
    let mut parsed = Query::new();
    for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
        parsed
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    parsed
}

/// Split a module id of the form `path?query`.
pub fn parse_resource(id: &str) -> (PathBuf, Query) {
    match id.split_once('?') {
        Some((path, query)) => (PathBuf::from(path), parse_query(query)),
        None => (PathBuf::from(id), Query::new()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModuleType {
    #[default]
    Js,
    Json,
}

impl ModuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleType::Js => "js",
            ModuleType::Json => "json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderOutput {
    pub code: String,
    pub source_map: Option<String>,
    pub module_type: Option<ModuleType>,
}

impl LoaderOutput {
    pub fn js(code: impl Into<String>) -> Self {
        LoaderOutput {
            code: code.into(),
            source_map: None,
            module_type: Some(ModuleType::Js),
        }
    }

    pub fn json(code: impl Into<String>) -> Self {
        LoaderOutput {
            code: code.into(),
            source_map: None,
            module_type: Some(ModuleType::Json),
        }
    }

    pub fn module_type(&self) -> ModuleType {
        self.module_type.unwrap_or_default()
    }
}

/// Receives files a load depended on, so the host can rebuild when they
/// change.
pub trait DependencySink: Send + Sync {
    fn add_dependency(&self, path: &Path);
}

/// Discards declared dependencies.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDependencies;

impl DependencySink for NoDependencies {
    fn add_dependency(&self, _path: &Path) {}
}

/// Collects declared dependencies, without duplicates, in declaration order.
#[derive(Debug, Default)]
pub struct DependencyList {
    paths: Mutex<Vec<PathBuf>>,
}

impl DependencyList {
    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths.lock().clone()
    }

    pub fn take(&self) -> Vec<PathBuf> {
        std::mem::take(&mut *self.paths.lock())
    }
}

impl DependencySink for DependencyList {
    fn add_dependency(&self, path: &Path) {
        let mut paths = self.paths.lock();
        if !paths.iter().any(|p| p == path) {
            paths.push(path.to_path_buf());
        }
    }
}

/// Everything a loader may ask about the file being loaded.
pub struct LoaderInput {
    pub file_path: PathBuf,
    pub query: Query,
    pub development: bool,
    /// Source handed over by the host, if it already read the file
    source: Option<String>,
    disk: OnceCell<String>,
    deps: Arc<dyn DependencySink>,
}

impl LoaderInput {
    pub fn new(file_path: impl Into<PathBuf>, query: Query) -> Self {
        LoaderInput {
            file_path: file_path.into(),
            query,
            development: false,
            source: None,
            disk: OnceCell::new(),
            deps: Arc::new(NoDependencies),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    pub fn with_dependencies(mut self, deps: Arc<dyn DependencySink>) -> Self {
        self.deps = deps;
        self
    }

    /// The source the host handed over, if any.
    pub fn host_source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// First value of a query parameter.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// The file's source: the host's copy when there is one, otherwise the
    /// file on disk, read once.
    pub async fn get_source(&self) -> Result<&str> {
        if let Some(source) = &self.source {
            return Ok(source);
        }
        let source = self
            .disk
            .get_or_try_init(|| async { tokio::fs::read_to_string(&self.file_path).await })
            .await?;
        Ok(source)
    }

    /// Blocking variant of [`LoaderInput::get_source`] for synchronous hosts.
    pub fn get_source_sync(&self) -> Result<&str> {
        if let Some(source) = &self.source {
            return Ok(source);
        }
        if self.disk.get().is_none() {
            let source = std::fs::read_to_string(&self.file_path)?;
            // A concurrent async read may have won; both read the same file.
            let _ = self.disk.set(source);
        }
        self.disk.get().map(String::as_str).ok_or_else(|| {
            QuarryError::Other(format!("{} could not be read", self.file_path.display()))
        })
    }

    pub fn declare_dependency(&self, path: &Path) {
        self.deps.add_dependency(path);
    }
}

/// Turns a file into module code. `None` means the file is not handled and
/// the host should fall through to its default behavior.
pub trait Loader: Send + Sync {
    fn load(&self, input: LoaderInput) -> MaybeAsync<'_, Result<Option<LoaderOutput>>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_resource_splits_query() {
        let (path, query) = parse_resource("/site/docs/a.mdx?collection=docs&only=frontmatter&x=1&x=2");
        assert_eq!(path, PathBuf::from("/site/docs/a.mdx"));
        assert_eq!(query["collection"], vec!["docs"]);
        assert_eq!(query["only"], vec!["frontmatter"]);
        assert_eq!(query["x"], vec!["1", "2"]);

        let (bare, empty) = parse_resource("/site/docs/a.mdx");
        assert_eq!(bare, PathBuf::from("/site/docs/a.mdx"));
        assert!(empty.is_empty());
    }

    #[test]
    fn test_query_values_are_decoded() {
        let query = parse_query("?name=a%20b&flag");
        assert_eq!(query["name"], vec!["a b"]);
        assert_eq!(query["flag"], vec![""]);
    }

    #[tokio::test]
    async fn test_source_prefers_host_copy() {
        let input = LoaderInput::new("/does/not/exist.md", Query::new()).with_source("in memory");
        assert_eq!(input.get_source().await.unwrap(), "in memory");
        assert_eq!(input.get_source_sync().unwrap(), "in memory");
    }

    #[tokio::test]
    async fn test_source_is_read_from_disk_once() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("a.md");
        std::fs::write(&path, "first").unwrap();

        let input = LoaderInput::new(&path, Query::new());
        assert_eq!(input.get_source().await.unwrap(), "first");
        std::fs::write(&path, "second").unwrap();
        assert_eq!(input.get_source().await.unwrap(), "first");
        assert_eq!(input.get_source_sync().unwrap(), "first");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let input = LoaderInput::new("/does/not/exist.md", Query::new());
        assert!(input.get_source_sync().unwrap_err().is_not_found());
    }

    #[test]
    fn test_dependency_list_dedups() {
        let deps = Arc::new(DependencyList::default());
        let input = LoaderInput::new("a.md", Query::new()).with_dependencies(deps.clone());
        input.declare_dependency(Path::new("b.md"));
        input.declare_dependency(Path::new("c.md"));
        input.declare_dependency(Path::new("b.md"));
        assert_eq!(deps.take(), vec![PathBuf::from("b.md"), PathBuf::from("c.md")]);
        assert!(deps.paths().is_empty());
    }
}
