use crate::collection::Collection;
use crate::error::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level configuration parsed from quarry.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory generated modules are written to, relative to the workspace
    #[serde(default = "default_output")]
    pub output: String,
    /// Collections in declaration order
    #[serde(default)]
    pub collections: IndexMap<String, CollectionConfig>,
}

fn default_output() -> String {
    ".source".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            output: default_output(),
            collections: IndexMap::new(),
        }
    }
}

/// Configuration of a single collection. The collection's name is the key it
/// is registered under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    #[serde(rename = "type")]
    pub kind: CollectionKind,
    pub dir: String,
    /// Glob patterns relative to `dir`. A leading `!` excludes.
    #[serde(default)]
    pub files: Option<Vec<String>>,
    /// Overrides the extensions the collection kind accepts. An empty list
    /// accepts every file.
    #[serde(default)]
    pub extensions: Option<Vec<String>>,
    /// Emit document bodies as lazy imports
    #[serde(rename = "async", default)]
    pub lazy: bool,
    /// JSON Schema describing each record, for editor tooling
    #[serde(default)]
    pub schema: Option<serde_json::Value>,
    /// Collections that must be declared (and initialized) before this one
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Composer expressions appended to the generated list, in order
    #[serde(default)]
    pub composers: Vec<String>,
    #[serde(skip)]
    pub init: Option<InitHook>,
}

impl CollectionConfig {
    pub fn new(kind: CollectionKind, dir: impl Into<String>) -> Self {
        CollectionConfig {
            kind,
            dir: dir.into(),
            files: None,
            extensions: None,
            lazy: false,
            schema: None,
            depends_on: Vec::new(),
            composers: Vec::new(),
            init: None,
        }
    }

    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files = Some(files.into_iter().map(Into::into).collect());
        self
    }

    /// Attach a procedure run once each time the collection is bound to a
    /// workspace. It must be idempotent.
    pub fn with_init<F>(mut self, f: F) -> Self
    where
        F: Fn(&Collection, &Workspace) -> Result<()> + Send + Sync + 'static,
    {
        self.init = Some(InitHook(Arc::new(f)));
        self
    }

    /// Extensions accepted by this collection, or `None` when unrestricted.
    pub fn supported_extensions(&self) -> Option<Vec<String>> {
        match &self.extensions {
            Some(exts) if exts.is_empty() => None,
            Some(exts) => Some(exts.iter().map(|e| e.trim_start_matches('.').to_string()).collect()),
            None => self
                .kind
                .default_extensions()
                .map(|exts| exts.iter().map(|e| e.to_string()).collect()),
        }
    }
}

/// Collection type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    /// Markdown/MDX documents with front matter
    Doc,
    /// JSON/YAML metadata files
    Meta,
    /// Documents and metadata sharing one directory
    Docs,
    /// Arbitrary files, exposed by path
    Data,
    #[serde(untagged)]
    Custom(String),
}

pub(crate) const DOC_EXTENSIONS: &[&str] = &["md", "mdx"];
pub(crate) const META_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

impl CollectionKind {
    fn default_extensions(&self) -> Option<Vec<&'static str>> {
        match self {
            CollectionKind::Doc => Some(DOC_EXTENSIONS.to_vec()),
            CollectionKind::Meta => Some(META_EXTENSIONS.to_vec()),
            CollectionKind::Docs => Some([DOC_EXTENSIONS, META_EXTENSIONS].concat()),
            CollectionKind::Data | CollectionKind::Custom(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CollectionKind::Doc => "doc",
            CollectionKind::Meta => "meta",
            CollectionKind::Docs => "docs",
            CollectionKind::Data => "data",
            CollectionKind::Custom(name) => name,
        }
    }
}

/// A collection's init procedure.
#[derive(Clone)]
pub struct InitHook(pub Arc<dyn Fn(&Collection, &Workspace) -> Result<()> + Send + Sync>);

impl fmt::Debug for InitHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InitHook(..)")
    }
}

/// The workspace collections are bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub dir: PathBuf,
    pub name: String,
}

impl Workspace {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Workspace {
            dir: dir.into(),
            name: name.into(),
        }
    }
}
