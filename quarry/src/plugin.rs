//! Extension points of the registry.

use crate::collection::{Collection, Origin};
use crate::config::{CollectionConfig, CollectionKind, Workspace};
use crate::document::Document;
use crate::error::Result;
use crate::hooks::{Hook, Pipe};
use std::path::PathBuf;

/// A unit of extension: contributes collections and hook steps.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// Collections registered after the configured ones, in order.
    fn collections(&self) -> Vec<(String, CollectionConfig)> {
        Vec::new()
    }

    /// Register hook and pipe steps. Called once per `Core::init`, before
    /// any chain runs.
    fn setup(&self, _hooks: &mut CoreHooks) -> Result<()> {
        Ok(())
    }
}

/// Every chain the registry runs. Rebuilt on each init.
#[derive(Debug, Default)]
pub struct CoreHooks {
    /// Runs sequentially after plugin setup, before collections initialize
    pub init: Hook<InitContext>,
    /// Runs concurrently once emitted files are on disk
    pub build_finished: Hook<BuildReport>,
    /// Produces the files written to the output directory
    pub emit: Pipe<Vec<EmitEntry>, EmitContext>,
    pub document: Pipe<Document, DocumentContext>,
    pub meta: Pipe<serde_json::Value, MetaContext>,
}

/// Snapshot of a registered collection handed to plugins.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionInfo {
    pub name: String,
    pub kind: CollectionKind,
    /// Absolute collection directory
    pub dir: PathBuf,
    pub origin: Origin,
    pub lazy: bool,
    pub schema: Option<serde_json::Value>,
    pub composers: Vec<String>,
    /// Member files, sorted. Empty until the collection has been scanned.
    pub files: Vec<PathBuf>,
}

impl CollectionInfo {
    pub(crate) fn describe(collection: &Collection, workspace: &Workspace) -> Self {
        let config = collection.config();
        let dir = match collection.fs() {
            Some(fs) => fs.dir().to_path_buf(),
            None => workspace.dir.join(&config.dir),
        };
        CollectionInfo {
            name: collection.name().to_string(),
            kind: config.kind.clone(),
            dir,
            origin: collection.origin().clone(),
            lazy: config.lazy,
            schema: config.schema.clone(),
            composers: config.composers.clone(),
            files: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InitContext {
    pub workspace: Workspace,
    /// Registered collections in declaration order, not yet initialized
    pub collections: Vec<CollectionInfo>,
}

/// Context of a per-file pipe run.
#[derive(Debug, Clone, PartialEq)]
pub struct FileContext {
    pub collection: String,
    pub path: PathBuf,
    pub development: bool,
}

pub type DocumentContext = FileContext;
pub type MetaContext = FileContext;

#[derive(Debug, Clone)]
pub struct EmitContext {
    pub workspace: Workspace,
    pub output_dir: PathBuf,
    pub collections: Vec<CollectionInfo>,
}

impl EmitContext {
    pub fn collection(&self, name: &str) -> Option<&CollectionInfo> {
        self.collections.iter().find(|c| c.name == name)
    }
}

/// A generated file, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitEntry {
    pub path: String,
    pub content: String,
}

impl EmitEntry {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        EmitEntry {
            path: path.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub output_dir: PathBuf,
    /// Absolute paths of the files written, in emit order
    pub written: Vec<PathBuf>,
}
