//! Per-concern strategies attached to a collection.

pub mod fs;

pub use fs::{FileHandler, Matcher};

use crate::config::{CollectionConfig, CollectionKind, Workspace, DOC_EXTENSIONS, META_EXTENSIONS};
use crate::error::{QuarryError, Result};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    Fs,
    Mdx,
    Meta,
    JsonSchema,
    EntryFile,
}

/// Compiles Markdown/MDX members of a collection.
#[derive(Debug, Clone)]
pub struct MdxHandler {
    /// Bodies are loaded on demand rather than bundled with front matter
    pub lazy: bool,
}

impl MdxHandler {
    pub fn is_doc_file(&self, path: &Path) -> bool {
        has_extension(path, DOC_EXTENSIONS)
    }
}

/// Parses JSON/YAML members of a collection.
#[derive(Debug, Clone)]
pub struct MetaHandler;

impl MetaHandler {
    pub fn is_meta_file(&self, path: &Path) -> bool {
        has_extension(path, META_EXTENSIONS)
    }
}

/// Carries a JSON Schema for emission next to the generated modules.
#[derive(Debug, Clone)]
pub struct JsonSchemaHandler {
    pub schema: serde_json::Value,
}

/// How the collection appears in the generated entry module.
#[derive(Debug, Clone)]
pub struct EntryFileHandler {
    pub composers: Vec<String>,
}

/// The handlers of one collection, keyed by kind.
#[derive(Debug, Default)]
pub struct Handlers {
    pub fs: Option<FileHandler>,
    pub mdx: Option<MdxHandler>,
    pub meta: Option<MetaHandler>,
    pub json_schema: Option<JsonSchemaHandler>,
    pub entry_file: Option<EntryFileHandler>,
}

impl Handlers {
    /// Build the handler set a collection kind calls for.
    pub fn for_config(config: &CollectionConfig, workspace: Option<&Workspace>) -> Result<Self> {
        if config.dir.trim().is_empty() {
            return Err(QuarryError::Config("collection directory is missing".into()));
        }

        let (mdx, meta) = match &config.kind {
            CollectionKind::Doc => (Some(MdxHandler { lazy: config.lazy }), None),
            CollectionKind::Meta => (None, Some(MetaHandler)),
            CollectionKind::Docs => (Some(MdxHandler { lazy: config.lazy }), Some(MetaHandler)),
            CollectionKind::Data => (None, None),
            CollectionKind::Custom(name) => {
                return Err(QuarryError::Config(format!(
                    "unsupported collection type '{name}'"
                )));
            }
        };

        let fs = FileHandler::init(config, workspace);
        if fs.dir().exists() && !fs.dir().is_dir() {
            return Err(QuarryError::Config(format!(
                "{} is not a directory",
                fs.dir().display()
            )));
        }

        Ok(Handlers {
            fs: Some(fs),
            mdx,
            meta,
            json_schema: config.schema.clone().map(|schema| JsonSchemaHandler { schema }),
            entry_file: Some(EntryFileHandler {
                composers: config.composers.clone(),
            }),
        })
    }

    pub fn has(&self, kind: HandlerKind) -> bool {
        match kind {
            HandlerKind::Fs => self.fs.is_some(),
            HandlerKind::Mdx => self.mdx.is_some(),
            HandlerKind::Meta => self.meta.is_some(),
            HandlerKind::JsonSchema => self.json_schema.is_some(),
            HandlerKind::EntryFile => self.entry_file.is_some(),
        }
    }

    pub fn kinds(&self) -> Vec<HandlerKind> {
        [
            HandlerKind::Fs,
            HandlerKind::Mdx,
            HandlerKind::Meta,
            HandlerKind::JsonSchema,
            HandlerKind::EntryFile,
        ]
        .into_iter()
        .filter(|kind| self.has(*kind))
        .collect()
    }
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| allowed.contains(&ext))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_docs_kind_gets_mdx_and_meta() {
        let config = CollectionConfig::new(CollectionKind::Docs, "content/docs");
        let handlers = Handlers::for_config(&config, None).unwrap();
        assert_eq!(
            handlers.kinds(),
            vec![
                HandlerKind::Fs,
                HandlerKind::Mdx,
                HandlerKind::Meta,
                HandlerKind::EntryFile
            ]
        );
        let mdx = handlers.mdx.unwrap();
        assert!(mdx.is_doc_file(Path::new("a.mdx")));
        assert!(!mdx.is_doc_file(Path::new("meta.json")));
    }

    #[test]
    fn test_schema_adds_json_schema_handler() {
        let mut config = CollectionConfig::new(CollectionKind::Meta, "meta");
        config.schema = Some(serde_json::json!({ "type": "object" }));
        let handlers = Handlers::for_config(&config, None).unwrap();
        assert!(handlers.has(HandlerKind::JsonSchema));
        assert!(!handlers.has(HandlerKind::Mdx));
    }

    #[test]
    fn test_unsupported_kind_and_missing_dir_are_config_errors() {
        let custom = CollectionConfig::new(CollectionKind::Custom("sheet".into()), "sheets");
        assert!(matches!(
            Handlers::for_config(&custom, None),
            Err(QuarryError::Config(_))
        ));

        let no_dir = CollectionConfig::new(CollectionKind::Doc, "  ");
        assert!(matches!(
            Handlers::for_config(&no_dir, None),
            Err(QuarryError::Config(_))
        ));
    }
}
