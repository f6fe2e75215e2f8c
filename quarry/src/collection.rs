use crate::config::{CollectionConfig, CollectionKind, Workspace};
use crate::error::Result;
use crate::handler::{FileHandler, HandlerKind, Handlers};
use std::path::Path;

/// Where a collection was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Config,
    Plugin(String),
}

/// A named, configured source of content records.
///
/// Only the registry constructs collections, so a name is assigned exactly
/// once and never changes.
#[derive(Debug)]
pub struct Collection {
    name: String,
    config: CollectionConfig,
    origin: Origin,
    handlers: Handlers,
}

impl Collection {
    pub(crate) fn new(name: String, config: CollectionConfig, origin: Origin) -> Self {
        Collection {
            name,
            config,
            origin,
            handlers: Handlers::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    pub fn kind(&self) -> &CollectionKind {
        &self.config.kind
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn handlers(&self) -> &Handlers {
        &self.handlers
    }

    pub fn has_handler(&self, kind: HandlerKind) -> bool {
        self.handlers.has(kind)
    }

    pub fn fs(&self) -> Option<&FileHandler> {
        self.handlers.fs.as_ref()
    }

    /// Whether `path` is a member of this collection.
    pub fn has_file(&self, path: &Path) -> bool {
        self.fs().map(|fs| fs.has_file(path)).unwrap_or(false)
    }

    /// Bind the collection to a workspace. Handlers are rebuilt from the
    /// configuration, so running this again replaces rather than accumulates.
    pub(crate) fn init(&mut self, workspace: Option<&Workspace>) -> Result<()> {
        self.handlers = Handlers::for_config(&self.config, workspace)?;
        if let (Some(init), Some(ws)) = (self.config.init.clone(), workspace) {
            (init.0)(&*self, ws)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuarryError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_reinit_replaces_handlers() {
        let ws = Workspace::new("/work", "site");
        let mut collection = Collection::new(
            "docs".into(),
            CollectionConfig::new(CollectionKind::Doc, "content/docs"),
            Origin::Config,
        );
        assert!(!collection.has_file(Path::new("/work/content/docs/a.md")));

        collection.init(Some(&ws)).unwrap();
        collection.init(Some(&ws)).unwrap();
        assert_eq!(collection.name(), "docs");
        assert!(collection.has_file(Path::new("/work/content/docs/a.md")));
        assert_eq!(collection.fs().unwrap().patterns().len(), 2);
    }

    #[test]
    fn test_init_procedure_runs_per_workspace_binding() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let config = CollectionConfig::new(CollectionKind::Meta, "meta").with_init(move |c, ws| {
            assert_eq!(c.name(), "meta");
            assert_eq!(ws.name, "site");
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let mut collection = Collection::new("meta".into(), config, Origin::Config);

        collection.init(Some(&Workspace::new("/work", "site"))).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_init_procedure_error_propagates() {
        let config = CollectionConfig::new(CollectionKind::Doc, "docs")
            .with_init(|_, _| Err(QuarryError::Other("no access".into())));
        let mut collection = Collection::new("docs".into(), config, Origin::Config);
        assert!(collection.init(Some(&Workspace::new("/work", "site"))).is_err());
    }
}
