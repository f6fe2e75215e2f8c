use crate::cache::AsyncCache;
use crate::collection::{Collection, Origin};
use crate::config::{CollectionConfig, Config, ConfigProvider, Workspace};
use crate::document::{split_front_matter, Document};
use crate::error::{QuarryError, Result};
use crate::handler::fs::{normalize, to_slash};
use crate::loader::CompiledMdx;
use crate::maybe_async::MaybeAsync;
use crate::plugin::{
    BuildReport, CollectionInfo, CoreHooks, EmitContext, EmitEntry, FileContext, InitContext,
    Plugin,
};
use crate::store::FileStore;
use crate::watcher::WatcherEvent;
use futures::FutureExt;
use indexmap::IndexMap;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Options for constructing a [`Core`].
pub struct CoreOptions {
    pub workspace: Workspace,
    /// Overrides the configured output directory
    pub output_dir: Option<PathBuf>,
    pub plugins: Vec<Arc<dyn Plugin>>,
    pub development: bool,
}

impl CoreOptions {
    pub fn new(workspace: Workspace) -> Self {
        CoreOptions {
            workspace,
            output_dir: None,
            plugins: Vec::new(),
            development: false,
        }
    }

    pub fn plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    pub fn development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }
}

/// The collection registry. Owns collections, plugins, their hook chains and
/// every cache; nothing is shared between two `Core`s.
///
/// [`Core::init`] needs exclusive access. Once the registry is shared with
/// loaders through an `Arc`, a full rebuild goes through [`Core::rebuild`]
/// and the host swaps in loaders over the new registry.
pub struct Core {
    workspace: Workspace,
    output_override: Option<PathBuf>,
    output_dir: PathBuf,
    collections: IndexMap<String, Collection>,
    plugins: Vec<Arc<dyn Plugin>>,
    hooks: CoreHooks,
    files: AsyncCache<Arc<str>>,
    compiled: AsyncCache<Arc<CompiledMdx>>,
    development: bool,
}

impl Core {
    pub fn new(options: CoreOptions) -> Self {
        let output_override = options
            .output_dir
            .as_ref()
            .map(|dir| normalize(&options.workspace.dir.join(dir)));
        let output_dir = match &output_override {
            Some(dir) => dir.clone(),
            None => normalize(&options.workspace.dir.join(Config::default().output)),
        };
        Core {
            workspace: options.workspace,
            output_override,
            output_dir,
            collections: IndexMap::new(),
            plugins: options.plugins,
            hooks: CoreHooks::default(),
            files: AsyncCache::new(),
            compiled: AsyncCache::new(),
            development: options.development,
        }
    }

    /// Load the configuration through `provider`, then [`Core::init`].
    pub async fn init_from(&mut self, provider: &dyn ConfigProvider, path: &Path) -> Result<()> {
        let config = provider.load_config(path)?;
        self.init(config).await
    }

    /// Build the registry from `config`.
    ///
    /// Configured collections register first, then plugin collections. After
    /// plugin setup and the `init` hook, collections initialize in
    /// declaration order. Any failure leaves the registry empty.
    pub async fn init(&mut self, config: Config) -> Result<()> {
        self.reset();
        let result = self.try_init(config).await;
        match &result {
            Ok(()) => log::info!(
                "Initialized {} collections in {}",
                self.collections.len(),
                self.workspace.dir.display()
            ),
            Err(e) => {
                log::warn!("Initialization failed: {e}");
                self.reset();
            }
        }
        result
    }

    /// A new registry with this one's workspace, plugins and options,
    /// initialized from `config` with empty caches. `self` keeps serving
    /// until the caller replaces it.
    pub async fn rebuild(&self, config: Config) -> Result<Core> {
        let mut core = Core {
            workspace: self.workspace.clone(),
            output_override: self.output_override.clone(),
            output_dir: self.output_dir.clone(),
            collections: IndexMap::new(),
            plugins: self.plugins.clone(),
            hooks: CoreHooks::default(),
            files: AsyncCache::new(),
            compiled: AsyncCache::new(),
            development: self.development,
        };
        core.init(config).await?;
        Ok(core)
    }

    async fn try_init(&mut self, config: Config) -> Result<()> {
        self.output_dir = match &self.output_override {
            Some(dir) => dir.clone(),
            None => normalize(&self.workspace.dir.join(&config.output)),
        };

        for (name, collection) in config.collections {
            self.register(name, collection, Origin::Config)?;
        }
        for plugin in self.plugins.clone() {
            for (name, collection) in plugin.collections() {
                self.register(name, collection, Origin::Plugin(plugin.name().to_string()))?;
            }
        }
        self.check_dependencies()?;

        let mut hooks = CoreHooks::default();
        for plugin in &self.plugins {
            log::debug!("Setting up plugin {}", plugin.name());
            plugin.setup(&mut hooks)?;
        }
        self.hooks = hooks;

        let ctx = InitContext {
            workspace: self.workspace.clone(),
            collections: self.describe_collections(true),
        };
        self.hooks.init.run_sequential(&ctx).await?;

        let workspace = &self.workspace;
        for (name, collection) in self.collections.iter_mut() {
            collection
                .init(Some(workspace))
                .map_err(|e| e.in_collection(name))?;
            if let Some(fs) = collection.fs() {
                if !fs.dir().exists() {
                    log::warn!(
                        "Collection '{name}' directory {} does not exist",
                        fs.dir().display()
                    );
                }
            }
        }
        Ok(())
    }

    fn register(&mut self, name: String, config: CollectionConfig, origin: Origin) -> Result<()> {
        if self.collections.contains_key(&name) {
            return Err(QuarryError::DuplicateCollection(name));
        }
        log::debug!("Registering collection '{name}' ({})", config.kind.as_str());
        let collection = Collection::new(name.clone(), config, origin);
        self.collections.insert(name, collection);
        Ok(())
    }

    /// Every `depends_on` entry must name a collection declared earlier.
    fn check_dependencies(&self) -> Result<()> {
        let mut declared: HashSet<&str> = HashSet::new();
        for (name, collection) in &self.collections {
            for dependency in &collection.config().depends_on {
                if !declared.contains(dependency.as_str()) {
                    let reason = if self.collections.contains_key(dependency) {
                        format!("depends on '{dependency}', which is declared after it")
                    } else {
                        format!("depends on unknown collection '{dependency}'")
                    };
                    return Err(QuarryError::Config(reason).in_collection(name));
                }
            }
            declared.insert(name.as_str());
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.collections.clear();
        self.hooks = CoreHooks::default();
        self.files.clear();
        self.compiled.clear();
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn development(&self) -> bool {
        self.development
    }

    pub fn hooks(&self) -> &CoreHooks {
        &self.hooks
    }

    pub fn plugins(&self) -> &[Arc<dyn Plugin>] {
        &self.plugins
    }

    pub fn get_collection(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    /// Like [`Core::get_collection`], failing for unknown names.
    pub fn collection(&self, name: &str) -> Result<&Collection> {
        self.get_collection(name)
            .ok_or_else(|| QuarryError::UnknownCollection(name.to_string()))
    }

    /// Collections in declaration order, optionally without those plugins
    /// contributed.
    pub fn get_collections(&self, include_plugins: bool) -> Vec<&Collection> {
        self.collections
            .values()
            .filter(|c| include_plugins || c.origin() == &Origin::Config)
            .collect()
    }

    /// The first collection, in declaration order, that contains `path`.
    pub fn collection_for_file(&self, path: &Path) -> Option<&Collection> {
        self.collections.values().find(|c| c.has_file(path))
    }

    /// Directories the watcher should observe.
    pub fn watch_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Vec::new();
        for collection in self.collections.values() {
            if let Some(fs) = collection.fs() {
                if !dirs.iter().any(|d| fs.dir().starts_with(d)) {
                    dirs.retain(|d| !d.starts_with(fs.dir()));
                    dirs.push(fs.dir().to_path_buf());
                }
            }
        }
        dirs
    }

    fn describe_collections(&self, include_plugins: bool) -> Vec<CollectionInfo> {
        self.get_collections(include_plugins)
            .into_iter()
            .map(|c| CollectionInfo::describe(c, &self.workspace))
            .collect()
    }

    /// Read a file through the content cache. Concurrent reads of one path
    /// share a single disk read.
    pub async fn read_file(&self, path: &Path) -> Result<Arc<str>> {
        let path = self.absolute(path);
        let key = cache_key(&path);
        self.files
            .cached(key, move || async move {
                log::trace!("Reading {}", path.display());
                let content = tokio::fs::read_to_string(&path).await?;
                Ok::<_, QuarryError>(Arc::from(content))
            })
            .await
    }

    /// Blocking variant of [`Core::read_file`] for synchronous hosts. Shares
    /// the content cache; while an async read of the same file is still in
    /// flight the file is read directly.
    pub fn read_file_sync(&self, path: &Path) -> Result<Arc<str>> {
        let path = self.absolute(path);
        let key = cache_key(&path);
        let read = {
            let path = path.clone();
            self.files.cached(key, move || {
                futures::future::lazy(move |_| {
                    log::trace!("Reading {}", path.display());
                    let content = std::fs::read_to_string(&path)?;
                    Ok::<_, QuarryError>(Arc::from(content))
                })
            })
        };
        match read.now_or_never() {
            Some(result) => result,
            None => Ok(Arc::from(std::fs::read_to_string(&path)?)),
        }
    }

    pub(crate) fn compiled_cache(&self) -> &AsyncCache<Arc<CompiledMdx>> {
        &self.compiled
    }

    /// Key for a compiled document: the file path plus a hash of the source
    /// and of the build mode the output is compiled for.
    pub(crate) fn compile_key(&self, path: &Path, source: &str, development: bool) -> String {
        let mut hasher = DefaultHasher::new();
        source.hash(&mut hasher);
        development.hash(&mut hasher);
        format!("{}#{:016x}", cache_key(&self.absolute(path)), hasher.finish())
    }

    /// Split front matter and run the `document` pipe.
    pub fn process_document(
        &self,
        collection: &str,
        path: &Path,
        source: &str,
    ) -> MaybeAsync<'_, Result<Document>> {
        let document = match split_front_matter(source) {
            Ok(document) => document,
            Err(e) => return MaybeAsync::Ready(Err(e)),
        };
        let ctx = self.file_context(collection, path);
        self.hooks.document.run(document, ctx)
    }

    /// Parse a JSON or YAML file and run the `meta` pipe.
    pub fn process_meta(
        &self,
        collection: &str,
        path: &Path,
        source: &str,
    ) -> MaybeAsync<'_, Result<serde_json::Value>> {
        let data = match parse_meta(path, source) {
            Ok(data) => data,
            Err(e) => return MaybeAsync::Ready(Err(e)),
        };
        let ctx = self.file_context(collection, path);
        self.hooks.meta.run(data, ctx)
    }

    fn file_context(&self, collection: &str, path: &Path) -> FileContext {
        FileContext {
            collection: collection.to_string(),
            path: self.absolute(path),
            development: self.development,
        }
    }

    /// Scan a collection and derive one record per member file: front matter
    /// for documents, parsed data for metadata, nothing for other files.
    pub async fn build_store(&self, name: &str) -> Result<FileStore<serde_json::Value>> {
        let collection = self.collection(name)?;
        let Some(fs) = collection.fs() else {
            return Ok(FileStore::new());
        };
        let mdx = collection.handlers().mdx.as_ref();
        let meta = collection.handlers().meta.as_ref();

        let mut store = FileStore::new();
        for path in fs.scan()? {
            let Some(id) = fs.relative_path(&path) else {
                continue;
            };
            let data = if mdx.is_some_and(|h| h.is_doc_file(&path)) {
                let source = self.read_file(&path).await?;
                let document = self
                    .process_document(name, &path, &source)
                    .await
                    .map_err(|e| e.in_file(&path))?;
                document.frontmatter
            } else if meta.is_some_and(|h| h.is_meta_file(&path)) {
                let source = self.read_file(&path).await?;
                self.process_meta(name, &path, &source)
                    .await
                    .map_err(|e| e.in_file(&path))?
            } else {
                serde_json::Value::Null
            };
            store.insert(id, path, data);
        }
        log::debug!("Collection '{name}' has {} entries", store.len());
        Ok(store)
    }

    /// Run the `emit` pipe, write every entry below the output directory and
    /// run `build_finished`.
    pub async fn emit(&self) -> Result<Vec<EmitEntry>> {
        let mut collections = self.describe_collections(true);
        for info in &mut collections {
            if let Some(fs) = self.collections.get(&info.name).and_then(|c| c.fs()) {
                info.files = fs.scan().map_err(|e| e.in_collection(&info.name))?;
            }
        }
        let ctx = EmitContext {
            workspace: self.workspace.clone(),
            output_dir: self.output_dir.clone(),
            collections,
        };
        let entries = self.hooks.emit.run(Vec::new(), ctx).await?;

        let mut written = Vec::with_capacity(entries.len());
        for entry in &entries {
            let target = normalize(&self.output_dir.join(&entry.path));
            if !target.starts_with(&self.output_dir) || target == self.output_dir {
                return Err(QuarryError::Config(format!(
                    "emitted path '{}' is outside the output directory",
                    entry.path
                )));
            }
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&target, &entry.content).await?;
            log::debug!("Wrote {}", target.display());
            written.push(target);
        }

        let report = BuildReport {
            output_dir: self.output_dir.clone(),
            written,
        };
        self.hooks.build_finished.run_concurrent(&report).await?;
        log::info!(
            "Emitted {} files to {}",
            entries.len(),
            self.output_dir.display()
        );
        Ok(entries)
    }

    /// Evict everything cached for `path`. Returns the number of evicted
    /// entries.
    pub fn invalidate(&self, path: &Path) -> usize {
        let key = cache_key(&self.absolute(path));
        let compiled_prefix = format!("{key}#");
        let evicted = usize::from(self.files.delete(&key))
            + self.compiled.delete_where(|k| k.starts_with(&compiled_prefix));
        if evicted > 0 {
            log::debug!("Invalidated {evicted} cache entries for {key}");
        }
        evicted
    }

    /// React to a watcher event. Returns whether the file belongs to a
    /// collection, i.e. whether generated output may be stale.
    pub fn handle_change(&self, event: &WatcherEvent) -> bool {
        self.invalidate(&event.path);
        let affected = self.collection_for_file(&event.path).is_some();
        if affected {
            log::info!("{:?} {}", event.kind, event.path.display());
        }
        affected
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            normalize(path)
        } else {
            normalize(&self.workspace.dir.join(path))
        }
    }
}

fn cache_key(path: &Path) -> String {
    to_slash(path)
}

fn parse_meta(path: &Path, source: &str) -> Result<serde_json::Value> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(serde_json::from_str(source)?),
        Some("yaml") | Some("yml") => {
            let value: serde_yaml::Value = serde_yaml::from_str(source)?;
            Ok(serde_json::to_value(value)?)
        }
        _ => Err(QuarryError::Other(format!(
            "{} is not a metadata file",
            path.display()
        ))),
    }
}
