use crate::error::Result;
use crate::loader::{parse_query, DependencyList, Loader, LoaderInput, LoaderOutput};
use crate::maybe_async::MaybeAsync;
use std::path::Path;
use std::sync::Arc;

/// The host side of a callback-style bundler loader.
pub trait LoaderContext: Send + Sync {
    fn resource_path(&self) -> &Path;
    /// Raw query string including the leading `?`, or empty
    fn resource_query(&self) -> &str;
    fn development(&self) -> bool;
    fn cacheable(&self, cacheable: bool);
    fn add_dependency(&self, path: &Path);
}

/// Drives a loader from a bundler loader that receives the raw source and
/// reports completion through a callback.
///
/// The result is always marked cacheable, and dependencies are registered
/// with the host before the callback runs. Files the loader passes on are
/// returned unchanged.
pub struct CallbackLoaderAdapter {
    loader: Arc<dyn Loader>,
}

impl CallbackLoaderAdapter {
    pub fn new(loader: Arc<dyn Loader>) -> Self {
        CallbackLoaderAdapter { loader }
    }

    /// Run the loader and call `callback` exactly once. The returned value
    /// is ready when the callback has already been called.
    pub fn run<'a, F>(
        &'a self,
        ctx: &'a dyn LoaderContext,
        source: String,
        callback: F,
    ) -> MaybeAsync<'a, ()>
    where
        F: FnOnce(Result<LoaderOutput>) + Send + 'a,
    {
        ctx.cacheable(true);
        let file_path = ctx.resource_path().to_path_buf();
        let deps = Arc::new(DependencyList::default());
        let input = LoaderInput::new(file_path.clone(), parse_query(ctx.resource_query()))
            .with_source(source.clone())
            .with_development(ctx.development())
            .with_dependencies(deps.clone());

        self.loader.load(input).map(move |result| {
            for path in deps.take() {
                ctx.add_dependency(&path);
            }
            let result = match result {
                Ok(Some(output)) => Ok(output),
                Ok(None) => Ok(LoaderOutput {
                    code: source,
                    source_map: None,
                    module_type: None,
                }),
                Err(e) => Err(e.in_file(file_path)),
            };
            callback(result);
        })
    }
}
