use crate::error::{QuarryError, Result};
use crate::loader::{
    parse_query, DependencySink, Loader, LoaderInput, LoaderOutput, ModuleType, NoDependencies,
    Query,
};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Result of a module-resolution `load` hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadResult {
    /// `module` or `json`
    pub format: String,
    pub source: String,
    /// Whether later hooks in the chain are skipped
    pub short_circuit: bool,
}

impl LoadResult {
    fn from_output(output: LoaderOutput) -> Self {
        let format = match output.module_type() {
            ModuleType::Js => "module",
            ModuleType::Json => "json",
        };
        LoadResult {
            format: format.to_string(),
            source: output.code,
            short_circuit: true,
        }
    }
}

/// Drives a loader from a runtime module loader hook, where modules are
/// identified by URL. Only `file://` URLs are handled; everything else, and
/// every file the loader passes on, goes to `next`.
pub struct ResolveLoadAdapter {
    loader: Arc<dyn Loader>,
    deps: Arc<dyn DependencySink>,
    development: bool,
}

impl ResolveLoadAdapter {
    pub fn new(loader: Arc<dyn Loader>, development: bool) -> Self {
        ResolveLoadAdapter {
            loader,
            deps: Arc::new(NoDependencies),
            development,
        }
    }

    /// Forward declared dependencies, e.g. to restart a watch process.
    pub fn with_dependency_sink(mut self, deps: Arc<dyn DependencySink>) -> Self {
        self.deps = deps;
        self
    }

    pub async fn load<N, Fut>(&self, url: &str, next: N) -> Result<LoadResult>
    where
        N: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<LoadResult>>,
    {
        let Some((path, query)) = file_target(url)? else {
            return next(url.to_string()).await;
        };
        let output = self
            .loader
            .load(self.input(path.clone(), query))
            .await
            .map_err(|e| e.in_file(path))?;
        match output {
            Some(output) => Ok(LoadResult::from_output(output)),
            None => next(url.to_string()).await,
        }
    }

    /// For hosts whose load hook must return synchronously. Fails with
    /// [`QuarryError::AsyncInSyncContext`] when the loader does not resolve
    /// immediately.
    pub fn load_sync<N>(&self, url: &str, next: N) -> Result<LoadResult>
    where
        N: FnOnce(String) -> Result<LoadResult>,
    {
        let Some((path, query)) = file_target(url)? else {
            return next(url.to_string());
        };
        let result = match self.loader.load(self.input(path.clone(), query)).now() {
            Ok(result) => result,
            Err(_pending) => return Err(QuarryError::AsyncInSyncContext(path)),
        };
        match result.map_err(|e| e.in_file(path))? {
            Some(output) => Ok(LoadResult::from_output(output)),
            None => next(url.to_string()),
        }
    }

    fn input(&self, path: PathBuf, query: Query) -> LoaderInput {
        LoaderInput::new(path, query)
            .with_development(self.development)
            .with_dependencies(self.deps.clone())
    }
}

/// The file path and query of a `file://` URL, or `None` for any other id.
fn file_target(id: &str) -> Result<Option<(PathBuf, Query)>> {
    if !id.starts_with("file:") {
        return Ok(None);
    }
    let url = Url::parse(id)?;
    let path = url
        .to_file_path()
        .map_err(|()| QuarryError::Other(format!("'{id}' is not a local file URL")))?;
    let query = url.query().map(parse_query).unwrap_or_default();
    Ok(Some((path, query)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_file_target() {
        let (path, query) = file_target("file:///site/docs/a.mdx?collection=docs")
            .unwrap()
            .unwrap();
        assert_eq!(path, PathBuf::from("/site/docs/a.mdx"));
        assert_eq!(query["collection"], vec!["docs"]);

        assert!(file_target("node:fs").unwrap().is_none());
        assert!(file_target("./relative.js").unwrap().is_none());
        assert!(file_target("file://remote-host/a.mdx").is_err());
    }

    #[test]
    fn test_percent_encoded_paths_are_decoded() {
        let (path, _) = file_target("file:///site/my%20docs/a.mdx").unwrap().unwrap();
        assert_eq!(path, PathBuf::from("/site/my docs/a.mdx"));
    }
}
