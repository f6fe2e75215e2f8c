use crate::error::Result;
use crate::loader::{parse_query, DependencyList, Loader, LoaderInput};
use crate::maybe_async::MaybeAsync;
use regex::Regex;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments of a plugin on-load callback: the resolved path and the query
/// suffix (`?collection=docs`), nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnLoadArgs {
    pub path: String,
    pub suffix: String,
}

impl OnLoadArgs {
    pub fn new(path: impl Into<String>) -> Self {
        OnLoadArgs {
            path: path.into(),
            suffix: String::new(),
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnLoadResult {
    pub contents: String,
    /// `js` or `json`
    pub loader: &'static str,
    pub watch_files: Vec<PathBuf>,
}

/// Drives a loader from an on-load plugin hook. The host passes only the
/// path, so the source is read from disk. The result is synchronous whenever
/// the loader is.
pub struct OnLoadAdapter {
    loader: Arc<dyn Loader>,
    filter: Regex,
    development: bool,
}

impl OnLoadAdapter {
    pub fn new(loader: Arc<dyn Loader>, filter: Regex, development: bool) -> Self {
        OnLoadAdapter {
            loader,
            filter,
            development,
        }
    }

    /// Paths the host should route to [`OnLoadAdapter::on_load`].
    pub fn filter(&self) -> &Regex {
        &self.filter
    }

    pub fn on_load(&self, args: &OnLoadArgs) -> MaybeAsync<'_, Result<Option<OnLoadResult>>> {
        if !self.filter.is_match(&args.path) {
            return MaybeAsync::Ready(Ok(None));
        }

        let file_path = PathBuf::from(&args.path);
        let deps = Arc::new(DependencyList::default());
        let input = LoaderInput::new(file_path.clone(), parse_query(&args.suffix))
            .with_development(self.development)
            .with_dependencies(deps.clone());

        self.loader.load(input).map(move |result| {
            let watch_files = deps.take();
            let output = result.map_err(|e| e.in_file(file_path))?;
            Ok(output.map(|output| OnLoadResult {
                loader: output.module_type().as_str(),
                contents: output.code,
                watch_files,
            }))
        })
    }
}
