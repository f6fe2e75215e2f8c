use super::{Loader, LoaderInput, LoaderOutput};
use crate::error::Result;
use crate::maybe_async::MaybeAsync;
use crate::registry::Core;
use std::path::Path;
use std::sync::Arc;

/// Loads JSON/YAML members of meta collections. JSON files stay JSON
/// modules; YAML becomes a JS module with a default export.
///
/// Files are read synchronously through the core's content cache, so the
/// result is ready whenever the `meta` pipe has no async steps.
pub struct MetaLoader {
    core: Arc<Core>,
}

impl MetaLoader {
    pub fn new(core: Arc<Core>) -> Self {
        MetaLoader { core }
    }

    fn collection_name(&self, input: &LoaderInput) -> Result<Option<String>> {
        let collection = match input.query_value("collection") {
            Some(name) => self.core.collection(name)?,
            None => match self.core.collection_for_file(&input.file_path) {
                Some(collection) => collection,
                None => return Ok(None),
            },
        };
        let handles = collection
            .handlers()
            .meta
            .as_ref()
            .is_some_and(|meta| meta.is_meta_file(&input.file_path));
        Ok(handles.then(|| collection.name().to_string()))
    }
}

impl Loader for MetaLoader {
    fn load(&self, input: LoaderInput) -> MaybeAsync<'_, Result<Option<LoaderOutput>>> {
        let name = match self.collection_name(&input) {
            Ok(Some(name)) => name,
            Ok(None) => return MaybeAsync::Ready(Ok(None)),
            Err(e) => return MaybeAsync::Ready(Err(e)),
        };
        let source: Arc<str> = match input.host_source() {
            Some(source) => Arc::from(source),
            None => match self.core.read_file_sync(&input.file_path) {
                Ok(source) => source,
                Err(e) => return MaybeAsync::Ready(Err(e)),
            },
        };
        let json = is_json(&input.file_path);
        self.core
            .process_meta(&name, &input.file_path, &source)
            .map(move |data| render(data?, json).map(Some))
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("json")
}

fn render(data: serde_json::Value, json: bool) -> Result<LoaderOutput> {
    if json {
        Ok(LoaderOutput::json(serde_json::to_string(&data)?))
    } else {
        Ok(LoaderOutput::js(format!(
            "export default {};",
            serde_json::to_string(&data)?
        )))
    }
}
