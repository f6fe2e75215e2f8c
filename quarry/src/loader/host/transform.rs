use crate::error::Result;
use crate::loader::{parse_resource, DependencyList, Loader, LoaderInput, ModuleType};
use std::path::Path;
use std::sync::Arc;

/// The host side of a single-file transform hook.
pub trait TransformContext: Send + Sync {
    /// Rebuild the module when `path` changes.
    fn add_watch_file(&self, path: &Path);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformResult {
    pub code: String,
    pub map: Option<String>,
}

/// Drives a loader from a `transform(code, id)` hook. The host already holds
/// the source; JSON outputs are wrapped into a JS default export because the
/// hook must produce JavaScript.
pub struct TransformAdapter {
    loader: Arc<dyn Loader>,
    development: bool,
}

impl TransformAdapter {
    pub fn new(loader: Arc<dyn Loader>, development: bool) -> Self {
        TransformAdapter {
            loader,
            development,
        }
    }

    pub async fn transform(
        &self,
        ctx: &dyn TransformContext,
        code: String,
        id: &str,
    ) -> Result<Option<TransformResult>> {
        let (file_path, query) = parse_resource(id);
        let deps = Arc::new(DependencyList::default());
        let input = LoaderInput::new(file_path.clone(), query)
            .with_source(code)
            .with_development(self.development)
            .with_dependencies(deps.clone());

        let result = self.loader.load(input).await;
        // Dependencies are watched even when the load failed.
        for path in deps.take() {
            ctx.add_watch_file(&path);
        }
        let output = result.map_err(|e| e.in_file(&file_path))?;

        Ok(output.map(|output| {
            let code = match output.module_type() {
                ModuleType::Js => output.code,
                ModuleType::Json => format!("export default {};", output.code),
            };
            TransformResult {
                code,
                map: output.source_map,
            }
        }))
    }
}
