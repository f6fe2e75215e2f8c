use super::{Loader, LoaderInput, LoaderOutput};
use crate::collection::Collection;
use crate::document::Document;
use crate::error::Result;
use crate::maybe_async::MaybeAsync;
use crate::registry::Core;
use futures::future::BoxFuture;
use std::path::PathBuf;
use std::sync::Arc;

/// The Markdown/MDX compiler. Turning a document into module code is left to
/// the implementor.
pub trait MdxCompiler: Send + Sync {
    fn compile<'a>(&'a self, request: &'a CompileRequest) -> BoxFuture<'a, Result<CompiledMdx>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompileRequest {
    pub collection: String,
    pub path: PathBuf,
    /// Front matter and body after the `document` pipe
    pub document: Document,
    pub development: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompiledMdx {
    pub code: String,
    pub source_map: Option<String>,
    /// Files the output depends on besides the document itself
    pub dependencies: Vec<PathBuf>,
}

/// Compiles members of doc collections.
///
/// The collection comes from `?collection=` when present, otherwise from
/// file membership. `?only=frontmatter` skips compilation and exports the
/// front matter alone.
pub struct MdxLoader {
    core: Arc<Core>,
    compiler: Arc<dyn MdxCompiler>,
}

impl MdxLoader {
    pub fn new(core: Arc<Core>, compiler: Arc<dyn MdxCompiler>) -> Self {
        MdxLoader { core, compiler }
    }

    fn resolve(&self, input: &LoaderInput) -> Result<Option<&Collection>> {
        let collection = match input.query_value("collection") {
            Some(name) => self.core.collection(name)?,
            None => match self.core.collection_for_file(&input.file_path) {
                Some(collection) => collection,
                None => return Ok(None),
            },
        };
        let handles = collection
            .handlers()
            .mdx
            .as_ref()
            .is_some_and(|mdx| mdx.is_doc_file(&input.file_path));
        Ok(handles.then_some(collection))
    }

    async fn load_document(&self, input: LoaderInput) -> Result<Option<LoaderOutput>> {
        let Some(collection) = self.resolve(&input)? else {
            return Ok(None);
        };
        let name = collection.name();
        let source: Arc<str> = match input.host_source() {
            Some(source) => Arc::from(source),
            None => self.core.read_file(&input.file_path).await?,
        };
        let document = self
            .core
            .process_document(name, &input.file_path, &source)
            .await?;

        if input.query_value("only") == Some("frontmatter") {
            let code = format!(
                "export const frontmatter = {};",
                serde_json::to_string(&document.frontmatter)?
            );
            return Ok(Some(LoaderOutput::js(code)));
        }

        let key = self
            .core
            .compile_key(&input.file_path, &source, input.development);
        let compiler = self.compiler.clone();
        let request = CompileRequest {
            collection: name.to_string(),
            path: input.file_path.clone(),
            document,
            development: input.development,
        };
        let compiled = self
            .core
            .compiled_cache()
            .cached(key, move || async move {
                log::debug!("Compiling {}", request.path.display());
                compiler.compile(&request).await.map(Arc::new)
            })
            .await?;

        for dependency in &compiled.dependencies {
            input.declare_dependency(dependency);
        }
        Ok(Some(LoaderOutput {
            code: compiled.code.clone(),
            source_map: compiled.source_map.clone(),
            module_type: None,
        }))
    }
}

impl Loader for MdxLoader {
    fn load(&self, input: LoaderInput) -> MaybeAsync<'_, Result<Option<LoaderOutput>>> {
        MaybeAsync::pending(self.load_document(input))
    }
}
