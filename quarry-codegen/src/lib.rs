//! quarry code generation - turns registered collections into generated
//! JavaScript modules.
//!
//! The building blocks are [`CodeGenerator`] (imports and statements of one
//! module) and [`ListGenerator`] (one exported collection list). The
//! [`EntryFilePlugin`] and [`JsonSchemaPlugin`] plugins hook them into
//! [`quarry::Core::emit`].
//!
//! # Example
//!
//! ```no_run
//! use quarry::{Core, CoreOptions, Workspace};
//! use quarry_codegen::{EntryFilePlugin, JsonSchemaPlugin};
//! use std::path::Path;
//!
//! # async fn run() -> quarry::Result<()> {
//! let options = CoreOptions::new(Workspace::new("/site", "site"))
//!     .plugin(EntryFilePlugin::default())
//!     .plugin(JsonSchemaPlugin);
//! let mut core = Core::new(options);
//! core.init_from(&quarry::config::YamlConfigProvider, Path::new("/site/quarry.yaml"))
//!     .await?;
//! core.emit().await?;
//! # Ok(())
//! # }
//! ```

mod entry_gen;
mod generator;
mod list_gen;
pub mod naming;
mod schema_gen;

pub use entry_gen::{generate_entry, EntryOptions};
pub use generator::CodeGenerator;
pub use list_gen::ListGenerator;
pub use schema_gen::schema_entries;

use quarry::plugin::{CoreHooks, EmitContext, EmitEntry, Plugin};
use quarry::Result;

/// Emits the entry module exporting every collection.
#[derive(Debug, Clone, Default)]
pub struct EntryFilePlugin {
    options: EntryOptions,
}

impl EntryFilePlugin {
    pub fn new(options: EntryOptions) -> Self {
        EntryFilePlugin { options }
    }
}

impl Plugin for EntryFilePlugin {
    fn name(&self) -> &str {
        "entry-file"
    }

    fn setup(&self, hooks: &mut CoreHooks) -> Result<()> {
        let options = self.options.clone();
        hooks
            .emit
            .pipe(move |mut entries: Vec<EmitEntry>, ctx: &EmitContext| {
                let code = generate_entry(ctx, &options)?;
                entries.push(EmitEntry::new(options.file_name.clone(), code));
                Ok(entries)
            });
        Ok(())
    }
}

/// Emits `json-schema/<name>.json` for collections declaring a schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaPlugin;

impl Plugin for JsonSchemaPlugin {
    fn name(&self) -> &str {
        "json-schema"
    }

    fn setup(&self, hooks: &mut CoreHooks) -> Result<()> {
        hooks
            .emit
            .pipe(|mut entries: Vec<EmitEntry>, ctx: &EmitContext| {
                entries.extend(schema_entries(ctx)?);
                Ok(entries)
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry::config::parse_config_str;
    use quarry::{Core, CoreOptions, Workspace};
    use std::fs;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
output: .source
collections:
  docs:
    type: doc
    dir: content/docs
    schema:
      type: object
      required: [title]
  authors:
    type: meta
    dir: content/authors
    composers: ["(xs) => xs.reverse()"]
"#;

    fn workspace() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let docs = tmp.path().join("content/docs");
        let authors = tmp.path().join("content/authors");
        fs::create_dir_all(docs.join("sub")).unwrap();
        fs::create_dir_all(&authors).unwrap();
        fs::write(docs.join("a.md"), "---\ntitle: A\n---\n# A\n").unwrap();
        fs::write(docs.join("sub/b.mdx"), "---\ntitle: B\n---\n# B\n").unwrap();
        fs::write(authors.join("ann.json"), r#"{"name":"Ann"}"#).unwrap();
        tmp
    }

    #[tokio::test]
    async fn test_emit_writes_entry_and_schema_files() {
        let tmp = workspace();
        let options = CoreOptions::new(Workspace::new(tmp.path(), "site"))
            .plugin(EntryFilePlugin::default())
            .plugin(JsonSchemaPlugin);
        let mut core = Core::new(options);
        core.init(parse_config_str(CONFIG).unwrap()).await.unwrap();

        let entries = core.emit().await.unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["index.ts", "json-schema/docs.json"]);

        let out = tmp.path().join(".source");
        let index = fs::read_to_string(out.join("index.ts")).unwrap();
        assert!(index.starts_with("// Generated by quarry. Do not edit.\n"));
        assert!(index.contains(r#"import { list as _list, doc as _doc, meta as _meta } from "quarry/runtime";"#));
        assert!(index.contains(r#"import * as _doc0 from "../content/docs/a.md?collection=docs";"#));
        assert!(index.contains(r#"import * as _doc1 from "../content/docs/sub/b.mdx?collection=docs";"#));
        assert!(index.contains(r#"import _meta0 from "../content/authors/ann.json?collection=authors";"#));
        assert!(index.contains(r#"export const authors = _list(_meta("authors", ["#));
        assert!(index.contains(".composer((xs) => xs.reverse()).build();"));

        let schema: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("json-schema/docs.json")).unwrap())
                .unwrap();
        assert_eq!(schema["required"][0], "title");
        assert!(schema.get("$schema").is_some());
    }

    #[tokio::test]
    async fn test_custom_entry_file_name() {
        let tmp = workspace();
        let plugin = EntryFilePlugin::new(EntryOptions {
            file_name: "collections/entry.js".to_string(),
            ..EntryOptions::default()
        });
        let mut core =
            Core::new(CoreOptions::new(Workspace::new(tmp.path(), "site")).plugin(plugin));
        core.init(parse_config_str(CONFIG).unwrap()).await.unwrap();

        core.emit().await.unwrap();
        assert!(tmp.path().join(".source/collections/entry.js").is_file());
    }
}
