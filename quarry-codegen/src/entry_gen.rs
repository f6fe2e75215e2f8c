//! The generated entry module: one export per collection.

use crate::generator::CodeGenerator;
use crate::list_gen::ListGenerator;
use crate::naming::{export_name, relative_import, string_literal};
use quarry::config::CollectionKind;
use quarry::plugin::{CollectionInfo, EmitContext};
use quarry::{QuarryError, Result};
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use url::form_urlencoded;

const DOC_EXTENSIONS: &[&str] = &["md", "mdx"];
const META_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryOptions {
    /// Module the runtime constructors are imported from
    pub runtime: String,
    /// Entry module path, relative to the output directory
    pub file_name: String,
}

impl Default for EntryOptions {
    fn default() -> Self {
        EntryOptions {
            runtime: "quarry/runtime".to_string(),
            file_name: "index.ts".to_string(),
        }
    }
}

/// Render the entry module for every collection in `ctx`, in registration
/// order.
///
/// Runtime functions are imported under `_`-prefixed aliases, which no
/// export name can take. Two collections whose names map to the same export
/// name are a configuration error.
pub fn generate_entry(ctx: &EmitContext, options: &EntryOptions) -> Result<String> {
    let mut gen = CodeGenerator::new().with_banner("Generated by quarry. Do not edit.");

    let mut exports: HashMap<String, &str> = HashMap::new();
    for info in &ctx.collections {
        let export = export_name(&info.name);
        if let Some(first) = exports.insert(export.clone(), &info.name) {
            return Err(QuarryError::Config(format!(
                "collections '{first}' and '{}' are both exported as '{export}'",
                info.name
            )));
        }
    }

    gen.add_aliased_import("list", &runtime_alias("list"), &options.runtime);
    for info in &ctx.collections {
        let constructor = constructor(&info.kind);
        gen.add_aliased_import(constructor, &runtime_alias(constructor), &options.runtime);
    }

    for info in &ctx.collections {
        let constructor = runtime_alias(constructor(&info.kind));
        let name = string_literal(&info.name);
        let base = match info.kind {
            CollectionKind::Doc => {
                let docs = doc_entries(&mut gen, ctx, info);
                format!("{constructor}({name}, {docs})")
            }
            CollectionKind::Meta => {
                let meta = meta_entries(&mut gen, ctx, info);
                format!("{constructor}({name}, {meta})")
            }
            CollectionKind::Docs => {
                let docs = doc_entries(&mut gen, ctx, info);
                let meta = meta_entries(&mut gen, ctx, info);
                format!("{constructor}({name}, {{ docs: {docs}, meta: {meta} }})")
            }
            CollectionKind::Data | CollectionKind::Custom(_) => {
                let files: Vec<String> = info
                    .files
                    .iter()
                    .map(|file| file_info(info, file))
                    .collect();
                format!("{constructor}({name}, [{}])", files.join(", "))
            }
        };

        let list = info.composers.iter().fold(
            ListGenerator::new(export_name(&info.name), base).list_call(runtime_alias("list")),
            |list, composer| list.composer(composer.as_str()),
        );
        gen.push(list.render());
    }

    log::debug!("Generated entry module for {} collections", ctx.collections.len());
    Ok(gen.flush())
}

fn constructor(kind: &CollectionKind) -> &'static str {
    match kind {
        CollectionKind::Doc => "doc",
        CollectionKind::Meta => "meta",
        CollectionKind::Docs => "docs",
        CollectionKind::Data | CollectionKind::Custom(_) => "data",
    }
}

fn runtime_alias(symbol: &str) -> String {
    format!("_{symbol}")
}

/// Import specifier of a member file, with the collection (and any extra
/// pairs) form-encoded into the query.
fn specifier(
    ctx: &EmitContext,
    info: &CollectionInfo,
    file: &Path,
    extra: &[(&str, &str)],
) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("collection", &info.name);
    for (key, value) in extra {
        query.append_pair(key, value);
    }
    format!("{}?{}", relative_import(&ctx.output_dir, file), query.finish())
}

fn doc_entries(gen: &mut CodeGenerator, ctx: &EmitContext, info: &CollectionInfo) -> String {
    let mut entries = Vec::new();
    for file in info.files.iter().filter(|f| has_extension(f, DOC_EXTENSIONS)) {
        let id = gen.generate_id("_doc_");
        let file_info = file_info(info, file);
        if info.lazy {
            let eager = specifier(ctx, info, file, &[("only", "frontmatter")]);
            gen.add_namespace_import(&id, &eager);
            entries.push(format!(
                "{{ info: {file_info}, data: {id}, load: () => import({}) }}",
                string_literal(&specifier(ctx, info, file, &[]))
            ));
        } else {
            gen.add_namespace_import(&id, &specifier(ctx, info, file, &[]));
            entries.push(format!("{{ info: {file_info}, data: {id} }}"));
        }
    }
    format!("[{}]", entries.join(", "))
}

fn meta_entries(gen: &mut CodeGenerator, ctx: &EmitContext, info: &CollectionInfo) -> String {
    let mut entries = Vec::new();
    for file in info.files.iter().filter(|f| has_extension(f, META_EXTENSIONS)) {
        let id = gen.generate_id("_meta_");
        gen.add_default_import(&id, &specifier(ctx, info, file, &[]));
        entries.push(format!("{{ info: {}, data: {id} }}", file_info(info, file)));
    }
    format!("[{}]", entries.join(", "))
}

/// `{"path":…,"fullPath":…}` for a member file.
fn file_info(info: &CollectionInfo, file: &Path) -> String {
    let relative = match file.strip_prefix(&info.dir) {
        Ok(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => file.to_string_lossy().into_owned(),
    };
    json!({ "path": relative, "fullPath": file.to_string_lossy() }).to_string()
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quarry::collection::Origin;
    use quarry::config::Workspace;
    use quarry::loader::parse_resource;
    use std::path::PathBuf;

    fn collection(name: &str, kind: CollectionKind, files: &[&str]) -> CollectionInfo {
        let dir = PathBuf::from(format!("/site/content/{name}"));
        CollectionInfo {
            name: name.to_string(),
            kind,
            files: files.iter().map(|f| dir.join(f)).collect(),
            dir,
            origin: Origin::Config,
            lazy: false,
            schema: None,
            composers: Vec::new(),
        }
    }

    fn context(collections: Vec<CollectionInfo>) -> EmitContext {
        EmitContext {
            workspace: Workspace::new("/site", "site"),
            output_dir: PathBuf::from("/site/.source"),
            collections,
        }
    }

    #[test]
    fn test_doc_collection_entry() {
        let ctx = context(vec![collection("docs", CollectionKind::Doc, &["a.md", "sub/b.mdx"])]);
        let code = generate_entry(&ctx, &EntryOptions::default()).unwrap();

        assert_eq!(
            code,
            [
                "// Generated by quarry. Do not edit.",
                r#"import { list as _list, doc as _doc } from "quarry/runtime";"#,
                r#"import * as _doc0 from "../content/docs/a.md?collection=docs";"#,
                r#"import * as _doc1 from "../content/docs/sub/b.mdx?collection=docs";"#,
                "",
                concat!(
                    r#"export const docs = _list(_doc("docs", ["#,
                    r#"{ info: {"path":"a.md","fullPath":"/site/content/docs/a.md"}, data: _doc0 }, "#,
                    r#"{ info: {"path":"sub/b.mdx","fullPath":"/site/content/docs/sub/b.mdx"}, data: _doc1 }"#,
                    r#"])).build();"#
                ),
                "",
            ]
            .join("\n")
        );
    }

    #[test]
    fn test_lazy_docs_import_front_matter_eagerly() {
        let mut docs = collection("guides", CollectionKind::Doc, &["intro.mdx"]);
        docs.lazy = true;
        let code = generate_entry(&context(vec![docs]), &EntryOptions::default()).unwrap();

        assert!(code.contains(
            r#"import * as _doc0 from "../content/guides/intro.mdx?collection=guides&only=frontmatter";"#
        ));
        assert!(code.contains(
            r#"load: () => import("../content/guides/intro.mdx?collection=guides")"#
        ));
    }

    #[test]
    fn test_docs_collection_splits_documents_and_meta() {
        let mut pages = collection(
            "blog-posts",
            CollectionKind::Docs,
            &["index.mdx", "meta.json", "notes.txt"],
        );
        pages.composers = vec!["sortByDate".to_string()];
        let code = generate_entry(&context(vec![pages]), &EntryOptions::default()).unwrap();

        assert!(code.contains(r#"import { list as _list, docs as _docs } from "quarry/runtime";"#));
        assert!(code.contains(r#"import * as _doc0 from "../content/blog-posts/index.mdx?collection=blog-posts";"#));
        assert!(code.contains(r#"import _meta0 from "../content/blog-posts/meta.json?collection=blog-posts";"#));
        assert!(!code.contains("notes.txt"));
        assert!(code.contains(r#"export const blogPosts = _list(_docs("blog-posts", { docs: ["#));
        assert!(code.ends_with(".composer(sortByDate).build();\n"));
    }

    #[test]
    fn test_runtime_import_lists_each_constructor_once() {
        let ctx = context(vec![
            collection("a", CollectionKind::Meta, &[]),
            collection("b", CollectionKind::Doc, &[]),
            collection("c", CollectionKind::Meta, &[]),
            collection("assets", CollectionKind::Data, &["logo.svg"]),
        ]);
        let options = EntryOptions {
            runtime: "@site/runtime".to_string(),
            ..EntryOptions::default()
        };
        let code = generate_entry(&ctx, &options).unwrap();

        assert!(code.contains(
            r#"import { list as _list, meta as _meta, doc as _doc, data as _data } from "@site/runtime";"#
        ));
        assert!(code.contains(r#"export const a = _list(_meta("a", [])).build();"#));
        assert!(code.contains(
            r#"export const assets = _list(_data("assets", [{"path":"logo.svg","fullPath":"/site/content/assets/logo.svg"}])).build();"#
        ));
    }

    #[test]
    fn test_collections_named_like_runtime_functions() {
        let ctx = context(vec![
            collection("docs", CollectionKind::Docs, &["index.mdx"]),
            collection("list", CollectionKind::Meta, &[]),
            collection("data", CollectionKind::Data, &[]),
        ]);
        let code = generate_entry(&ctx, &EntryOptions::default()).unwrap();

        assert!(code.contains(
            r#"import { list as _list, docs as _docs, meta as _meta, data as _data } from "quarry/runtime";"#
        ));
        assert!(code.contains(r#"export const docs = _list(_docs("docs", { docs: ["#));
        assert!(code.contains(r#"export const list = _list(_meta("list", [])).build();"#));
        assert!(code.contains(r#"export const data = _list(_data("data", [])).build();"#));
    }

    #[test]
    fn test_names_exported_under_the_same_identifier_are_rejected() {
        let ctx = context(vec![
            collection("blog-posts", CollectionKind::Doc, &[]),
            collection("blog_posts", CollectionKind::Doc, &[]),
        ]);
        match generate_entry(&ctx, &EntryOptions::default()) {
            Err(QuarryError::Config(msg)) => {
                assert!(msg.contains("'blog-posts'"));
                assert!(msg.contains("'blog_posts'"));
                assert!(msg.contains("'blogPosts'"));
            }
            other => panic!("expected a config error, got {other:?}"),
        }
    }

    #[test]
    fn test_collection_name_is_encoded_in_the_query() {
        let name = "a&b c#d=%";
        let mut docs = collection(name, CollectionKind::Doc, &["x.md"]);
        docs.lazy = true;
        let ctx = context(vec![docs]);
        let code = generate_entry(&ctx, &EntryOptions::default()).unwrap();
        assert!(!code.contains("collection=a&b"));

        let info = &ctx.collections[0];
        let eager = specifier(&ctx, info, &info.files[0], &[("only", "frontmatter")]);
        assert!(code.contains(&eager));

        let (path, query) = parse_resource(&eager);
        assert_eq!(path, PathBuf::from("../content/a&b c#d=%/x.md"));
        assert_eq!(query["collection"], vec![name.to_string()]);
        assert_eq!(query["only"], vec!["frontmatter".to_string()]);
    }
}
