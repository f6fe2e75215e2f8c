use heck::ToLowerCamelCase;
use std::path::{Component, Path};

/// Words that cannot be used as a JavaScript binding.
const RESERVED: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "implements", "import", "in", "instanceof", "interface", "let", "new", "null",
    "package", "private", "protected", "public", "return", "static", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

pub fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name)
}

/// Convert a collection name to the name it is exported under.
/// e.g. "blog-posts" -> "blogPosts", "default" -> "_default", "2024" -> "_2024"
pub fn export_name(collection_name: &str) -> String {
    let name = collection_name.to_lower_camel_case();
    let starts_with_digit = name.chars().next().map_or(true, |c| c.is_ascii_digit());
    if starts_with_digit || is_reserved(&name) {
        format!("_{name}")
    } else {
        name
    }
}

/// A double-quoted JavaScript string literal.
pub fn string_literal(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Import specifier for `file` as seen from a module in `from_dir`. Both
/// paths are absolute. The result always starts with `./` or `../`.
pub fn relative_import(from_dir: &Path, file: &Path) -> String {
    let from: Vec<Component> = from_dir.components().collect();
    let to: Vec<Component> = file.components().collect();
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    for _ in common..from.len() {
        parts.push("..".to_string());
    }
    for component in &to[common..] {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }

    let joined = parts.join("/");
    if joined.starts_with("..") {
        joined
    } else {
        format!("./{joined}")
    }
}
