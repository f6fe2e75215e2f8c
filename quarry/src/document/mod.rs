// Document I/O - split Markdown/MDX sources into YAML front matter and body

use crate::error::{QuarryError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static FRONT_MATTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A---[ \t]*\r?\n((?s:.*?)\r?\n)??---[ \t]*(?:\r?\n|\z)").unwrap()
});

/// A Markdown/MDX source split into front matter and body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Always a JSON object; empty when the source has no front matter
    pub frontmatter: serde_json::Value,
    pub content: String,
    /// Lines consumed by the front matter block, fences included
    pub frontmatter_lines: usize,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Document {
            frontmatter: serde_json::Value::Object(serde_json::Map::new()),
            content: content.into(),
            frontmatter_lines: 0,
        }
    }

    /// Front matter field by key
    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.frontmatter.get(key)
    }
}

/// Split a source into front matter and body.
pub fn split_front_matter(source: &str) -> Result<Document> {
    let Some(captures) = FRONT_MATTER.captures(source) else {
        return Ok(Document::new(source));
    };
    let Some(block) = captures.get(0) else {
        return Ok(Document::new(source));
    };
    let raw = captures.get(1).map(|m| m.as_str()).unwrap_or("");

    let frontmatter = parse_yaml_mapping(raw)?;
    let frontmatter_lines = block.as_str().lines().count();

    Ok(Document {
        frontmatter,
        content: source[block.end()..].to_string(),
        frontmatter_lines,
    })
}

fn parse_yaml_mapping(raw: &str) -> Result<serde_json::Value> {
    if raw.trim().is_empty() {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    }
    let yaml: serde_yaml::Value = serde_yaml::from_str(raw)?;
    match serde_json::to_value(yaml)? {
        serde_json::Value::Null => Ok(serde_json::Value::Object(serde_json::Map::new())),
        value @ serde_json::Value::Object(_) => Ok(value),
        other => Err(QuarryError::FrontMatter(format!(
            "expected a mapping, found {}",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a sequence",
        serde_json::Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_split_front_matter() {
        let doc = split_front_matter("---\ntitle: Hello\ntags: [a, b]\n---\n# Body\n").unwrap();
        assert_eq!(doc.frontmatter, json!({ "title": "Hello", "tags": ["a", "b"] }));
        assert_eq!(doc.content, "# Body\n");
        assert_eq!(doc.frontmatter_lines, 4);
        assert_eq!(doc.field("title"), Some(&json!("Hello")));
    }

    #[test]
    fn test_crlf_front_matter() {
        let doc = split_front_matter("---\r\ntitle: Win\r\n---\r\nBody").unwrap();
        assert_eq!(doc.frontmatter["title"], "Win");
        assert_eq!(doc.content, "Body");
    }

    #[test]
    fn test_missing_and_empty_front_matter() {
        let plain = split_front_matter("# No front matter").unwrap();
        assert_eq!(plain.frontmatter, json!({}));
        assert_eq!(plain.content, "# No front matter");
        assert_eq!(plain.frontmatter_lines, 0);

        let empty = split_front_matter("---\n---\nbody").unwrap();
        assert_eq!(empty.frontmatter, json!({}));
        assert_eq!(empty.content, "body");
    }

    #[test]
    fn test_fence_must_start_the_file() {
        let doc = split_front_matter("intro\n---\ntitle: x\n---\n").unwrap();
        assert_eq!(doc.frontmatter, json!({}));
    }

    #[test]
    fn test_non_mapping_front_matter_is_an_error() {
        let err = split_front_matter("---\n- a\n- b\n---\nbody").unwrap_err();
        assert!(matches!(err, QuarryError::FrontMatter(_)));

        let invalid = split_front_matter("---\ntitle: [unclosed\n---\n").unwrap_err();
        assert!(matches!(invalid, QuarryError::Yaml(_)));
    }
}
