use std::fmt;

/// Renders one exported collection list:
/// `export const <name> = list(<base>).composer(<fn>)….build();`
///
/// Composers render in the order they are added, matching the runtime's
/// left-to-right application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListGenerator {
    name: String,
    list_call: String,
    base: String,
    composers: Vec<String>,
    build_call: String,
}

impl ListGenerator {
    pub fn new(name: impl Into<String>, base_expr: impl Into<String>) -> Self {
        ListGenerator {
            name: name.into(),
            list_call: "list".to_string(),
            base: base_expr.into(),
            composers: Vec::new(),
            build_call: "build".to_string(),
        }
    }

    pub fn composer(mut self, expr: impl Into<String>) -> Self {
        self.composers.push(expr.into());
        self
    }

    /// Function that wraps the base expression.
    pub fn list_call(mut self, name: impl Into<String>) -> Self {
        self.list_call = name.into();
        self
    }

    /// Method that terminates the chain.
    pub fn build_call(mut self, name: impl Into<String>) -> Self {
        self.build_call = name.into();
        self
    }

    pub fn render(&self) -> String {
        let mut out = format!(
            "export const {} = {}({})",
            self.name, self.list_call, self.base
        );
        for composer in &self.composers {
            out.push_str(&format!(".composer({composer})"));
        }
        out.push_str(&format!(".{}();", self.build_call));
        out
    }
}

impl fmt::Display for ListGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_without_composers() {
        let list = ListGenerator::new("docs", "doc(\"docs\", [])");
        assert_eq!(list.render(), r#"export const docs = list(doc("docs", [])).build();"#);
    }

    #[test]
    fn test_composers_keep_order() {
        let list = ListGenerator::new("posts", "items")
            .composer("upper")
            .composer("(xs) => xs.filter((x) => x !== \"Y\")")
            .list_call("_list")
            .build_call("toArray");
        assert_eq!(
            list.to_string(),
            r#"export const posts = _list(items).composer(upper).composer((xs) => xs.filter((x) => x !== "Y")).toArray();"#
        );
    }
}
