use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ImportKind {
    Named(Vec<String>),
    Namespace(String),
    Default(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Import {
    source: String,
    kind: ImportKind,
}

impl fmt::Display for Import {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = crate::naming::string_literal(&self.source);
        match &self.kind {
            ImportKind::Named(symbols) => {
                write!(f, "import {{ {} }} from {source};", symbols.join(", "))
            }
            ImportKind::Namespace(alias) => write!(f, "import * as {alias} from {source};"),
            ImportKind::Default(alias) => write!(f, "import {alias} from {source};"),
        }
    }
}

/// Accumulates an ES module: imports first, then statements.
///
/// Imports are deduplicated and keep the position of their first
/// registration. Named imports from one source collapse into a single line.
#[derive(Debug, Default, Clone)]
pub struct CodeGenerator {
    banner: Option<String>,
    imports: Vec<Import>,
    statements: Vec<String>,
    ids: HashMap<String, usize>,
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A comment line emitted above everything else.
    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = Some(banner.into());
        self
    }

    pub fn add_named_import<I, S>(&mut self, symbols: I, source: &str)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let symbols: Vec<String> = symbols.into_iter().map(Into::into).collect();
        let existing = self.imports.iter_mut().find_map(|import| match &mut import.kind {
            ImportKind::Named(names) if import.source == source => Some(names),
            _ => None,
        });
        match existing {
            Some(names) => {
                for symbol in symbols {
                    if !names.contains(&symbol) {
                        names.push(symbol);
                    }
                }
            }
            None => {
                let mut names: Vec<String> = Vec::with_capacity(symbols.len());
                for symbol in symbols {
                    if !names.contains(&symbol) {
                        names.push(symbol);
                    }
                }
                self.imports.push(Import {
                    source: source.to_string(),
                    kind: ImportKind::Named(names),
                });
            }
        }
    }

    /// `import { symbol as alias }`, merged with the other named imports
    /// from `source`.
    pub fn add_aliased_import(&mut self, symbol: &str, alias: &str, source: &str) {
        self.add_named_import([format!("{symbol} as {alias}")], source);
    }

    pub fn add_namespace_import(&mut self, alias: impl Into<String>, source: &str) {
        self.add_unique(source, ImportKind::Namespace(alias.into()));
    }

    pub fn add_default_import(&mut self, alias: impl Into<String>, source: &str) {
        self.add_unique(source, ImportKind::Default(alias.into()));
    }

    fn add_unique(&mut self, source: &str, kind: ImportKind) {
        let import = Import {
            source: source.to_string(),
            kind,
        };
        if !self.imports.contains(&import) {
            self.imports.push(import);
        }
    }

    pub fn push(&mut self, statement: impl Into<String>) {
        self.statements.push(statement.into());
    }

    /// A fresh local binding: `prefix0`, `prefix1`, …
    pub fn generate_id(&mut self, prefix: &str) -> String {
        let counter = self.ids.entry(prefix.to_string()).or_insert(0);
        let id = format!("{prefix}{counter}");
        *counter += 1;
        id
    }

    /// Render the module.
    pub fn flush(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        if let Some(banner) = &self.banner {
            lines.push(format!("// {banner}"));
        }
        lines.extend(self.imports.iter().map(ToString::to_string));
        if !self.imports.is_empty() && !self.statements.is_empty() {
            lines.push(String::new());
        }
        lines.extend(self.statements.iter().cloned());
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

impl fmt::Display for CodeGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.flush())
    }
}
