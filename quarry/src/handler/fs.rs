use crate::config::{CollectionConfig, Workspace};
use crate::error::{QuarryError, Result};
use glob::{MatchOptions, Pattern};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Maps a collection directory and its glob patterns to files on disk.
#[derive(Debug)]
pub struct FileHandler {
    dir: PathBuf,
    /// Base for resolving relative paths passed to `has_file`
    base: Option<PathBuf>,
    patterns: Vec<String>,
    extensions: Option<Vec<String>>,
    matcher: OnceLock<std::result::Result<Matcher, PatternError>>,
}

#[derive(Debug, Clone)]
struct PatternError {
    pattern: String,
    message: String,
}

impl From<PatternError> for QuarryError {
    fn from(e: PatternError) -> Self {
        QuarryError::Glob {
            pattern: e.pattern,
            message: e.message,
        }
    }
}

/// Compiled include/exclude patterns.
#[derive(Debug)]
pub struct Matcher {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl Matcher {
    fn compile(patterns: &[String]) -> std::result::Result<Self, PatternError> {
        let mut include = Vec::new();
        let mut exclude = Vec::new();
        for raw in patterns {
            let (target, source) = match raw.strip_prefix('!') {
                Some(rest) => (&mut exclude, rest),
                None => (&mut include, raw.as_str()),
            };
            let pattern =
                Pattern::new(source.trim_start_matches("./")).map_err(|e| PatternError {
                    pattern: raw.clone(),
                    message: e.to_string(),
                })?;
            target.push(pattern);
        }
        Ok(Matcher { include, exclude })
    }

    /// Match a `/`-separated path relative to the collection directory.
    pub fn is_match(&self, relative: &str) -> bool {
        self.include
            .iter()
            .any(|p| p.matches_with(relative, MATCH_OPTIONS))
            && !self
                .exclude
                .iter()
                .any(|p| p.matches_with(relative, MATCH_OPTIONS))
    }
}

impl FileHandler {
    /// Build the handler for a collection. `dir` is resolved against the
    /// workspace directory when a workspace is given, otherwise against the
    /// current directory.
    pub fn init(config: &CollectionConfig, workspace: Option<&Workspace>) -> Self {
        let dir = match workspace {
            Some(ws) => normalize(&ws.dir.join(&config.dir)),
            None => absolute(Path::new(&config.dir)),
        };
        let extensions = config.supported_extensions();
        let patterns = match (&config.files, &extensions) {
            (Some(files), _) => files.clone(),
            (None, Some(exts)) => exts.iter().map(|ext| format!("**/*.{ext}")).collect(),
            (None, None) => vec!["**/*".to_string()],
        };

        FileHandler {
            dir,
            base: workspace.map(|ws| ws.dir.clone()),
            patterns,
            extensions,
            matcher: OnceLock::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn extensions(&self) -> Option<&[String]> {
        self.extensions.as_deref()
    }

    /// Whether the file's extension is one this collection accepts.
    pub fn is_file_supported(&self, path: &Path) -> bool {
        let Some(exts) = &self.extensions else {
            return true;
        };
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| exts.iter().any(|allowed| allowed == ext))
            .unwrap_or(false)
    }

    /// The compiled matcher, built on first use.
    pub fn matcher(&self) -> Result<&Matcher> {
        self.matcher
            .get_or_init(|| Matcher::compile(&self.patterns))
            .as_ref()
            .map_err(|e| e.clone().into())
    }

    /// Whether `path` belongs to this collection: supported, under `dir`
    /// and matched by the patterns. Paths escaping `dir` are simply not
    /// members.
    pub fn has_file(&self, path: &Path) -> bool {
        if !self.is_file_supported(path) {
            return false;
        }
        let Some(relative) = self.relative_path(path) else {
            return false;
        };
        match self.matcher() {
            Ok(matcher) => matcher.is_match(&relative),
            Err(e) => {
                log::warn!("Ignoring {}: {e}", path.display());
                false
            }
        }
    }

    /// `path` relative to `dir` with `/` separators, or `None` when the path
    /// lies outside `dir`.
    pub fn relative_path(&self, path: &Path) -> Option<String> {
        let absolute = if path.is_absolute() {
            normalize(path)
        } else {
            let base = match &self.base {
                Some(base) => base.clone(),
                None => std::env::current_dir().ok()?,
            };
            normalize(&base.join(path))
        };
        let relative = absolute.strip_prefix(&self.dir).ok()?;
        if relative.as_os_str().is_empty() {
            return None;
        }
        Some(to_slash(relative))
    }

    /// Enumerate the collection's files, sorted. A missing directory yields
    /// no files.
    pub fn scan(&self) -> Result<Vec<PathBuf>> {
        let matcher = self.matcher()?;
        if !self.dir.is_dir() {
            log::debug!("Collection directory {} does not exist", self.dir.display());
            return Ok(Vec::new());
        }

        let root = Pattern::escape(&self.dir.to_string_lossy());
        let mut files = BTreeSet::new();
        for include in &matcher.include {
            let pattern = format!("{root}/{}", include.as_str());
            let entries = glob::glob_with(&pattern, MATCH_OPTIONS).map_err(|e| QuarryError::Glob {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            for entry in entries.filter_map(|r| r.ok()) {
                if entry.is_file() && self.has_file(&entry) {
                    files.insert(entry);
                }
            }
        }

        Ok(files.into_iter().collect())
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return normalize(path);
    }
    match std::env::current_dir() {
        Ok(cwd) => normalize(&cwd.join(path)),
        Err(e) => {
            log::warn!("Cannot resolve {} against the current directory: {e}", path.display());
            normalize(path)
        }
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                None | Some(Component::ParentDir) => out.push(".."),
                Some(_) => {
                    out.pop();
                }
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

pub(crate) fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollectionKind;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn handler(kind: CollectionKind, dir: &str, files: Option<&[&str]>, root: &Path) -> FileHandler {
        let mut config = CollectionConfig::new(kind, dir);
        if let Some(files) = files {
            config = config.with_files(files.iter().copied());
        }
        FileHandler::init(&config, Some(&Workspace::new(root, "test")))
    }

    #[test]
    fn test_has_file_requires_dir_pattern_and_extension() {
        let root = Path::new("/work");
        let h = handler(CollectionKind::Doc, "content/docs", Some(&["**/*.md"]), root);

        assert!(h.has_file(Path::new("/work/content/docs/a.md")));
        assert!(h.has_file(Path::new("/work/content/docs/sub/b.md")));
        assert!(h.has_file(Path::new("content/docs/a.md")));
        // Supported extension but not matched by the patterns
        assert!(!h.has_file(Path::new("/work/content/docs/a.mdx")));
        // Unsupported extension
        assert!(!h.has_file(Path::new("/work/content/docs/a.txt")));
        // Outside the collection directory
        assert!(!h.has_file(Path::new("/work/content/other.md")));
    }

    #[test]
    fn test_traversal_never_escapes_dir() {
        let root = Path::new("/work");
        let h = handler(CollectionKind::Doc, "content/docs", None, root);

        assert!(!h.has_file(Path::new("/work/content/docs/../other.md")));
        assert!(!h.has_file(Path::new("content/docs/../../secret.md")));
        assert!(!h.has_file(Path::new("/etc/passwd.md")));
        assert!(h.has_file(Path::new("/work/content/docs/sub/../a.md")));
    }

    #[test]
    fn test_default_patterns() {
        let root = Path::new("/work");
        let doc = handler(CollectionKind::Doc, "docs", None, root);
        assert_eq!(doc.patterns(), &["**/*.md".to_string(), "**/*.mdx".to_string()]);

        let data = handler(CollectionKind::Data, "public", None, root);
        assert_eq!(data.patterns(), &["**/*".to_string()]);
        assert!(data.is_file_supported(Path::new("logo.png")));
        assert!(data.has_file(Path::new("/work/public/img/logo.png")));
    }

    #[test]
    fn test_exclusion_patterns() {
        let root = Path::new("/work");
        let h = handler(
            CollectionKind::Doc,
            "docs",
            Some(&["**/*.md", "!drafts/**"]),
            root,
        );
        assert!(h.has_file(Path::new("/work/docs/guide.md")));
        assert!(!h.has_file(Path::new("/work/docs/drafts/wip.md")));
    }

    #[test]
    fn test_matcher_is_built_lazily() {
        let root = Path::new("/work");
        let h = handler(CollectionKind::Doc, "docs", Some(&["[bad"]), root);
        // Construction succeeds; the error surfaces on first use.
        assert!(!h.has_file(Path::new("/work/docs/a.md")));
        assert!(matches!(h.scan(), Err(QuarryError::Glob { .. })));
    }

    #[test]
    fn test_scan_collects_matching_files() {
        let tmp = TempDir::new().unwrap();
        let docs = tmp.path().join("content/docs");
        std::fs::create_dir_all(docs.join("sub")).unwrap();
        std::fs::write(docs.join("a.md"), "# A").unwrap();
        std::fs::write(docs.join("sub/b.md"), "# B").unwrap();
        std::fs::write(docs.join("notes.txt"), "skip").unwrap();
        std::fs::write(tmp.path().join("content/other.md"), "# Other").unwrap();

        let h = handler(CollectionKind::Doc, "content/docs", Some(&["**/*.md"]), tmp.path());
        let files: Vec<String> = h
            .scan()
            .unwrap()
            .iter()
            .map(|p| h.relative_path(p).unwrap())
            .collect();
        assert_eq!(files, vec!["a.md", "sub/b.md"]);
    }

    #[test]
    fn test_without_workspace_dir_resolves_against_current_dir() {
        let tmp = tempfile::Builder::new()
            .prefix(".fs-handler")
            .tempdir_in(".")
            .unwrap();
        let name = tmp.path().file_name().unwrap().to_string_lossy().into_owned();
        std::fs::create_dir_all(tmp.path().join("content/docs")).unwrap();
        std::fs::write(tmp.path().join("content/docs/a.md"), "# A").unwrap();

        let config = CollectionConfig::new(CollectionKind::Doc, format!("{name}/content/docs"));
        let h = FileHandler::init(&config, None);
        let dir = std::env::current_dir().unwrap().join(&name).join("content/docs");

        assert_eq!(h.dir(), dir.as_path());
        assert!(h.has_file(&Path::new(&name).join("content/docs/a.md")));
        assert!(h.has_file(&dir.join("a.md")));
        assert_eq!(h.scan().unwrap(), vec![dir.join("a.md")]);
    }

    #[test]
    fn test_scan_missing_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        let h = handler(CollectionKind::Meta, "nope", None, tmp.path());
        assert!(h.scan().unwrap().is_empty());
    }
}
