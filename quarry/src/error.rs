use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuarryError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Collection '{collection}' failed to initialize: {source}")]
    Collection {
        collection: String,
        #[source]
        source: Box<QuarryError>,
    },

    #[error("Collection not found: {0}")]
    UnknownCollection(String),

    #[error("Collection '{0}' is already registered")]
    DuplicateCollection(String),

    #[error("Invalid glob pattern '{pattern}': {message}")]
    Glob { pattern: String, message: String },

    #[error("Failed to load {}: {source}", path.display())]
    Loader {
        path: PathBuf,
        #[source]
        source: Box<QuarryError>,
    },

    #[error("Compile error: {0}")]
    Compile(String),

    #[error("Front matter error: {0}")]
    FrontMatter(String),

    #[error("Loader for {} returned an async result in a synchronous context", .0.display())]
    AsyncInSyncContext(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    /// A failure stored in the async cache and shared by every waiter.
    #[error(transparent)]
    Shared(#[from] Arc<QuarryError>),

    #[error("{0}")]
    Other(String),
}

impl QuarryError {
    /// Attribute an error to the collection whose init produced it.
    pub fn in_collection(self, collection: &str) -> Self {
        QuarryError::Collection {
            collection: collection.to_string(),
            source: Box::new(self),
        }
    }

    /// Attribute an error to the file a loader was processing.
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        QuarryError::Loader {
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// Whether the root cause is a missing file.
    pub fn is_not_found(&self) -> bool {
        match self {
            QuarryError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            QuarryError::Shared(inner) => inner.is_not_found(),
            QuarryError::Loader { source, .. } | QuarryError::Collection { source, .. } => {
                source.is_not_found()
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, QuarryError>;
