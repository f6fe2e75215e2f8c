pub mod cache;
pub mod collection;
pub mod config;
pub mod document;
pub mod error;
pub mod handler;
pub mod hooks;
pub mod list;
pub mod loader;
pub mod maybe_async;
pub mod plugin;
pub mod registry;
pub mod store;
pub mod watcher;

pub use cache::AsyncCache;
pub use collection::{Collection, Origin};
pub use config::{CollectionConfig, CollectionKind, Config, ConfigProvider, Workspace};
pub use document::Document;
pub use error::{QuarryError, Result};
pub use hooks::{Hook, Pipe};
pub use list::CollectionList;
pub use loader::{Loader, LoaderInput, LoaderOutput};
pub use maybe_async::MaybeAsync;
pub use plugin::{CoreHooks, EmitEntry, Plugin};
pub use registry::{Core, CoreOptions};
pub use store::{CollectionStore, FileStore, MapStore};
