//! Collection configuration: the `quarry.yaml` surface and the provider
//! interface the registry loads it through.

mod parser;
mod types;

pub use parser::{parse_config, parse_config_str, ConfigProvider, YamlConfigProvider};
pub use types::{CollectionConfig, CollectionKind, Config, InitHook, Workspace};
pub(crate) use types::{DOC_EXTENSIONS, META_EXTENSIONS};
