//! Adapters from the [`Loader`](super::Loader) contract to host build tool
//! integration points. Each adapter only reshapes inputs and outputs; what a
//! file compiles to never depends on the host.

mod callback;
mod on_load;
mod resolve_load;
mod transform;

pub use callback::{CallbackLoaderAdapter, LoaderContext};
pub use on_load::{OnLoadAdapter, OnLoadArgs, OnLoadResult};
pub use resolve_load::{LoadResult, ResolveLoadAdapter};
pub use transform::{TransformAdapter, TransformContext, TransformResult};
