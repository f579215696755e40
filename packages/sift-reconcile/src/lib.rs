pub mod handler;
pub mod pagination;
pub mod reconcile;
pub mod registry;
pub mod response;

mod error;

pub use error::{Error, Result};
pub use handler::{
	BoxFuture, Handler, IndexDefinition, RecordMap, RecordModel, SourceIndex, record_key,
};
pub use pagination::Paginator;
pub use reconcile::{Reconciler, SearchResults};
pub use registry::{HandlerRegistry, IndexMap, IndexMapInput, apply_index_prefix};
pub use response::{Hit, Meta, RawResponse};
