pub mod builder;
pub mod clause;
pub mod context;
pub mod index;
pub mod params;
pub mod scope;
pub mod sort;

mod error;

pub use builder::QueryBuilder;
pub use clause::{ClauseKind, MatchType, QueryNode, SearchFields};
pub use context::{SearchContext, SearchExecutor};
pub use error::{Error, Result};
pub use index::{IndexNames, IndexTarget};
pub use params::ParamStore;
pub use scope::{ScopeDecorator, ScopeMethod, ScopeSet, method_identifier};
pub use sort::{DistanceType, GeoSortOptions, SortDirective, SortMode, SortOrder};
