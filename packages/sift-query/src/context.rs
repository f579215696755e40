use std::{fmt, sync::Arc};

use serde_json::Value;

use sift_config::{Config, PaginationFields};
use sift_reconcile::{BoxFuture, HandlerRegistry, Reconciler};

use crate::{QueryBuilder, Result};

/// Sends a compiled request to the search backend and returns the raw response body.
///
/// The request is `{"index": ..., "body": {...}}` plus any extra top-level parameters such as
/// `size` and `from`.
pub trait SearchExecutor
where
	Self: Send + Sync,
{
	fn search<'a>(&'a self, request: &'a Value) -> BoxFuture<'a, Result<Value>>;
}

/// Shared, read-only execution context handed to every builder and nested group.
pub struct SearchContext {
	executor: Arc<dyn SearchExecutor>,
	reconciler: Reconciler,
	reset_after_query: bool,
	default_per_page: u32,
	pagination_path: String,
	pagination_fields: PaginationFields,
}
impl SearchContext {
	pub fn new(executor: Arc<dyn SearchExecutor>, reconciler: Reconciler) -> Self {
		Self {
			executor,
			reconciler,
			reset_after_query: true,
			default_per_page: 30,
			pagination_path: "/".to_string(),
			pagination_fields: PaginationFields::default(),
		}
	}

	pub fn from_config(
		cfg: &Config,
		executor: Arc<dyn SearchExecutor>,
		registry: Arc<HandlerRegistry>,
	) -> Self {
		let reconciler = Reconciler::new(registry).with_refresh_default(cfg.reconcile.refresh);

		Self {
			executor,
			reconciler,
			reset_after_query: cfg.query.reset_after_query,
			default_per_page: cfg.query.default_per_page,
			pagination_path: cfg.pagination.path.clone(),
			pagination_fields: cfg.pagination.fields.clone(),
		}
	}

	pub fn with_reset_after_query(mut self, enabled: bool) -> Self {
		self.reset_after_query = enabled;

		self
	}

	pub fn with_default_per_page(mut self, per_page: u32) -> Self {
		self.default_per_page = per_page.max(1);

		self
	}

	pub fn with_pagination(mut self, path: impl Into<String>, fields: PaginationFields) -> Self {
		self.pagination_path = path.into();
		self.pagination_fields = fields;

		self
	}

	pub fn executor(&self) -> &Arc<dyn SearchExecutor> {
		&self.executor
	}

	pub fn reconciler(&self) -> &Reconciler {
		&self.reconciler
	}

	pub fn registry(&self) -> &Arc<HandlerRegistry> {
		self.reconciler.registry()
	}

	pub fn prefix(&self) -> &str {
		self.registry().prefix()
	}

	pub fn reset_after_query(&self) -> bool {
		self.reset_after_query
	}

	pub fn default_per_page(&self) -> u32 {
		self.default_per_page
	}

	pub fn pagination_path(&self) -> &str {
		&self.pagination_path
	}

	pub fn pagination_fields(&self) -> &PaginationFields {
		&self.pagination_fields
	}

	/// A fresh, empty builder bound to this context.
	pub fn builder(self: &Arc<Self>) -> QueryBuilder {
		QueryBuilder::new(self.clone())
	}
}
impl fmt::Debug for SearchContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SearchContext")
			.field("reconciler", &self.reconciler)
			.field("reset_after_query", &self.reset_after_query)
			.field("default_per_page", &self.default_per_page)
			.field("pagination_path", &self.pagination_path)
			.finish_non_exhaustive()
	}
}
