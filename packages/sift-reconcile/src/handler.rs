use std::{collections::HashMap, fmt, future::Future, pin::Pin, sync::Arc};

use serde_json::{Map, Value};

use crate::Result;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Records keyed by their primary key rendered as text.
pub type RecordMap = HashMap<String, Value>;

/// A handler backed by the system of record.
pub trait RecordModel
where
	Self: Send + Sync,
{
	/// Unprefixed index name the model is searchable as.
	fn searchable_as(&self) -> &str;

	fn key_name(&self) -> &str {
		"id"
	}

	/// `Some` when the model opts into searchable refresh. `default` is the configured fallback
	/// for models that do not carry their own flag.
	fn searchable_refresh(&self, _default: bool) -> Option<bool> {
		None
	}

	/// Static refresh flag, consulted only when searchable refresh is not exposed.
	fn refresh_flag(&self) -> bool {
		false
	}

	/// Builds a record from indexed fields without touching the store.
	fn hydrate(&self, fields: Map<String, Value>) -> Value {
		Value::Object(fields)
	}

	fn fetch_by_ids<'a>(&'a self, ids: &'a [String]) -> BoxFuture<'a, Result<RecordMap>>;

	/// Shapes a hydrated record for callers. Runs last for every hit.
	fn transform(&self, record: Value) -> Value {
		record
	}
}

/// A handler that describes an index rather than a stored record type.
pub trait IndexDefinition
where
	Self: Send + Sync,
{
	/// Unprefixed index name.
	fn index(&self) -> &str;

	fn key_name(&self) -> &str {
		"id"
	}

	fn searchable_refresh(&self, _default: bool) -> Option<bool> {
		None
	}

	/// Identity of the record model behind this index, resolved through the registry.
	fn model(&self) -> Option<&str> {
		None
	}

	fn set_data(&self, fields: Map<String, Value>) -> Value {
		Value::Object(fields)
	}

	fn get_data<'a>(&'a self, ids: &'a [String]) -> BoxFuture<'a, Result<RecordMap>>;

	fn transform(&self, record: Value) -> Value {
		record
	}
}

#[derive(Clone)]
pub enum Handler {
	Record(Arc<dyn RecordModel>),
	Index(Arc<dyn IndexDefinition>),
}
impl Handler {
	pub fn record(model: impl RecordModel + 'static) -> Self {
		Self::Record(Arc::new(model))
	}

	pub fn index(definition: impl IndexDefinition + 'static) -> Self {
		Self::Index(Arc::new(definition))
	}

	pub fn searchable_as(&self) -> &str {
		match self {
			Self::Record(model) => model.searchable_as(),
			Self::Index(definition) => definition.index(),
		}
	}

	pub fn key_name(&self) -> &str {
		match self {
			Self::Record(model) => model.key_name(),
			Self::Index(definition) => definition.key_name(),
		}
	}

	pub fn kind(&self) -> &'static str {
		match self {
			Self::Record(_) => "record",
			Self::Index(_) => "index",
		}
	}
}
impl fmt::Debug for Handler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Handler")
			.field("kind", &self.kind())
			.field("searchable_as", &self.searchable_as())
			.finish()
	}
}

/// Index definition that hands indexed fields straight through.
#[derive(Debug, Clone)]
pub struct SourceIndex {
	index: String,
	key_name: String,
}
impl SourceIndex {
	pub fn new(index: impl Into<String>) -> Self {
		Self { index: index.into(), key_name: "id".to_string() }
	}

	pub fn with_key_name(mut self, key_name: impl Into<String>) -> Self {
		self.key_name = key_name.into();

		self
	}
}
impl IndexDefinition for SourceIndex {
	fn index(&self) -> &str {
		&self.index
	}

	fn key_name(&self) -> &str {
		&self.key_name
	}

	fn get_data<'a>(&'a self, _ids: &'a [String]) -> BoxFuture<'a, Result<RecordMap>> {
		Box::pin(async { Ok(RecordMap::new()) })
	}
}

/// Renders a key value the way stores key their records. Only strings and numbers are keys.
pub fn record_key(value: &Value) -> Option<String> {
	match value {
		Value::String(key) => Some(key.clone()),
		Value::Number(key) => Some(key.to_string()),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn record_key_accepts_strings_and_numbers() {
		assert_eq!(record_key(&serde_json::json!("a-1")), Some("a-1".to_string()));
		assert_eq!(record_key(&serde_json::json!(42)), Some("42".to_string()));
		assert_eq!(record_key(&Value::Null), None);
		assert_eq!(record_key(&serde_json::json!({ "id": 1 })), None);
	}

	#[test]
	fn handler_reports_index_and_key() {
		let handler = Handler::index(SourceIndex::new("posts").with_key_name("slug"));

		assert_eq!(handler.searchable_as(), "posts");
		assert_eq!(handler.key_name(), "slug");
		assert_eq!(handler.kind(), "index");
	}
}
