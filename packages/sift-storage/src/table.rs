use std::{fmt, sync::Arc};

use serde_json::{Map, Value};
use sqlx::PgPool;

use sift_reconcile::{BoxFuture, RecordMap, RecordModel, record_key};

use crate::{Error, Result};

type Transform = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// A Postgres table used as the system of record for one search index.
///
/// Rows are read as `to_jsonb(row)` and keyed by the key column rendered as text.
#[derive(Clone)]
pub struct PgTable {
	pool: PgPool,
	table: String,
	key_name: String,
	searchable_as: String,
	searchable_refresh: Option<Option<bool>>,
	refresh_flag: bool,
	relations: Vec<String>,
	transform: Option<Transform>,
}
impl PgTable {
	/// `table` may be schema-qualified. The index name defaults to the bare table name.
	pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
		let table = table.into();
		let searchable_as = table.rsplit('.').next().unwrap_or(table.as_str()).to_string();

		Self {
			pool,
			table,
			key_name: "id".to_string(),
			searchable_as,
			searchable_refresh: None,
			refresh_flag: false,
			relations: Vec::new(),
			transform: None,
		}
	}

	pub fn with_key_name(mut self, key_name: impl Into<String>) -> Self {
		self.key_name = key_name.into();

		self
	}

	pub fn with_searchable_as(mut self, index: impl Into<String>) -> Self {
		self.searchable_as = index.into();

		self
	}

	/// Opts into searchable refresh. `None` defers to the configured default.
	pub fn with_searchable_refresh(mut self, refresh: Option<bool>) -> Self {
		self.searchable_refresh = Some(refresh);

		self
	}

	pub fn with_refresh_flag(mut self, refresh: bool) -> Self {
		self.refresh_flag = refresh;

		self
	}

	/// Fields holding related records. They are dropped before indexed fields are hydrated.
	pub fn with_relations<I, S>(mut self, relations: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.relations = relations.into_iter().map(Into::into).collect();

		self
	}

	pub fn with_transform<F>(mut self, transform: F) -> Self
	where
		F: Fn(Value) -> Value + Send + Sync + 'static,
	{
		self.transform = Some(Arc::new(transform));

		self
	}

	pub fn table(&self) -> &str {
		&self.table
	}

	pub async fn fetch_records(&self, ids: &[String]) -> Result<RecordMap> {
		if ids.is_empty() {
			return Ok(RecordMap::new());
		}

		let sql = format!(
			"SELECT to_jsonb(t) FROM {} t WHERE t.{}::text = ANY($1)",
			quote_ident(&self.table)?,
			quote_ident(&self.key_name)?,
		);
		let rows: Vec<Value> =
			sqlx::query_scalar(sql.as_str()).bind(ids).fetch_all(&self.pool).await?;
		let mut records = RecordMap::with_capacity(rows.len());

		for row in rows {
			let Some(key) = row.get(&self.key_name).and_then(record_key) else {
				continue;
			};

			records.insert(key, row);
		}

		tracing::debug!(
			table = %self.table,
			requested = ids.len(),
			found = records.len(),
			"Fetched records by id."
		);

		Ok(records)
	}
}
impl RecordModel for PgTable {
	fn searchable_as(&self) -> &str {
		&self.searchable_as
	}

	fn key_name(&self) -> &str {
		&self.key_name
	}

	fn searchable_refresh(&self, default: bool) -> Option<bool> {
		self.searchable_refresh.map(|refresh| refresh.unwrap_or(default))
	}

	fn refresh_flag(&self) -> bool {
		self.refresh_flag
	}

	fn hydrate(&self, fields: Map<String, Value>) -> Value {
		let mut fields = fields;

		for relation in &self.relations {
			fields.remove(relation);
		}

		Value::Object(fields)
	}

	fn fetch_by_ids<'a>(
		&'a self,
		ids: &'a [String],
	) -> BoxFuture<'a, sift_reconcile::Result<RecordMap>> {
		Box::pin(async move { Ok(self.fetch_records(ids).await?) })
	}

	fn transform(&self, record: Value) -> Value {
		match &self.transform {
			Some(transform) => transform(record),
			None => record,
		}
	}
}
impl fmt::Debug for PgTable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PgTable")
			.field("table", &self.table)
			.field("key_name", &self.key_name)
			.field("searchable_as", &self.searchable_as)
			.field("searchable_refresh", &self.searchable_refresh)
			.field("refresh_flag", &self.refresh_flag)
			.field("relations", &self.relations)
			.finish_non_exhaustive()
	}
}

/// Quotes a possibly schema-qualified identifier, e.g. `app.posts` becomes `"app"."posts"`.
pub fn quote_ident(raw: &str) -> Result<String> {
	let mut quoted = Vec::new();

	for part in raw.split('.') {
		if part.trim().is_empty() {
			return Err(Error::InvalidArgument(format!(
				"Identifier {raw:?} must not have empty parts."
			)));
		}

		quoted.push(format!("\"{}\"", part.replace('"', "\"\"")));
	}

	Ok(quoted.join("."))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn identifiers_are_quoted_per_part() {
		assert_eq!(quote_ident("posts").expect("ident"), r#""posts""#);
		assert_eq!(quote_ident("app.posts").expect("ident"), r#""app"."posts""#);
		assert_eq!(quote_ident(r#"we"ird"#).expect("ident"), r#""we""ird""#);
		assert!(matches!(quote_ident("app..posts"), Err(Error::InvalidArgument(_))));
		assert!(matches!(quote_ident(""), Err(Error::InvalidArgument(_))));
	}

	#[tokio::test]
	async fn hydration_strips_relations_and_refresh_defers_to_default() {
		let pool = PgPool::connect_lazy("postgres://localhost/sift").expect("Lazy pool should build.");
		let table = PgTable::new(pool, "app.posts")
			.with_relations(["author", "comments"])
			.with_searchable_refresh(None)
			.with_transform(|record| serde_json::json!({ "post": record }));
		let mut fields = Map::new();

		fields.insert("id".to_string(), Value::from(1));
		fields.insert("author".to_string(), serde_json::json!({ "id": 9 }));
		fields.insert("comments".to_string(), serde_json::json!([]));

		assert_eq!(table.searchable_as(), "posts");
		assert_eq!(table.hydrate(fields), serde_json::json!({ "id": 1 }));
		assert_eq!(table.searchable_refresh(true), Some(true));
		assert_eq!(table.searchable_refresh(false), Some(false));
		assert_eq!(table.transform(Value::from(1)), serde_json::json!({ "post": 1 }));
	}
}
