use std::{collections::HashMap, sync::Arc};

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{
	Error, Handler, HandlerRegistry, IndexDefinition, Meta, RawResponse, RecordMap, RecordModel,
	Result, response::Hit,
};

/// Ordered, transformed records plus the response metadata they came with.
#[derive(Debug, Clone)]
pub struct SearchResults {
	meta: Meta,
	data: Vec<Value>,
	raw: Value,
}
impl SearchResults {
	pub fn count(&self) -> usize {
		self.meta.count()
	}

	pub fn total(&self) -> u64 {
		self.meta.total()
	}

	pub fn max_score(&self) -> Option<f64> {
		self.meta.max_score()
	}

	pub fn time(&self, with_unit: bool) -> String {
		self.meta.time(with_unit)
	}

	pub fn meta(&self) -> &Meta {
		&self.meta
	}

	pub fn data(&self) -> &[Value] {
		&self.data
	}

	pub fn into_data(self) -> Vec<Value> {
		self.data
	}

	/// The untouched backend response.
	pub fn raw(&self) -> &Value {
		&self.raw
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	pub fn to_json(&self) -> Value {
		serde_json::json!({ "meta": self.meta.to_value(), "data": self.data })
	}
}
impl IntoIterator for SearchResults {
	type IntoIter = std::vec::IntoIter<Value>;
	type Item = Value;

	fn into_iter(self) -> Self::IntoIter {
		self.data.into_iter()
	}
}
impl Serialize for SearchResults {
	fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		self.data.serialize(serializer)
	}
}

/// Turns raw search responses into ordered domain records.
#[derive(Debug, Clone)]
pub struct Reconciler {
	registry: Arc<HandlerRegistry>,
	refresh_default: bool,
}
impl Reconciler {
	pub fn new(registry: Arc<HandlerRegistry>) -> Self {
		Self { registry, refresh_default: false }
	}

	/// Fallback used by handlers that expose searchable refresh without their own flag.
	pub fn with_refresh_default(mut self, refresh_default: bool) -> Self {
		self.refresh_default = refresh_default;

		self
	}

	pub fn registry(&self) -> &Arc<HandlerRegistry> {
		&self.registry
	}

	pub fn should_refresh(&self, handler: &Handler) -> bool {
		match handler {
			Handler::Record(model) => model
				.searchable_refresh(self.refresh_default)
				.unwrap_or_else(|| model.refresh_flag()),
			Handler::Index(definition) =>
				definition.searchable_refresh(self.refresh_default).unwrap_or(false),
		}
	}

	/// Runs one reconciliation pass. Any unresolved index aborts the pass before any fetch runs.
	pub async fn reconcile(&self, raw: Value) -> Result<SearchResults> {
		let RawResponse { meta, hits } = RawResponse::parse(&raw)?;
		let mut positions = HashMap::new();
		let mut groups: Vec<(String, Vec<(usize, Hit)>)> = Vec::new();

		for (order, hit) in hits.into_iter().enumerate() {
			let slot = *positions.entry(hit.index.clone()).or_insert_with(|| {
				groups.push((hit.index.clone(), Vec::new()));

				groups.len() - 1
			});

			groups[slot].1.push((order, hit));
		}

		let mut plans = Vec::with_capacity(groups.len());

		for (index, hits) in groups {
			let handler = self
				.registry
				.resolve(&index)
				.ok_or_else(|| Error::UnresolvedIndexHandler { index: index.clone() })?;
			let refresh = self.should_refresh(&handler);
			let source = self.source_for(&index, handler)?;

			plans.push(GroupPlan { index, source, refresh, hits });
		}

		let groups = futures::future::try_join_all(plans.into_iter().map(reconcile_group)).await?;
		let mut rows = groups.into_iter().flatten().collect::<Vec<_>>();

		rows.sort_by_key(|(order, _)| *order);

		Ok(SearchResults { meta, data: rows.into_iter().map(|(_, record)| record).collect(), raw })
	}

	fn source_for(&self, index: &str, handler: Handler) -> Result<Source> {
		match handler {
			Handler::Record(model) => Ok(Source::Record(model)),
			Handler::Index(definition) => {
				let Some(identity) = definition.model().map(str::to_string) else {
					return Ok(Source::Index(definition));
				};

				match self.registry.handler(&identity) {
					Some(Handler::Record(model)) => Ok(Source::Delegated { definition, model }),
					Some(Handler::Index(_)) => Err(Error::UnsupportedHandlerType {
						index: index.to_string(),
						identity,
						reason: "delegation target must be a record model.".to_string(),
					}),
					None => Err(Error::UnknownHandler { identity }),
				}
			},
		}
	}
}

enum Source {
	Record(Arc<dyn RecordModel>),
	Index(Arc<dyn IndexDefinition>),
	Delegated { definition: Arc<dyn IndexDefinition>, model: Arc<dyn RecordModel> },
}
impl Source {
	fn key_name(&self) -> &str {
		match self {
			Self::Record(model) => model.key_name(),
			Self::Index(definition) | Self::Delegated { definition, .. } => definition.key_name(),
		}
	}

	async fn fetch(&self, ids: &[String]) -> Result<RecordMap> {
		match self {
			Self::Record(model) | Self::Delegated { model, .. } => model.fetch_by_ids(ids).await,
			Self::Index(definition) => definition.get_data(ids).await,
		}
	}

	fn build(&self, fields: Map<String, Value>) -> Value {
		match self {
			Self::Record(model) | Self::Delegated { model, .. } => model.hydrate(fields),
			Self::Index(definition) => definition.set_data(fields),
		}
	}

	fn transform(&self, record: Value) -> Value {
		match self {
			Self::Record(model) | Self::Delegated { model, .. } => model.transform(record),
			Self::Index(definition) => definition.transform(record),
		}
	}
}

struct GroupPlan {
	index: String,
	source: Source,
	refresh: bool,
	hits: Vec<(usize, Hit)>,
}

async fn reconcile_group(plan: GroupPlan) -> Result<Vec<(usize, Value)>> {
	let GroupPlan { index, source, refresh, hits } = plan;
	let key_name = source.key_name().to_string();
	let fetch = refresh || matches!(source, Source::Delegated { .. });

	tracing::debug!(%index, hits = hits.len(), refresh, fetch, "Reconciling index group.");

	let keyed = hits
		.into_iter()
		.map(|(order, hit)| {
			let key = hit
				.source
				.get(&key_name)
				.and_then(crate::record_key)
				.or_else(|| hit.id.clone())
				.unwrap_or_default();

			(order, key, hit.source)
		})
		.collect::<Vec<_>>();
	let mut rows = Vec::with_capacity(keyed.len());
	let mut missing = Vec::new();

	if fetch {
		let mut ids = Vec::new();

		for (_, key, _) in &keyed {
			if !key.is_empty() && !ids.contains(key) {
				ids.push(key.clone());
			}
		}

		let records = source.fetch(&ids).await?;

		for (order, key, _) in keyed {
			match records.get(&key) {
				Some(record) if !record.is_null() =>
					rows.push((order, source.transform(record.clone()))),
				_ => missing.push(key),
			}
		}
	} else {
		for (order, key, fields) in keyed {
			let record = source.build(fields);

			if record.is_null() {
				missing.push(key);
			} else {
				rows.push((order, source.transform(record)));
			}
		}
	}

	if !missing.is_empty() {
		tracing::warn!(%index, missing = missing.len(), "Search hits have no backing record.");

		return Err(Error::MissingRecordAfterRefresh { index, ids: missing });
	}

	Ok(rows)
}
