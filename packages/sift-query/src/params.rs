use serde_json::{Map, Value};

use crate::{ClauseKind, QueryNode};

/// Clause buckets for one builder. Insertion order within a bucket is preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamStore {
	must: Vec<QueryNode>,
	should: Vec<QueryNode>,
	filter: Vec<QueryNode>,
	must_not: Vec<QueryNode>,
	sort: Vec<QueryNode>,
}
impl ParamStore {
	pub fn add(&mut self, kind: ClauseKind, node: QueryNode) {
		self.bucket_mut(kind).push(node);
	}

	pub fn get(&self, kind: ClauseKind) -> &[QueryNode] {
		match kind {
			ClauseKind::Must => &self.must,
			ClauseKind::Should => &self.should,
			ClauseKind::Filter => &self.filter,
			ClauseKind::MustNot => &self.must_not,
			ClauseKind::Sort => &self.sort,
		}
	}

	pub fn has(&self, kind: ClauseKind) -> bool {
		!self.get(kind).is_empty()
	}

	/// Whether any must, should, filter or must_not clause is present. Sort alone does not count.
	pub fn has_query(&self) -> bool {
		ClauseKind::QUERY.into_iter().any(|kind| self.has(kind))
	}

	pub fn is_empty(&self) -> bool {
		ClauseKind::QUERY.into_iter().chain([ClauseKind::Sort]).all(|kind| !self.has(kind))
	}

	/// Compiled wire form of one bucket. Nested builders become boolean queries.
	pub fn compiled(&self, kind: ClauseKind) -> Vec<Value> {
		self.get(kind).iter().map(QueryNode::to_value).collect()
	}

	/// `{"bool": {...}}` with only the non-empty query kinds, or `{}` when none have entries.
	pub fn to_query(&self) -> Value {
		let mut bool_query = Map::new();

		for kind in ClauseKind::QUERY {
			if self.has(kind) {
				bool_query.insert(kind.as_str().to_string(), Value::Array(self.compiled(kind)));
			}
		}

		if bool_query.is_empty() {
			return Value::Object(Map::new());
		}

		serde_json::json!({ "bool": bool_query })
	}

	/// Body entries that live beside the query rather than inside it.
	pub fn non_query(&self) -> Map<String, Value> {
		let mut body = Map::new();

		if self.has(ClauseKind::Sort) {
			body.insert("sort".to_string(), Value::Array(self.compiled(ClauseKind::Sort)));
		}

		body
	}

	pub fn reset(&mut self) {
		*self = Self::default();
	}

	fn bucket_mut(&mut self, kind: ClauseKind) -> &mut Vec<QueryNode> {
		match kind {
			ClauseKind::Must => &mut self.must,
			ClauseKind::Should => &mut self.should,
			ClauseKind::Filter => &mut self.filter,
			ClauseKind::MustNot => &mut self.must_not,
			ClauseKind::Sort => &mut self.sort,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::SortDirective;

	#[test]
	fn empty_store_compiles_to_empty_object() {
		let store = ParamStore::default();

		assert!(store.is_empty());
		assert_eq!(store.to_query(), serde_json::json!({}));
		assert!(store.non_query().is_empty());
	}

	#[test]
	fn only_populated_kinds_are_emitted() {
		let mut store = ParamStore::default();

		store.add(ClauseKind::MustNot, QueryNode::Raw(serde_json::json!({ "term": { "a": 1 } })));
		store.add(ClauseKind::Filter, QueryNode::Raw(serde_json::json!({ "term": { "b": 2 } })));
		store.add(ClauseKind::Filter, QueryNode::Raw(serde_json::json!({ "term": { "c": 3 } })));
		store.add(ClauseKind::Sort, SortDirective::field("price", "asc", None).into());

		assert_eq!(
			store.to_query(),
			serde_json::json!({
				"bool": {
					"filter": [{ "term": { "b": 2 } }, { "term": { "c": 3 } }],
					"must_not": [{ "term": { "a": 1 } }]
				}
			})
		);
		assert_eq!(
			Value::Object(store.non_query()),
			serde_json::json!({ "sort": [{ "price": { "order": "asc" } }] })
		);

		store.reset();

		assert!(store.is_empty());
	}

	#[test]
	fn sub_queries_compile_to_nested_bool() {
		let mut inner = ParamStore::default();

		inner.add(ClauseKind::Must, QueryNode::Raw(serde_json::json!({ "term": { "a": 1 } })));

		let mut outer = ParamStore::default();

		outer.add(ClauseKind::Should, QueryNode::SubQuery(Box::new(inner)));

		assert_eq!(
			outer.to_query(),
			serde_json::json!({
				"bool": { "should": [{ "bool": { "must": [{ "term": { "a": 1 } }] } }] }
			})
		);
	}
}
