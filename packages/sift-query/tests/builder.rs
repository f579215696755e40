use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};

use sift_query::{
	ClauseKind, Error, GeoSortOptions, MatchType, QueryBuilder, QueryNode, ScopeSet,
	SearchContext, SearchExecutor,
};
use sift_reconcile::{BoxFuture, Handler, HandlerRegistry, IndexMapInput, Reconciler, SourceIndex};

/// Records every request and answers with a fixed response.
struct RecordingExecutor {
	requests: Mutex<Vec<Value>>,
	response: Value,
}
impl RecordingExecutor {
	fn empty() -> Self {
		Self::with_response(serde_json::json!({
			"took": 1,
			"hits": { "total": { "value": 0, "relation": "eq" }, "max_score": null, "hits": [] }
		}))
	}

	fn with_response(response: Value) -> Self {
		Self { requests: Mutex::new(Vec::new()), response }
	}

	fn requests(&self) -> Vec<Value> {
		self.requests.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl SearchExecutor for RecordingExecutor {
	fn search<'a>(&'a self, request: &'a Value) -> BoxFuture<'a, sift_query::Result<Value>> {
		Box::pin(async move {
			self.requests.lock().unwrap_or_else(|err| err.into_inner()).push(request.clone());

			Ok(self.response.clone())
		})
	}
}

fn context(prefix: &str, executor: Arc<RecordingExecutor>) -> Arc<SearchContext> {
	let registry = HandlerRegistry::new(prefix)
		.with_handler("posts", Handler::index(SourceIndex::new("posts")));

	registry
		.index_map(Some(IndexMapInput::Handlers(vec!["posts".to_string()])), true)
		.expect("Index map should build.");

	Arc::new(SearchContext::new(executor, Reconciler::new(Arc::new(registry))))
}

fn builder() -> QueryBuilder {
	context("", Arc::new(RecordingExecutor::empty())).builder()
}

#[test]
fn empty_builder_has_empty_query() {
	assert_eq!(builder().get_query(), serde_json::json!({}));
	assert_eq!(
		builder().get_full_query(Map::new()),
		serde_json::json!({ "index": "*,-.*", "body": {} })
	);
}

#[test]
fn only_populated_kinds_are_compiled() {
	let query = builder()
		.must_match("title", "rust", None)
		.must_not(|q| q.must_match("status", "draft", None))
		.get_query();

	assert_eq!(
		query,
		serde_json::json!({
			"bool": {
				"must": [{ "match": { "title": { "query": "rust" } } }],
				"must_not": [
					{ "bool": { "must": [{ "match": { "status": { "query": "draft" } } }] } }
				]
			}
		})
	);
}

#[test]
fn group_with_two_matches_nests_one_bool_clause() {
	let query = builder()
		.must(|q| q.must_match("a", "x", None).should_match_phrase("b", "y z", None))
		.get_query();
	let must = query["bool"]["must"].as_array().expect("must clauses");

	assert_eq!(must.len(), 1);
	assert_eq!(
		must[0],
		serde_json::json!({
			"bool": {
				"must": [{ "match": { "a": { "query": "x" } } }],
				"should": [{ "match_phrase": { "b": { "query": "y z" } } }]
			}
		})
	);
}

#[test]
fn composer_returning_none_adds_nothing() {
	let query = builder().filter(|_| None::<QueryBuilder>).get_query();

	assert_eq!(query, serde_json::json!({}));
}

#[test]
fn untouched_groups_and_empty_field_maps_add_nothing() {
	let query = builder()
		.must(|q| q)
		.should(|q| q.sort_by("price", "asc", None))
		.match_fields(Vec::<(String, Value)>::new(), None, MatchType::Match, ClauseKind::Filter)
		.get_query();

	assert_eq!(query, serde_json::json!({}));

	let query = builder()
		.must_match("title", "rust", None)
		.filter(|q| q.must(|q| q))
		.get_query();

	assert_eq!(
		query,
		serde_json::json!({ "bool": { "must": [{ "match": { "title": { "query": "rust" } } }] } })
	);
}

#[test]
fn field_maps_become_one_and_group() {
	let query = builder()
		.match_fields([("color", "red"), ("size", "xl")], None, MatchType::Match, ClauseKind::Should)
		.get_query();

	assert_eq!(
		query,
		serde_json::json!({
			"bool": {
				"should": [{
					"bool": {
						"must": [
							{ "match": { "color": { "query": "red" } } },
							{ "match": { "size": { "query": "xl" } } }
						]
					}
				}]
			}
		})
	);
}

#[test]
fn match_options_are_merged() {
	let mut options = Map::new();

	options.insert("fuzziness".to_string(), Value::from("AUTO"));

	let query = builder().should_match_multi("name", "jon", options).get_query();

	assert_eq!(
		query["bool"]["should"][0],
		serde_json::json!({ "multi_match": { "name": { "fuzziness": "AUTO", "query": "jon" } } })
	);
}

#[test]
fn weighted_search_renders_boosts() {
	let query = builder().search("foo", [("title", 3), ("body", 0)], None).get_query();

	assert_eq!(
		query["bool"]["must"][0],
		serde_json::json!({
			"query_string": { "query": "foo", "default_operator": "AND", "fields": ["title^3", "body"] }
		})
	);
}

#[test]
fn invalid_sort_order_falls_back_to_desc() {
	let request = builder().sort_by("price", "bogus", None).get_full_query(Map::new());

	assert_eq!(request["body"]["sort"], serde_json::json!([{ "price": { "order": "desc" } }]));
	assert!(request["body"].get("query").is_none());
}

#[test]
fn sort_aliases_append_in_order() {
	let request = builder()
		.order_by_score("asc")
		.order_by_distance("pin", serde_json::json!([-70.0, 40.0]), &GeoSortOptions::default())
		.get_full_query(Map::new());
	let sort = request["body"]["sort"].as_array().expect("sort clauses");

	assert_eq!(sort[0], serde_json::json!({ "_score": { "order": "asc" } }));
	assert_eq!(sort[1]["_geo_distance"]["distance_type"], "arc");
}

#[test]
fn unknown_clause_kind_is_rejected() {
	let err = builder()
		.add_clause("sometimes", QueryNode::Raw(serde_json::json!({ "term": { "a": 1 } })))
		.expect_err("Expected invalid clause kind.");

	assert!(matches!(err, Error::InvalidClauseKind { kind } if kind == "sometimes"));

	let query = builder()
		.add_clause("filter", QueryNode::Raw(serde_json::json!({ "term": { "a": 1 } })))
		.expect("Filter is a valid kind.")
		.get_query();

	assert_eq!(query, serde_json::json!({ "bool": { "filter": [{ "term": { "a": 1 } }] } }));
}

#[test]
fn index_expression_respects_prefix() {
	let plain = context("", Arc::new(RecordingExecutor::empty()));
	let prefixed = context("app_", Arc::new(RecordingExecutor::empty()));

	assert_eq!(plain.builder().get_indexes(), "*,-.*");
	assert_eq!(prefixed.builder().get_indexes(), "app_*");
	assert_eq!(prefixed.builder().on("posts, app_users").get_indexes(), "app_posts,app_users");

	let weighted = prefixed.builder().index_weighted([("posts", 2.0)]);

	assert_eq!(weighted.get_indexes(), "app_posts");
	assert_eq!(weighted.index_weights(), [("app_posts".to_string(), 2.0)]);
}

#[test]
fn extra_parameters_win_on_collision() {
	let mut extra = Map::new();

	extra.insert("index".to_string(), Value::from("override"));
	extra.insert("size".to_string(), Value::from(5));

	let request = builder().index("posts").get_full_query(extra);

	assert_eq!(request["index"], "override");
	assert_eq!(request["size"], 5);
}

#[test]
fn index_map_is_shared_through_the_registry() {
	let q = builder();
	let map = q
		.index_map(Some([("comments", "posts")].into_iter().collect()), true)
		.expect("Index map should merge.");

	assert_eq!(map.get("posts").map(String::as_str), Some("posts"));
	assert_eq!(map.get("comments").map(String::as_str), Some("posts"));
}

#[test]
fn scopes_apply_registered_decorators_only() {
	let price_range = |builder: QueryBuilder, value: &Value| {
		let node = QueryNode::Raw(serde_json::json!({ "range": { "price": value } }));

		builder.push(ClauseKind::Filter, node)
	};
	let scopes = ScopeSet::new("shop::Product").with_decorator("price_range", price_range);
	let query = builder()
		.bind(Arc::new(scopes))
		.apply_scopes([
			("price_range", serde_json::json!({ "gte": 10 })),
			("unknown_scope", Value::Bool(true)),
		])
		.get_query();

	assert_eq!(
		query,
		serde_json::json!({ "bool": { "filter": [{ "range": { "price": { "gte": 10 } } }] } })
	);
}

#[test]
fn dynamic_calls_dispatch_to_bound_methods() {
	let scopes = ScopeSet::default().with_method("featured", |builder, args| {
		builder.must_match("featured", args.first().cloned().unwrap_or(Value::Bool(true)), None)
	});
	let bound = builder().bind(Arc::new(scopes));
	let (bound, found) = bound.try_call("featured", &[Value::Bool(false)]);

	assert!(found);
	assert_eq!(
		bound.get_query()["bool"]["must"][0],
		serde_json::json!({ "match": { "featured": { "query": false } } })
	);

	let (unchanged, found) = bound.clone().try_call("missing", &[]);

	assert!(!found);
	assert_eq!(unchanged.get_query(), bound.get_query());
	assert_eq!(builder().call("featured", &[]).get_query(), serde_json::json!({}));
}

#[tokio::test]
async fn get_resets_state_after_compiling() {
	let executor = Arc::new(RecordingExecutor::empty());
	let mut q = context("", executor.clone()).builder().index("posts").must_match("a", "b", None);
	let results = q.get().await.expect("Search should succeed.");

	assert!(results.is_empty());
	assert_eq!(results.total(), 0);
	assert_eq!(q.get_query(), serde_json::json!({}));
	assert_eq!(q.get_indexes(), "*,-.*");

	let requests = executor.requests();

	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0]["index"], "posts");
	assert_eq!(requests[0]["body"]["query"]["bool"]["must"][0]["match"]["a"]["query"], "b");
}

#[tokio::test]
async fn disabling_reset_keeps_the_query() {
	let executor = Arc::new(RecordingExecutor::empty());
	let mut q = context("", executor.clone())
		.builder()
		.reset_after_query(false)
		.must_match("a", "b", None);

	q.get().await.expect("Search should succeed.");
	q.get().await.expect("Search should succeed.");

	let requests = executor.requests();

	assert_eq!(requests.len(), 2);
	assert_eq!(requests[0], requests[1]);
	assert!(q.params().has(ClauseKind::Must));
}

#[tokio::test]
async fn get_raw_never_resets() {
	let executor = Arc::new(RecordingExecutor::empty());
	let q = context("", executor.clone()).builder().must_match("a", "b", None);
	let raw = q.get_raw().await.expect("Search should succeed.");

	assert_eq!(raw["took"], 1);
	assert!(q.params().has(ClauseKind::Must));
}

#[tokio::test]
async fn paginate_sends_size_and_offset() {
	let executor = Arc::new(RecordingExecutor::with_response(serde_json::json!({
		"took": 2,
		"hits": {
			"total": 45,
			"max_score": 1.0,
			"hits": [
				{ "_index": "posts", "_id": "21", "_score": 1.0, "_source": { "id": 21 } },
				{ "_index": "posts", "_id": "22", "_score": 0.9, "_source": { "id": 22 } }
			]
		}
	})));
	let mut q = context("", executor.clone()).builder().index("posts");
	let page = q.paginate(3, Some(10)).await.expect("Search should succeed.");
	let requests = executor.requests();

	assert_eq!(requests[0]["size"], 10);
	assert_eq!(requests[0]["from"], 20);
	assert_eq!(page.last_page(), 5);
	assert_eq!(page.first_item(), Some(21));
	assert_eq!(page.last_item(), Some(22));
	assert_eq!(page.items()[1]["id"], 22);
}

#[tokio::test]
async fn unmapped_index_fails_the_search() {
	let executor = Arc::new(RecordingExecutor::with_response(serde_json::json!({
		"hits": { "total": 1, "hits": [{ "_index": "ghosts", "_id": "1", "_source": {} }] }
	})));
	let mut q = context("", executor).builder();
	let err = q.get().await.expect_err("Expected reconciliation failure.");

	assert!(matches!(
		err,
		Error::Reconcile(sift_reconcile::Error::UnresolvedIndexHandler { index }) if index == "ghosts"
	));
}
