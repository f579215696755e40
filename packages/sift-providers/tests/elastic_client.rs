use std::{
	collections::HashMap,
	net::SocketAddr,
	sync::{Arc, Mutex},
};

use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::{HeaderMap, StatusCode},
	routing::post,
};
use serde_json::{Map, Value};
use tokio::net::TcpListener;

use sift_config::Backend;
use sift_providers::ElasticClient;
use sift_query::{SearchContext, SearchExecutor};
use sift_reconcile::{Handler, HandlerRegistry, IndexMapInput, Reconciler, SourceIndex};

#[derive(Debug, Clone)]
struct Captured {
	index: String,
	params: HashMap<String, String>,
	authorization: Option<String>,
	client: Option<String>,
	body: Value,
}

#[derive(Clone, Default)]
struct MockState {
	captured: Arc<Mutex<Vec<Captured>>>,
}

async fn search(
	State(state): State<MockState>,
	Path(index): Path<String>,
	Query(params): Query<HashMap<String, String>>,
	headers: HeaderMap,
	Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
	if index == "broken" {
		return Err(StatusCode::INTERNAL_SERVER_ERROR);
	}

	let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);

	state.captured.lock().unwrap_or_else(|err| err.into_inner()).push(Captured {
		index: index.clone(),
		params,
		authorization: header("authorization"),
		client: header("x-client"),
		body,
	});

	Ok(Json(serde_json::json!({
		"took": 4,
		"hits": {
			"total": { "value": 1, "relation": "eq" },
			"max_score": 2.5,
			"hits": [
				{ "_index": index, "_id": "7", "_score": 2.5, "_source": { "id": 7, "title": "Rust" } }
			]
		}
	})))
}

async fn spawn_backend() -> (SocketAddr, MockState) {
	let state = MockState::default();
	let router = Router::new().route("/{index}/_search", post(search)).with_state(state.clone());
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind mock backend.");
	let addr = listener.local_addr().expect("Failed to read mock backend address.");

	tokio::spawn(async move {
		axum::serve(listener, router).await.expect("Mock backend failed.");
	});

	(addr, state)
}

fn backend(addr: SocketAddr, api_key: Option<&str>) -> Backend {
	let mut default_headers = Map::new();

	default_headers.insert("X-Client".to_string(), Value::from("sift"));

	Backend {
		hosts: vec![format!("http://{addr}")],
		timeout_ms: 5_000,
		api_key: api_key.map(str::to_string),
		default_headers,
	}
}

#[tokio::test]
async fn request_shape_reaches_the_backend() {
	let (addr, state) = spawn_backend().await;
	let client = ElasticClient::new(&backend(addr, Some("secret"))).expect("Client should build.");
	let request = serde_json::json!({
		"index": "posts",
		"body": { "query": { "bool": { "must": [{ "match": { "title": { "query": "rust" } } }] } } },
		"size": 10,
		"from": 0
	});
	let raw = client.search(&request).await.expect("Search should succeed.");
	let captured = state.captured.lock().unwrap_or_else(|err| err.into_inner()).clone();

	assert_eq!(raw["took"], 4);
	assert_eq!(captured.len(), 1);
	assert_eq!(captured[0].index, "posts");
	assert_eq!(captured[0].params.get("size").map(String::as_str), Some("10"));
	assert_eq!(captured[0].params.get("from").map(String::as_str), Some("0"));
	assert_eq!(captured[0].authorization.as_deref(), Some("Bearer secret"));
	assert_eq!(captured[0].client.as_deref(), Some("sift"));
	assert_eq!(captured[0].body, request["body"]);
}

#[tokio::test]
async fn error_status_becomes_executor_error() {
	let (addr, _) = spawn_backend().await;
	let client = ElasticClient::new(&backend(addr, None)).expect("Client should build.");
	let err = client
		.search(&serde_json::json!({ "index": "broken", "body": {} }))
		.await
		.expect_err("Expected backend failure.");

	assert!(matches!(err, sift_query::Error::Executor { ref message } if message.contains("500")));
}

#[tokio::test]
async fn builder_round_trip_through_http() {
	let (addr, state) = spawn_backend().await;
	let client = ElasticClient::new(&backend(addr, None)).expect("Client should build.");
	let registry = HandlerRegistry::new("app_")
		.with_handler("posts", Handler::index(SourceIndex::new("posts")));

	registry
		.index_map(Some(IndexMapInput::Handlers(vec!["posts".to_string()])), true)
		.expect("Index map should build.");

	let context = Arc::new(SearchContext::new(
		Arc::new(client),
		Reconciler::new(Arc::new(registry)),
	));
	let mut query = context.builder().index("posts").search("rust", ["title"], None);
	let page = query.paginate(2, Some(5)).await.expect("Search should succeed.");
	let captured = state.captured.lock().unwrap_or_else(|err| err.into_inner()).clone();

	assert_eq!(captured[0].index, "app_posts");
	assert_eq!(captured[0].params.get("from").map(String::as_str), Some("5"));
	assert_eq!(page.items(), &[serde_json::json!({ "id": 7, "title": "Rust" })]);
	assert_eq!(page.total(), 1);
}
