use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub backend: Backend,
	#[serde(default)]
	pub index: Index,
	#[serde(default)]
	pub query: Query,
	#[serde(default)]
	pub reconcile: Reconcile,
	#[serde(default)]
	pub pagination: Pagination,
	pub storage: Option<Storage>,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Backend {
	/// Search backend base URLs, e.g. "http://localhost:9200". Requests go to the first entry.
	pub hosts: Vec<String>,
	pub timeout_ms: u64,
	/// Optional. Sent as a bearer token when present.
	pub api_key: Option<String>,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Index {
	/// Prepended to every index name that does not already carry it.
	#[serde(default)]
	pub prefix: String,
}

#[derive(Debug, Deserialize)]
pub struct Query {
	#[serde(default = "default_true")]
	pub reset_after_query: bool,
	#[serde(default = "default_per_page")]
	pub default_per_page: u32,
}
impl Default for Query {
	fn default() -> Self {
		Self { reset_after_query: true, default_per_page: default_per_page() }
	}
}

#[derive(Debug, Default, Deserialize)]
pub struct Reconcile {
	/// Fallback for handlers that opt into searchable refresh without their own flag.
	#[serde(default)]
	pub refresh: bool,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
	#[serde(default = "default_pagination_path")]
	pub path: String,
	#[serde(default)]
	pub fields: PaginationFields,
}
impl Default for Pagination {
	fn default() -> Self {
		Self { path: default_pagination_path(), fields: PaginationFields::default() }
	}
}

/// Output location of each paginator field, written as a dot path such as "meta.total".
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PaginationFields {
	pub current_page: String,
	pub data: String,
	pub first_page_url: String,
	pub from: String,
	pub last_page: String,
	pub last_page_url: String,
	pub next_page_url: String,
	pub path: String,
	pub per_page: String,
	pub prev_page_url: String,
	pub to: String,
	pub total: String,
}
impl PaginationFields {
	pub fn entries(&self) -> [(&'static str, &str); 12] {
		[
			("current_page", self.current_page.as_str()),
			("data", self.data.as_str()),
			("first_page_url", self.first_page_url.as_str()),
			("from", self.from.as_str()),
			("last_page", self.last_page.as_str()),
			("last_page_url", self.last_page_url.as_str()),
			("next_page_url", self.next_page_url.as_str()),
			("path", self.path.as_str()),
			("per_page", self.per_page.as_str()),
			("prev_page_url", self.prev_page_url.as_str()),
			("to", self.to.as_str()),
			("total", self.total.as_str()),
		]
	}
}
impl Default for PaginationFields {
	fn default() -> Self {
		Self {
			current_page: "current_page".to_string(),
			data: "data".to_string(),
			first_page_url: "first_page_url".to_string(),
			from: "from".to_string(),
			last_page: "last_page".to_string(),
			last_page_url: "last_page_url".to_string(),
			next_page_url: "next_page_url".to_string(),
			path: "path".to_string(),
			per_page: "per_page".to_string(),
			prev_page_url: "prev_page_url".to_string(),
			to: "to".to_string(),
			total: "total".to_string(),
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

fn default_true() -> bool {
	true
}

fn default_per_page() -> u32 {
	30
}

fn default_pagination_path() -> String {
	"/".to_string()
}
