use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use sift_config::PaginationFields;

use crate::SearchResults;

/// Length-aware page over reconciled results.
#[derive(Debug, Clone)]
pub struct Paginator {
	results: SearchResults,
	total: u64,
	per_page: u32,
	current_page: u32,
	path: String,
	query: Vec<(String, String)>,
	fields: PaginationFields,
}
impl Paginator {
	pub fn new(
		results: SearchResults,
		per_page: u32,
		current_page: u32,
		path: impl Into<String>,
	) -> Self {
		Self {
			total: results.total(),
			results,
			per_page: per_page.max(1),
			current_page: current_page.max(1),
			path: path.into(),
			query: Vec::new(),
			fields: PaginationFields::default(),
		}
	}

	pub fn with_fields(mut self, fields: PaginationFields) -> Self {
		self.fields = fields;

		self
	}

	/// Adds query parameters carried into every page URL.
	pub fn appends<I, K, V>(mut self, pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		for (key, value) in pairs {
			let key = key.into();

			self.query.retain(|(existing, _)| existing != &key);
			self.query.push((key, value.into()));
		}

		self
	}

	pub fn results(&self) -> &SearchResults {
		&self.results
	}

	pub fn items(&self) -> &[Value] {
		self.results.data()
	}

	pub fn total(&self) -> u64 {
		self.total
	}

	pub fn per_page(&self) -> u32 {
		self.per_page
	}

	pub fn current_page(&self) -> u32 {
		self.current_page
	}

	pub fn last_page(&self) -> u64 {
		self.total.div_ceil(u64::from(self.per_page)).max(1)
	}

	/// 1-based position of the first item on this page.
	pub fn first_item(&self) -> Option<u64> {
		if self.items().is_empty() {
			return None;
		}

		Some(u64::from(self.current_page - 1) * u64::from(self.per_page) + 1)
	}

	pub fn last_item(&self) -> Option<u64> {
		self.first_item().map(|first| first + self.items().len() as u64 - 1)
	}

	pub fn has_more_pages(&self) -> bool {
		u64::from(self.current_page) < self.last_page()
	}

	/// Page URL with appended parameters, form-encoded. `page` always comes last.
	pub fn url(&self, page: u64) -> String {
		let mut query = form_urlencoded::Serializer::new(String::new());

		for (key, value) in self.query.iter().filter(|(key, _)| key != "page") {
			query.append_pair(key, value);
		}

		query.append_pair("page", &page.max(1).to_string());

		let separator = if self.path.contains('?') { '&' } else { '?' };

		format!("{}{separator}{}", self.path, query.finish())
	}

	pub fn next_page_url(&self) -> Option<String> {
		self.has_more_pages().then(|| self.url(u64::from(self.current_page) + 1))
	}

	pub fn previous_page_url(&self) -> Option<String> {
		(self.current_page > 1).then(|| self.url(u64::from(self.current_page) - 1))
	}

	/// Renders the page with every field written at its configured dot path.
	pub fn to_value(&self) -> Value {
		let mut root = Value::Object(Map::new());
		let fields = &self.fields;
		let or_null = |value: Option<Value>| value.unwrap_or(Value::Null);
		let entries = [
			(&fields.current_page, Value::from(self.current_page)),
			(&fields.data, Value::Array(self.items().to_vec())),
			(&fields.first_page_url, Value::from(self.url(1))),
			(&fields.from, or_null(self.first_item().map(Value::from))),
			(&fields.last_page, Value::from(self.last_page())),
			(&fields.last_page_url, Value::from(self.url(self.last_page()))),
			(&fields.next_page_url, or_null(self.next_page_url().map(Value::from))),
			(&fields.path, Value::from(self.path.clone())),
			(&fields.per_page, Value::from(self.per_page)),
			(&fields.prev_page_url, or_null(self.previous_page_url().map(Value::from))),
			(&fields.to, or_null(self.last_item().map(Value::from))),
			(&fields.total, Value::from(self.total)),
		];

		for (path, value) in entries {
			set_path(&mut root, path, value);
		}

		root
	}
}
impl Serialize for Paginator {
	fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		self.to_value().serialize(serializer)
	}
}

fn set_path(root: &mut Value, path: &str, value: Value) {
	if !root.is_object() {
		*root = Value::Object(Map::new());
	}

	let Value::Object(map) = root else {
		return;
	};

	match path.split_once('.') {
		Some((head, rest)) => {
			let child = map.entry(head.to_string()).or_insert_with(|| Value::Object(Map::new()));

			set_path(child, rest, value);
		},
		None => {
			map.insert(path.to_string(), value);
		},
	}
}
