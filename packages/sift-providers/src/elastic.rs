use std::time::Duration;

use reqwest::Client;
use serde_json::{Map, Value};

use sift_query::SearchExecutor;
use sift_reconcile::BoxFuture;

use crate::{Error, Result};

/// Where and what a compiled request sends.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchTarget {
	pub url: String,
	pub query: Vec<(String, String)>,
	pub body: Value,
}
impl SearchTarget {
	/// Splits a compiled request into URL, query-string parameters and JSON body.
	///
	/// Scalar top-level extras such as `size` and `from` go to the query string. Structured
	/// extras are merged into the body unless the body already defines them.
	pub fn from_request(host: &str, request: &Value) -> Result<Self> {
		let request = request.as_object().ok_or_else(|| Error::InvalidRequest {
			message: "Search request must be a JSON object.".to_string(),
		})?;
		let index = request.get("index").and_then(Value::as_str).ok_or_else(|| {
			Error::InvalidRequest { message: "Search request must name an index.".to_string() }
		})?;
		let mut body = match request.get("body") {
			None | Some(Value::Null) => Map::new(),
			Some(Value::Object(body)) => body.clone(),
			Some(_) => {
				return Err(Error::InvalidRequest {
					message: "Search request body must be a JSON object.".to_string(),
				});
			},
		};
		let mut query = Vec::new();

		for (key, value) in request {
			if key == "index" || key == "body" {
				continue;
			}

			match value {
				Value::Null => {},
				Value::String(raw) => query.push((key.clone(), raw.clone())),
				Value::Number(_) | Value::Bool(_) => query.push((key.clone(), value.to_string())),
				Value::Array(_) | Value::Object(_) => {
					body.entry(key.clone()).or_insert_with(|| value.clone());
				},
			}
		}

		Ok(Self {
			url: format!("{}/{}/_search", host.trim_end_matches('/'), index),
			query,
			body: Value::Object(body),
		})
	}
}

/// JSON-over-HTTP search executor for Elasticsearch-compatible backends.
#[derive(Debug, Clone)]
pub struct ElasticClient {
	client: Client,
	host: String,
}
impl ElasticClient {
	pub fn new(cfg: &sift_config::Backend) -> Result<Self> {
		let host = cfg.hosts.first().cloned().ok_or_else(|| Error::InvalidConfig {
			message: "backend.hosts must contain at least one host.".to_string(),
		})?;
		let headers = crate::auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?;
		let client = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.default_headers(headers)
			.build()?;

		Ok(Self { client, host })
	}

	pub fn host(&self) -> &str {
		&self.host
	}

	pub async fn send(&self, request: &Value) -> Result<Value> {
		let target = SearchTarget::from_request(&self.host, request)?;

		tracing::debug!(url = %target.url, params = target.query.len(), "Sending search request.");

		let res =
			self.client.post(&target.url).query(&target.query).json(&target.body).send().await?;
		let status = res.status();

		if !status.is_success() {
			let body = res.text().await.unwrap_or_default();

			tracing::warn!(url = %target.url, %status, "Search backend rejected the request.");

			return Err(Error::InvalidResponse {
				message: format!("Search backend returned {status}: {body}"),
			});
		}

		Ok(res.json().await?)
	}
}
impl SearchExecutor for ElasticClient {
	fn search<'a>(&'a self, request: &'a Value) -> BoxFuture<'a, sift_query::Result<Value>> {
		Box::pin(async move { Ok(self.send(request).await?) })
	}
}
