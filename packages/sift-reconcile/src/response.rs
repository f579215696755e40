use serde_json::{Map, Value};

use crate::{Error, Result};

/// Response metadata with the hit list stripped out.
#[derive(Debug, Clone, PartialEq)]
pub struct Meta {
	total: u64,
	max_score: Option<f64>,
	count: usize,
	took: Option<u64>,
	rest: Map<String, Value>,
}
impl Meta {
	pub fn count(&self) -> usize {
		self.count
	}

	pub fn total(&self) -> u64 {
		self.total
	}

	pub fn max_score(&self) -> Option<f64> {
		self.max_score
	}

	pub fn took(&self) -> Option<u64> {
		self.took
	}

	/// Backend execution time, e.g. "12ms".
	pub fn time(&self, with_unit: bool) -> String {
		let took = self.took.unwrap_or(0);

		if with_unit { format!("{took}ms") } else { took.to_string() }
	}

	/// Any other top-level response field, e.g. "timed_out" or "_shards".
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.rest.get(key)
	}

	pub fn to_value(&self) -> Value {
		let mut meta = self.rest.clone();

		meta.insert("total".to_string(), Value::from(self.total));
		meta.insert("maxScore".to_string(), self.max_score.map(Value::from).unwrap_or(Value::Null));
		meta.insert("count".to_string(), Value::from(self.count));

		Value::Object(meta)
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
	pub index: String,
	pub id: Option<String>,
	pub score: Option<f64>,
	pub source: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
	pub meta: Meta,
	pub hits: Vec<Hit>,
}
impl RawResponse {
	pub fn parse(raw: &Value) -> Result<Self> {
		let body = raw.as_object().ok_or_else(|| invalid("response must be an object."))?;
		let hits = body
			.get("hits")
			.and_then(Value::as_object)
			.ok_or_else(|| invalid("response.hits must be an object."))?;
		let items = hits
			.get("hits")
			.and_then(Value::as_array)
			.ok_or_else(|| invalid("response.hits.hits must be an array."))?;
		let total = parse_total(hits.get("total"))?;
		let max_score = hits.get("max_score").and_then(Value::as_f64);
		let took = body.get("took").and_then(Value::as_u64);
		let mut rest = body.clone();

		rest.remove("hits");

		let hits = items
			.iter()
			.enumerate()
			.map(|(position, item)| parse_hit(position, item))
			.collect::<Result<Vec<_>>>()?;

		Ok(Self { meta: Meta { total, max_score, count: hits.len(), took, rest }, hits })
	}
}

fn parse_total(raw: Option<&Value>) -> Result<u64> {
	match raw {
		None | Some(Value::Null) => Ok(0),
		Some(Value::Number(total)) =>
			total.as_u64().ok_or_else(|| invalid("response.hits.total must be non-negative.")),
		Some(Value::Object(total)) => total
			.get("value")
			.and_then(Value::as_u64)
			.ok_or_else(|| invalid("response.hits.total.value must be a non-negative integer.")),
		Some(_) => Err(invalid("response.hits.total must be a number or an object.")),
	}
}

fn parse_hit(position: usize, item: &Value) -> Result<Hit> {
	let hit = item
		.as_object()
		.ok_or_else(|| invalid(&format!("response.hits.hits[{position}] must be an object.")))?;
	let index = hit
		.get("_index")
		.and_then(Value::as_str)
		.ok_or_else(|| invalid(&format!("response.hits.hits[{position}]._index is required.")))?;
	let source = match hit.get("_source") {
		None | Some(Value::Null) => Map::new(),
		Some(Value::Object(source)) => source.clone(),
		Some(_) => {
			return Err(invalid(&format!(
				"response.hits.hits[{position}]._source must be an object."
			)));
		},
	};

	Ok(Hit {
		index: index.to_string(),
		id: hit.get("_id").and_then(crate::record_key),
		score: hit.get("_score").and_then(Value::as_f64),
		source,
	})
}

fn invalid(message: &str) -> Error {
	Error::InvalidResponse { message: message.to_string() }
}
