use std::{fmt, str::FromStr};

use serde_json::{Map, Value};

use crate::{Error, ParamStore, SortDirective};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseKind {
	Must,
	Should,
	Filter,
	MustNot,
	Sort,
}
impl ClauseKind {
	/// Kinds emitted inside the boolean query, in output order.
	pub const QUERY: [Self; 4] = [Self::Must, Self::Should, Self::Filter, Self::MustNot];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Must => "must",
			Self::Should => "should",
			Self::Filter => "filter",
			Self::MustNot => "must_not",
			Self::Sort => "sort",
		}
	}
}
impl FromStr for ClauseKind {
	type Err = Error;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw {
			"must" => Ok(Self::Must),
			"should" => Ok(Self::Should),
			"filter" => Ok(Self::Filter),
			"must_not" => Ok(Self::MustNot),
			"sort" => Ok(Self::Sort),
			_ => Err(Error::InvalidClauseKind { kind: raw.to_string() }),
		}
	}
}
impl fmt::Display for ClauseKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchType {
	#[default]
	Match,
	MatchPhrase,
	MatchPhrasePrefix,
	MultiMatch,
	Common,
}
impl MatchType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Match => "match",
			Self::MatchPhrase => "match_phrase",
			Self::MatchPhrasePrefix => "match_phrase_prefix",
			Self::MultiMatch => "multi_match",
			Self::Common => "common",
		}
	}
}

/// Fields searched by a query-string clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFields {
	Plain(Vec<String>),
	/// Field to boost. Positive weights render as `field^weight`.
	Weighted(Vec<(String, i64)>),
}
impl SearchFields {
	pub fn render(&self) -> Vec<String> {
		match self {
			Self::Plain(fields) => fields.clone(),
			Self::Weighted(fields) => fields
				.iter()
				.map(|(field, weight)| {
					if *weight > 0 { format!("{field}^{weight}") } else { field.clone() }
				})
				.collect(),
		}
	}
}
impl Default for SearchFields {
	fn default() -> Self {
		Self::Plain(Vec::new())
	}
}
impl From<Vec<String>> for SearchFields {
	fn from(fields: Vec<String>) -> Self {
		Self::Plain(fields)
	}
}
impl From<Vec<&str>> for SearchFields {
	fn from(fields: Vec<&str>) -> Self {
		Self::Plain(fields.into_iter().map(str::to_string).collect())
	}
}
impl<const N: usize> From<[&str; N]> for SearchFields {
	fn from(fields: [&str; N]) -> Self {
		Self::Plain(fields.into_iter().map(str::to_string).collect())
	}
}
impl From<Vec<(String, i64)>> for SearchFields {
	fn from(fields: Vec<(String, i64)>) -> Self {
		Self::Weighted(fields)
	}
}
impl<const N: usize> From<[(&str, i64); N]> for SearchFields {
	fn from(fields: [(&str, i64); N]) -> Self {
		Self::Weighted(fields.into_iter().map(|(field, weight)| (field.to_string(), weight)).collect())
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
	Match { field: String, value: Value, options: Map<String, Value>, match_type: MatchType },
	QueryString { text: String, fields: SearchFields, options: Map<String, Value> },
	Raw(Value),
	SubQuery(Box<ParamStore>),
	Sort(SortDirective),
}
impl QueryNode {
	pub fn to_value(&self) -> Value {
		match self {
			Self::Match { field, value, options, match_type } => {
				let mut body = options.clone();

				body.insert("query".to_string(), value.clone());

				let mut by_field = Map::new();

				by_field.insert(field.clone(), Value::Object(body));

				let mut clause = Map::new();

				clause.insert(match_type.as_str().to_string(), Value::Object(by_field));

				Value::Object(clause)
			},
			Self::QueryString { text, fields, options } => {
				let mut body = Map::new();

				body.insert("query".to_string(), Value::from(text.as_str()));
				body.insert("default_operator".to_string(), Value::from("AND"));
				body.insert("fields".to_string(), Value::from(fields.render()));
				body.extend(options.clone());

				serde_json::json!({ "query_string": body })
			},
			Self::Raw(body) => body.clone(),
			Self::SubQuery(params) => params.to_query(),
			Self::Sort(sort) => sort.to_value(),
		}
	}
}
impl From<SortDirective> for QueryNode {
	fn from(sort: SortDirective) -> Self {
		Self::Sort(sort)
	}
}
impl From<Value> for QueryNode {
	fn from(body: Value) -> Self {
		Self::Raw(body)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clause_kinds_parse_from_wire_names() {
		assert_eq!("must_not".parse::<ClauseKind>().expect("kind"), ClauseKind::MustNot);
		assert_eq!(ClauseKind::Filter.to_string(), "filter");

		let err = "maybe".parse::<ClauseKind>().expect_err("Expected invalid kind.");

		assert!(matches!(err, Error::InvalidClauseKind { kind } if kind == "maybe"));
	}

	#[test]
	fn match_query_overrides_options() {
		let mut options = Map::new();

		options.insert("operator".to_string(), Value::from("and"));
		options.insert("query".to_string(), Value::from("ignored"));

		let node = QueryNode::Match {
			field: "title".to_string(),
			value: Value::from("rust"),
			options,
			match_type: MatchType::MatchPhrase,
		};

		assert_eq!(
			node.to_value(),
			serde_json::json!({ "match_phrase": { "title": { "operator": "and", "query": "rust" } } })
		);
	}

	#[test]
	fn weighted_fields_render_boosts() {
		let fields = SearchFields::from([("title", 3), ("body", 0), ("tags", -1)]);

		assert_eq!(fields.render(), vec!["title^3", "body", "tags"]);
	}
}
