use std::{fmt, sync::Arc};

use serde_json::{Map, Value};

use sift_reconcile::{IndexMap, IndexMapInput, Paginator, SearchResults};

use crate::{
	ClauseKind, GeoSortOptions, IndexNames, IndexTarget, MatchType, ParamStore, QueryNode, Result,
	ScopeSet, SearchContext, SearchFields, SortDirective,
};

type Options = Option<Map<String, Value>>;

/// Fluent boolean query builder.
///
/// Clause methods consume and return the builder. Execution borrows it mutably, compiles the
/// request and, unless auto-reset is off, clears clauses and target indices before the request
/// is sent.
#[derive(Clone)]
pub struct QueryBuilder {
	context: Arc<SearchContext>,
	scopes: Option<Arc<ScopeSet>>,
	params: ParamStore,
	indexes: IndexTarget,
	reset_after_query: bool,
}
impl QueryBuilder {
	pub fn new(context: Arc<SearchContext>) -> Self {
		let reset_after_query = context.reset_after_query();

		Self {
			context,
			scopes: None,
			params: ParamStore::default(),
			indexes: IndexTarget::default(),
			reset_after_query,
		}
	}

	pub fn context(&self) -> &Arc<SearchContext> {
		&self.context
	}

	pub fn params(&self) -> &ParamStore {
		&self.params
	}

	/// Appends `node` under the clause kind named by `kind`.
	pub fn add_clause(self, kind: &str, node: QueryNode) -> Result<Self> {
		let kind = kind.parse::<ClauseKind>()?;

		Ok(self.push(kind, node))
	}

	pub fn push(mut self, kind: ClauseKind, node: QueryNode) -> Self {
		self.params.add(kind, node);

		self
	}

	/// Runs `composer` against a fresh child builder and nests its boolean query under `kind`.
	/// Returning `None`, or a child without query clauses, leaves this builder untouched.
	pub fn group<F, R>(self, kind: ClauseKind, composer: F) -> Self
	where
		F: FnOnce(QueryBuilder) -> R,
		R: Into<Option<QueryBuilder>>,
	{
		let child: Option<QueryBuilder> = composer(self.child()).into();

		match child {
			Some(child) => self.push_group(kind, child.params),
			None => self,
		}
	}

	pub fn must<F, R>(self, composer: F) -> Self
	where
		F: FnOnce(QueryBuilder) -> R,
		R: Into<Option<QueryBuilder>>,
	{
		self.group(ClauseKind::Must, composer)
	}

	pub fn must_not<F, R>(self, composer: F) -> Self
	where
		F: FnOnce(QueryBuilder) -> R,
		R: Into<Option<QueryBuilder>>,
	{
		self.group(ClauseKind::MustNot, composer)
	}

	pub fn should<F, R>(self, composer: F) -> Self
	where
		F: FnOnce(QueryBuilder) -> R,
		R: Into<Option<QueryBuilder>>,
	{
		self.group(ClauseKind::Should, composer)
	}

	pub fn filter<F, R>(self, composer: F) -> Self
	where
		F: FnOnce(QueryBuilder) -> R,
		R: Into<Option<QueryBuilder>>,
	{
		self.group(ClauseKind::Filter, composer)
	}

	/// A single match clause under `kind`.
	pub fn match_field(
		self,
		field: impl Into<String>,
		value: impl Into<Value>,
		options: impl Into<Options>,
		match_type: MatchType,
		kind: ClauseKind,
	) -> Self {
		let node = QueryNode::Match {
			field: field.into(),
			value: value.into(),
			options: options.into().unwrap_or_default(),
			match_type,
		};

		self.push(kind, node)
	}

	/// One nested group, appended once under `kind`, in which every field must match. An empty
	/// field list appends nothing.
	pub fn match_fields<I, K, V>(
		self,
		fields: I,
		options: impl Into<Options>,
		match_type: MatchType,
		kind: ClauseKind,
	) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<Value>,
	{
		let options = options.into();
		let mut group = self.child();

		for (field, value) in fields {
			group = group.match_field(field, value, options.clone(), match_type, ClauseKind::Must);
		}

		self.push_group(kind, group.params)
	}

	pub fn match_group<F, R>(self, composer: F, kind: ClauseKind) -> Self
	where
		F: FnOnce(QueryBuilder) -> R,
		R: Into<Option<QueryBuilder>>,
	{
		self.group(kind, composer)
	}

	pub fn must_match(
		self,
		field: impl Into<String>,
		value: impl Into<Value>,
		options: impl Into<Options>,
	) -> Self {
		self.match_field(field, value, options, MatchType::Match, ClauseKind::Must)
	}

	pub fn must_match_phrase(
		self,
		field: impl Into<String>,
		value: impl Into<Value>,
		options: impl Into<Options>,
	) -> Self {
		self.match_field(field, value, options, MatchType::MatchPhrase, ClauseKind::Must)
	}

	pub fn must_match_phrase_prefix(
		self,
		field: impl Into<String>,
		value: impl Into<Value>,
		options: impl Into<Options>,
	) -> Self {
		self.match_field(field, value, options, MatchType::MatchPhrasePrefix, ClauseKind::Must)
	}

	pub fn must_match_multi(
		self,
		field: impl Into<String>,
		value: impl Into<Value>,
		options: impl Into<Options>,
	) -> Self {
		self.match_field(field, value, options, MatchType::MultiMatch, ClauseKind::Must)
	}

	pub fn should_match(
		self,
		field: impl Into<String>,
		value: impl Into<Value>,
		options: impl Into<Options>,
	) -> Self {
		self.match_field(field, value, options, MatchType::Match, ClauseKind::Should)
	}

	pub fn should_match_phrase(
		self,
		field: impl Into<String>,
		value: impl Into<Value>,
		options: impl Into<Options>,
	) -> Self {
		self.match_field(field, value, options, MatchType::MatchPhrase, ClauseKind::Should)
	}

	pub fn should_match_phrase_prefix(
		self,
		field: impl Into<String>,
		value: impl Into<Value>,
		options: impl Into<Options>,
	) -> Self {
		self.match_field(field, value, options, MatchType::MatchPhrasePrefix, ClauseKind::Should)
	}

	pub fn should_match_multi(
		self,
		field: impl Into<String>,
		value: impl Into<Value>,
		options: impl Into<Options>,
	) -> Self {
		self.match_field(field, value, options, MatchType::MultiMatch, ClauseKind::Should)
	}

	/// Full-text `query_string` search across `fields`, always under `must`.
	pub fn search(
		self,
		text: impl Into<String>,
		fields: impl Into<SearchFields>,
		options: impl Into<Options>,
	) -> Self {
		let node = QueryNode::QueryString {
			text: text.into(),
			fields: fields.into(),
			options: options.into().unwrap_or_default(),
		};

		self.push(ClauseKind::Must, node)
	}

	pub fn sort_by(self, field: impl Into<String>, order: &str, mode: Option<&str>) -> Self {
		self.push(ClauseKind::Sort, SortDirective::field(field, order, mode).into())
	}

	pub fn order_by(self, field: impl Into<String>, order: &str, mode: Option<&str>) -> Self {
		self.sort_by(field, order, mode)
	}

	pub fn sort_by_score(self, order: &str) -> Self {
		self.sort_by("_score", order, None)
	}

	pub fn order_by_score(self, order: &str) -> Self {
		self.sort_by_score(order)
	}

	pub fn sort_by_distance(
		self,
		field: impl Into<String>,
		point: impl Into<Value>,
		options: &GeoSortOptions,
	) -> Self {
		self.push(ClauseKind::Sort, SortDirective::geo_distance(field, point, options).into())
	}

	pub fn order_by_distance(
		self,
		field: impl Into<String>,
		point: impl Into<Value>,
		options: &GeoSortOptions,
	) -> Self {
		self.sort_by_distance(field, point, options)
	}

	/// Sets the target indices. The configured prefix is applied to each name.
	pub fn index(mut self, names: impl Into<IndexNames>) -> Self {
		self.indexes.set(names.into(), self.context.prefix());

		self
	}

	pub fn on(self, names: impl Into<IndexNames>) -> Self {
		self.index(names)
	}

	/// Sets the target indices from `(name, weight)` pairs and keeps the weights.
	pub fn index_weighted<I, K>(mut self, weighted: I) -> Self
	where
		I: IntoIterator<Item = (K, f64)>,
		K: Into<String>,
	{
		let weighted = weighted.into_iter().map(|(name, weight)| (name.into(), weight)).collect();

		self.indexes.set_weighted(weighted, self.context.prefix());

		self
	}

	pub fn index_weights(&self) -> &[(String, f64)] {
		self.indexes.weights()
	}

	/// Index expression sent to the backend.
	pub fn get_indexes(&self) -> String {
		self.indexes.expression(self.context.prefix())
	}

	/// Reads, replaces, or merges the shared index map.
	pub fn index_map(&self, input: Option<IndexMapInput>, merge: bool) -> Result<IndexMap> {
		Ok(self.context.registry().index_map(input, merge)?)
	}

	pub fn bind(mut self, scopes: Arc<ScopeSet>) -> Self {
		self.scopes = Some(scopes);

		self
	}

	pub fn scopes(&self) -> Option<&Arc<ScopeSet>> {
		self.scopes.as_ref()
	}

	/// Applies each registered scope decorator in order. Unregistered scopes are skipped.
	pub fn apply_scopes<I, K>(self, scopes: I) -> Self
	where
		I: IntoIterator<Item = (K, Value)>,
		K: AsRef<str>,
	{
		let Some(set) = self.scopes.clone() else {
			return self;
		};
		let mut builder = self;

		for (name, value) in scopes {
			match set.decorator(name.as_ref()) {
				Some(decorator) => builder = decorator.apply(builder, &value),
				None => tracing::debug!(scope = name.as_ref(), "Scope is not registered."),
			}
		}

		builder
	}

	/// Invokes a bound handler method by name. Unknown names are a no-op.
	pub fn call(self, name: &str, args: &[Value]) -> Self {
		self.try_call(name, args).0
	}

	pub fn try_call(self, name: &str, args: &[Value]) -> (Self, bool) {
		match self.scopes.clone() {
			Some(set) => set.try_invoke(name, self, args),
			None => (self, false),
		}
	}

	pub fn get_query(&self) -> Value {
		self.params.to_query()
	}

	/// `{"index": ..., "body": {...}}` merged with `extra`. Keys in `extra` win.
	pub fn get_full_query(&self, extra: Map<String, Value>) -> Value {
		let mut body = self.params.non_query();
		let query = self.get_query();

		if query.as_object().is_some_and(|query| !query.is_empty()) {
			body.insert("query".to_string(), query);
		}

		let mut request = Map::new();

		request.insert("index".to_string(), Value::from(self.get_indexes()));
		request.insert("body".to_string(), Value::Object(body));
		request.extend(extra);

		Value::Object(request)
	}

	/// Executes and reconciles the current query.
	pub async fn get(&mut self) -> Result<SearchResults> {
		let request = self.compile(Map::new());
		let raw = self.context.executor().search(&request).await?;

		Ok(self.context.reconciler().reconcile(raw).await?)
	}

	/// Executes one page. `per_page` falls back to the configured default.
	pub async fn paginate(&mut self, page: u32, per_page: Option<u32>) -> Result<Paginator> {
		let page = page.max(1);
		let per_page = per_page.unwrap_or_else(|| self.context.default_per_page()).max(1);
		let mut extra = Map::new();

		extra.insert("size".to_string(), Value::from(per_page));
		extra.insert("from".to_string(), Value::from(u64::from(per_page) * u64::from(page - 1)));

		let request = self.compile(extra);
		let raw = self.context.executor().search(&request).await?;
		let results = self.context.reconciler().reconcile(raw).await?;

		Ok(Paginator::new(results, per_page, page, self.context.pagination_path())
			.with_fields(self.context.pagination_fields().clone()))
	}

	/// Executes the current query and returns the backend response as is. Never resets.
	pub async fn get_raw(&self) -> Result<Value> {
		let request = self.get_full_query(Map::new());

		tracing::debug!(index = %request["index"], "Executing raw search request.");

		self.context.executor().search(&request).await
	}

	/// Clears target indices and clauses. Bound scopes stay.
	pub fn reset(&mut self) {
		self.indexes.clear();
		self.params.reset();
	}

	pub fn reset_after_query(mut self, enabled: bool) -> Self {
		self.reset_after_query = enabled;

		self
	}

	pub fn set_reset_after_query(&mut self, enabled: bool) {
		self.reset_after_query = enabled;
	}

	fn compile(&mut self, extra: Map<String, Value>) -> Value {
		let request = self.get_full_query(extra);

		tracing::debug!(
			index = %request["index"],
			reset = self.reset_after_query,
			"Executing search request."
		);

		if self.reset_after_query {
			self.reset();
		}

		request
	}

	fn push_group(self, kind: ClauseKind, params: ParamStore) -> Self {
		if !params.has_query() {
			tracing::debug!(kind = kind.as_str(), "Skipping empty query group.");

			return self;
		}

		self.push(kind, QueryNode::SubQuery(Box::new(params)))
	}

	fn child(&self) -> Self {
		Self {
			context: self.context.clone(),
			scopes: self.scopes.clone(),
			params: ParamStore::default(),
			indexes: IndexTarget::default(),
			reset_after_query: self.reset_after_query,
		}
	}
}
impl fmt::Debug for QueryBuilder {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("QueryBuilder")
			.field("params", &self.params)
			.field("indexes", &self.indexes)
			.field("scopes", &self.scopes)
			.field("reset_after_query", &self.reset_after_query)
			.finish_non_exhaustive()
	}
}
