use std::{collections::HashMap, fmt, sync::Arc};

use serde_json::Value;

use crate::QueryBuilder;

/// A named query modifier applied through [`QueryBuilder::apply_scopes`].
pub trait ScopeDecorator
where
	Self: Send + Sync,
{
	fn apply(&self, builder: QueryBuilder, value: &Value) -> QueryBuilder;
}
impl<F> ScopeDecorator for F
where
	F: Fn(QueryBuilder, &Value) -> QueryBuilder + Send + Sync,
{
	fn apply(&self, builder: QueryBuilder, value: &Value) -> QueryBuilder {
		self(builder, value)
	}
}

/// A handler method reachable through [`QueryBuilder::call`].
pub type ScopeMethod = Arc<dyn Fn(QueryBuilder, &[Value]) -> QueryBuilder + Send + Sync>;

/// Scope decorators and dynamic methods bound to one handler.
///
/// Both tables are keyed by the identifiers the builder derives from caller-facing names, so
/// `price_range` finds the decorator registered as `PriceRangeScope` under the set's namespace and
/// `featured` finds the method `scopeElasticFeatured`.
#[derive(Clone, Default)]
pub struct ScopeSet {
	namespace: String,
	decorators: HashMap<String, Arc<dyn ScopeDecorator>>,
	methods: HashMap<String, ScopeMethod>,
}
impl ScopeSet {
	pub fn new(namespace: impl Into<String>) -> Self {
		Self { namespace: namespace.into(), ..Default::default() }
	}

	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	pub fn with_decorator(mut self, name: &str, decorator: impl ScopeDecorator + 'static) -> Self {
		let identifier = self.decorator_identifier(name);

		self.decorators.insert(identifier, Arc::new(decorator));

		self
	}

	pub fn with_method<F>(mut self, name: &str, method: F) -> Self
	where
		F: Fn(QueryBuilder, &[Value]) -> QueryBuilder + Send + Sync + 'static,
	{
		self.methods.insert(method_identifier(name), Arc::new(method));

		self
	}

	/// `price_range` becomes `<namespace>::PriceRangeScope`.
	pub fn decorator_identifier(&self, name: &str) -> String {
		let class = title_case(&name.replace('_', " ")).replace(' ', "");

		if self.namespace.is_empty() {
			format!("{class}Scope")
		} else {
			format!("{}::{class}Scope", self.namespace)
		}
	}

	pub fn decorator(&self, name: &str) -> Option<Arc<dyn ScopeDecorator>> {
		self.decorators.get(&self.decorator_identifier(name)).cloned()
	}

	/// Runs the method registered for `name`. Returns the builder unchanged and `false` when none
	/// is registered.
	pub fn try_invoke(
		&self,
		name: &str,
		builder: QueryBuilder,
		args: &[Value],
	) -> (QueryBuilder, bool) {
		match self.methods.get(&method_identifier(name)) {
			Some(method) => (method(builder, args), true),
			None => (builder, false),
		}
	}
}
impl fmt::Debug for ScopeSet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut decorators = self.decorators.keys().collect::<Vec<_>>();
		let mut methods = self.methods.keys().collect::<Vec<_>>();

		decorators.sort();
		methods.sort();

		f.debug_struct("ScopeSet")
			.field("namespace", &self.namespace)
			.field("decorators", &decorators)
			.field("methods", &methods)
			.finish()
	}
}

/// `featured` becomes `scopeElasticFeatured`.
pub fn method_identifier(name: &str) -> String {
	let mut chars = name.chars();

	match chars.next() {
		Some(first) => format!("scopeElastic{}{}", first.to_uppercase(), chars.as_str()),
		None => "scopeElastic".to_string(),
	}
}

fn title_case(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());
	let mut at_word_start = true;

	for ch in raw.chars() {
		if at_word_start {
			out.extend(ch.to_uppercase());
		} else {
			out.push(ch);
		}

		at_word_start = ch.is_whitespace();
	}

	out
}
