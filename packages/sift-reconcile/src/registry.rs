use std::{
	collections::{BTreeMap, HashMap},
	sync::RwLock,
};

use crate::{Error, Handler, Result};

/// Prefixed index name to handler identity.
pub type IndexMap = BTreeMap<String, String>;

/// Input accepted when building the index map.
#[derive(Debug, Clone)]
pub enum IndexMapInput {
	/// Index name to handler identity. Keys are prefixed.
	Explicit(Vec<(String, String)>),
	/// Handler identities. Index names come from each handler and are prefixed.
	Handlers(Vec<String>),
}
impl<K, V> FromIterator<(K, V)> for IndexMapInput
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self::Explicit(
			iter.into_iter().map(|(index, identity)| (index.into(), identity.into())).collect(),
		)
	}
}

/// Handler container plus the process-wide index map.
///
/// Handlers are registered once during setup. The index map is read-mostly afterwards and only
/// changes through [`HandlerRegistry::index_map`].
#[derive(Debug, Default)]
pub struct HandlerRegistry {
	prefix: String,
	handlers: HashMap<String, Handler>,
	index_map: RwLock<IndexMap>,
}
impl HandlerRegistry {
	pub fn new(prefix: impl Into<String>) -> Self {
		Self {
			prefix: prefix.into(),
			handlers: HashMap::new(),
			index_map: RwLock::new(IndexMap::new()),
		}
	}

	pub fn with_handler(mut self, identity: impl Into<String>, handler: Handler) -> Self {
		self.handlers.insert(identity.into(), handler);

		self
	}

	pub fn prefix(&self) -> &str {
		&self.prefix
	}

	pub fn apply_prefix(&self, index: &str) -> String {
		apply_index_prefix(&self.prefix, index)
	}

	pub fn handler(&self, identity: &str) -> Option<Handler> {
		self.handlers.get(identity).cloned()
	}

	/// Reads, replaces, or merges the index map and returns the effective map.
	///
	/// With `merge`, entries from `input` win over existing entries on the same index.
	pub fn index_map(&self, input: Option<IndexMapInput>, merge: bool) -> Result<IndexMap> {
		let Some(input) = input else {
			return Ok(self.read_map().clone());
		};
		let built = self.build_index_map(input)?;
		let mut map = self.index_map.write().unwrap_or_else(|err| err.into_inner());

		if merge && !map.is_empty() {
			map.extend(built);
		} else {
			*map = built;
		}

		Ok(map.clone())
	}

	/// Identity mapped to `index`, if any.
	pub fn identity_for(&self, index: &str) -> Option<String> {
		self.read_map().get(index).cloned()
	}

	/// Handler for a prefixed index name.
	pub fn resolve(&self, index: &str) -> Option<Handler> {
		let identity = self.identity_for(index)?;

		self.handler(&identity)
	}

	fn build_index_map(&self, input: IndexMapInput) -> Result<IndexMap> {
		match input {
			IndexMapInput::Explicit(entries) => Ok(entries
				.into_iter()
				.map(|(index, identity)| (self.apply_prefix(&index), identity))
				.collect()),
			IndexMapInput::Handlers(identities) => {
				let mut map = IndexMap::new();

				for identity in identities {
					let handler = self
						.handler(&identity)
						.ok_or_else(|| Error::UnknownHandler { identity: identity.clone() })?;

					map.insert(self.apply_prefix(handler.searchable_as()), identity);
				}

				Ok(map)
			},
		}
	}

	fn read_map(&self) -> std::sync::RwLockReadGuard<'_, IndexMap> {
		self.index_map.read().unwrap_or_else(|err| err.into_inner())
	}
}

/// Prefixes `index` unless it already starts with `prefix`.
pub fn apply_index_prefix(prefix: &str, index: &str) -> String {
	if index.starts_with(prefix) { index.to_string() } else { format!("{prefix}{index}") }
}
