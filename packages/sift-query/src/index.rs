use sift_reconcile::apply_index_prefix;

/// Index names as given by a caller, before prefixing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexNames(Vec<String>);
impl IndexNames {
	pub fn into_inner(self) -> Vec<String> {
		self.0
	}
}
impl From<&str> for IndexNames {
	/// Comma-delimited. Blank parts are dropped.
	fn from(raw: &str) -> Self {
		Self(
			raw.split(',')
				.map(str::trim)
				.filter(|name| !name.is_empty())
				.map(str::to_string)
				.collect(),
		)
	}
}
impl From<String> for IndexNames {
	fn from(raw: String) -> Self {
		Self::from(raw.as_str())
	}
}
impl From<&String> for IndexNames {
	fn from(raw: &String) -> Self {
		Self::from(raw.as_str())
	}
}
impl From<Vec<String>> for IndexNames {
	fn from(names: Vec<String>) -> Self {
		Self(names)
	}
}
impl From<Vec<&str>> for IndexNames {
	fn from(names: Vec<&str>) -> Self {
		Self(names.into_iter().map(str::to_string).collect())
	}
}
impl<const N: usize> From<[&str; N]> for IndexNames {
	fn from(names: [&str; N]) -> Self {
		Self(names.into_iter().map(str::to_string).collect())
	}
}

/// Resolved target indices of one builder, with optional per-index weights.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexTarget {
	names: Vec<String>,
	weights: Vec<(String, f64)>,
}
impl IndexTarget {
	pub fn set(&mut self, names: IndexNames, prefix: &str) {
		self.names =
			names.into_inner().iter().map(|name| apply_index_prefix(prefix, name)).collect();
		self.weights.clear();
	}

	/// Sets the targets and keeps their weights. Weights are not sent to the backend.
	pub fn set_weighted(&mut self, weighted: Vec<(String, f64)>, prefix: &str) {
		self.weights = weighted
			.into_iter()
			.map(|(name, weight)| (apply_index_prefix(prefix, &name), weight))
			.collect();
		self.names = self.weights.iter().map(|(name, _)| name.clone()).collect();
	}

	pub fn names(&self) -> &[String] {
		&self.names
	}

	pub fn weights(&self) -> &[(String, f64)] {
		&self.weights
	}

	pub fn is_empty(&self) -> bool {
		self.names.is_empty()
	}

	pub fn clear(&mut self) {
		self.names.clear();
		self.weights.clear();
	}

	/// Comma-joined names, or a wildcard when unset: `*,-.*` skips system indices and
	/// `<prefix>*` scopes to the configured prefix.
	pub fn expression(&self, prefix: &str) -> String {
		if !self.names.is_empty() {
			return self.names.join(",");
		}
		if prefix.is_empty() {
			return "*,-.*".to_string();
		}

		format!("{prefix}*")
	}
}
