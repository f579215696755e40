use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
	Asc,
	#[default]
	Desc,
}
impl SortOrder {
	/// Anything other than "asc" or "desc" falls back to descending.
	pub fn parse(raw: &str) -> Self {
		match raw {
			"asc" => Self::Asc,
			_ => Self::Desc,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Asc => "asc",
			Self::Desc => "desc",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
	Min,
	Max,
	Sum,
	Avg,
	Median,
}
impl SortMode {
	/// Unknown modes, including "none", mean no mode.
	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"min" => Some(Self::Min),
			"max" => Some(Self::Max),
			"sum" => Some(Self::Sum),
			"avg" => Some(Self::Avg),
			"median" => Some(Self::Median),
			_ => None,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Min => "min",
			Self::Max => "max",
			Self::Sum => "sum",
			Self::Avg => "avg",
			Self::Median => "median",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceType {
	Arc,
	Plane,
}
impl DistanceType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Arc => "arc",
			Self::Plane => "plane",
		}
	}
}

/// Options for a geo-distance sort. Defaults: ascending, `min` mode, meters, arc distance.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoSortOptions {
	pub order: String,
	pub mode: String,
	pub unit: String,
	pub most_accurate: bool,
}
impl Default for GeoSortOptions {
	fn default() -> Self {
		Self {
			order: "asc".to_string(),
			mode: "min".to_string(),
			unit: "m".to_string(),
			most_accurate: true,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortDirective {
	Field {
		field: String,
		order: SortOrder,
		mode: Option<SortMode>,
	},
	GeoDistance {
		field: String,
		point: Value,
		order: SortOrder,
		mode: Option<SortMode>,
		unit: String,
		distance_type: DistanceType,
	},
}
impl SortDirective {
	pub fn field(field: impl Into<String>, order: &str, mode: Option<&str>) -> Self {
		Self::Field {
			field: field.into(),
			order: SortOrder::parse(order),
			mode: mode.and_then(SortMode::parse),
		}
	}

	pub fn geo_distance(
		field: impl Into<String>,
		point: impl Into<Value>,
		options: &GeoSortOptions,
	) -> Self {
		Self::GeoDistance {
			field: field.into(),
			point: point.into(),
			order: SortOrder::parse(&options.order),
			mode: SortMode::parse(&options.mode),
			unit: options.unit.clone(),
			distance_type: if options.most_accurate { DistanceType::Arc } else { DistanceType::Plane },
		}
	}

	pub fn to_value(&self) -> Value {
		match self {
			Self::Field { field, order, mode } => {
				let mut directive = Map::new();

				directive.insert("order".to_string(), Value::from(order.as_str()));

				if let Some(mode) = mode {
					directive.insert("mode".to_string(), Value::from(mode.as_str()));
				}

				let mut sort = Map::new();

				sort.insert(field.clone(), Value::Object(directive));

				Value::Object(sort)
			},
			Self::GeoDistance { field, point, order, mode, unit, distance_type } => {
				let mut directive = Map::new();

				directive.insert("order".to_string(), Value::from(order.as_str()));
				directive.insert("unit".to_string(), Value::from(unit.as_str()));

				if let Some(mode) = mode {
					directive.insert("mode".to_string(), Value::from(mode.as_str()));
				}

				directive.insert("distance_type".to_string(), Value::from(distance_type.as_str()));
				directive.insert(field.clone(), point.clone());

				serde_json::json!({ "_geo_distance": directive })
			},
		}
	}
}
