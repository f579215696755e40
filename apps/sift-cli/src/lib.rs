use std::{path::PathBuf, sync::Arc};

use clap::{
	Parser, Subcommand,
	builder::{
		Styles,
		styling::{AnsiColor, Effects},
	},
};
use color_eyre::eyre;
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

use sift_config::Config;
use sift_providers::ElasticClient;
use sift_query::{QueryBuilder, SearchContext, SearchFields};
use sift_reconcile::{Handler, HandlerRegistry, IndexMapInput, SourceIndex};
use sift_storage::{PgTable, db::Db};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(
	version = VERSION,
	rename_all = "kebab",
	styles = styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
#[command(rename_all = "kebab")]
pub enum Command {
	/// Print the compiled search request without sending it.
	Explain(QueryArgs),
	/// Run a search and print the reconciled page as JSON.
	Search(SearchArgs),
}

#[derive(Debug, clap::Args)]
#[command(rename_all = "kebab")]
pub struct QueryArgs {
	/// Query-string text.
	pub query: String,
	#[arg(long, short = 'i', value_name = "INDEX")]
	pub index: Vec<String>,
	/// Field to search, optionally boosted, e.g. `title^3`.
	#[arg(long, short = 'f', value_name = "FIELD", value_parser = parse_field)]
	pub field: Vec<(String, i64)>,
	/// Sort clause, e.g. `price:asc`. Repeatable.
	#[arg(long, value_name = "FIELD[:ORDER]")]
	pub sort: Vec<String>,
	#[arg(long, default_value_t = 1)]
	pub page: u32,
	#[arg(long, value_name = "N")]
	pub per_page: Option<u32>,
}

#[derive(Debug, clap::Args)]
#[command(rename_all = "kebab")]
pub struct SearchArgs {
	#[command(flatten)]
	pub query: QueryArgs,
	/// Back an index with a Postgres table, e.g. `posts=public.posts`.
	#[arg(long, value_name = "INDEX=TABLE", value_parser = parse_table)]
	pub table: Vec<(String, String)>,
	/// Replace hits on table-backed indices with the current rows.
	#[arg(long)]
	pub refresh: bool,
}
impl SearchArgs {
	/// Indices to search: the explicit ones plus every table-backed one.
	pub fn targets(&self) -> Vec<String> {
		let mut targets = self.query.index.clone();

		for (index, _) in &self.table {
			if !targets.contains(index) {
				targets.push(index.clone());
			}
		}

		targets
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = sift_config::load(&args.config)?;

	init_tracing(&config)?;

	let output = match args.command {
		Command::Explain(query) => {
			let registry = HandlerRegistry::new(config.index.prefix.clone());
			let context = Arc::new(build_context(&config, registry)?);

			explain(&context, &query)
		},
		Command::Search(search) => {
			let registry = build_registry(&config, &search).await?;
			let context = Arc::new(build_context(&config, registry)?);
			let mut builder = build_query(&context, &search.query, &search.targets());
			let page = builder.paginate(search.query.page, search.query.per_page).await?;

			tracing::info!(
				total = page.total(),
				items = page.items().len(),
				"Search completed."
			);

			page.to_value()
		},
	};
	let json = serde_json::to_string_pretty(&output)?;

	println!("{json}");

	Ok(())
}

/// The request `search` would send for the same arguments.
pub fn explain(context: &Arc<SearchContext>, query: &QueryArgs) -> Value {
	let per_page = query.per_page.unwrap_or_else(|| context.default_per_page()).max(1);
	let page = query.page.max(1);
	let mut extra = Map::new();

	extra.insert("size".to_string(), Value::from(per_page));
	extra.insert("from".to_string(), Value::from(u64::from(per_page) * u64::from(page - 1)));

	build_query(context, query, &query.index).get_full_query(extra)
}

pub fn build_query(
	context: &Arc<SearchContext>,
	query: &QueryArgs,
	indexes: &[String],
) -> QueryBuilder {
	let mut builder = context.builder().search(
		query.query.clone(),
		SearchFields::Weighted(query.field.clone()),
		None,
	);

	if !indexes.is_empty() {
		builder = builder.index(indexes.to_vec());
	}

	for sort in &query.sort {
		builder = match sort.split_once(':') {
			Some((field, order)) => builder.sort_by(field, order, None),
			None => builder.sort_by(sort.as_str(), "desc", None),
		};
	}

	builder
}

pub fn parse_field(raw: &str) -> Result<(String, i64), String> {
	match raw.split_once('^') {
		Some((field, weight)) if !field.is_empty() => weight
			.parse::<i64>()
			.map(|weight| (field.to_string(), weight))
			.map_err(|err| format!("Invalid weight in {raw:?}: {err}.")),
		Some(_) => Err(format!("Field {raw:?} has no name.")),
		None if raw.is_empty() => Err("Field must be non-empty.".to_string()),
		None => Ok((raw.to_string(), 0)),
	}
}

pub fn parse_table(raw: &str) -> Result<(String, String), String> {
	match raw.split_once('=') {
		Some((index, table)) if !index.is_empty() && !table.is_empty() =>
			Ok((index.to_string(), table.to_string())),
		_ => Err(format!("Expected INDEX=TABLE, got {raw:?}.")),
	}
}

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Red.on_default() | Effects::BOLD)
		.usage(AnsiColor::Red.on_default() | Effects::BOLD)
		.literal(AnsiColor::Blue.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
}

fn build_context(config: &Config, registry: HandlerRegistry) -> color_eyre::Result<SearchContext> {
	let client = ElasticClient::new(&config.backend)?;

	Ok(SearchContext::from_config(config, Arc::new(client), Arc::new(registry)))
}

async fn build_registry(
	config: &Config,
	search: &SearchArgs,
) -> color_eyre::Result<HandlerRegistry> {
	let mut registry = HandlerRegistry::new(config.index.prefix.clone());

	if !search.table.is_empty() {
		let Some(storage) = config.storage.as_ref() else {
			return Err(eyre::eyre!("--table requires a [storage.postgres] section."));
		};
		let db = Db::connect(&storage.postgres).await?;

		for (index, table) in &search.table {
			let model = PgTable::new(db.pool.clone(), table.as_str())
				.with_searchable_as(index.as_str())
				.with_searchable_refresh(search.refresh.then_some(true));

			registry = registry.with_handler(index.as_str(), Handler::record(model));
		}
	}

	for index in &search.query.index {
		if search.table.iter().all(|(table_index, _)| table_index != index) {
			let definition = SourceIndex::new(index.as_str());

			registry = registry.with_handler(index.as_str(), Handler::index(definition));
		}
	}

	registry.index_map(Some(IndexMapInput::Handlers(search.targets())), false)?;

	Ok(registry)
}

fn init_tracing(config: &Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();

	Ok(())
}
