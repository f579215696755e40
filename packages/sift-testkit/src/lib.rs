mod error;

pub use error::{Error, Result};

use std::{env, str::FromStr, thread};

use serde_json::Value;
use sqlx::{
	ConnectOptions, Connection, Executor, PgPool,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::runtime::Builder;
use uuid::Uuid;

use sift_config::Postgres;

/// Server DSN for Postgres-backed tests, read from `SIFT_PG_DSN`.
pub fn env_dsn() -> Option<String> {
	env::var("SIFT_PG_DSN").ok()
}

/// A throwaway `sift_test_*` database on the test server.
///
/// Dropped by `cleanup`, or from a helper thread when the value is dropped first.
pub struct TestDatabase {
	name: String,
	options: PgConnectOptions,
	admin: PgConnectOptions,
	dropped: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base = PgConnectOptions::from_str(base_dsn)
			.map_err(|err| Error::Message(format!("Invalid SIFT_PG_DSN: {err}.")))?;
		let (admin, mut conn) = connect_admin(&base).await?;
		let name = format!("sift_test_{}", Uuid::new_v4().simple());

		conn.execute(format!(r#"CREATE DATABASE "{name}""#).as_str()).await?;
		conn.close().await?;

		Ok(Self { options: base.database(&name), name, admin, dropped: false })
	}

	pub fn dsn(&self) -> String {
		self.options.to_url_lossy().to_string()
	}

	/// Storage settings pointing at this database, as `Db::connect` expects them.
	pub fn postgres_config(&self, pool_max_conns: u32) -> Postgres {
		Postgres { dsn: self.dsn(), pool_max_conns }
	}

	pub async fn cleanup(mut self) -> Result<()> {
		self.dropped = true;

		drop_database(&self.admin, &self.name).await
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.dropped {
			return;
		}

		let admin = self.admin.clone();
		let name = self.name.clone();
		let handle = thread::spawn(move || {
			Builder::new_current_thread()
				.enable_all()
				.build()
				.map_err(|err| Error::Message(format!("Failed to start cleanup runtime: {err}.")))?
				.block_on(drop_database(&admin, &name))
		});

		if let Ok(Err(err)) = handle.join() {
			eprintln!("Failed to drop test database {}: {err}.", self.name);
		}
	}
}

/// A table created and filled inside a test database.
///
/// Rows are JSON objects loaded through `jsonb_populate_recordset`, so their keys must match
/// column names. Missing keys become NULL.
#[derive(Debug, Clone)]
pub struct TableFixture {
	table: String,
	columns: Vec<(String, String)>,
	rows: Vec<Value>,
}
impl TableFixture {
	/// `table` may be schema-qualified and is used as written.
	pub fn new(table: impl Into<String>) -> Self {
		Self { table: table.into(), columns: Vec::new(), rows: Vec::new() }
	}

	pub fn column(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
		self.columns.push((name.into(), ty.into()));

		self
	}

	pub fn row(mut self, row: Value) -> Self {
		self.rows.push(row);

		self
	}

	/// Creates the table and inserts every row. Returns the inserted row count.
	pub async fn seed(&self, pool: &PgPool) -> Result<u64> {
		let create_sql = self.create_sql()?;

		sqlx::query(create_sql.as_str()).execute(pool).await?;

		if self.rows.is_empty() {
			return Ok(0);
		}

		let insert_sql = format!(
			"INSERT INTO {table} SELECT * FROM jsonb_populate_recordset(NULL::{table}, $1)",
			table = self.table,
		);
		let done = sqlx::query(insert_sql.as_str())
			.bind(Value::Array(self.rows.clone()))
			.execute(pool)
			.await?;

		Ok(done.rows_affected())
	}

	fn create_sql(&self) -> Result<String> {
		if self.columns.is_empty() {
			return Err(Error::Message(format!("Table fixture {} has no columns.", self.table)));
		}

		let columns = self
			.columns
			.iter()
			.map(|(name, ty)| format!(r#""{}" {ty}"#, name.replace('"', "\"\"")))
			.collect::<Vec<_>>();

		Ok(format!("CREATE TABLE {} ({})", self.table, columns.join(", ")))
	}
}

async fn connect_admin(base: &PgConnectOptions) -> Result<(PgConnectOptions, PgConnection)> {
	let admin = base.clone().database("postgres");

	match PgConnection::connect_with(&admin).await {
		Ok(conn) => Ok((admin, conn)),
		Err(_) => {
			let admin = base.clone().database("template1");
			let conn = PgConnection::connect_with(&admin).await?;

			Ok((admin, conn))
		},
	}
}

async fn drop_database(admin: &PgConnectOptions, name: &str) -> Result<()> {
	let mut conn = PgConnection::connect_with(admin).await?;

	conn.execute(format!(r#"DROP DATABASE IF EXISTS "{name}" WITH (FORCE)"#).as_str()).await?;
	conn.close().await?;

	Ok(())
}
