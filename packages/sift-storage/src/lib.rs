pub mod db;
pub mod table;

mod error;

pub use error::{Error, Result};
pub use table::{PgTable, quote_ident};
