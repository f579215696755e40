pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
}
impl From<Error> for sift_reconcile::Error {
	fn from(err: Error) -> Self {
		Self::Store { message: err.to_string() }
	}
}
