pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Unknown clause kind {kind:?}. Expected must, should, filter, must_not, or sort.")]
	InvalidClauseKind { kind: String },
	#[error("Search executor failed: {message}")]
	Executor { message: String },
	#[error(transparent)]
	Reconcile(#[from] sift_reconcile::Error),
}
