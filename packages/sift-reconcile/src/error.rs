pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("No handler is mapped to index {index:?}.")]
	UnresolvedIndexHandler { index: String },
	#[error("Handler {identity:?} is not registered.")]
	UnknownHandler { identity: String },
	#[error("Handler {identity:?} cannot back index {index:?}: {reason}")]
	UnsupportedHandlerType { index: String, identity: String, reason: String },
	#[error("Records for index {index:?} are missing for ids {ids:?}.")]
	MissingRecordAfterRefresh { index: String, ids: Vec<String> },
	#[error("Invalid search response: {message}")]
	InvalidResponse { message: String },
	#[error("Store error: {message}")]
	Store { message: String },
}
