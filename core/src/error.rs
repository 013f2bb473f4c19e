use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Rejected input: bad document id, control characters, malformed minus-word.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Inconsistent index state observed while ranking or removing.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self { Error::InvalidArgument(msg.into()) }

    pub fn is_invalid_argument(&self) -> bool { matches!(self, Error::InvalidArgument(_)) }
}
