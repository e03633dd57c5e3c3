//! Error taxonomy shared by every engine operation

use persistence::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Caller passed something the operation cannot act on
    /// (non-positive score under the strict policy, non-positive
    /// limit/radius, malformed body).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The member holds no entry on the queried leaderboard.
    #[error("member not found")]
    NotFound,

    /// Credential mismatch on a privileged operation.
    #[error("invalid authentication")]
    AccessDenied,

    /// Backing-store failure or any unexpected fault. The detail is
    /// for logs; the boundary layer must not echo it to clients.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        Self::Internal(err.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
