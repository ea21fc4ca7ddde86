use crate::store::StoreError;

/// Failure modes of the aggregate read path. Every variant except [`Store`]
/// is a deterministic function of the request, so none of them is worth a
/// retry.
///
/// [`Store`]: QueryError::Store
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Malformed input, e.g. a non-positive page number or duration.
    #[error("{0}")]
    InvalidArgument(String),
    /// Well-formed request addressing a page beyond the window end.
    #[error("{0}")]
    OutOfRange(String),
    /// The installation id is unknown to the store.
    #[error("installation {0} does not exist")]
    NotFound(u64),
    /// Opaque infrastructure failure, propagated uninterpreted.
    #[error(transparent)]
    Store(#[from] StoreError),
}
