//! Error types for the store layer.

/// Errors a [`Storage`](crate::Storage) backend can report.
///
/// [`SessionStore`](crate::SessionStore) never lets these escape; they
/// exist so backends can say what went wrong and the store can log it.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend refused to work at all (lock poisoned, quota
    /// exhausted, storage disabled).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Reading or writing the backing file failed.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file exists but isn't a JSON object of strings.
    #[error("storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
