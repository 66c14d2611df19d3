use thiserror::Error;

/// An error that happens when fetching a value from a remote source.
///
/// Errors are `Clone` because every caller that joined a coalesced fetch
/// receives the same error when that fetch fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The value could not be fetched due to a transport problem, like
    /// connection loss, DNS resolution, a timeout, or a 5xx server response.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The value could not be fetched due to missing permissions.
    ///
    /// The attached string contains the remote source's response.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// The value was fetched successfully, but could not be parsed into the
    /// expected domain type.
    #[error("malformed response: {0}")]
    Malformed(String),
    /// The owner of the cache was torn down while a fetch was pending.
    #[error("owner was torn down")]
    TornDown,
}

/// A fetched value, or the reason why it could not be fetched.
pub type CacheEntry<T = ()> = Result<T, CacheError>;
