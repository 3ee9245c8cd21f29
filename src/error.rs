use thiserror::Error;

/// Failure taxonomy for every operation the daemon exposes.
///
/// Validation problems (`BadParams`, `Unauthorized`) are raised before a
/// transaction opens; anything raised inside a transaction rolls it back, so
/// a surfaced error always means no partial mutation is visible.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing caller identity")]
    Unauthorized,
    #[error("{0}")]
    PermissionDenied(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadParams(String),
    #[error("select a workspace first")]
    NoWorkspace,
    /// Storage-engine failure, including aborted transactions. Surfaced to
    /// the caller as retryable; the daemon never retries internally.
    #[error(transparent)]
    Db(#[from] rusqlite::Error),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "unauthorized",
            ApiError::PermissionDenied(_) => "permission_denied",
            ApiError::NotFound(_) => "not_found",
            ApiError::BadParams(_) => "bad_params",
            ApiError::NoWorkspace => "no_workspace",
            ApiError::Db(_) => "db_failed",
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        ApiError::NotFound(what.into())
    }

    pub fn bad_params(what: impl Into<String>) -> Self {
        ApiError::BadParams(what.into())
    }
}
