use sentinel_core::CollaboratorError;

/// Errors raised while wiring up the HTTP collaborators.
///
/// Failures of individual calls are reported as [`CollaboratorError`] so the core can classify
/// them; this type only covers startup.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Code given to transport failures (connect, timeout, broken body).
pub const NETWORK_CODE: &str = "network-request-failed";

/// Maps a reqwest failure onto a collaborator error.
pub(crate) fn transport_error(err: reqwest::Error) -> CollaboratorError {
    if err.is_decode() {
        CollaboratorError::new(format!("Invalid response from service: {err}"))
    } else {
        CollaboratorError::with_code(NETWORK_CODE, format!("network error: {err}"))
    }
}
