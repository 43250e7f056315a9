use reqwest::StatusCode;
use thiserror::Error;

use crate::state::persistence::PersistenceError;

/// Convenient result alias returning [`ClientError`] failures.
pub type ClientResult<T> = Result<T, ClientError>;

/// Failures while talking to the backend over HTTP.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build HTTP client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The request could not be sent or the connection dropped.
    #[error("failed to send request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The backend answered with a non-success status.
    #[error("unexpected response status {status} for `{path}`: {message}")]
    RequestStatus {
        path: String,
        status: StatusCode,
        message: String,
    },
    /// The response body did not match the expected shape.
    #[error("failed to decode response from `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ClientError {
    /// Status code returned by the backend, if it answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::RequestStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ClientError> for PersistenceError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::RequestStatus {
                status, message, ..
            } => PersistenceError::Rejected {
                status: status.as_u16(),
                message,
            },
            other => PersistenceError::Unavailable(other.to_string()),
        }
    }
}

/// Failures raised while registering a player, before any session starts.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// A required identity field is blank.
    #[error("`{0}` must not be blank")]
    MissingField(&'static str),
    /// The backend could not register the player.
    #[error(transparent)]
    Client(#[from] ClientError),
}
