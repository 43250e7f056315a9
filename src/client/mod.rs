//! HTTP client for a running backend, usable as the score backend of a local game session.

mod error;
mod http;

pub use error::{ClientError, ClientResult, RegistrationError};
pub use http::HttpScoreClient;
