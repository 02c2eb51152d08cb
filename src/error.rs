use thiserror::Error;

/// Failures surfaced by the REST client.
///
/// Renderers mostly swallow these (an empty list or an anonymous session is
/// shown instead); only the login and signup forms put them in front of the
/// user.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// Non-OK status on a write whose body we do not read.
    #[error("{method} {path} returned HTTP {status}")]
    Status {
        method: &'static str,
        path: String,
        status: u16,
    },

    /// Non-OK status on signup or login, with the server's message when it sent one.
    #[error("rejected with HTTP {status}")]
    Rejected { status: u16, message: Option<String> },

    /// The body was not the JSON we expected.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// True when no response arrived at all.
    ///
    /// Form handlers stop early on these, before touching their inputs.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Network(e.to_string())
    }
}
