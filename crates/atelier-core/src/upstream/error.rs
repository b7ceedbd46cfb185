use thiserror::Error;

/// Errors from a hosted text or image model.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The service answered with a non-success HTTP status.
    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// The request never produced an HTTP response.
    #[error("request to model failed: {0}")]
    Transport(String),

    /// The response arrived but did not contain usable output.
    #[error("malformed model response: {0}")]
    MalformedResponse(String),

    /// Credentials could not be obtained for the call.
    #[error("authentication failed: {0}")]
    Auth(String),
}

/// Errors from the object store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload of {key:?} failed: {message}")]
    Upload { key: String, message: String },

    #[error("signing URL for {key:?} failed: {message}")]
    Signing { key: String, message: String },

    #[error("storage request failed: {0}")]
    Transport(String),
}
