use thiserror::Error;

/// Failure of one outbound provider call. Callers that degrade gracefully
/// (places, address, images, IP info) contain this inside their own resolver
/// and never let it cross into the orchestrating flow.
#[derive(Debug, Error)]
pub enum GetError {
    #[error("the request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("the request failed with status code: {0}")]
    ResponseError(reqwest::StatusCode),
    #[error("the response body could not be read: {0}")]
    ResponseBodyError(#[source] reqwest::Error),
    #[error("unable to parse the response body: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Failure to obtain a position fix. The only error class surfaced to the
/// caller as a user-visible status.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocateError {
    #[error("no positioning capability is available")]
    Unsupported,
    #[error("the user declined to share their position")]
    PermissionDenied,
    #[error("the positioning capability could not produce a fix")]
    PositionUnavailable,
    #[error("no position fix arrived within the configured timeout")]
    Timeout,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unable to read the file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("unable to parse the file: {0}")]
    ParseError(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("unable to write the file: {0}")]
    WriteError(#[from] std::io::Error),
    #[error("unable to serialize the data: {0}")]
    SerializeError(#[from] serde_json::Error),
}
