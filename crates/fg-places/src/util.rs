use crate::constants::{CONNECT_TIMEOUT, REQUEST_TIMEOUT, USER_AGENT};

/// HTTP client with compression, explicit timeouts and the crate's
/// User-Agent. The public spatial and geocoding services reject anonymous
/// clients, and downstream calls must not hang past the request timeout.
pub fn default_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .gzip(true)
        .brotli(true)
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .unwrap()
}
