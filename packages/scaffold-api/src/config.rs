//! Settings of the HTTP layer.

/// HTTP layer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Upper bound for reading one request body
    pub request_timeout_ms: u64,
    /// Bodies larger than this are rejected
    pub max_body_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 5000,
            max_body_bytes: 1024 * 1024,
        }
    }
}
