//! Connection Configuration
//!
//! Resolution precedence, highest first:
//! 1. Explicit CLI flags (`--endpoint`, `--region`)
//! 2. The `DYNAMO_ENDPOINT` environment variable
//! 3. Built-in defaults (a local endpoint on port 8000, `us-west-2`)

use std::env;

/// Environment variable naming the store endpoint
pub const ENDPOINT_ENV: &str = "DYNAMO_ENDPOINT";

/// Default endpoint, matching a locally running store
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000";

/// Default region
pub const DEFAULT_REGION: &str = "us-west-2";

/// Resolved store connection parameters
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub endpoint: String,
    pub region: String,
}

impl StoreConfig {
    /// Resolve flags against the environment and defaults
    #[must_use]
    pub fn resolve(endpoint: Option<String>, region: Option<String>) -> Self {
        Self {
            endpoint: endpoint
                .or_else(|| env::var(ENDPOINT_ENV).ok())
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            region: region.unwrap_or_else(|| DEFAULT_REGION.to_string()),
        }
    }
}
