//! relay-client: Off-chain readers for the Opyn client
//!
//! - [`relay::RelayClient`] reads order books from a 0x standard relayer (v3)
//! - [`subgraph::GraphClient`] reads vault ownership from the options subgraph

pub mod relay;
pub mod subgraph;

use std::time::Duration;

use opyn_core::SourceError;

pub use relay::RelayClient;
pub use subgraph::GraphClient;

/// Timeout for relay and subgraph requests (30 seconds).
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Result type for off-chain reads
pub type Result<T> = std::result::Result<T, SourceError>;

fn http_client(source_name: &'static str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| SourceError::api(source_name, e))
}

/// Map a transport failure, keeping timeouts distinguishable
fn request_error(source_name: &'static str, url: &str, err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        SourceError::Timeout {
            source_name,
            secs: REQUEST_TIMEOUT.as_secs(),
        }
    } else if err.is_connect() {
        SourceError::Unreachable {
            source_name,
            url: url.to_string(),
        }
    } else {
        SourceError::api(source_name, err)
    }
}
