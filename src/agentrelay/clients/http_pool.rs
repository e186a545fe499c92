//! HTTP Client Pool for maintaining persistent connections per base URL.
//!
//! Every agent persona may own its own client (one model per persona), but personas that talk
//! to the same provider should still share sockets. This module keeps one `reqwest::Client`
//! per base URL so that:
//! - HTTP connections are reused across agents and across concurrent queries
//! - TLS handshakes are reused where possible
//! - TCP connections are kept alive between collaboration rounds

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

lazy_static! {
    /// Global HTTP client pool, lazily initialized on first access.
    static ref HTTP_CLIENT_POOL: Mutex<HashMap<String, reqwest::Client>> =
        Mutex::new(HashMap::new());
}

/// Get or create a shared HTTP client for the given base URL.
///
/// Falls back to an unpooled default client if the pooled builder fails (which only happens
/// when the TLS backend cannot be initialised).
pub fn get_http_client(base_url: &str) -> reqwest::Client {
    let mut pool = match HTTP_CLIENT_POOL.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    if let Some(client) = pool.get(base_url) {
        return client.clone();
    }

    let client = match reqwest::ClientBuilder::new()
        // Keep idle connections alive for 90 seconds
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .pool_max_idle_per_host(10)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        // Collaboration rounds chain several long generations; give each one room.
        .timeout(Duration::from_secs(300))
        .build()
    {
        Ok(client) => client,
        Err(err) => {
            log::warn!(
                "agentrelay::clients::http_pool: falling back to default client for {}: {}",
                base_url,
                err
            );
            reqwest::Client::new()
        }
    };

    pool.insert(base_url.to_string(), client.clone());
    client
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_base_url_is_reused() {
        let _a = get_http_client("https://pool-test.invalid");
        let _b = get_http_client("https://pool-test.invalid");
        let pool = HTTP_CLIENT_POOL.lock().unwrap();
        assert_eq!(
            pool.keys()
                .filter(|k| k.as_str() == "https://pool-test.invalid")
                .count(),
            1
        );
    }
}
