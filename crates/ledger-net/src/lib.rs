//! HTTP transport for fetching peer chains.
//!
//! A peer is addressed by its `[userinfo@]host:port` authority and serves its
//! chain as `{"chain": [...], "length": n}` at `GET /get_chain`.

use async_trait::async_trait;
use ledger_core::constants::FETCH_TIMEOUT_SECS;
use ledger_core::{ChainSnapshot, FetchError, PeerChainFetcher};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

pub const CHAIN_PATH: &str = "/get_chain";

#[derive(Clone, Debug)]
pub struct HttpPeerFetcher {
    client: Client,
    scheme: String,
}

impl HttpPeerFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            scheme: "http".to_string(),
        })
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn chain_url(&self, peer: &str) -> String {
        format!("{}://{}{}", self.scheme, peer, CHAIN_PATH)
    }
}

impl Default for HttpPeerFetcher {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            scheme: "http".to_string(),
        }
    }
}

#[async_trait]
impl PeerChainFetcher for HttpPeerFetcher {
    async fn fetch(&self, peer: &str) -> Result<ChainSnapshot, FetchError> {
        let url = self.chain_url(peer);
        debug!(%url, "fetching peer chain");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Unreachable {
                peer: peer.to_string(),
                reason: e.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                peer: peer.to_string(),
                status: status.as_u16(),
            });
        }
        let snapshot = response
            .json::<ChainSnapshot>()
            .await
            .map_err(|e| FetchError::Decode {
                peer: peer.to_string(),
                reason: e.to_string(),
            })?;
        snapshot.check_length(peer)?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_url_uses_authority_and_scheme() {
        let fetcher = HttpPeerFetcher::default();
        assert_eq!(
            fetcher.chain_url("127.0.0.1:5001"),
            "http://127.0.0.1:5001/get_chain"
        );
        let fetcher = fetcher.with_scheme("https");
        assert_eq!(
            fetcher.chain_url("node.example"),
            "https://node.example/get_chain"
        );
    }

    #[test]
    fn chain_url_carries_userinfo() {
        let fetcher = HttpPeerFetcher::default();
        assert_eq!(
            fetcher.chain_url("alice:pw@10.0.0.7:5001"),
            "http://alice:pw@10.0.0.7:5001/get_chain"
        );
    }
}
