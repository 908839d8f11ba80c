//! Buyer and seller key-value service clients.
//!
//! Both are plain HTTPS GETs with URL-encoded list parameters, returning an
//! opaque JSON string. The fetch contract is async with a caller-supplied
//! timeout; callers decide whether a failure degrades or aborts.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Metadata headers forwarded on KV fetches, already mapped to their HTTP
/// header names.
pub type RequestMetadata = Vec<(String, String)>;

/// gRPC metadata keys forwarded from the SFE to buyer front ends, unchanged.
pub const FORWARDED_METADATA_KEYS: [&str; 3] =
    ["x-accept-language", "x-user-agent", "x-bna-client-ip"];

/// gRPC metadata key to the HTTP header it becomes on the buyer KV fetch.
pub const BUYER_KV_METADATA_MAP: [(&str, &str); 3] = [
    ("x-accept-language", "Accept-Language"),
    ("x-user-agent", "User-Agent"),
    ("x-bna-client-ip", "X-BnA-Client-IP"),
];

#[derive(Debug, Error)]
pub enum KvError {
    #[error("kv request failed: {0}")]
    Transport(String),
    #[error("kv server returned status {0}")]
    Status(u16),
    #[error("kv fetch timed out")]
    Timeout,
}

/// Lookup for one buyer's bidding signals.
#[derive(Debug, Default, Clone)]
pub struct BuyerKvInput {
    pub hostname: String,
    pub keys: Vec<String>,
    pub interest_group_names: Vec<String>,
}

/// Lookup for scoring signals, keyed by the candidate render URLs.
#[derive(Debug, Default, Clone)]
pub struct SellerKvInput {
    pub render_urls: Vec<String>,
    pub ad_component_render_urls: Vec<String>,
}

/// Async fetcher returning the raw JSON body.
#[async_trait]
pub trait BiddingSignalsFetcher: Send + Sync {
    async fn fetch_bidding_signals(
        &self,
        input: &BuyerKvInput,
        metadata: &RequestMetadata,
        timeout: Duration,
    ) -> Result<String, KvError>;
}

#[async_trait]
pub trait ScoringSignalsFetcher: Send + Sync {
    async fn fetch_scoring_signals(
        &self,
        input: &SellerKvInput,
        timeout: Duration,
    ) -> Result<String, KvError>;
}

/// HTTP client for one KV endpoint.
#[derive(Debug, Clone)]
pub struct HttpKvClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpKvClient {
    pub fn new(base_url: Url) -> anyhow::Result<Self> {
        Ok(Self { client: reqwest::Client::builder().build()?, base_url })
    }

    fn build_url(&self, params: &[(&str, &[String])]) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (name, values) in params {
                if !values.is_empty() {
                    pairs.append_pair(name, &values.join(","));
                }
            }
        }
        url
    }

    async fn fetch(
        &self,
        url: Url,
        metadata: &RequestMetadata,
        timeout: Duration,
    ) -> Result<String, KvError> {
        debug!(message = "kv fetch", url = %url);
        let mut request = self.client.get(url).timeout(timeout);
        for (name, value) in metadata {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                KvError::Timeout
            } else {
                KvError::Transport(e.to_string())
            }
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(KvError::Status(status.as_u16()));
        }
        response
            .text()
            .await
            .map_err(|e| KvError::Transport(e.to_string()))
    }
}

#[async_trait]
impl BiddingSignalsFetcher for HttpKvClient {
    async fn fetch_bidding_signals(
        &self,
        input: &BuyerKvInput,
        metadata: &RequestMetadata,
        timeout: Duration,
    ) -> Result<String, KvError> {
        let hostname = if input.hostname.is_empty() {
            vec![]
        } else {
            vec![input.hostname.clone()]
        };
        let url = self.build_url(&[
            ("hostname", &hostname),
            ("keys", &input.keys),
            ("interestGroupNames", &input.interest_group_names),
        ]);
        self.fetch(url, metadata, timeout).await
    }
}

#[async_trait]
impl ScoringSignalsFetcher for HttpKvClient {
    async fn fetch_scoring_signals(
        &self,
        input: &SellerKvInput,
        timeout: Duration,
    ) -> Result<String, KvError> {
        let url = self.build_url(&[
            ("renderUrls", &input.render_urls),
            ("adComponentRenderUrls", &input.ad_component_render_urls),
        ]);
        self.fetch(url, &RequestMetadata::new(), timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buyer_url_carries_hostname_and_lists() {
        let client = HttpKvClient::new(Url::parse("https://kv.buyer.example.com/v1/getvalues").unwrap())
            .unwrap();
        let url = client.build_url(&[
            ("hostname", &vec!["pub.example.com".to_string()]),
            (
                "keys",
                &vec!["k1".to_string(), "k2".to_string(), "with space".to_string()],
            ),
            ("interestGroupNames", &vec!["cars".to_string()]),
        ]);
        let s = url.as_str();
        assert!(s.starts_with("https://kv.buyer.example.com/v1/getvalues?"));
        assert!(s.contains("hostname=pub.example.com"));
        assert!(s.contains("keys=k1%2Ck2%2Cwith+space"));
        assert!(s.contains("interestGroupNames=cars"));
    }

    #[test]
    fn empty_lists_are_omitted() {
        let client =
            HttpKvClient::new(Url::parse("https://kv.seller.example.com/v1/getvalues").unwrap())
                .unwrap();
        let url = client.build_url(&[
            ("renderUrls", &vec!["https://cdn.example.com/ad1".to_string()]),
            ("adComponentRenderUrls", &vec![]),
        ]);
        assert!(url.as_str().contains("renderUrls="));
        assert!(!url.as_str().contains("adComponentRenderUrls"));
    }
}
