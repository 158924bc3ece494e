//! Token list data model and the fixed-endpoint HTTP collaborator.
//!
//! The upstream API wraps its payload in a `{ code, data }` envelope and
//! signals success with code `"000000"`; anything else is a fetch failure.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub const DEFAULT_TOKEN_LIST_URL: &str =
    "https://www.binance.com/bapi/defi/v1/public/wallet-direct/buw/wallet/cex/alpha/all/token/list";

const SUCCESS_CODE: &str = "000000";

/// One listed token as delivered by the upstream API. Read-only input:
/// numeric fields stay in their wire form (decimal strings) and are parsed
/// where a consumer needs numbers. `token_id` uniqueness is assumed but
/// never enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub token_id: String,
    pub name: String,
    pub symbol: String,
    pub icon_url: String,
    #[serde(deserialize_with = "string_or_number")]
    pub price: String,
    #[serde(rename = "percentChange24h", deserialize_with = "string_or_number")]
    pub percent_change_24h: String,
    #[serde(deserialize_with = "string_or_number")]
    pub mul_point: String,
}

/// Upstream response envelope. `data` is optional on the wire; a missing
/// or non-array payload is treated as a malformed response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenListEnvelope {
    pub code: String,
    #[serde(default)]
    pub data: Option<Vec<Token>>,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("token list request failed: {0}")]
    Transport(String),
    #[error("token list endpoint returned HTTP {0}")]
    Status(u16),
    #[error("token list response decode failed: {0}")]
    Decode(String),
    #[error("token list envelope rejected: {0}")]
    Envelope(String),
}

/// Accept the envelope only when the success code and an actual payload
/// array are both present.
pub fn tokens_from_envelope(envelope: TokenListEnvelope) -> Result<Vec<Token>, FeedError> {
    if envelope.code != SUCCESS_CODE {
        return Err(FeedError::Envelope(format!(
            "unexpected response code {:?}",
            envelope.code
        )));
    }

    envelope
        .data
        .ok_or_else(|| FeedError::Envelope("missing token payload array".to_string()))
}

/// The injected fetch capability. The polling task only ever talks to this
/// trait, so tests can script outcomes without a network.
#[async_trait]
pub trait TokenListSource: Send + Sync {
    async fn fetch_tokens(&self) -> Result<Vec<Token>, FeedError>;
}

/// Reqwest-backed source hitting the fixed token list endpoint.
pub struct TokenListClient {
    client: reqwest::Client,
    endpoint_url: String,
}

impl TokenListClient {
    pub fn new(endpoint_url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| FeedError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            endpoint_url: endpoint_url.into(),
        })
    }
}

#[async_trait]
impl TokenListSource for TokenListClient {
    async fn fetch_tokens(&self) -> Result<Vec<Token>, FeedError> {
        let response = self
            .client
            .get(&self.endpoint_url)
            .send()
            .await
            .map_err(|err| FeedError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let envelope: TokenListEnvelope = response
            .json()
            .await
            .map_err(|err| FeedError::Decode(err.to_string()))?;

        tokens_from_envelope(envelope)
    }
}

/// The API emits `mulPoint` (and occasionally other numeric fields) as a
/// bare JSON number or as a string depending on the token; normalize both
/// to the string form.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}
