// ===============================
// src/binance.rs
// ===============================
//
// Binance SIGNED endpoint helpers:
// - SignedQuery : ordered query params (insertion order is the signing order)
// - Signer      : HMAC-SHA256 over the encoded query, lowercase hex
// - models      : openOrders response + REST error body
//
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::config::ConfigError;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_KEY: &str = "signature";

pub fn timestamp_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// Ordered query parameters of a signed request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignedQuery {
    params: Vec<(String, String)>,
}

impl SignedQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn timestamp(self, ts_ms: u64) -> Self {
        self.param("timestamp", ts_ms)
    }

    /// `k=v&k=v`, values percent-encoded, insertion order kept.
    /// A caller-supplied `signature` is dropped; only `Signer::sign` appends one.
    pub fn encode(&self) -> String {
        encode_pairs(
            self.params
                .iter()
                .filter(|(k, _)| k != SIGNATURE_KEY)
                .map(|(k, v)| (k.as_str(), v.as_str())),
        )
    }
}

fn encode_pairs<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Holds the shared secret; can only exist with a non-empty key.
#[derive(Clone)]
pub struct Signer {
    secret: String,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer").field("secret", &"<redacted>").finish()
    }
}

impl Signer {
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        Ok(Self { secret })
    }

    /// Lowercase hex HMAC-SHA256 of `payload`.
    pub fn signature(&self, payload: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(self.secret.as_bytes()).expect("HMAC takes keys of any size");
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Final query string: the encoded params followed by `&signature=<hex>`.
    pub fn sign(&self, query: &SignedQuery) -> String {
        let payload = query.encode();
        let sig = self.signature(&payload);
        if payload.is_empty() {
            return format!("{SIGNATURE_KEY}={sig}");
        }
        format!("{payload}&{SIGNATURE_KEY}={sig}")
    }
}

// ---- REST models ----

/// One entry of `GET /api/v3/openOrders`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OpenOrder {
    pub symbol: String,
    pub order_id: u64,
    #[serde(default)]
    pub client_order_id: String,
    #[serde(default)]
    pub price: String, // decimal string, e.g. "27000.00000000"
    #[serde(default)]
    pub orig_qty: String,
    #[serde(default)]
    pub executed_qty: String,
    #[serde(default)]
    pub status: String, // NEW, PARTIALLY_FILLED, ...
    #[serde(rename = "type", default)]
    pub order_type: String,
    #[serde(default)]
    pub side: String,
    #[serde(default)]
    pub time: u64,
}

/// Body Binance returns with non-2xx responses, e.g. `{"code":-2015,"msg":"Invalid API-key"}`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ApiErrorBody {
    pub code: i64,
    pub msg: String,
}
