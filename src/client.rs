// ===============================
// src/client.rs
// ===============================
use std::future::Future;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::binance::{timestamp_ms, ApiErrorBody, OpenOrder, SignedQuery, Signer};
use crate::config::{Config, ConfigError};

pub const OPEN_ORDERS_PATH: &str = "/api/v3/openOrders";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http transport: {0}")]
    Http(#[from] reqwest::Error),
    #[error("binance rejected request ({status}): code={code:?} msg={msg}")]
    Api {
        status: u16,
        code: Option<i64>,
        msg: String,
    },
    #[error("bad response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Maps a non-2xx response body to `Api`, decoding Binance's `{code,msg}` when present.
    fn from_status(status: StatusCode, body: String) -> Self {
        match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(b) => ClientError::Api {
                status: status.as_u16(),
                code: Some(b.code),
                msg: b.msg,
            },
            Err(_) => ClientError::Api {
                status: status.as_u16(),
                code: None,
                msg: body,
            },
        }
    }
}

/// Anything that can list the watched pair's open orders.
pub trait OpenOrdersSource {
    fn open_orders(&self) -> impl Future<Output = Result<Vec<OpenOrder>, ClientError>> + Send;
}

/// Binance Spot REST client for SIGNED GET endpoints.
#[derive(Debug, Clone)]
pub struct BinanceClient {
    http: reqwest::Client,
    rest_base: String,
    api_key: String,
    signer: Signer,
    symbol: String,
    recv_window: u64,
}

impl BinanceClient {
    /// Fails fast (no network) when the secret is missing.
    pub fn new(cfg: &Config) -> Result<Self, ConfigError> {
        let signer = Signer::new(cfg.secret.clone())?;
        Ok(Self {
            http: reqwest::Client::new(),
            rest_base: cfg.rest_base.clone(),
            api_key: cfg.api_key.clone(),
            signer,
            symbol: cfg.symbol.clone(),
            recv_window: cfg.recv_window,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn open_orders_query(&self, ts_ms: u64) -> SignedQuery {
        SignedQuery::new()
            .param("symbol", &self.symbol)
            .param("recvWindow", self.recv_window)
            .timestamp(ts_ms)
    }

    pub fn signed_url(&self, path: &str, query: &SignedQuery) -> String {
        format!("{}{}?{}", self.rest_base, path, self.signer.sign(query))
    }

    pub async fn get_signed<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &SignedQuery,
    ) -> Result<T, ClientError> {
        let url = self.signed_url(path, query);
        debug!(%path, "GET signed");

        let rsp = self
            .http
            .get(url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await?;

        let status = rsp.status();
        let body = rsp.text().await?;
        if !status.is_success() {
            return Err(ClientError::from_status(status, body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

impl OpenOrdersSource for BinanceClient {
    async fn open_orders(&self) -> Result<Vec<OpenOrder>, ClientError> {
        let query = self.open_orders_query(timestamp_ms());
        self.get_signed(OPEN_ORDERS_PATH, &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn cfg(secret: &str) -> Config {
        Config {
            api_key: "key".into(),
            secret: secret.into(),
            symbol: "BTCUSDT".into(),
            recv_window: 15_000,
            poll_interval: Duration::from_secs(60),
            rest_base: "https://api.binance.com".into(),
            metrics_port: None,
        }
    }

    /// Answers exactly one HTTP request with `status` and `body`; yields the raw request head.
    async fn one_shot_server(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut head: Vec<u8> = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let rsp = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(rsp.as_bytes()).await.unwrap();
            stream.flush().await.unwrap();
            String::from_utf8_lossy(&head).into_owned()
        });
        (base, handle)
    }

    fn client_for(base: String) -> BinanceClient {
        let mut c = cfg("abc");
        c.api_key = "KEY1".into();
        c.rest_base = base;
        BinanceClient::new(&c).unwrap()
    }

    #[test]
    fn missing_secret_fails_before_any_request() {
        let err = BinanceClient::new(&cfg("")).unwrap_err();
        assert_eq!(err, ConfigError::MissingSecret);
    }

    #[test]
    fn builds_open_orders_url() {
        let client = BinanceClient::new(&cfg("abc")).unwrap();
        let query = client.open_orders_query(1_700_000_000_000);
        let url = client.signed_url(OPEN_ORDERS_PATH, &query);

        let prefix = "https://api.binance.com/api/v3/openOrders?symbol=BTCUSDT&recvWindow=15000&timestamp=1700000000000&signature=";
        assert!(url.starts_with(prefix), "{url}");
        assert_eq!(url.len(), prefix.len() + 64);
    }

    #[test]
    fn api_error_body_is_decoded() {
        let err = ClientError::from_status(
            StatusCode::UNAUTHORIZED,
            r#"{"code":-2015,"msg":"Invalid API-key, IP, or permissions for action."}"#.into(),
        );
        match err {
            ClientError::Api { status, code, msg } => {
                assert_eq!(status, 401);
                assert_eq!(code, Some(-2015));
                assert!(msg.starts_with("Invalid API-key"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn non_json_error_body_is_kept_verbatim() {
        let err = ClientError::from_status(StatusCode::BAD_GATEWAY, "upstream down".into());
        match err {
            ClientError::Api { status, code, msg } => {
                assert_eq!(status, 502);
                assert_eq!(code, None);
                assert_eq!(msg, "upstream down");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn sends_signed_get_with_api_key_header() {
        let (base, server) = one_shot_server("200 OK", r#"[{"symbol":"BTCUSDT","orderId":7}]"#).await;
        let orders = client_for(base).open_orders().await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, 7);

        let head = server.await.unwrap();
        let request_line = head.lines().next().unwrap_or_default();
        let prefix = "GET /api/v3/openOrders?symbol=BTCUSDT&recvWindow=15000&timestamp=";
        assert!(request_line.starts_with(prefix), "{request_line}");
        let sig = request_line
            .split_once("&signature=")
            .map(|(_, rest)| rest.trim_end_matches(" HTTP/1.1"))
            .unwrap_or_default();
        assert_eq!(sig.len(), 64, "{request_line}");
        assert!(head
            .lines()
            .any(|l| l.to_ascii_lowercase() == "x-mbx-apikey: key1"));
    }

    #[tokio::test]
    async fn rejected_request_maps_to_api_error() {
        let (base, server) =
            one_shot_server("401 Unauthorized", r#"{"code":-2015,"msg":"bad"}"#).await;
        let err = client_for(base).open_orders().await.unwrap_err();
        server.await.unwrap();
        match err {
            ClientError::Api { status, code, msg } => {
                assert_eq!(status, 401);
                assert_eq!(code, Some(-2015));
                assert_eq!(msg, "bad");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_success_body_is_a_decode_error() {
        let (base, server) = one_shot_server("200 OK", "not json").await;
        let err = client_for(base).open_orders().await.unwrap_err();
        server.await.unwrap();
        assert!(matches!(err, ClientError::Decode(_)), "{err:?}");
    }
}
