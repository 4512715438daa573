// ===============================
// src/metrics.rs
// ===============================
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

// label: outcome = ok | error
pub static POLLS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("order_watch_polls_total", "openOrders polls by outcome"),
        &["outcome"],
    )
    .unwrap()
});

pub static OPEN_ORDERS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("order_watch_open_orders", "open orders seen on the last successful poll")
        .unwrap()
});

pub static LAST_POLL_TS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "order_watch_last_poll_ts",
        "Unix seconds of the last successful poll",
    )
    .unwrap()
});

pub static NOTIFY_ERRORS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("order_watch_notify_errors_total", "failed desktop notifications").unwrap()
});

pub fn init() {
    for m in [
        REGISTRY.register(Box::new(POLLS.clone())),
        REGISTRY.register(Box::new(OPEN_ORDERS.clone())),
        REGISTRY.register(Box::new(LAST_POLL_TS.clone())),
        REGISTRY.register(Box::new(NOTIFY_ERRORS.clone())),
    ] {
        // AlreadyReg on a second init() is fine
        let _ = m;
    }
}

fn encode_metrics() -> Vec<u8> {
    let encoder = TextEncoder::new();
    let families = REGISTRY.gather();
    let mut buf = Vec::new();
    if encoder.encode(&families, &mut buf).is_err() || buf.is_empty() {
        buf.extend_from_slice(b"# no metrics\n");
    }
    buf
}

// Any path gets the metrics; headers are drained, not parsed.
async fn handle_client(mut stream: TcpStream) -> std::io::Result<()> {
    let mut req_buf = [0u8; 1024];
    let _ = stream.read(&mut req_buf).await?;

    let body = encode_metrics();
    let header = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain; version=0.0.4; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    stream.write_all(header.as_bytes()).await?;
    stream.write_all(&body).await?;
    stream.flush().await
}

/// Serves Prometheus text format on `0.0.0.0:port` until the process exits.
pub async fn serve_metrics(port: u16) {
    let addr = format!("0.0.0.0:{port}");
    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            warn!(%addr, error = %e, "metrics bind failed; metrics disabled");
            return;
        }
    };
    info!("metrics listening on http://{addr}/metrics");

    loop {
        match listener.accept().await {
            Ok((stream, _peer)) => {
                tokio::spawn(async move {
                    if let Err(e) = handle_client(stream).await {
                        warn!(error = %e, "metrics client error");
                    }
                });
            }
            Err(e) => warn!(error = %e, "metrics accept error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_registered_metrics() {
        init();
        init();
        POLLS.with_label_values(&["ok"]).inc();
        let text = String::from_utf8(encode_metrics()).unwrap();
        assert!(text.contains("order_watch_polls_total"));
        assert!(text.contains("order_watch_open_orders"));
    }
}
