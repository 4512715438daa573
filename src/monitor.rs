// ===============================
// src/monitor.rs
// ===============================
//
// One poll = fetch openOrders -> summarize -> desktop notification.
// Fetch and notify failures are logged and never stop the schedule.
//
use chrono::Utc;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task::block_in_place;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

use crate::client::OpenOrdersSource;
use crate::metrics::{LAST_POLL_TS, NOTIFY_ERRORS, OPEN_ORDERS, POLLS};
use crate::notifier::{Notice, Notifier, NotifyError, OrdersSummary};
use crate::scheduler::run_every;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Notified(OrdersSummary),
    NotifyFailed(OrdersSummary),
    FetchFailed,
}

pub struct Monitor<S, N> {
    source: S,
    notifier: N,
    symbol: String,
}

impl<S, N> Monitor<S, N>
where
    S: OpenOrdersSource,
    N: Notifier,
{
    pub fn new(source: S, notifier: N, symbol: impl Into<String>) -> Self {
        Self {
            source,
            notifier,
            symbol: symbol.into(),
        }
    }

    pub async fn poll_once(&self) -> PollOutcome {
        info!(symbol = %self.symbol, "requesting open orders");

        let orders = match self.source.open_orders().await {
            Ok(o) => o,
            Err(e) => {
                POLLS.with_label_values(&["error"]).inc();
                error!(symbol = %self.symbol, error = %e, "open orders request failed");
                return PollOutcome::FetchFailed;
            }
        };

        for o in &orders {
            debug!(
                symbol = %o.symbol,
                order_id = o.order_id,
                client_order_id = %o.client_order_id,
                side = %o.side,
                order_type = %o.order_type,
                price = %o.price,
                orig_qty = %o.orig_qty,
                executed_qty = %o.executed_qty,
                status = %o.status,
                time = o.time,
                "open order"
            );
        }

        let summary = OrdersSummary::from_orders(&orders);
        POLLS.with_label_values(&["ok"]).inc();
        OPEN_ORDERS.set(summary.count() as i64);
        LAST_POLL_TS.set(Utc::now().timestamp());
        info!(symbol = %self.symbol, count = summary.count(), "open orders");

        let notice = summary.notice();
        match self.show(&notice) {
            Ok(()) => PollOutcome::Notified(summary),
            Err(e) => {
                NOTIFY_ERRORS.inc();
                warn!(error = %e, title = %notice.title, "notification not shown");
                PollOutcome::NotifyFailed(summary)
            }
        }
    }

    // Desktop backends block (D-Bus round trip on Linux); keep them off the async
    // workers when the runtime can hand the worker's queue to another thread.
    fn show(&self, notice: &Notice) -> Result<(), NotifyError> {
        match Handle::try_current() {
            Ok(h) if h.runtime_flavor() == RuntimeFlavor::MultiThread => {
                block_in_place(|| self.notifier.notify(notice))
            }
            _ => self.notifier.notify(notice),
        }
    }

    /// Polls now and then every `period` until the process exits.
    pub async fn run(&self, period: Duration) {
        info!(symbol = %self.symbol, period_secs = period.as_secs(), "monitoring open orders");
        run_every(period, move || async move {
            self.poll_once().await;
        })
        .await;
    }
}
