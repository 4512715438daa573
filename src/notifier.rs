// ===============================
// src/notifier.rs
// ===============================
use notify_rust::Notification;
use thiserror::Error;

use crate::binance::OpenOrder;

const APP_NAME: &str = "order_watch";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrdersSummary {
    Pending { count: usize },
    NoneScheduled,
}

impl OrdersSummary {
    pub fn from_orders(orders: &[OpenOrder]) -> Self {
        match orders.len() {
            0 => OrdersSummary::NoneScheduled,
            count => OrdersSummary::Pending { count },
        }
    }

    pub fn count(&self) -> usize {
        match self {
            OrdersSummary::Pending { count } => *count,
            OrdersSummary::NoneScheduled => 0,
        }
    }

    pub fn notice(&self) -> Notice {
        match self {
            OrdersSummary::Pending { count: 1 } => Notice {
                title: "Pending transactions".into(),
                body: "There is 1 pending transaction.".into(),
            },
            OrdersSummary::Pending { count } => Notice {
                title: "Pending transactions".into(),
                body: format!("There are {count} pending transactions."),
            },
            OrdersSummary::NoneScheduled => Notice {
                title: "No scheduled transactions".into(),
                body: "There are no scheduled transactions.".into(),
            },
        }
    }
}

/// Text of one desktop notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub body: String,
}

/// Platform backends report very different error types; only the message is kept.
#[derive(Debug, Error)]
#[error("desktop notification failed: {0}")]
pub struct NotifyError(pub String);

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice) -> Result<(), NotifyError>;
}

/// Native OS notification (D-Bus on Linux/BSD, Notification Center on macOS, toast on Windows).
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, notice: &Notice) -> Result<(), NotifyError> {
        Notification::new()
            .appname(APP_NAME)
            .summary(&notice.title)
            .body(&notice.body)
            .show()
            .map_err(|e| NotifyError(e.to_string()))?;
        Ok(())
    }
}
