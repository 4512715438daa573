// ===============================
// src/scheduler.rs
// ===============================
use std::future::Future;

use tokio::time::{interval, Duration, MissedTickBehavior};

/// Runs `action` now and then every `period`, forever.
///
/// Single-flight: the action is awaited before the next tick is taken, so
/// two runs never overlap. Ticks that fall inside a slow run are skipped
/// rather than queued up and fired back to back.
pub async fn run_every<F, Fut>(period: Duration, mut action: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut tick = interval(period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tick.tick().await;
        action().await;
    }
}
