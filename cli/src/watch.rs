//! In-session price watcher.
//!
//! Polls on a fixed cadence while the process runs; there is no background
//! execution once it exits.

use std::future::Future;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{Instrument, error, info};

use alerts::TriggeredAlert;
use common::logger::{TraceId, root_span};

use crate::app::App;

/// Runs `App::poll_once` every `poll_every` until `shutdown` resolves.
/// `on_fired` sees every alert fired by a tick.
pub async fn run_watch<S, F>(app: &App, poll_every: Duration, shutdown: S, mut on_fired: F)
where
    S: Future<Output = ()>,
    F: FnMut(&TriggeredAlert),
{
    let mut ticker = interval(poll_every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    info!(every_ms = poll_every.as_millis() as u64, "price watcher started");

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }

        let trace_id = TraceId::default();
        match app.poll_once().instrument(root_span("watch_tick", &trace_id)).await {
            Ok(fired) => fired.iter().for_each(&mut on_fired),
            Err(e) => error!(error = ?e, "watch tick failed"),
        }
    }

    info!("price watcher stopped");
}
