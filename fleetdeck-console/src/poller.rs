//! Global status tick.
//!
//! Root of the polling tree: every period one snapshot request is issued,
//! reconciled into the fleet view, and fanned out to the stats fetcher and
//! the inline pacer for each running server. A failed poll is logged and
//! skipped; the next tick is the retry. The refresh channel lets the
//! command dispatcher force an early out-of-band poll after a lifecycle
//! command.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, warn};

use crate::liveview::LivePacer;
use crate::state::SharedFleet;
use crate::stats::spawn_stats_refresh;
use crate::sync::reconcile;
use crate::transport::ControlApi;

/// Sender half handed to the command dispatcher.
pub type RefreshSender = mpsc::Sender<()>;

pub fn refresh_channel() -> (RefreshSender, mpsc::Receiver<()>) {
    mpsc::channel(8)
}

pub fn spawn_status_poller(
    api: Arc<dyn ControlApi>,
    fleet: SharedFleet,
    pacer: LivePacer,
    period: Duration,
    mut refresh_rx: mpsc::Receiver<()>,
) {
    tokio::spawn(async move {
        // first tick fires immediately, so the view fills right after boot
        let mut ticker = interval(period);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    poll_once(&api, &fleet, &pacer).await;
                }
                Some(()) = refresh_rx.recv() => {
                    debug!("out-of-band status refresh");
                    poll_once(&api, &fleet, &pacer).await;
                }
            }
        }
    });
}

/// One full poll: snapshot, reconcile, then fan out to stats and inline
/// refresh for every running server. Reconciliation completes before any
/// fan-out fires.
pub async fn poll_once(api: &Arc<dyn ControlApi>, fleet: &SharedFleet, pacer: &LivePacer) {
    let snapshot = match api.fleet_snapshot().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("fleet snapshot failed: {e}");
            return;
        }
    };

    reconcile(&mut fleet.lock(), &snapshot);

    for row in snapshot.iter().filter(|r| r.status.is_running()) {
        spawn_stats_refresh(api.clone(), fleet.clone(), row.id.clone());
        pacer.refresh_inline(&row.id, &row.name);
    }
}
