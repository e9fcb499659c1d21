//! Snapshot reconciliation.
//!
//! `reconcile` is the only writer of status and control gating, and the
//! only place gauges are zeroed. It is a pure function of (previous view,
//! snapshot) and idempotent: applying the same snapshot twice leaves the
//! view bit-for-bit identical.

use tracing::debug;

use crate::models::{ServerInfo, ServerState};
use crate::state::FleetView;
use crate::view::{ControlGating, ServerView};

/// Seed the fleet from the configured roster. Every server starts in
/// `Unknown` status until the first snapshot lands.
pub fn bootstrap(fleet: &mut FleetView, roster: Vec<ServerInfo>) {
    for info in roster {
        let id = info.id.clone();
        fleet.servers.insert(id, ServerView::new(info));
    }
}

/// Fold one fleet snapshot into the view.
///
/// Rows for ids that were never in the roster are skipped: servers are
/// created at config load only. Servers missing from the snapshot keep
/// their last-known state - there is no removal path.
pub fn reconcile(fleet: &mut FleetView, snapshot: &[ServerState]) {
    for row in snapshot {
        let Some(server) = fleet.servers.get_mut(&row.id) else {
            debug!(id = %row.id, "snapshot row for unconfigured server, skipping");
            continue;
        };

        server.status = row.status;
        server.controls = ControlGating::for_status(row.status);
        if !row.status.is_running() {
            server.zero_gauges();
        }
    }
}
