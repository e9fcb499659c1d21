//! Per-server utilization refresh, one fetch per running server per
//! status tick.

use std::sync::Arc;
use tracing::debug;

use crate::models::StatsPayload;
use crate::state::SharedFleet;
use crate::transport::ControlApi;

/// Fire one stats request for `id` in the background. Failures and
/// unusable payloads leave the gauges exactly as they were; zeroing on
/// stop is the synchronizer's job.
pub fn spawn_stats_refresh(api: Arc<dyn ControlApi>, fleet: SharedFleet, id: String) {
    tokio::spawn(async move {
        match api.stats(&id).await {
            Ok(payload) => apply_stats(&fleet, &id, &payload),
            Err(e) => debug!(id = %id, "stats fetch failed: {e}"),
        }
    });
}

pub fn apply_stats(fleet: &SharedFleet, id: &str, payload: &StatsPayload) {
    let Some((cpu, ram, disk)) = payload.reading() else {
        if let Some(error) = &payload.error {
            debug!(id = %id, "stats reported error: {error}");
        }
        return;
    };

    let mut fleet = fleet.lock();
    if let Some(server) = fleet.get_mut(id) {
        server.cpu.set(cpu);
        server.ram.set(ram);
        server.disk.set(disk);
    }
}
