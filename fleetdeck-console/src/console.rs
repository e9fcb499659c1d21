//! Console output polling.
//!
//! Every second, each running server's pending console output is fetched
//! and appended to its buffer. Fetches are spawned per server so one slow
//! or hung request never stalls the tick or any other server's stream.
//! Failures are silent; the buffer is append-only and survives restarts of
//! the server it belongs to.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::trace;

use crate::state::SharedFleet;
use crate::transport::ControlApi;

pub fn spawn_console_poller(api: Arc<dyn ControlApi>, fleet: SharedFleet, period: Duration) {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        loop {
            ticker.tick().await;
            let running = fleet.lock().running();
            for (id, _name) in running {
                let api = api.clone();
                let fleet = fleet.clone();
                tokio::spawn(async move {
                    match api.console_output(&id).await {
                        Ok(Some(chunk)) if !chunk.is_empty() => {
                            append_output(&fleet, &id, &chunk);
                        }
                        Ok(_) => {}
                        Err(e) => trace!(id = %id, "console fetch failed: {e}"),
                    }
                });
            }
        }
    });
}

pub fn append_output(fleet: &SharedFleet, id: &str, chunk: &str) {
    let mut fleet = fleet.lock();
    if let Some(server) = fleet.get_mut(id) {
        server.console.append(chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ServerInfo;
    use crate::state::{new_state, FleetView};
    use crate::view::ServerView;

    #[test]
    fn output_is_appended_never_replaced() {
        let mut fleet = FleetView::default();
        fleet.servers.insert(
            "1".into(),
            ServerView::new(ServerInfo {
                id: "1".into(),
                name: "srv-1".into(),
                display_name: "Server 1".into(),
                ip: "10.0.0.1".into(),
            }),
        );
        let fleet = new_state(fleet);

        append_output(&fleet, "1", "boot ok\n");
        append_output(&fleet, "1", "ready\n");

        let fleet = fleet.lock();
        let console = &fleet.get("1").unwrap().console;
        assert_eq!(console.text, "boot ok\nready\n");
        assert_eq!(console.revision, 2);
    }
}
