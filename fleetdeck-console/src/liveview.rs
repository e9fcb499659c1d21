//! Live-frame pacing.
//!
//! One cancellable session per (server, surface) pair. The inline surface
//! is refreshed once per status tick; the expanded surface runs its own
//! self-paced loop: fetch, swap on success, then wait 200ms (500ms after a
//! failure) before the next fetch, so the request rate stays bounded even
//! against a slow or erroring backend. A session loop issues exactly one
//! fetch at a time and checks its cancellation flag at every resumption
//! point; cancelling never aborts the in-flight request, it only makes the
//! resolution a no-op.

use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::state::{new_state, ExpandedOverlay, Shared, SharedFleet};
use crate::transport::ControlApi;

const FRAME_DELAY: Duration = Duration::from_millis(200);
const RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    Inline,
    Expanded,
}

/// Handle for one live-image loop. Cancelled when its view closes or a
/// newer session replaces it.
#[derive(Debug)]
pub struct LiveSession {
    active: AtomicBool,
    backoff: Mutex<Duration>,
}

impl LiveSession {
    fn new(initial_backoff: Duration) -> Self {
        Self {
            active: AtomicBool::new(true),
            backoff: Mutex::new(initial_backoff),
        }
    }

    pub fn cancel(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Delay before the loop's next fetch (200ms after a successful load,
    /// 500ms after a failed one).
    pub fn backoff(&self) -> Duration {
        *self.backoff.lock()
    }

    fn set_backoff(&self, delay: Duration) {
        *self.backoff.lock() = delay;
    }
}

/// Cache-busting token for a frame request.
fn fresh_token() -> i64 {
    Utc::now().timestamp_millis()
}

#[derive(Clone)]
pub struct LivePacer {
    api: Arc<dyn ControlApi>,
    fleet: SharedFleet,
    sessions: Shared<HashMap<(String, Surface), Arc<LiveSession>>>,
    frame_delay: Duration,
    retry_delay: Duration,
}

impl LivePacer {
    pub fn new(api: Arc<dyn ControlApi>, fleet: SharedFleet) -> Self {
        Self {
            api,
            fleet,
            sessions: new_state(HashMap::new()),
            frame_delay: FRAME_DELAY,
            retry_delay: RETRY_DELAY,
        }
    }

    /// Open a session for (server, surface), cancelling any session already
    /// registered for the same pair. For the expanded surface this also
    /// starts the self-paced loop and publishes the overlay record.
    pub fn open(&self, id: &str, name: &str, surface: Surface) -> Arc<LiveSession> {
        // only one expanded overlay exists; switching servers retires the
        // previous server's expanded session first
        if surface == Surface::Expanded {
            let stale = {
                let fleet = self.fleet.lock();
                fleet.expanded.as_ref().filter(|o| o.id != id).map(|o| o.id.clone())
            };
            if let Some(previous_id) = stale {
                self.close(&previous_id, Surface::Expanded);
            }
        }

        let session = Arc::new(LiveSession::new(self.frame_delay));
        let key = (id.to_string(), surface);
        if let Some(previous) = self.sessions.lock().insert(key, session.clone()) {
            previous.cancel();
        }

        if surface == Surface::Expanded {
            {
                let mut fleet = self.fleet.lock();
                fleet.expanded =
                    Some(ExpandedOverlay { id: id.to_string(), name: name.to_string() });
                if let Some(server) = fleet.get_mut(id) {
                    server.inject_input.clear();
                }
            }
            let pacer = self.clone();
            let (id, name, session) = (id.to_string(), name.to_string(), session.clone());
            tokio::spawn(async move {
                pacer.run_expanded(&id, &name, session).await;
            });
        }

        session
    }

    /// Close the session for (server, surface); its in-flight fetch, if
    /// any, resolves into nothing.
    pub fn close(&self, id: &str, surface: Surface) {
        if let Some(session) = self.sessions.lock().remove(&(id.to_string(), surface)) {
            session.cancel();
        }
        if surface == Surface::Expanded {
            let mut fleet = self.fleet.lock();
            if fleet.expanded.as_ref().is_some_and(|o| o.id == id) {
                fleet.expanded = None;
            }
        }
    }

    pub fn active_session(&self, id: &str, surface: Surface) -> Option<Arc<LiveSession>> {
        self.sessions.lock().get(&(id.to_string(), surface)).cloned()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    /// One inline refresh, driven by the status tick. The fetch runs in the
    /// background; a load still in flight when the next tick fires simply
    /// overlaps it and the last completed load wins.
    pub fn refresh_inline(&self, id: &str, name: &str) {
        let Some(session) = self.active_session(id, Surface::Inline) else {
            return;
        };
        let pacer = self.clone();
        let (id, name) = (id.to_string(), name.to_string());
        tokio::spawn(async move {
            let token = fresh_token();
            match pacer.api.screenshot(&name, token).await {
                Ok(image) if session.is_active() => {
                    pacer.swap_frame(&id, Surface::Inline, image, token);
                }
                Ok(_) => {}
                Err(e) => debug!(server = %name, "inline frame fetch failed: {e}"),
            }
        });
    }

    async fn run_expanded(&self, id: &str, name: &str, session: Arc<LiveSession>) {
        loop {
            if !session.is_active() {
                return;
            }
            let token = fresh_token();
            match self.api.screenshot(name, token).await {
                Ok(image) => {
                    if !session.is_active() {
                        return;
                    }
                    self.swap_frame(id, Surface::Expanded, image, token);
                    session.set_backoff(self.frame_delay);
                }
                Err(e) => {
                    if !session.is_active() {
                        return;
                    }
                    debug!(server = %name, "expanded frame fetch failed: {e}");
                    session.set_backoff(self.retry_delay);
                }
            }
            tokio::time::sleep(session.backoff()).await;
        }
    }

    fn swap_frame(&self, id: &str, surface: Surface, image: Vec<u8>, token: i64) {
        let mut fleet = self.fleet.lock();
        if let Some(server) = fleet.get_mut(id) {
            let slot = match surface {
                Surface::Inline => &mut server.inline_frame,
                Surface::Expanded => &mut server.expanded_frame,
            };
            slot.swap(image, token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ServerInfo, ServerState, StatsPayload};
    use crate::state::FleetView;
    use crate::transport::{LifecycleAction, TransportError};
    use crate::view::ServerView;
    use async_trait::async_trait;

    struct NullApi;

    #[async_trait]
    impl ControlApi for NullApi {
        async fn fleet_config(&self) -> Result<Vec<ServerInfo>, TransportError> {
            Ok(vec![])
        }
        async fn fleet_snapshot(&self) -> Result<Vec<ServerState>, TransportError> {
            Ok(vec![])
        }
        async fn stats(&self, _id: &str) -> Result<StatsPayload, TransportError> {
            Ok(StatsPayload::default())
        }
        async fn screenshot(&self, _name: &str, _token: i64) -> Result<Vec<u8>, TransportError> {
            Ok(vec![0u8; 4])
        }
        async fn console_output(&self, _id: &str) -> Result<Option<String>, TransportError> {
            Ok(None)
        }
        async fn lifecycle(
            &self,
            _name: &str,
            _action: LifecycleAction,
        ) -> Result<(), TransportError> {
            Ok(())
        }
        async fn inject_text(&self, _name: &str, _text: &str) -> Result<(), TransportError> {
            Ok(())
        }
        async fn shell_input(&self, _id: &str, _line: &str) -> Result<(), TransportError> {
            Ok(())
        }
        async fn exec(&self, _id: &str, _command: &str) -> Result<String, TransportError> {
            Ok(String::new())
        }
    }

    fn pacer() -> LivePacer {
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
        LivePacer::new(Arc::new(NullApi), new_state(fleet))
    }

    #[tokio::test]
    async fn reopening_cancels_the_previous_session() {
        let pacer = pacer();
        let first = pacer.open("1", "srv-1", Surface::Inline);
        let second = pacer.open("1", "srv-1", Surface::Inline);

        assert!(!first.is_active());
        assert!(second.is_active());
        assert_eq!(pacer.session_count(), 1);
    }

    #[tokio::test]
    async fn surfaces_are_independent_sessions() {
        let pacer = pacer();
        let inline = pacer.open("1", "srv-1", Surface::Inline);
        let expanded = pacer.open("1", "srv-1", Surface::Expanded);

        assert!(inline.is_active());
        assert!(expanded.is_active());
        assert_eq!(pacer.session_count(), 2);
    }

    #[tokio::test]
    async fn close_cancels_and_clears_the_overlay() {
        let pacer = pacer();
        let session = pacer.open("1", "srv-1", Surface::Expanded);
        assert!(pacer.fleet.lock().expanded.is_some());

        pacer.close("1", Surface::Expanded);
        assert!(!session.is_active());
        assert!(pacer.fleet.lock().expanded.is_none());
        assert_eq!(pacer.session_count(), 0);
    }

    #[tokio::test]
    async fn inline_refresh_without_a_session_is_a_no_op() {
        let pacer = pacer();
        pacer.refresh_inline("1", "srv-1");
        tokio::task::yield_now().await;
        assert!(pacer.fleet.lock().get("1").unwrap().inline_frame.image.is_none());
    }
}
