//! Process-wide fleet state container.
//!
//! The `FleetView` is owned by the status poller / synchronizer pair; other
//! components reach it only through the accessors below and their own
//! narrow write paths. Lock scopes stay short: nothing holds the lock
//! across an await point.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::view::ServerView;

pub type Shared<T> = Arc<Mutex<T>>;

pub fn new_state<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

/// The expanded-overlay record: which server the fullscreen view shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedOverlay {
    pub id: String,
    pub name: String,
}

/// All per-server view records, keyed by server id. BTreeMap keeps the
/// roster order stable for rendering.
#[derive(Debug, Default)]
pub struct FleetView {
    pub servers: BTreeMap<String, ServerView>,
    pub expanded: Option<ExpandedOverlay>,
}

impl FleetView {
    pub fn get(&self, id: &str) -> Option<&ServerView> {
        self.servers.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ServerView> {
        self.servers.get_mut(id)
    }

    /// (id, name) pairs of every server currently reported running.
    pub fn running(&self) -> Vec<(String, String)> {
        self.servers
            .values()
            .filter(|s| s.status.is_running())
            .map(|s| (s.id.clone(), s.name.clone()))
            .collect()
    }

    /// Resolve a server by its internal name (lifecycle commands address
    /// servers by name, everything else by id).
    pub fn find_by_name(&self, name: &str) -> Option<&ServerView> {
        self.servers.values().find(|s| s.name == name)
    }
}

pub type SharedFleet = Shared<FleetView>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ServerInfo, ServerStatus};

    fn seed(fleet: &mut FleetView, id: &str, status: ServerStatus) {
        let mut view = ServerView::new(ServerInfo {
            id: id.into(),
            name: format!("srv-{id}"),
            display_name: format!("Server {id}"),
            ip: "10.0.0.1".into(),
        });
        view.status = status;
        fleet.servers.insert(id.into(), view);
    }

    #[test]
    fn running_lists_only_running_servers() {
        let mut fleet = FleetView::default();
        seed(&mut fleet, "1", ServerStatus::Running);
        seed(&mut fleet, "2", ServerStatus::Stopped);
        seed(&mut fleet, "3", ServerStatus::Running);

        let running = fleet.running();
        assert_eq!(running.len(), 2);
        assert!(running.iter().any(|(id, _)| id == "1"));
        assert!(running.iter().any(|(id, _)| id == "3"));
    }

    #[test]
    fn find_by_name_resolves_internal_names() {
        let mut fleet = FleetView::default();
        seed(&mut fleet, "7", ServerStatus::Unknown);
        assert_eq!(fleet.find_by_name("srv-7").map(|s| s.id.as_str()), Some("7"));
        assert!(fleet.find_by_name("srv-8").is_none());
    }
}
