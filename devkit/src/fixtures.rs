/*!
Canned fleet payloads for tests, shaped like the control API emits them.
*/

use fleetdeck_console::models::{ServerInfo, ServerState, ServerStatus, StatsPayload};

pub fn server_info(id: &str) -> ServerInfo {
    ServerInfo {
        id: id.to_string(),
        name: format!("srv-{id}"),
        display_name: format!("Server {id}"),
        ip: format!("10.0.0.{id}"),
    }
}

pub fn roster(ids: &[&str]) -> Vec<ServerInfo> {
    ids.iter().map(|id| server_info(id)).collect()
}

pub fn snapshot_row(id: &str, status: ServerStatus) -> ServerState {
    let info = server_info(id);
    ServerState {
        id: info.id,
        name: info.name,
        display_name: info.display_name,
        ip: info.ip,
        status,
    }
}

pub fn stats(cpu: f32, ram: f32, disk: f32) -> StatsPayload {
    StatsPayload { cpu: Some(cpu), ram: Some(ram), disk: Some(disk), error: None }
}

pub fn stats_error(message: &str) -> StatsPayload {
    StatsPayload { error: Some(message.to_string()), ..StatsPayload::default() }
}
