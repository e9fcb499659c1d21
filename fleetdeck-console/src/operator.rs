//! Line-oriented operator surface.
//!
//! This is a rendering surface over the view-model: `render_fleet` and
//! friends are pure projections of `FleetView`, and every mutation goes
//! through the command dispatcher. Closing the expanded view is bound to
//! the `close` command (the terminal stand-in for the escape gesture).

use std::io::{self, Write};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::{CommandDispatcher, ConfirmGate};
use crate::state::{FleetView, SharedFleet};
use crate::transport::LifecycleAction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    Help,
    Status,
    Console { id: String },
    Start { name: String },
    Stop { name: String },
    Restart { name: String },
    Type { id: String, text: String },
    Exec { id: String, command: String },
    Shell { id: String, line: String },
    View { id: String },
    Close,
    Quit,
}

/// Parse one operator line. Injection text may be empty (`type 1` sends an
/// empty keystroke batch); exec and shell require a non-empty remainder.
pub fn parse_line(line: &str) -> Result<OperatorCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    let arg = |what: &str| -> Result<String, String> {
        if rest.is_empty() {
            Err(format!("usage: {word} <{what}>"))
        } else {
            Ok(rest.to_string())
        }
    };
    let id_and_rest = |require_rest: bool| -> Result<(String, String), String> {
        let (id, remainder) = match rest.split_once(char::is_whitespace) {
            Some((id, r)) => (id, r.trim()),
            None => (rest, ""),
        };
        if id.is_empty() || (require_rest && remainder.is_empty()) {
            return Err(format!("usage: {word} <id> <text>"));
        }
        Ok((id.to_string(), remainder.to_string()))
    };

    match word {
        "help" | "?" => Ok(OperatorCommand::Help),
        "status" | "ls" => Ok(OperatorCommand::Status),
        "console" => Ok(OperatorCommand::Console { id: arg("id")? }),
        "start" => Ok(OperatorCommand::Start { name: arg("name")? }),
        "stop" => Ok(OperatorCommand::Stop { name: arg("name")? }),
        "restart" => Ok(OperatorCommand::Restart { name: arg("name")? }),
        "type" => {
            let (id, text) = id_and_rest(false)?;
            Ok(OperatorCommand::Type { id, text })
        }
        "exec" => {
            let (id, command) = id_and_rest(true)?;
            Ok(OperatorCommand::Exec { id, command })
        }
        "shell" => {
            let (id, line) = id_and_rest(true)?;
            Ok(OperatorCommand::Shell { id, line })
        }
        "view" => Ok(OperatorCommand::View { id: arg("id")? }),
        "close" => Ok(OperatorCommand::Close),
        "quit" | "exit" => Ok(OperatorCommand::Quit),
        "" => Err("empty command, try 'help'".into()),
        other => Err(format!("unknown command '{other}', try 'help'")),
    }
}

pub fn help_text() -> &'static str {
    "commands:\n\
     \x20 status                 show the fleet\n\
     \x20 console <id>           show a server's console stream\n\
     \x20 start|stop|restart <name>\n\
     \x20 type <id> [text]       inject keystrokes\n\
     \x20 exec <id> <command>    run a command remotely\n\
     \x20 shell <id> <line>      feed the persistent shell session\n\
     \x20 view <id>              open the expanded live view\n\
     \x20 close                  close the expanded live view\n\
     \x20 quit"
}

/// Pure projection of the fleet for the terminal.
pub fn render_fleet(fleet: &FleetView) -> String {
    if fleet.servers.is_empty() {
        return "no servers configured".into();
    }
    let mut out = String::new();
    for server in fleet.servers.values() {
        let (label, _class) = server.badge();
        let frame = match &server.inline_frame.image {
            Some(image) => format!("{}b frame", image.len()),
            None => "no frame".into(),
        };
        out.push_str(&format!(
            "{:<4} {:<20} {:<15} [{:<7}] cpu {:>6} ram {:>6} disk {:>6} | {} | start:{} restart:{} stop:{}\n",
            server.id,
            server.display_name,
            server.ip,
            label,
            server.cpu.text(),
            server.ram.text(),
            server.disk.text(),
            frame,
            mark(server.controls.start),
            mark(server.controls.restart),
            mark(server.controls.stop),
        ));
    }
    if let Some(overlay) = &fleet.expanded {
        out.push_str(&format!("expanded view: {}\n", overlay.name));
    }
    out.trim_end().to_string()
}

fn mark(enabled: bool) -> char {
    if enabled {
        '+'
    } else {
        '-'
    }
}

/// y/N prompt on the controlling terminal, used as the restart gate.
pub struct TermConfirm;

impl ConfirmGate for TermConfirm {
    fn confirm(&self, action: LifecycleAction, name: &str) -> bool {
        print!("{action} '{name}'? Unsaved data may be lost. [y/N] ");
        let _ = io::stdout().flush();
        let mut answer = String::new();
        if io::stdin().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim(), "y" | "Y" | "yes")
    }
}

/// Read-eval loop over stdin. Returns when the operator quits or stdin
/// closes.
pub async fn run(dispatcher: CommandDispatcher, fleet: SharedFleet) {
    println!("{}", help_text());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_prompt();

    while let Ok(Some(line)) = lines.next_line().await {
        match parse_line(&line) {
            Ok(command) => {
                if !apply(&dispatcher, &fleet, command).await {
                    return;
                }
            }
            Err(msg) => println!("{msg}"),
        }
        print_prompt();
    }
}

fn print_prompt() {
    print!("fleetdeck> ");
    let _ = io::stdout().flush();
}

/// Apply one parsed command; false means quit.
async fn apply(
    dispatcher: &CommandDispatcher,
    fleet: &SharedFleet,
    command: OperatorCommand,
) -> bool {
    match command {
        OperatorCommand::Help => println!("{}", help_text()),
        OperatorCommand::Status => println!("{}", render_fleet(&fleet.lock())),
        OperatorCommand::Console { id } => {
            let text = fleet.lock().get(&id).map(|s| s.console.text.clone());
            match text {
                Some(text) if !text.is_empty() => println!("{text}"),
                Some(_) => println!("(no console output yet)"),
                None => println!("unknown server id '{id}'"),
            }
        }
        OperatorCommand::Start { name } => {
            if known_name(fleet, &name) {
                dispatcher.start(&name).await;
            } else {
                println!("unknown server name '{name}'");
            }
        }
        OperatorCommand::Stop { name } => {
            if known_name(fleet, &name) {
                dispatcher.stop(&name).await;
            } else {
                println!("unknown server name '{name}'");
            }
        }
        OperatorCommand::Restart { name } => {
            if known_name(fleet, &name) {
                dispatcher.restart(&name).await;
            } else {
                println!("unknown server name '{name}'");
            }
        }
        OperatorCommand::Type { id, text } => match resolve_name(fleet, &id) {
            Some(name) => {
                if let Some(server) = fleet.lock().get_mut(&id) {
                    server.inject_input = text;
                }
                dispatcher.inject(&id, &name).await;
            }
            None => println!("unknown server id '{id}'"),
        },
        OperatorCommand::Exec { id, command } => {
            if fleet.lock().get_mut(&id).map(|s| s.exec_input = command).is_none() {
                println!("unknown server id '{id}'");
            } else {
                dispatcher.exec(&id).await;
                let panel = fleet.lock().get(&id).and_then(|s| s.exec_panel.text().map(String::from));
                if let Some(text) = panel {
                    println!("{text}");
                }
            }
        }
        OperatorCommand::Shell { id, line } => dispatcher.shell_input(&id, &line).await,
        OperatorCommand::View { id } => match resolve_name(fleet, &id) {
            Some(name) => dispatcher.open_expanded(&id, &name),
            None => println!("unknown server id '{id}'"),
        },
        OperatorCommand::Close => dispatcher.close_expanded(),
        OperatorCommand::Quit => {
            println!("bye");
            return false;
        }
    }
    true
}

fn resolve_name(fleet: &SharedFleet, id: &str) -> Option<String> {
    fleet.lock().get(id).map(|s| s.name.clone())
}

fn known_name(fleet: &SharedFleet, name: &str) -> bool {
    fleet.lock().find_by_name(name).is_some()
}

// Arc<TermConfirm> is what main hands to the dispatcher.
pub fn term_gate() -> Arc<dyn ConfirmGate> {
    Arc::new(TermConfirm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fleet_commands() {
        assert_eq!(parse_line("status"), Ok(OperatorCommand::Status));
        assert_eq!(
            parse_line("start web-1"),
            Ok(OperatorCommand::Start { name: "web-1".into() })
        );
        assert_eq!(
            parse_line("exec 3 uptime -p"),
            Ok(OperatorCommand::Exec { id: "3".into(), command: "uptime -p".into() })
        );
    }

    #[test]
    fn type_allows_empty_text() {
        assert_eq!(
            parse_line("type 2"),
            Ok(OperatorCommand::Type { id: "2".into(), text: String::new() })
        );
    }

    #[test]
    fn exec_requires_a_command() {
        assert!(parse_line("exec 2").is_err());
        assert!(parse_line("exec").is_err());
    }

    #[test]
    fn unknown_words_are_rejected() {
        assert!(parse_line("reboot everything").is_err());
        assert!(parse_line("").is_err());
    }
}
