// Console command parsing.
//
// Turns one line of user input into an engine intent. What a bare word means
// can depend on the active workflow: `cancel` dismisses whichever dialog is
// open, and during endpoint entry any unrecognised line is taken as the
// address.

use hostreg_core::{DraftEdit, Intent, WorkflowState};

/// A parsed console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Forward to the engine
    Intent(Intent),
    /// Print the cached hosts
    Show,
    /// Print usage
    Help,
    /// Leave the client
    Quit,
}

/// Usage text printed by `help`
pub const USAGE: &str = "\
Commands:
  connect <address>             Point the client at the API on <address>
  endpoint                      Change the API address
  refresh                       Reload the host list from the server
  hosts                         Show the cached hosts
  add <mac> <hostname> [ip]     Add a host (the server may assign the IP)
  delete <mac>                  Delete a host (asks for confirmation)
  edit <mac>                    Edit a host
    hostname <name>             Change the hostname being edited
    ip [address]                Change (or clear) the IP being edited
    save                        Save the edit
  confirm                       Confirm the pending delete
  cancel                        Dismiss the open dialog
  help                          Show this text
  quit                          Leave the client";

/// Parse a console line
///
/// # Returns
///
/// - `Ok(None)`: Blank line
/// - `Ok(Some(Command))`: A recognised command
/// - `Err(String)`: What was wrong with the line
pub fn parse_command(line: &str, state: &WorkflowState) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let keyword = words.next().unwrap_or_default().to_lowercase();
    let args: Vec<&str> = words.collect();

    let command = match (keyword.as_str(), args.as_slice()) {
        ("connect", [address]) => Command::Intent(Intent::SetEndpoint(address.to_string())),
        ("connect", _) => return Err("usage: connect <address>".into()),
        ("endpoint", []) => Command::Intent(Intent::ChangeEndpoint),
        ("endpoint", [address]) => Command::Intent(Intent::SetEndpoint(address.to_string())),
        ("refresh" | "reload", []) => Command::Intent(Intent::Refresh),
        ("hosts" | "list" | "ls", []) => Command::Show,
        ("add", [mac, hostname]) => Command::Intent(Intent::RequestAdd {
            mac: mac.to_string(),
            hostname: hostname.to_string(),
            ip: None,
        }),
        ("add", [mac, hostname, ip]) => Command::Intent(Intent::RequestAdd {
            mac: mac.to_string(),
            hostname: hostname.to_string(),
            ip: Some(ip.to_string()),
        }),
        ("add", _) => return Err("usage: add <mac> <hostname> [ip]".into()),
        ("delete" | "rm", [mac]) => Command::Intent(Intent::RequestDelete(mac.to_string())),
        ("delete" | "rm", _) => return Err("usage: delete <mac>".into()),
        ("confirm" | "yes" | "y", []) => Command::Intent(Intent::ConfirmDelete),
        ("edit", [mac]) => Command::Intent(Intent::RequestEdit(mac.to_string())),
        ("edit", _) => return Err("usage: edit <mac>".into()),
        ("hostname", [name]) => Command::Intent(Intent::UpdateDraft(DraftEdit::hostname(*name))),
        ("hostname", _) => return Err("usage: hostname <name>".into()),
        ("ip", []) => Command::Intent(Intent::UpdateDraft(DraftEdit::ip(""))),
        ("ip", [ip]) => Command::Intent(Intent::UpdateDraft(DraftEdit::ip(*ip))),
        ("save", []) => Command::Intent(Intent::SaveEdit),
        ("cancel" | "no" | "n", []) => match state {
            WorkflowState::ConfirmingDelete { .. } => Command::Intent(Intent::CancelDelete),
            _ => Command::Intent(Intent::CancelEdit),
        },
        ("help" | "?", _) => Command::Help,
        ("quit" | "exit", []) => Command::Quit,
        _ if *state == WorkflowState::SettingEndpoint && args.is_empty() => {
            Command::Intent(Intent::SetEndpoint(line.to_string()))
        }
        _ => return Err(format!("unknown command: {} (type 'help')", line)),
    };

    Ok(Some(command))
}
