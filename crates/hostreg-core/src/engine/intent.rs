// User intents forwarded by the presentation layer.
//
// Each variant maps to exactly one engine operation; see
// `RegistryEngine::dispatch`.

use crate::workflow::DraftEdit;

/// Something the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Open endpoint entry
    ChangeEndpoint,
    /// Commit an endpoint address
    SetEndpoint(String),
    /// Reload the host list
    Refresh,
    /// Create a host
    RequestAdd {
        /// MAC address
        mac: String,
        /// Hostname
        hostname: String,
        /// Optional IP address
        ip: Option<String>,
    },
    /// Ask to delete the host with this MAC
    RequestDelete(String),
    /// Confirm the pending delete
    ConfirmDelete,
    /// Dismiss the pending delete
    CancelDelete,
    /// Start editing the host with this MAC
    RequestEdit(String),
    /// Change the edit draft
    UpdateDraft(DraftEdit),
    /// Save the edit draft
    SaveEdit,
    /// Discard the edit draft
    CancelEdit,
}

impl Intent {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Intent::ChangeEndpoint => "change_endpoint",
            Intent::SetEndpoint(_) => "set_endpoint",
            Intent::Refresh => "refresh",
            Intent::RequestAdd { .. } => "request_add",
            Intent::RequestDelete(_) => "request_delete",
            Intent::ConfirmDelete => "confirm_delete",
            Intent::CancelDelete => "cancel_delete",
            Intent::RequestEdit(_) => "request_edit",
            Intent::UpdateDraft(_) => "update_draft",
            Intent::SaveEdit => "save_edit",
            Intent::CancelEdit => "cancel_edit",
        }
    }
}
