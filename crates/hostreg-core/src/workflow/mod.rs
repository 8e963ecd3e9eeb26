// # Interaction Workflows
//
// Tracks which modal interaction is active. Exactly one workflow exists at a
// time; starting another while one is active is rejected, never overwritten.
//
// ```text
//            change endpoint                 set endpoint
//   Idle ───────────────────▶ SettingEndpoint ───────────▶ Idle
//
//            request delete                  confirm | cancel
//   Idle ───────────────────▶ ConfirmingDelete ──────────▶ Idle
//
//            request edit                    save | cancel
//   Idle ───────────────────▶ Editing ───────────────────▶ Idle
// ```
//
// Endpoint entry has no cancel path: the client cannot do anything useful
// until an endpoint is set.

use crate::error::{Error, Result};
use crate::traits::HostRecord;
use crate::traits::host_transport::non_empty;

/// The active workflow
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkflowState {
    /// No workflow active
    #[default]
    Idle,
    /// Waiting for the user to enter an endpoint address
    SettingEndpoint,
    /// Waiting for the user to confirm deleting `target`
    ConfirmingDelete {
        /// Record to delete
        target: HostRecord,
    },
    /// Editing a copy of `target`
    Editing {
        /// Record as it was when editing started
        target: HostRecord,
        /// Working copy
        draft: HostRecord,
    },
}

impl WorkflowState {
    /// Short name used in logs and error messages
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::SettingEndpoint => "endpoint entry",
            WorkflowState::ConfirmingDelete { .. } => "delete confirmation",
            WorkflowState::Editing { .. } => "host editing",
        }
    }

    /// Check if no workflow is active
    pub fn is_idle(&self) -> bool {
        matches!(self, WorkflowState::Idle)
    }
}

/// Changes to apply to an edit draft
///
/// `None` leaves a field as it is. An empty `ip` clears the IP.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftEdit {
    /// New hostname
    pub hostname: Option<String>,
    /// New IP address
    pub ip: Option<String>,
}

impl DraftEdit {
    /// Change the hostname
    pub fn hostname(value: impl Into<String>) -> Self {
        Self {
            hostname: Some(value.into()),
            ip: None,
        }
    }

    /// Change the IP address
    pub fn ip(value: impl Into<String>) -> Self {
        Self {
            hostname: None,
            ip: Some(value.into()),
        }
    }
}

/// Workflow state machine
#[derive(Debug, Default)]
pub struct Workflow {
    state: WorkflowState,
}

impl Workflow {
    /// Create an idle workflow
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a workflow that starts in endpoint entry
    ///
    /// Used at startup when no endpoint is configured.
    pub fn awaiting_endpoint() -> Self {
        Self {
            state: WorkflowState::SettingEndpoint,
        }
    }

    /// The active workflow
    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Open endpoint entry
    ///
    /// Ignored if endpoint entry is already active.
    pub fn begin_endpoint_entry(&mut self) -> Result<()> {
        match self.state {
            WorkflowState::Idle | WorkflowState::SettingEndpoint => {
                self.state = WorkflowState::SettingEndpoint;
                Ok(())
            }
            _ => Err(self.conflict("change the endpoint")),
        }
    }

    /// Check that an endpoint may be committed now
    pub fn check_endpoint_commit(&self) -> Result<()> {
        match self.state {
            WorkflowState::Idle | WorkflowState::SettingEndpoint => Ok(()),
            _ => Err(self.conflict("set the endpoint")),
        }
    }

    /// Close endpoint entry after the endpoint was committed
    pub fn finish_endpoint_entry(&mut self) -> Result<()> {
        self.check_endpoint_commit()?;
        self.state = WorkflowState::Idle;
        Ok(())
    }

    /// Ask the user to confirm deleting `target`
    pub fn begin_delete(&mut self, target: HostRecord) -> Result<()> {
        if !self.state.is_idle() {
            return Err(self.conflict("delete a host"));
        }
        self.state = WorkflowState::ConfirmingDelete { target };
        Ok(())
    }

    /// Commit the delete confirmation, returning the record to delete
    pub fn confirm_delete(&mut self) -> Result<HostRecord> {
        match std::mem::take(&mut self.state) {
            WorkflowState::ConfirmingDelete { target } => Ok(target),
            other => {
                self.state = other;
                Err(self.conflict("confirm a delete"))
            }
        }
    }

    /// Dismiss the delete confirmation
    pub fn cancel_delete(&mut self) -> Result<()> {
        match self.state {
            WorkflowState::ConfirmingDelete { .. } => {
                self.state = WorkflowState::Idle;
                Ok(())
            }
            _ => Err(self.conflict("cancel a delete")),
        }
    }

    /// Start editing a copy of `target`
    pub fn begin_edit(&mut self, target: HostRecord) -> Result<()> {
        if !self.state.is_idle() {
            return Err(self.conflict("edit a host"));
        }
        let draft = target.clone();
        self.state = WorkflowState::Editing { target, draft };
        Ok(())
    }

    /// Apply changes to the edit draft
    ///
    /// The MAC address is never part of a draft change.
    pub fn update_draft(&mut self, edit: DraftEdit) -> Result<()> {
        match &mut self.state {
            WorkflowState::Editing { draft, .. } => {
                if let Some(hostname) = edit.hostname {
                    draft.hostname = hostname.trim().to_string();
                }
                if let Some(ip) = edit.ip {
                    draft.ip = non_empty(Some(&ip));
                }
                Ok(())
            }
            _ => Err(self.conflict("change a draft")),
        }
    }

    /// The record being edited and its draft
    pub fn editing(&self) -> Option<(&HostRecord, &HostRecord)> {
        match &self.state {
            WorkflowState::Editing { target, draft } => Some((target, draft)),
            _ => None,
        }
    }

    /// Commit the edit, returning `(target, draft)`
    ///
    /// The draft must have a hostname; otherwise the edit stays open.
    pub fn save_edit(&mut self) -> Result<(HostRecord, HostRecord)> {
        match self.editing() {
            Some((_, draft)) if draft.hostname.is_empty() => {
                return Err(Error::validation("Hostname is required"));
            }
            Some(_) => {}
            None => return Err(self.conflict("save an edit")),
        }

        match std::mem::take(&mut self.state) {
            WorkflowState::Editing { target, draft } => Ok((target, draft)),
            other => {
                self.state = other;
                Err(self.conflict("save an edit"))
            }
        }
    }

    /// Discard the edit
    pub fn cancel_edit(&mut self) -> Result<()> {
        match self.state {
            WorkflowState::Editing { .. } => {
                self.state = WorkflowState::Idle;
                Ok(())
            }
            _ => Err(self.conflict("cancel an edit")),
        }
    }

    fn conflict(&self, requested: &'static str) -> Error {
        Error::Workflow {
            active: self.state.name(),
            requested,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> HostRecord {
        HostRecord::new("aa:bb", "h1", Some("1.2.3.4".into()))
    }

    #[test]
    fn test_endpoint_entry_round_trip() {
        let mut workflow = Workflow::awaiting_endpoint();
        assert_eq!(workflow.state(), &WorkflowState::SettingEndpoint);

        // Re-opening the active workflow is ignored
        workflow.begin_endpoint_entry().unwrap();
        workflow.finish_endpoint_entry().unwrap();
        assert!(workflow.state().is_idle());
    }

    #[test]
    fn test_endpoint_entry_blocks_other_workflows() {
        let mut workflow = Workflow::awaiting_endpoint();
        assert!(workflow.begin_delete(record()).is_err());
        assert!(workflow.begin_edit(record()).is_err());
        assert_eq!(workflow.state(), &WorkflowState::SettingEndpoint);
    }

    #[test]
    fn test_delete_confirm_and_cancel() {
        let mut workflow = Workflow::new();
        workflow.begin_delete(record()).unwrap();
        assert_eq!(workflow.confirm_delete().unwrap(), record());
        assert!(workflow.state().is_idle());

        workflow.begin_delete(record()).unwrap();
        workflow.cancel_delete().unwrap();
        assert!(workflow.state().is_idle());

        assert!(matches!(
            workflow.confirm_delete(),
            Err(Error::Workflow { active: "idle", .. })
        ));
    }

    #[test]
    fn test_edit_rejected_while_confirming_delete() {
        let mut workflow = Workflow::new();
        workflow.begin_delete(record()).unwrap();

        let err = workflow.begin_edit(record()).unwrap_err();
        assert_eq!(
            err,
            Error::Workflow {
                active: "delete confirmation",
                requested: "edit a host",
            }
        );
        assert!(matches!(
            workflow.state(),
            WorkflowState::ConfirmingDelete { .. }
        ));
    }

    #[test]
    fn test_draft_updates_never_touch_target() {
        let mut workflow = Workflow::new();
        workflow.begin_edit(record()).unwrap();
        workflow.update_draft(DraftEdit::hostname(" h2 ")).unwrap();
        workflow.update_draft(DraftEdit::ip("")).unwrap();

        let (target, draft) = workflow.editing().unwrap();
        assert_eq!(target, &record());
        assert_eq!(draft.mac, "aa:bb");
        assert_eq!(draft.hostname, "h2");
        assert_eq!(draft.ip, None);
    }

    #[test]
    fn test_save_with_empty_hostname_keeps_editing() {
        let mut workflow = Workflow::new();
        workflow.begin_edit(record()).unwrap();
        workflow.update_draft(DraftEdit::hostname("")).unwrap();

        assert!(matches!(workflow.save_edit(), Err(Error::Validation(_))));
        assert!(workflow.editing().is_some());

        workflow.update_draft(DraftEdit::hostname("h3")).unwrap();
        let (_, draft) = workflow.save_edit().unwrap();
        assert_eq!(draft.hostname, "h3");
        assert!(workflow.state().is_idle());
    }

    #[test]
    fn test_cancel_wrong_workflow_is_rejected() {
        let mut workflow = Workflow::new();
        workflow.begin_edit(record()).unwrap();
        assert!(workflow.cancel_delete().is_err());
        workflow.cancel_edit().unwrap();
        assert!(workflow.state().is_idle());
    }
}
