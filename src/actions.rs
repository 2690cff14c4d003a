//! Bulk administrative actions over a set of groups.
//!
//! `ActionKind::ALL` is the registry offered to the operator. Each kind owns
//! its confirmation text, the parameters it asks for and the remote primitive
//! it maps to; the executor only dispatches on the kind.
use crate::error::ConsoleError;
use crate::input::{self, Console, DATE_TIME_FORMAT};
use crate::node::{Node, NodeId, NodeSet};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

mod executor;

pub use executor::{Executor, MAX_ACTION_WORKERS};

/// Bulk actions applicable to a selection of groups.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    RemoveMembers,
    RevokeUploads,
    GrantFileUpload,
    SetRegistrationPeriod,
    SetMaxMembers,
}

impl ActionKind {
    /// Actions offered to the operator, in menu order.
    pub const ALL: [ActionKind; 5] = [
        ActionKind::RemoveMembers,
        ActionKind::RevokeUploads,
        ActionKind::GrantFileUpload,
        ActionKind::SetRegistrationPeriod,
        ActionKind::SetMaxMembers,
    ];

    /// Stable identifier used in routes, logs and report file names.
    pub fn id(&self) -> &'static str {
        match self {
            ActionKind::RemoveMembers => "remove-members",
            ActionKind::RevokeUploads => "revoke-uploads",
            ActionKind::GrantFileUpload => "grant-file-upload",
            ActionKind::SetRegistrationPeriod => "set-registration-period",
            ActionKind::SetMaxMembers => "set-max-members",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ActionKind::RemoveMembers => "Remove all members from groups",
            ActionKind::RevokeUploads => "Revoke uploaded materials",
            ActionKind::GrantFileUpload => "Grant file upload permission to members",
            ActionKind::SetRegistrationPeriod => "Set registration period",
            ActionKind::SetMaxMembers => "Set maximum number of members",
        }
    }

    pub fn confirmation_text(&self, params: &ActionParams, group_count: usize) -> String {
        match (self, params) {
            (ActionKind::RemoveMembers, _) => {
                format!("Remove every member from {group_count} group(s)? This cannot be undone.")
            }
            (ActionKind::RevokeUploads, _) => {
                format!("Delete all uploaded files in {group_count} group(s)?")
            }
            (ActionKind::GrantFileUpload, _) => {
                format!("Allow members of {group_count} group(s) to upload files?")
            }
            (
                ActionKind::SetRegistrationPeriod,
                ActionParams::RegistrationPeriod { start, end },
            ) => {
                format!(
                    "Set the registration period of {group_count} group(s) to {} - {}?",
                    start.format(DATE_TIME_FORMAT),
                    end.format(DATE_TIME_FORMAT)
                )
            }
            (ActionKind::SetMaxMembers, ActionParams::MaxMembers { limit }) => {
                format!("Limit {group_count} group(s) to {limit} member(s)?")
            }
            (_, _) => format!("Apply `{}` to {group_count} group(s)?", self.display_name()),
        }
    }

    /// True when the action changes group membership, so a member snapshot
    /// is worth keeping in the report.
    pub fn affects_members(&self) -> bool {
        matches!(self, ActionKind::RemoveMembers)
    }

    /// Ask the operator for whatever this action needs beyond the selection.
    pub fn collect_params(&self, console: &mut dyn Console) -> Result<ActionParams, ConsoleError> {
        match self {
            ActionKind::SetRegistrationPeriod => {
                console.say("Enter the new registration period.")?;
                let (start, end) = input::date_range(console)?;
                Ok(ActionParams::RegistrationPeriod { start, end })
            }
            ActionKind::SetMaxMembers => {
                let limit = input::positive_number(console, "Maximum members per group: ")?;
                Ok(ActionParams::MaxMembers { limit })
            }
            ActionKind::RemoveMembers | ActionKind::RevokeUploads | ActionKind::GrantFileUpload => {
                Ok(ActionParams::None)
            }
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Extra input an action needs, sent along with every per-group call.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionParams {
    None,
    RegistrationPeriod {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    MaxMembers {
        limit: u32,
    },
}

/// An action chosen by the operator together with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    pub kind: ActionKind,
    pub params: ActionParams,
}

impl ActionRequest {
    pub fn new(kind: ActionKind, params: ActionParams) -> Self {
        Self { kind, params }
    }

    pub fn confirmation_text(&self, group_count: usize) -> String {
        self.kind.confirmation_text(&self.params, group_count)
    }
}

/// Result of one bulk action. `failed` is always a subset of `attempted`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub attempted: NodeSet,
    pub failed: NodeSet,
    pub errors: BTreeMap<NodeId, String>,
}

impl ActionOutcome {
    pub(crate) fn record_success(&mut self, node: Node) {
        self.attempted.push(node);
    }

    pub(crate) fn record_failure(&mut self, node: Node, detail: String) {
        self.errors.insert(node.id, detail);
        self.attempted.push(node.clone());
        self.failed.push(node);
    }

    pub fn is_empty(&self) -> bool {
        self.attempted.is_empty()
    }

    pub fn succeeded_count(&self) -> usize {
        self.attempted.len() - self.failed.len()
    }

    /// Lines for the operator: a count line, then one line per failed node.
    pub fn summary_lines(&self) -> Vec<String> {
        if self.is_empty() {
            return vec!["Nothing was executed.".to_string()];
        }
        let mut lines = vec![format!(
            "{} of {} group(s) succeeded, {} failed.",
            self.succeeded_count(),
            self.attempted.len(),
            self.failed.len()
        )];
        for node in &self.failed {
            let detail = self
                .errors
                .get(&node.id)
                .map(String::as_str)
                .unwrap_or("unknown error");
            lines.push(format!("  failed: {} [ref {}]: {}", node.label(), node.id, detail));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    #[test]
    fn registry_ids_are_unique() {
        let mut ids: Vec<&str> = ActionKind::ALL.iter().map(|kind| kind.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), ActionKind::ALL.len());
    }

    #[test]
    fn summary_lists_every_failed_group() {
        let mut outcome = ActionOutcome::default();
        outcome.record_success(Node::new(1, NodeKind::Group, "Group A"));
        outcome.record_failure(
            Node::new(2, NodeKind::Group, "Group B"),
            "permission denied".to_string(),
        );
        outcome.record_failure(Node::new(3, NodeKind::Group, ""), "timeout".to_string());

        let lines = outcome.summary_lines();
        assert_eq!(lines[0], "1 of 3 group(s) succeeded, 2 failed.");
        assert_eq!(lines[1], "  failed: Group B [ref 2]: permission denied");
        assert_eq!(lines[2], "  failed: #3 [ref 3]: timeout");
    }

    #[test]
    fn empty_outcome_reports_nothing_executed() {
        let outcome = ActionOutcome::default();
        assert!(outcome.is_empty());
        assert_eq!(outcome.summary_lines(), vec!["Nothing was executed."]);
    }

    #[test]
    fn confirmation_mentions_parameters() {
        let start = NaiveDateTime::parse_from_str("2024-04-01 08:00", DATE_TIME_FORMAT)
            .expect("start");
        let end = NaiveDateTime::parse_from_str("2024-04-30 18:00", DATE_TIME_FORMAT)
            .expect("end");
        let request = ActionRequest::new(
            ActionKind::SetRegistrationPeriod,
            ActionParams::RegistrationPeriod { start, end },
        );
        assert_eq!(
            request.confirmation_text(2),
            "Set the registration period of 2 group(s) to 2024-04-01 08:00 - 2024-04-30 18:00?"
        );
        let limit = ActionRequest::new(
            ActionKind::SetMaxMembers,
            ActionParams::MaxMembers { limit: 25 },
        );
        assert_eq!(limit.confirmation_text(1), "Limit 1 group(s) to 25 member(s)?");
    }
}
