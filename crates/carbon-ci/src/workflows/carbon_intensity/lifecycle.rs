//! Verification state machine.
//!
//! `transition` is pure: it decides the next status and the audit entry to
//! append, and the repository commits both under a compare-and-swap on the
//! prior status.

use serde::{Deserialize, Serialize};

use super::domain::{ActorId, ReportStatus};

/// Wire name of a workflow action, as recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Submit,
    StartReview,
    Approve,
    Reject,
    RequestRevision,
}

impl ActionKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::StartReview => "start_review",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::RequestRevision => "request_revision",
        }
    }

    /// The only status this action may be applied from.
    pub const fn from_status(self) -> ReportStatus {
        match self {
            Self::Submit => ReportStatus::Draft,
            Self::StartReview => ReportStatus::Submitted,
            Self::Approve | Self::Reject | Self::RequestRevision => ReportStatus::UnderReview,
        }
    }

    pub const fn to_status(self) -> ReportStatus {
        match self {
            Self::Submit => ReportStatus::Submitted,
            Self::StartReview => ReportStatus::UnderReview,
            Self::Approve => ReportStatus::Verified,
            Self::Reject => ReportStatus::Rejected,
            Self::RequestRevision => ReportStatus::Draft,
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Closed set of workflow actions with their required justification text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum VerificationAction {
    Submit,
    StartReview,
    Approve { notes: Option<String> },
    Reject { reason: String },
    RequestRevision { notes: String },
}

impl VerificationAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Submit => ActionKind::Submit,
            Self::StartReview => ActionKind::StartReview,
            Self::Approve { .. } => ActionKind::Approve,
            Self::Reject { .. } => ActionKind::Reject,
            Self::RequestRevision { .. } => ActionKind::RequestRevision,
        }
    }

    /// Build an action from the loose `(action, notes?, rejection_reason?)` shape
    /// the HTTP surface accepts.
    pub fn from_parts(
        kind: ActionKind,
        notes: Option<String>,
        rejection_reason: Option<String>,
    ) -> Result<Self, TransitionError> {
        let notes = non_blank(notes);
        match kind {
            ActionKind::Submit => Ok(Self::Submit),
            ActionKind::StartReview => Ok(Self::StartReview),
            ActionKind::Approve => Ok(Self::Approve { notes }),
            ActionKind::Reject => non_blank(rejection_reason)
                .map(|reason| Self::Reject { reason })
                .ok_or(TransitionError::MissingReason),
            ActionKind::RequestRevision => notes
                .map(|notes| Self::RequestRevision { notes })
                .ok_or(TransitionError::MissingNotes),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot {action} a report that is {from}")]
    InvalidTransition {
        action: ActionKind,
        from: ReportStatus,
    },
    #[error("rejecting a report requires a reason")]
    MissingReason,
    #[error("requesting a revision requires notes for the supplier")]
    MissingNotes,
}

/// Audit entry contents decided by the state machine; the store assigns the
/// sequence number and timestamp when it commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntryDraft {
    pub action: ActionKind,
    pub prior_status: ReportStatus,
    pub new_status: ReportStatus,
    pub actor: ActorId,
    pub notes: Option<String>,
}

/// Record-level side effect that accompanies a status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionEffect {
    None,
    AssignAuditor(ActorId),
    RecordRejection(String),
}

/// Outcome of a permitted transition, ready to be committed atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: ReportStatus,
    pub to: ReportStatus,
    pub effect: TransitionEffect,
    pub entry: AuditEntryDraft,
}

pub fn transition(
    current: ReportStatus,
    action: &VerificationAction,
    actor: &ActorId,
) -> Result<Transition, TransitionError> {
    let kind = action.kind();
    if current != kind.from_status() {
        return Err(TransitionError::InvalidTransition {
            action: kind,
            from: current,
        });
    }

    let (effect, notes) = match action {
        VerificationAction::Submit => (TransitionEffect::None, None),
        VerificationAction::StartReview => (TransitionEffect::AssignAuditor(actor.clone()), None),
        VerificationAction::Approve { notes } => (TransitionEffect::None, non_blank(notes.clone())),
        VerificationAction::Reject { reason } => {
            let reason = non_blank(Some(reason.clone())).ok_or(TransitionError::MissingReason)?;
            (TransitionEffect::RecordRejection(reason.clone()), Some(reason))
        }
        VerificationAction::RequestRevision { notes } => {
            let notes = non_blank(Some(notes.clone())).ok_or(TransitionError::MissingNotes)?;
            (TransitionEffect::None, Some(notes))
        }
    };

    let to = kind.to_status();
    Ok(Transition {
        from: current,
        to,
        effect,
        entry: AuditEntryDraft {
            action: kind,
            prior_status: current,
            new_status: to,
            actor: actor.clone(),
            notes,
        },
    })
}

/// Status implied by the `new_status` column of an ordered audit trail, or
/// draft when nothing has been logged.
pub fn replayed_status<I>(new_statuses: I) -> ReportStatus
where
    I: IntoIterator<Item = ReportStatus>,
{
    new_statuses
        .into_iter()
        .last()
        .unwrap_or(ReportStatus::Draft)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
