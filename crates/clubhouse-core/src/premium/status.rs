//! Request status and the member-facing state selector.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stored status of a premium request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    /// Database/wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Whether `self -> next` is an allowed transition. Approved and
    /// rejected requests accept none.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved | Self::Rejected)
        )
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which UI state the member sees, derived from their latest request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// Never submitted: show the submission form.
    NoRequest,
    /// Waiting for review: show the pending banner.
    Pending,
    /// Reviewed; carries the final status.
    Resolved(RequestStatus),
}

impl RequestState {
    /// Select the state from the status of the latest request, if any.
    pub const fn from_latest(latest: Option<RequestStatus>) -> Self {
        match latest {
            None => Self::NoRequest,
            Some(RequestStatus::Pending) => Self::Pending,
            Some(status) => Self::Resolved(status),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn stored_form_is_lowercase() {
        assert_eq!(RequestStatus::Pending.as_str(), "pending");
        assert_eq!(RequestStatus::Approved.to_string(), "approved");
        assert_eq!(
            serde_json::to_string(&RequestStatus::Rejected).unwrap(),
            r#""rejected""#
        );
    }

    #[test]
    fn only_pending_can_move() {
        use RequestStatus::{Approved, Pending, Rejected};
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(!Approved.can_transition_to(Approved));
    }

    #[test]
    fn state_selector() {
        assert_eq!(RequestState::from_latest(None), RequestState::NoRequest);
        assert_eq!(
            RequestState::from_latest(Some(RequestStatus::Pending)),
            RequestState::Pending
        );
        assert_eq!(
            RequestState::from_latest(Some(RequestStatus::Rejected)),
            RequestState::Resolved(RequestStatus::Rejected)
        );
    }
}
