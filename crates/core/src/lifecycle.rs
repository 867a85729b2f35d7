use serde::{Deserialize, Serialize};

use crate::domain::quote::QuoteStatus;
use crate::errors::DomainError;

/// Who is asking for a status change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    /// Staff working from the admin view.
    Admin,
    /// The customer who filed the request.
    Owner,
}

impl Actor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LifecyclePolicy {
    /// Lets an admin move an archived request back to `Pending`.
    pub allow_unarchive: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QuoteLifecycle {
    policy: LifecyclePolicy,
}

impl QuoteLifecycle {
    pub fn new(policy: LifecyclePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> LifecyclePolicy {
        self.policy
    }

    pub fn can_transition(&self, from: QuoteStatus, to: QuoteStatus, actor: Actor) -> bool {
        use QuoteStatus::{Approved, Archived, Pending, Rejected};

        match (from, to, actor) {
            (Pending, Approved, Actor::Admin) | (Pending, Rejected, Actor::Admin) => true,
            (Pending, Archived, _) | (Approved, Archived, _) | (Rejected, Archived, _) => true,
            (Archived, Pending, Actor::Admin) => self.policy.allow_unarchive,
            _ => false,
        }
    }

    pub fn check(
        &self,
        from: QuoteStatus,
        to: QuoteStatus,
        actor: Actor,
    ) -> Result<(), DomainError> {
        if self.can_transition(from, to, actor) {
            return Ok(());
        }

        Err(DomainError::InvalidQuoteTransition { from, to, actor })
    }
}
