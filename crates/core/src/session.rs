use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::identity::Identity;
use crate::errors::{ApplicationError, DomainError};
use crate::storage::{StateStorage, SESSION_KEY};

/// The one signed-in identity, persisted so it survives a reload.
pub struct IdentitySession<S> {
    storage: Arc<S>,
}

impl<S> IdentitySession<S>
where
    S: StateStorage,
{
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Replaces whatever session was active.
    pub async fn start(&self, identity: Identity) -> Result<(), ApplicationError> {
        if !identity.is_well_formed() {
            return Err(DomainError::InvariantViolation(format!(
                "session identity needs a valid email, got `{}`",
                identity.email
            ))
            .into());
        }

        let payload = serde_json::to_string(&identity).map_err(|error| {
            ApplicationError::Persistence(format!("could not encode session: {error}"))
        })?;
        self.storage.store(SESSION_KEY, &payload).await?;
        info!(
            event_name = "session.started",
            correlation_id = "session",
            email = %identity.email,
            "identity session started"
        );
        Ok(())
    }

    pub async fn current(&self) -> Result<Option<Identity>, ApplicationError> {
        let Some(state) = self.storage.load(SESSION_KEY).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<Identity>(&state.value) {
            Ok(identity) => Ok(Some(identity)),
            Err(error) => {
                warn!(
                    event_name = "session.corrupt_payload",
                    correlation_id = "session",
                    error = %error,
                    "persisted session is unreadable, treating it as signed out"
                );
                Ok(None)
            }
        }
    }

    pub async fn end(&self) -> Result<(), ApplicationError> {
        self.storage.remove(SESSION_KEY).await?;
        info!(event_name = "session.ended", correlation_id = "session", "identity session ended");
        Ok(())
    }
}
