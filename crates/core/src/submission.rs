use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::{info, warn};

use crate::auth::{Authenticator, Credentials};
use crate::domain::identity::Identity;
use crate::domain::quote::{QuoteRecord, QuoteRequestForm};
use crate::errors::ApplicationError;
use crate::session::IdentitySession;
use crate::storage::StateStorage;
use crate::store::QuoteRecordStore;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Created(QuoteRecord),
    /// The form is parked until authentication completes or is cancelled.
    AuthenticationRequired,
}

/// Reconciles an anonymous form fill with the rule that only an
/// authenticated identity may finalize a quote request.
///
/// At most one form is parked at a time. Completing authentication takes it
/// out of the slot before creating the record, so repeated completion
/// notifications create exactly one record.
pub struct SubmissionCoordinator<S> {
    store: Arc<QuoteRecordStore<S>>,
    session: Arc<IdentitySession<S>>,
    pending: Mutex<Option<QuoteRequestForm>>,
}

impl<S> SubmissionCoordinator<S>
where
    S: StateStorage,
{
    pub fn new(store: Arc<QuoteRecordStore<S>>, session: Arc<IdentitySession<S>>) -> Self {
        Self { store, session, pending: Mutex::new(None) }
    }

    pub async fn submit(
        &self,
        form: QuoteRequestForm,
    ) -> Result<SubmissionOutcome, ApplicationError> {
        form.validate_for_submission()?;

        if let Some(identity) = self.session.current().await? {
            let record = self.create(form, &identity).await?;
            return Ok(SubmissionOutcome::Created(record));
        }

        let replaced = self.pending_slot().replace(form).is_some();
        info!(
            event_name = "submission.deferred",
            correlation_id = "submission",
            replaced_pending = replaced,
            "quote request parked until authentication completes"
        );
        Ok(SubmissionOutcome::AuthenticationRequired)
    }

    pub fn has_pending(&self) -> bool {
        self.pending_slot().is_some()
    }

    /// Starts the session for `identity` and finalizes the parked form, if any.
    pub async fn complete_authentication(
        &self,
        identity: Identity,
    ) -> Result<Option<QuoteRecord>, ApplicationError> {
        self.session.start(identity.clone()).await?;

        let Some(form) = self.pending_slot().take() else {
            return Ok(None);
        };

        match self.create(form.clone(), &identity).await {
            Ok(record) => Ok(Some(record)),
            Err(error) => {
                warn!(
                    event_name = "submission.create_failed",
                    correlation_id = "submission",
                    error = %error,
                    "deferred quote request could not be created, keeping it parked"
                );
                self.pending_slot().get_or_insert(form);
                Err(error)
            }
        }
    }

    /// Runs the authentication step for a parked form. A refused sign-up
    /// leaves the form parked so the user can try again.
    pub async fn authenticate_and_complete<A>(
        &self,
        authenticator: &A,
        credentials: Credentials,
    ) -> Result<Option<QuoteRecord>, ApplicationError>
    where
        A: Authenticator + ?Sized,
    {
        let identity = authenticator.authenticate(credentials).await?;
        self.complete_authentication(identity).await
    }

    /// Returns whether a parked form was discarded.
    pub fn cancel_authentication(&self) -> bool {
        let discarded = self.pending_slot().take().is_some();
        if discarded {
            info!(
                event_name = "submission.cancelled",
                correlation_id = "submission",
                "authentication cancelled, parked quote request discarded"
            );
        }
        discarded
    }

    async fn create(
        &self,
        form: QuoteRequestForm,
        identity: &Identity,
    ) -> Result<QuoteRecord, ApplicationError> {
        let form = form.with_contact_email_fallback(identity);
        let record = QuoteRecord::create(form, Some(identity), Utc::now())?;
        let record = self.store.append(record).await?;
        info!(
            event_name = "submission.created",
            correlation_id = "submission",
            quote_id = %record.id(),
            category = record.category().as_str(),
            "quote request created"
        );
        Ok(record)
    }

    fn pending_slot(&self) -> MutexGuard<'_, Option<QuoteRequestForm>> {
        match self.pending.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
