use std::sync::Arc;

use tracing::debug;

use crate::domain::identity::Identity;
use crate::domain::quote::{QuoteId, QuoteRecord, QuoteStatus};
use crate::errors::ApplicationError;
use crate::lifecycle::Actor;
use crate::navigation::{NavigationSignal, SignalBus};
use crate::session::IdentitySession;
use crate::storage::StateStorage;
use crate::store::QuoteRecordStore;
use crate::views::{Confirmation, DeleteOutcome, ProfileProjection};

/// Customer-facing view: the signed-in user's own requests.
///
/// Records owned by someone else are treated as absent, so every operation on
/// them is a no-op.
pub struct ProfileView<S> {
    store: Arc<QuoteRecordStore<S>>,
    session: Arc<IdentitySession<S>>,
    signals: Option<SignalBus>,
}

impl<S> ProfileView<S>
where
    S: StateStorage,
{
    pub fn new(store: Arc<QuoteRecordStore<S>>, session: Arc<IdentitySession<S>>) -> Self {
        Self { store, session, signals: None }
    }

    pub fn with_signals(mut self, signals: SignalBus) -> Self {
        self.signals = Some(signals);
        self
    }

    /// The "new request" call to action. Returns `false` when the view has no bus.
    pub fn request_new_quote(&self) -> bool {
        let Some(signals) = &self.signals else {
            return false;
        };
        debug!(
            event_name = "profile.new_quote_requested",
            correlation_id = "profile",
            "profile asked the shell for the quote request page"
        );
        signals.emit(NavigationSignal::NavigateToQuoteRequest);
        true
    }

    /// `None` when nobody is signed in.
    pub async fn overview(
        &self,
    ) -> Result<Option<(Identity, ProfileProjection)>, ApplicationError> {
        let Some(identity) = self.session.current().await? else {
            return Ok(None);
        };
        let records = self.store.load_all().await?;
        let projection = ProfileProjection::for_identity(&records, &identity);
        Ok(Some((identity, projection)))
    }

    pub async fn archive(&self, id: &QuoteId) -> Result<Option<QuoteRecord>, ApplicationError> {
        if self.owned(id).await?.is_none() {
            return Ok(None);
        }
        self.store.transition(id, QuoteStatus::Archived, Actor::Owner).await
    }

    pub async fn delete(
        &self,
        id: &QuoteId,
        confirmation: Confirmation,
    ) -> Result<DeleteOutcome, ApplicationError> {
        if confirmation == Confirmation::Declined {
            return Ok(DeleteOutcome::NotConfirmed);
        }
        if self.owned(id).await?.is_none() {
            return Ok(DeleteOutcome::NotFound);
        }

        Ok(match self.store.remove(id).await? {
            Some(record) => DeleteOutcome::Deleted(record),
            None => DeleteOutcome::NotFound,
        })
    }

    async fn owned(&self, id: &QuoteId) -> Result<Option<QuoteRecord>, ApplicationError> {
        let Some(identity) = self.session.current().await? else {
            return Ok(None);
        };
        let record = self.store.get(id).await?;
        Ok(record.filter(|record| record.is_owned_by(&identity)))
    }
}
