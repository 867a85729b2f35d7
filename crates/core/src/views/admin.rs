use std::sync::Arc;

use tracing::info;

use crate::domain::quote::{QuoteId, QuoteRecord, QuoteStatus};
use crate::errors::ApplicationError;
use crate::lifecycle::Actor;
use crate::storage::StateStorage;
use crate::store::QuoteRecordStore;
use crate::views::{Confirmation, DeleteOutcome, QuoteFilter, QuoteMetrics};

/// Staff-facing view over the whole collection.
pub struct AdminView<S> {
    store: Arc<QuoteRecordStore<S>>,
}

impl<S> AdminView<S>
where
    S: StateStorage,
{
    pub fn new(store: Arc<QuoteRecordStore<S>>) -> Self {
        Self { store }
    }

    pub async fn list(&self, filter: &QuoteFilter) -> Result<Vec<QuoteRecord>, ApplicationError> {
        let records = self.store.load_all().await?;
        Ok(records.into_iter().filter(|record| filter.matches(record)).collect())
    }

    pub async fn metrics(&self) -> Result<QuoteMetrics, ApplicationError> {
        let records = self.store.load_all().await?;
        Ok(QuoteMetrics::from_records(&records))
    }

    pub async fn approve(&self, id: &QuoteId) -> Result<Option<QuoteRecord>, ApplicationError> {
        self.store.transition(id, QuoteStatus::Approved, Actor::Admin).await
    }

    pub async fn reject(&self, id: &QuoteId) -> Result<Option<QuoteRecord>, ApplicationError> {
        self.store.transition(id, QuoteStatus::Rejected, Actor::Admin).await
    }

    pub async fn archive(&self, id: &QuoteId) -> Result<Option<QuoteRecord>, ApplicationError> {
        self.store.transition(id, QuoteStatus::Archived, Actor::Admin).await
    }

    /// Only succeeds when the lifecycle policy allows re-activation.
    pub async fn reopen(&self, id: &QuoteId) -> Result<Option<QuoteRecord>, ApplicationError> {
        self.store.transition(id, QuoteStatus::Pending, Actor::Admin).await
    }

    pub async fn delete(
        &self,
        id: &QuoteId,
        confirmation: Confirmation,
    ) -> Result<DeleteOutcome, ApplicationError> {
        if confirmation == Confirmation::Declined {
            info!(
                event_name = "admin.delete_declined",
                correlation_id = "admin",
                quote_id = %id,
                "deletion not confirmed, nothing removed"
            );
            return Ok(DeleteOutcome::NotConfirmed);
        }

        Ok(match self.store.remove(id).await? {
            Some(record) => DeleteOutcome::Deleted(record),
            None => DeleteOutcome::NotFound,
        })
    }
}
