use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::domain::quote::{QuoteId, QuoteRecord, QuoteStatus};
use crate::errors::{ApplicationError, DomainError};
use crate::lifecycle::{Actor, QuoteLifecycle};
use crate::storage::{StateStorage, QUOTES_KEY};

pub const DEFAULT_MAX_WRITE_RETRIES: u32 = 5;
const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    Appended { id: QuoteId },
    StatusChanged { id: QuoteId, from: QuoteStatus, to: QuoteStatus },
    Removed { id: QuoteId },
    Replaced { count: usize },
}

/// Sole owner of the quote record collection.
///
/// Writes inside one process are serialized by `write_lock`. Each mutation is
/// committed with a revision-checked swap and re-applied on a fresh snapshot if
/// another process wrote in between, so concurrent writers never silently drop
/// each other's changes. Views observe changes through [`QuoteRecordStore::subscribe`].
pub struct QuoteRecordStore<S> {
    storage: Arc<S>,
    lifecycle: QuoteLifecycle,
    write_lock: Mutex<()>,
    events: broadcast::Sender<StoreEvent>,
    max_write_retries: u32,
}

struct Snapshot {
    records: Vec<QuoteRecord>,
    revision: Option<u64>,
}

impl<S> QuoteRecordStore<S>
where
    S: StateStorage,
{
    pub fn new(storage: Arc<S>, lifecycle: QuoteLifecycle) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            storage,
            lifecycle,
            write_lock: Mutex::new(()),
            events,
            max_write_retries: DEFAULT_MAX_WRITE_RETRIES,
        }
    }

    pub fn with_max_write_retries(mut self, max_write_retries: u32) -> Self {
        self.max_write_retries = max_write_retries;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Full collection in insertion order. An unreadable payload reads as empty.
    pub async fn load_all(&self) -> Result<Vec<QuoteRecord>, ApplicationError> {
        Ok(self.snapshot().await?.records)
    }

    pub async fn get(&self, id: &QuoteId) -> Result<Option<QuoteRecord>, ApplicationError> {
        let records = self.load_all().await?;
        Ok(records.into_iter().find(|record| record.id() == id))
    }

    /// Bulk import: overwrites the whole collection in one write.
    pub async fn replace_all(&self, records: Vec<QuoteRecord>) -> Result<(), ApplicationError> {
        ensure_importable(&records)?;
        let payload = encode(&records)?;

        let _guard = self.write_lock.lock().await;
        let revision = self.storage.store(QUOTES_KEY, &payload).await?;
        info!(
            event_name = "store.quotes.replaced",
            correlation_id = "store",
            record_count = records.len(),
            revision,
            "quote collection replaced"
        );
        self.publish(StoreEvent::Replaced { count: records.len() });
        Ok(())
    }

    pub async fn append(&self, record: QuoteRecord) -> Result<QuoteRecord, ApplicationError> {
        let appended = self
            .mutate("append", |records| {
                if records.iter().any(|existing| existing.id() == record.id()) {
                    return Err(DomainError::DuplicateQuoteId(record.id().clone()));
                }
                records.push(record.clone());
                Ok(Some((record.clone(), StoreEvent::Appended { id: record.id().clone() })))
            })
            .await?;

        appended.ok_or_else(|| {
            ApplicationError::Persistence("append completed without a record".to_owned())
        })
    }

    /// Sets `status` without consulting the lifecycle. Unknown ids are a no-op.
    pub async fn update_status(
        &self,
        id: &QuoteId,
        status: QuoteStatus,
    ) -> Result<Option<QuoteRecord>, ApplicationError> {
        self.mutate("update_status", |records| {
            let Some(record) = records.iter_mut().find(|record| record.id() == id) else {
                return Ok(None);
            };
            let from = record.status();
            record.set_status(status);
            let event = StoreEvent::StatusChanged { id: id.clone(), from, to: status };
            Ok(Some((record.clone(), event)))
        })
        .await
    }

    /// Lifecycle-guarded status change used by the consumer views.
    pub async fn transition(
        &self,
        id: &QuoteId,
        to: QuoteStatus,
        actor: Actor,
    ) -> Result<Option<QuoteRecord>, ApplicationError> {
        let lifecycle = self.lifecycle;
        self.mutate("transition", |records| {
            let Some(record) = records.iter_mut().find(|record| record.id() == id) else {
                return Ok(None);
            };
            let from = record.status();
            lifecycle.check(from, to, actor)?;
            record.set_status(to);
            let event = StoreEvent::StatusChanged { id: id.clone(), from, to };
            Ok(Some((record.clone(), event)))
        })
        .await
    }

    /// Deletion is legal from every status. Unknown ids are a no-op.
    pub async fn remove(&self, id: &QuoteId) -> Result<Option<QuoteRecord>, ApplicationError> {
        self.mutate("remove", |records| {
            let Some(position) = records.iter().position(|record| record.id() == id) else {
                return Ok(None);
            };
            let removed = records.remove(position);
            Ok(Some((removed, StoreEvent::Removed { id: id.clone() })))
        })
        .await
    }

    async fn snapshot(&self) -> Result<Snapshot, ApplicationError> {
        let Some(state) = self.storage.load(QUOTES_KEY).await? else {
            return Ok(Snapshot { records: Vec::new(), revision: None });
        };

        let records = match serde_json::from_str::<Vec<QuoteRecord>>(&state.value) {
            Ok(records) => records,
            Err(error) => {
                warn!(
                    event_name = "store.quotes.corrupt_payload",
                    correlation_id = "store",
                    revision = state.revision,
                    error = %error,
                    "persisted quote collection is unreadable, treating it as empty"
                );
                Vec::new()
            }
        };

        Ok(Snapshot { records, revision: Some(state.revision) })
    }

    async fn mutate<T, F>(
        &self,
        operation: &'static str,
        mut apply: F,
    ) -> Result<Option<T>, ApplicationError>
    where
        F: FnMut(&mut Vec<QuoteRecord>) -> Result<Option<(T, StoreEvent)>, DomainError>,
    {
        let _guard = self.write_lock.lock().await;

        for attempt in 0..=self.max_write_retries {
            let Snapshot { mut records, revision } = self.snapshot().await?;
            let Some((value, event)) = apply(&mut records)? else {
                debug!(
                    event_name = "store.quotes.noop",
                    correlation_id = "store",
                    operation,
                    "mutation matched no record"
                );
                return Ok(None);
            };

            let payload = encode(&records)?;
            match self.storage.compare_and_swap(QUOTES_KEY, revision, &payload).await? {
                Some(new_revision) => {
                    info!(
                        event_name = "store.quotes.mutated",
                        correlation_id = "store",
                        operation,
                        revision = new_revision,
                        record_count = records.len(),
                        "quote collection updated"
                    );
                    self.publish(event);
                    return Ok(Some(value));
                }
                None => {
                    warn!(
                        event_name = "store.quotes.write_conflict",
                        correlation_id = "store",
                        operation,
                        attempt,
                        "quote collection changed underneath the write, retrying"
                    );
                }
            }
        }

        Err(ApplicationError::Persistence(format!(
            "{operation} gave up after {} conflicting writes",
            self.max_write_retries + 1
        )))
    }

    fn publish(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

fn ensure_importable(records: &[QuoteRecord]) -> Result<(), DomainError> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        record.validate()?;
        if !seen.insert(record.id()) {
            return Err(DomainError::DuplicateQuoteId(record.id().clone()));
        }
    }
    Ok(())
}

fn encode(records: &[QuoteRecord]) -> Result<String, ApplicationError> {
    serde_json::to_string(records).map_err(|error| {
        ApplicationError::Persistence(format!("could not encode quote collection: {error}"))
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;

    use crate::domain::quote::{QuoteCategory, QuoteId, QuoteRecord, QuoteRequestForm, QuoteStatus};
    use crate::errors::{ApplicationError, DomainError};
    use crate::lifecycle::{Actor, LifecyclePolicy, QuoteLifecycle};
    use crate::storage::{
        InMemoryStateStorage, StateStorage, StorageError, StoredState, QUOTES_KEY,
    };

    use super::{QuoteRecordStore, StoreEvent};

    fn form(company: &str) -> QuoteRequestForm {
        QuoteRequestForm {
            category: Some(QuoteCategory::AlarmsDetection),
            company_name: company.to_owned(),
            contact_email: "a@acme.fr".to_owned(),
            contact_phone: "0100000000".to_owned(),
            description: "test".to_owned(),
        }
    }

    fn record(company: &str) -> QuoteRecord {
        QuoteRecord::create(form(company), None, Utc::now()).expect("valid form")
    }

    fn store() -> (Arc<InMemoryStateStorage>, QuoteRecordStore<InMemoryStateStorage>) {
        let storage = Arc::new(InMemoryStateStorage::default());
        let store = QuoteRecordStore::new(storage.clone(), QuoteLifecycle::default());
        (storage, store)
    }

    #[tokio::test]
    async fn empty_store_loads_nothing() {
        let (_, store) = store();
        assert_eq!(store.load_all().await.expect("load"), Vec::new());
    }

    #[tokio::test]
    async fn appended_record_is_pending() {
        let (_, store) = store();
        store.append(record("Acme")).await.expect("append");

        let records = store.load_all().await.expect("load");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status(), QuoteStatus::Pending);
        assert_eq!(records[0].company_name(), "Acme");
    }

    #[tokio::test]
    async fn replace_all_round_trips_in_order() {
        let (_, store) = store();
        let records = vec![record("Acme"), record("Globex"), record("Initech")];

        store.replace_all(records.clone()).await.expect("replace");

        assert_eq!(store.load_all().await.expect("load"), records);
    }

    #[tokio::test]
    async fn replace_all_rejects_duplicate_ids() {
        let (_, store) = store();
        let first = record("Acme");

        let error = store
            .replace_all(vec![first.clone(), first.clone()])
            .await
            .expect_err("duplicates must be rejected");

        assert_eq!(
            error,
            ApplicationError::Domain(DomainError::DuplicateQuoteId(first.id().clone()))
        );
        assert!(store.load_all().await.expect("load").is_empty());
    }

    #[tokio::test]
    async fn replace_all_rejects_records_breaking_creation_invariants() {
        let (_, store) = store();
        let blank_fields: QuoteRecord = serde_json::from_value(serde_json::json!({
            "id": "Q-imported",
            "createdAt": "2026-01-05T09:30:00Z",
            "status": "pending",
            "category": "other",
            "companyName": " ",
            "contactEmail": "",
            "contactPhone": "0100000000",
            "description": "imported"
        }))
        .expect("decode");

        let error = store
            .replace_all(vec![record("Acme"), blank_fields])
            .await
            .expect_err("blank fields must be rejected");
        assert_eq!(
            error,
            ApplicationError::Domain(DomainError::MissingRequiredFields {
                fields: vec!["company_name".to_owned(), "contact_email".to_owned()],
            })
        );

        let mut blank_id = serde_json::to_value(record("Acme")).expect("encode");
        blank_id["id"] = serde_json::json!("");
        let blank_id: QuoteRecord = serde_json::from_value(blank_id).expect("decode");
        let error = store.replace_all(vec![blank_id]).await.expect_err("blank id must be rejected");
        assert!(matches!(error, ApplicationError::Domain(DomainError::InvariantViolation(_))));

        assert!(store.load_all().await.expect("load").is_empty());
    }

    #[tokio::test]
    async fn appends_keep_ids_distinct() {
        let (_, store) = store();
        for index in 0..20 {
            store.append(record(&format!("Company {index}"))).await.expect("append");
        }

        let records = store.load_all().await.expect("load");
        let ids: HashSet<_> = records.iter().map(|record| record.id().clone()).collect();
        assert_eq!(records.len(), 20);
        assert_eq!(ids.len(), 20);
    }

    #[tokio::test]
    async fn append_refuses_an_existing_id() {
        let (_, store) = store();
        let first = store.append(record("Acme")).await.expect("append");

        let error = store.append(first.clone()).await.expect_err("duplicate id");
        assert!(matches!(error, ApplicationError::Domain(DomainError::DuplicateQuoteId(_))));
        assert_eq!(store.load_all().await.expect("load").len(), 1);
    }

    #[tokio::test]
    async fn update_status_on_unknown_id_changes_nothing() {
        let (storage, store) = store();
        store.append(record("Acme")).await.expect("append");
        let before = storage.load(QUOTES_KEY).await.expect("load").expect("present");

        let updated = store
            .update_status(&QuoteId("Q-missing".to_owned()), QuoteStatus::Approved)
            .await
            .expect("no-op is not an error");

        let after = storage.load(QUOTES_KEY).await.expect("load").expect("present");
        assert_eq!(updated, None);
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn raw_status_updates_are_unrestricted() {
        let (_, store) = store();
        let created = store.append(record("Acme")).await.expect("append");

        store.update_status(created.id(), QuoteStatus::Approved).await.expect("approve");
        store.update_status(created.id(), QuoteStatus::Rejected).await.expect("reject");

        let stored = store.get(created.id()).await.expect("get").expect("present");
        assert_eq!(stored.status(), QuoteStatus::Rejected);
    }

    #[tokio::test]
    async fn guarded_transition_follows_lifecycle() {
        let (_, store) = store();
        let created = store.append(record("Acme")).await.expect("append");

        store.transition(created.id(), QuoteStatus::Approved, Actor::Admin).await.expect("approve");
        let error = store
            .transition(created.id(), QuoteStatus::Rejected, Actor::Admin)
            .await
            .expect_err("approved cannot become rejected");

        assert!(matches!(
            error,
            ApplicationError::Domain(DomainError::InvalidQuoteTransition {
                from: QuoteStatus::Approved,
                to: QuoteStatus::Rejected,
                ..
            })
        ));
        let stored = store.get(created.id()).await.expect("get").expect("present");
        assert_eq!(stored.status(), QuoteStatus::Approved);
    }

    #[tokio::test]
    async fn archived_records_stay_archived_unless_policy_allows() {
        let (_, store) = store();
        let created = store.append(record("Acme")).await.expect("append");
        store.transition(created.id(), QuoteStatus::Archived, Actor::Owner).await.expect("archive");

        assert!(store.transition(created.id(), QuoteStatus::Pending, Actor::Admin).await.is_err());

        let storage = Arc::new(InMemoryStateStorage::default());
        let reopening = QuoteRecordStore::new(
            storage,
            QuoteLifecycle::new(LifecyclePolicy { allow_unarchive: true }),
        );
        let created = reopening.append(record("Acme")).await.expect("append");
        reopening
            .transition(created.id(), QuoteStatus::Archived, Actor::Admin)
            .await
            .expect("archive");
        let reopened = reopening
            .transition(created.id(), QuoteStatus::Pending, Actor::Admin)
            .await
            .expect("reopen")
            .expect("present");
        assert_eq!(reopened.status(), QuoteStatus::Pending);
    }

    #[tokio::test]
    async fn archived_record_can_be_removed() {
        let (_, store) = store();
        let keep = store.append(record("Globex")).await.expect("append");
        let created = store.append(record("Acme")).await.expect("append");
        store.transition(created.id(), QuoteStatus::Archived, Actor::Admin).await.expect("archive");

        let removed = store.remove(created.id()).await.expect("remove");

        assert_eq!(removed.map(|record| record.id().clone()), Some(created.id().clone()));
        let remaining = store.load_all().await.expect("load");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id(), keep.id());
    }

    #[tokio::test]
    async fn corrupt_payload_reads_as_empty_and_is_overwritten() {
        let (storage, store) = store();
        storage.store(QUOTES_KEY, "{not json").await.expect("seed corrupt payload");

        assert!(store.load_all().await.expect("load").is_empty());

        store.append(record("Acme")).await.expect("append over corrupt payload");
        assert_eq!(store.load_all().await.expect("load").len(), 1);
    }

    #[tokio::test]
    async fn subscribers_see_every_committed_change() {
        let (_, store) = store();
        let mut events = store.subscribe();

        let created = store.append(record("Acme")).await.expect("append");
        store.transition(created.id(), QuoteStatus::Approved, Actor::Admin).await.expect("approve");
        store.remove(&QuoteId("Q-missing".to_owned())).await.expect("no-op");
        store.remove(created.id()).await.expect("remove");

        assert_eq!(events.recv().await.expect("event"), StoreEvent::Appended {
            id: created.id().clone()
        });
        assert_eq!(events.recv().await.expect("event"), StoreEvent::StatusChanged {
            id: created.id().clone(),
            from: QuoteStatus::Pending,
            to: QuoteStatus::Approved,
        });
        assert_eq!(events.recv().await.expect("event"), StoreEvent::Removed {
            id: created.id().clone()
        });
        assert!(events.try_recv().is_err());
    }

    /// Storage whose first swap loses to a concurrent writer that appends a record.
    struct RacingStorage {
        inner: InMemoryStateStorage,
        intruder: std::sync::Mutex<Option<QuoteRecord>>,
    }

    #[async_trait]
    impl StateStorage for RacingStorage {
        async fn load(&self, key: &str) -> Result<Option<StoredState>, StorageError> {
            self.inner.load(key).await
        }

        async fn store(&self, key: &str, value: &str) -> Result<u64, StorageError> {
            self.inner.store(key, value).await
        }

        async fn compare_and_swap(
            &self,
            key: &str,
            expected: Option<u64>,
            value: &str,
        ) -> Result<Option<u64>, StorageError> {
            let intruder = self.intruder.lock().map(|mut slot| slot.take()).unwrap_or(None);
            if let Some(intruder) = intruder {
                let payload = serde_json::to_string(&vec![intruder])
                    .map_err(|error| StorageError::Backend(error.to_string()))?;
                self.inner.store(key, &payload).await?;
            }
            self.inner.compare_and_swap(key, expected, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key).await
        }
    }

    #[tokio::test]
    async fn concurrent_writer_change_is_not_lost() {
        let intruder = record("Written elsewhere");
        let storage = Arc::new(RacingStorage {
            inner: InMemoryStateStorage::default(),
            intruder: std::sync::Mutex::new(Some(intruder.clone())),
        });
        let store = QuoteRecordStore::new(storage, QuoteLifecycle::default());

        let mine = store.append(record("Acme")).await.expect("append retries after conflict");

        let records = store.load_all().await.expect("load");
        let ids: Vec<_> = records.iter().map(|record| record.id().clone()).collect();
        assert_eq!(ids, vec![intruder.id().clone(), mine.id().clone()]);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_as_persistence_error() {
        let storage = Arc::new(RacingStorage {
            inner: InMemoryStateStorage::default(),
            intruder: std::sync::Mutex::new(Some(record("Written elsewhere"))),
        });
        let store =
            QuoteRecordStore::new(storage, QuoteLifecycle::default()).with_max_write_retries(0);

        let error = store.append(record("Acme")).await.expect_err("single attempt loses");
        assert!(matches!(error, ApplicationError::Persistence(_)));
    }
}
