use std::sync::Arc;

use chrono::Utc;
use tempfile::TempDir;

use hakata_core::domain::quote::{QuoteCategory, QuoteRecord, QuoteRequestForm, QuoteStatus};
use hakata_core::lifecycle::QuoteLifecycle;
use hakata_core::session::IdentitySession;
use hakata_core::store::QuoteRecordStore;
use hakata_core::Identity;
use hakata_db::{connect_with_settings, migrations, SqlStateStorage};

async fn open(url: &str) -> Arc<SqlStateStorage> {
    let pool = connect_with_settings(url, 2, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("run migrations");
    Arc::new(SqlStateStorage::new(pool))
}

fn record(company: &str) -> QuoteRecord {
    QuoteRecord::create(
        QuoteRequestForm {
            category: Some(QuoteCategory::VideoSurveillance),
            company_name: company.to_owned(),
            contact_email: "ops@example.fr".to_owned(),
            contact_phone: "0102030405".to_owned(),
            description: "cameras for the loading dock".to_owned(),
        },
        None,
        Utc::now(),
    )
    .expect("valid form")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn two_handles_on_one_file_never_lose_appends() {
    let dir = TempDir::new().expect("tempdir");
    let url = format!("sqlite://{}", dir.path().join("shared.db").display());

    let first = Arc::new(
        QuoteRecordStore::new(open(&url).await, QuoteLifecycle::default())
            .with_max_write_retries(20),
    );
    let second = Arc::new(
        QuoteRecordStore::new(open(&url).await, QuoteLifecycle::default())
            .with_max_write_retries(20),
    );

    let writer = |store: Arc<QuoteRecordStore<SqlStateStorage>>, prefix: &'static str| {
        tokio::spawn(async move {
            for index in 0..10 {
                store.append(record(&format!("{prefix}-{index}"))).await.expect("append");
            }
        })
    };

    let left = writer(first.clone(), "left");
    let right = writer(second.clone(), "right");
    left.await.expect("left writer");
    right.await.expect("right writer");

    let records = first.load_all().await.expect("load");
    assert_eq!(records.len(), 20);
    assert_eq!(second.load_all().await.expect("load").len(), 20);
}

#[tokio::test]
async fn status_change_on_one_handle_is_visible_from_another() {
    let dir = TempDir::new().expect("tempdir");
    let url = format!("sqlite://{}", dir.path().join("shared.db").display());

    let writer = QuoteRecordStore::new(open(&url).await, QuoteLifecycle::default());
    let reader = QuoteRecordStore::new(open(&url).await, QuoteLifecycle::default());

    let created = writer.append(record("Acme")).await.expect("append");
    writer.update_status(created.id(), QuoteStatus::Approved).await.expect("update");

    let seen = reader.get(created.id()).await.expect("get").expect("present");
    assert_eq!(seen.status(), QuoteStatus::Approved);
}

#[tokio::test]
async fn session_persists_across_reopen() {
    let dir = TempDir::new().expect("tempdir");
    let url = format!("sqlite://{}", dir.path().join("session.db").display());

    IdentitySession::new(open(&url).await)
        .start(Identity::new("client@acme.fr", "Client", "Acme"))
        .await
        .expect("start");

    let reopened = IdentitySession::new(open(&url).await);
    let identity = reopened.current().await.expect("current").expect("signed in");
    assert_eq!(identity.email, "client@acme.fr");
}
