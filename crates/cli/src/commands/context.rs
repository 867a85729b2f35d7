use std::future::Future;
use std::sync::Arc;

use hakata_core::config::{AppConfig, LoadOptions};
use hakata_core::lifecycle::QuoteLifecycle;
use hakata_core::navigation::{AppShell, SignalBus};
use hakata_core::session::IdentitySession;
use hakata_core::store::QuoteRecordStore;
use hakata_db::{connect_with_settings, migrations, SqlStateStorage};

use crate::commands::CommandResult;

/// Everything a store-backed command needs, wired from the loaded config.
pub struct AppContext {
    pub config: AppConfig,
    pub store: Arc<QuoteRecordStore<SqlStateStorage>>,
    pub session: Arc<IdentitySession<SqlStateStorage>>,
    pub signals: SignalBus,
    /// Subscribed to `signals` before the command runs.
    pub shell: AppShell,
}

/// Loads config, opens and migrates the local database, then runs `action`.
///
/// Setup failures map to `config_validation` (2), `runtime_init` (3),
/// `db_connectivity` (4) and `migration` (5).
pub fn run_with_context<F, Fut>(command: &str, action: F) -> CommandResult
where
    F: FnOnce(AppContext) -> Fut,
    Fut: Future<Output = CommandResult>,
{
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                command,
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                command,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    runtime.block_on(async {
        let pool = match connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        {
            Ok(pool) => pool,
            Err(error) => {
                return CommandResult::failure(command, "db_connectivity", error.to_string(), 4);
            }
        };
        if let Err(error) = migrations::run_pending(&pool).await {
            pool.close().await;
            return CommandResult::failure(command, "migration", error.to_string(), 5);
        }

        let storage = Arc::new(SqlStateStorage::new(pool.clone()));
        let lifecycle = QuoteLifecycle::new(config.lifecycle.policy());
        let store = Arc::new(
            QuoteRecordStore::new(storage.clone(), lifecycle)
                .with_max_write_retries(config.store.max_write_retries),
        );
        let session = Arc::new(IdentitySession::new(storage));

        let signals = SignalBus::new();
        let shell = AppShell::new(&signals);

        let result = action(AppContext { config, store, session, signals, shell }).await;
        pool.close().await;
        result
    })
}
