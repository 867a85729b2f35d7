use std::collections::BTreeMap;

use hakata_db::migrations::MIGRATOR;
use serde_json::json;

use crate::commands::context::run_with_context;
use crate::commands::CommandResult;

/// Opening the context applies pending migrations, so this only reports the result.
pub fn run() -> CommandResult {
    run_with_context("migrate", |ctx| async move {
        // Reversible migrations appear once per direction.
        let applied: BTreeMap<i64, String> = MIGRATOR
            .iter()
            .map(|migration| (migration.version, migration.description.to_string()))
            .collect();
        let applied: Vec<_> = applied
            .into_iter()
            .map(|(version, description)| json!({ "version": version, "description": description }))
            .collect();

        CommandResult::success_with_data(
            "migrate",
            format!("quote store schema is current at `{}`", ctx.config.database.url),
            applied,
        )
    })
}
