use std::path::PathBuf;

use hakata_core::domain::quote::QuoteRecord;
use hakata_core::views::Confirmation;

use crate::commands::context::run_with_context;
use crate::commands::CommandResult;

pub fn export(output: Option<PathBuf>) -> CommandResult {
    run_with_context("export", |ctx| async move {
        let records = match ctx.store.load_all().await {
            Ok(records) => records,
            Err(error) => return CommandResult::from_application_error("export", error),
        };

        let Some(path) = output else {
            return CommandResult::success_with_data(
                "export",
                format!("exported {} quote requests", records.len()),
                &records,
            );
        };

        let payload = match serde_json::to_string_pretty(&records) {
            Ok(payload) => payload,
            Err(error) => {
                return CommandResult::failure("export", "serialization", error.to_string(), 9);
            }
        };
        if let Err(error) = tokio::fs::write(&path, payload).await {
            return CommandResult::failure(
                "export",
                "io",
                format!("could not write `{}`: {error}", path.display()),
                12,
            );
        }

        CommandResult::success(
            "export",
            format!("exported {} quote requests to {}", records.len(), path.display()),
        )
    })
}

/// Replaces the whole collection with the records in `path`.
pub fn import(path: PathBuf, confirmed: bool) -> CommandResult {
    if Confirmation::from_flag(confirmed) == Confirmation::Declined {
        return CommandResult::failure(
            "import",
            "not_confirmed",
            "import replaces every stored quote request; re-run with --yes to confirm",
            11,
        );
    }

    run_with_context("import", |ctx| async move {
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(error) => {
                return CommandResult::failure(
                    "import",
                    "io",
                    format!("could not read `{}`: {error}", path.display()),
                    12,
                );
            }
        };
        let records = match serde_json::from_str::<Vec<QuoteRecord>>(&raw) {
            Ok(records) => records,
            Err(error) => {
                return CommandResult::failure(
                    "import",
                    "invalid_request",
                    format!("`{}` is not a quote request export: {error}", path.display()),
                    7,
                );
            }
        };

        let count = records.len();
        match ctx.store.replace_all(records).await {
            Ok(()) => CommandResult::success("import", format!("imported {count} quote requests")),
            Err(error) => CommandResult::from_application_error("import", error),
        }
    })
}
