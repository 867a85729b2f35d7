use hakata_core::domain::quote::QuoteId;
use hakata_core::navigation::Page;
use hakata_core::views::{Confirmation, DeleteOutcome, ProfileView};
use serde_json::json;

use crate::commands::context::run_with_context;
use crate::commands::CommandResult;

const SIGNED_OUT: &str = "sign in to see your quote requests";

/// With no current request the profile follows its "new request" call to
/// action, and the shell reports the quote request page as the next page.
pub fn overview() -> CommandResult {
    run_with_context("profile", |mut ctx| async move {
        ctx.shell.navigate(Page::Profile);
        let view = ProfileView::new(ctx.store, ctx.session).with_signals(ctx.signals);
        let (identity, projection) = match view.overview().await {
            Ok(Some(overview)) => overview,
            Ok(None) => {
                return CommandResult::failure("profile", "authentication_required", SIGNED_OUT, 6);
            }
            Err(error) => return CommandResult::from_application_error("profile", error),
        };

        if projection.current.is_empty() {
            view.request_new_quote();
        }
        let page = ctx.shell.process_signals();

        CommandResult::success_with_data(
            "profile",
            format!(
                "{} current and {} archived requests for {}",
                projection.current.len(),
                projection.archived.len(),
                identity.display_name()
            ),
            json!({
                "identity": identity,
                "current": projection.current,
                "archived": projection.archived,
                "page": page,
            }),
        )
    })
}

pub fn archive(id: String) -> CommandResult {
    run_with_context("archive", |ctx| async move {
        let view = ProfileView::new(ctx.store, ctx.session);
        match view.archive(&QuoteId(id.clone())).await {
            Ok(Some(record)) => CommandResult::success_with_data(
                "archive",
                format!("quote request {} archived", record.id()),
                &record,
            ),
            Ok(None) => CommandResult::not_found("archive", &id),
            Err(error) => CommandResult::from_application_error("archive", error),
        }
    })
}

pub fn delete(id: String, confirmed: bool) -> CommandResult {
    run_with_context("delete", |ctx| async move {
        let view = ProfileView::new(ctx.store, ctx.session);
        let outcome = view.delete(&QuoteId(id.clone()), Confirmation::from_flag(confirmed)).await;
        delete_result("delete", &id, outcome)
    })
}

/// Shared by the profile and admin delete commands.
pub(crate) fn delete_result(
    command: &str,
    id: &str,
    outcome: Result<DeleteOutcome, hakata_core::ApplicationError>,
) -> CommandResult {
    match outcome {
        Ok(DeleteOutcome::Deleted(record)) => CommandResult::success_with_data(
            command,
            format!("quote request {} deleted", record.id()),
            &record,
        ),
        Ok(DeleteOutcome::NotConfirmed) => CommandResult::failure(
            command,
            "not_confirmed",
            "deletion is permanent; re-run with --yes to confirm",
            11,
        ),
        Ok(DeleteOutcome::NotFound) => CommandResult::not_found(command, id),
        Err(error) => CommandResult::from_application_error(command, error),
    }
}
