use clap::Subcommand;
use hakata_core::domain::quote::{QuoteId, QuoteRecord, QuoteStatus};
use hakata_core::errors::ApplicationError;
use hakata_core::views::{AdminView, Confirmation, QuoteFilter};

use crate::commands::context::run_with_context;
use crate::commands::profile::delete_result;
use crate::commands::CommandResult;

#[derive(Debug, Clone, Subcommand)]
pub enum AdminCommand {
    #[command(about = "List quote requests, optionally filtered by status and search text")]
    List {
        #[arg(long, help = "pending|approved|rejected|archived")]
        status: Option<String>,
        #[arg(long, default_value = "", help = "Matches company, email or category")]
        search: String,
    },
    #[command(about = "Show totals per status and category, plus the approval rate")]
    Metrics,
    #[command(about = "Approve a pending request")]
    Approve { id: String },
    #[command(about = "Reject a pending request")]
    Reject { id: String },
    #[command(about = "Archive a request")]
    Archive { id: String },
    #[command(about = "Move an archived request back to pending (needs lifecycle.allow_unarchive)")]
    Reopen { id: String },
    #[command(about = "Permanently delete a request")]
    Delete {
        id: String,
        #[arg(long, help = "Confirm the deletion")]
        yes: bool,
    },
}

pub fn run(command: AdminCommand) -> CommandResult {
    match command {
        AdminCommand::List { status, search } => list(status, search),
        AdminCommand::Metrics => metrics(),
        AdminCommand::Approve { id } => transition("admin.approve", id, QuoteStatus::Approved),
        AdminCommand::Reject { id } => transition("admin.reject", id, QuoteStatus::Rejected),
        AdminCommand::Archive { id } => transition("admin.archive", id, QuoteStatus::Archived),
        AdminCommand::Reopen { id } => transition("admin.reopen", id, QuoteStatus::Pending),
        AdminCommand::Delete { id, yes } => delete(id, yes),
    }
}

fn list(status: Option<String>, search: String) -> CommandResult {
    let status = match status.as_deref().map(|value| (value, QuoteStatus::parse(value))) {
        None => None,
        Some((_, Some(status))) => Some(status),
        Some((value, None)) => {
            return CommandResult::failure(
                "admin.list",
                "invalid_request",
                format!("unknown status `{value}` (expected pending|approved|rejected|archived)"),
                7,
            );
        }
    };
    let filter = QuoteFilter { status, search };

    run_with_context("admin.list", |ctx| async move {
        match AdminView::new(ctx.store).list(&filter).await {
            Ok(records) => CommandResult::success_with_data(
                "admin.list",
                format!("{} quote requests", records.len()),
                &records,
            ),
            Err(error) => CommandResult::from_application_error("admin.list", error),
        }
    })
}

fn metrics() -> CommandResult {
    run_with_context("admin.metrics", |ctx| async move {
        match AdminView::new(ctx.store).metrics().await {
            Ok(metrics) => CommandResult::success_with_data(
                "admin.metrics",
                format!(
                    "{} requests, {}% approved",
                    metrics.total, metrics.approval_rate_pct
                ),
                &metrics,
            ),
            Err(error) => CommandResult::from_application_error("admin.metrics", error),
        }
    })
}

fn transition(command: &'static str, id: String, to: QuoteStatus) -> CommandResult {
    run_with_context(command, |ctx| async move {
        let view = AdminView::new(ctx.store);
        let quote_id = QuoteId(id.clone());
        let outcome: Result<Option<QuoteRecord>, ApplicationError> = match to {
            QuoteStatus::Approved => view.approve(&quote_id).await,
            QuoteStatus::Rejected => view.reject(&quote_id).await,
            QuoteStatus::Archived => view.archive(&quote_id).await,
            QuoteStatus::Pending => view.reopen(&quote_id).await,
        };

        match outcome {
            Ok(Some(record)) => CommandResult::success_with_data(
                command,
                format!("quote request {} is now {}", record.id(), record.status().as_str()),
                &record,
            ),
            Ok(None) => CommandResult::not_found(command, &id),
            Err(error) => CommandResult::from_application_error(command, error),
        }
    })
}

fn delete(id: String, confirmed: bool) -> CommandResult {
    run_with_context("admin.delete", |ctx| async move {
        let view = AdminView::new(ctx.store);
        let outcome = view.delete(&QuoteId(id.clone()), Confirmation::from_flag(confirmed)).await;
        delete_result("admin.delete", &id, outcome)
    })
}
