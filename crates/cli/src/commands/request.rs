use clap::Args;
use hakata_core::auth::MockAuthenticator;
use hakata_core::domain::quote::{QuoteCategory, QuoteRequestForm};
use hakata_core::submission::{SubmissionCoordinator, SubmissionOutcome};

use crate::commands::context::run_with_context;
use crate::commands::session::AuthArgs;
use crate::commands::CommandResult;

#[derive(Debug, Clone, Args)]
pub struct RequestArgs {
    #[arg(long, help = "Category slug or catalogue label, e.g. `video-surveillance`")]
    pub category: String,
    #[arg(long)]
    pub company: String,
    #[arg(long, default_value = "", help = "Defaults to the signed-in email")]
    pub contact_email: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long)]
    pub description: String,
    #[command(flatten)]
    pub auth: AuthArgs,
}

pub fn run(args: RequestArgs) -> CommandResult {
    let Some(category) = QuoteCategory::parse(&args.category) else {
        let known: Vec<&str> = QuoteCategory::ALL.iter().map(QuoteCategory::as_str).collect();
        return CommandResult::failure(
            "request",
            "invalid_request",
            format!("unknown category `{}` (expected one of {})", args.category, known.join("|")),
            7,
        );
    };

    let form = QuoteRequestForm {
        category: Some(category),
        company_name: args.company,
        contact_email: args.contact_email,
        contact_phone: args.phone,
        description: args.description,
    };
    let auth = args.auth;

    run_with_context("request", |ctx| async move {
        if !auth.is_empty() {
            match ctx.session.current().await {
                Ok(Some(identity)) => {
                    return CommandResult::failure(
                        "request",
                        "invalid_request",
                        format!(
                            "already signed in as {}; drop the sign-in flags or log out first",
                            identity.email
                        ),
                        7,
                    );
                }
                Ok(None) => {}
                Err(error) => return CommandResult::from_application_error("request", error),
            }
        }

        let coordinator = SubmissionCoordinator::new(ctx.store.clone(), ctx.session.clone());
        let outcome = match coordinator.submit(form).await {
            Ok(outcome) => outcome,
            Err(error) => return CommandResult::from_application_error("request", error),
        };

        let record = match outcome {
            SubmissionOutcome::Created(record) => record,
            SubmissionOutcome::AuthenticationRequired if auth.is_empty() => {
                coordinator.cancel_authentication();
                return CommandResult::failure(
                    "request",
                    "authentication_required",
                    "sign in or create an account to send this request \
                     (re-run with --email/--password, --sign-up, or --google)",
                    6,
                );
            }
            SubmissionOutcome::AuthenticationRequired => {
                let credentials = auth.into_credentials();
                match coordinator.authenticate_and_complete(&MockAuthenticator, credentials).await {
                    Ok(Some(record)) => record,
                    Ok(None) => {
                        return CommandResult::failure(
                            "request",
                            "internal",
                            "authentication completed without a parked request",
                            9,
                        );
                    }
                    Err(error) => return CommandResult::from_application_error("request", error),
                }
            }
        };

        CommandResult::success_with_data(
            "request",
            format!("quote request {} created", record.id()),
            &record,
        )
    })
}
