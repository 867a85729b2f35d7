use clap::Args;
use hakata_core::auth::{Authenticator, Credentials, MockAuthenticator};
use secrecy::SecretString;

use crate::commands::context::run_with_context;
use crate::commands::CommandResult;

/// Credentials accepted by `login`, and by `request` only when nobody is signed in.
#[derive(Debug, Clone, Default, Args)]
pub struct AuthArgs {
    #[arg(long, help = "Account email")]
    pub email: Option<String>,
    #[arg(long, help = "Account password (not verified)")]
    pub password: Option<String>,
    #[arg(long, help = "First name, required with --sign-up")]
    pub first_name: Option<String>,
    #[arg(long, help = "Last name")]
    pub last_name: Option<String>,
    #[arg(long, help = "Create an account instead of signing in")]
    pub sign_up: bool,
    #[arg(long, help = "Confirm the anti-robot checkbox of the sign-up form")]
    pub captcha: bool,
    #[arg(
        long,
        conflicts_with_all = ["email", "password", "sign_up"],
        help = "Continue with the demo Google account"
    )]
    pub google: bool,
}

impl AuthArgs {
    pub fn is_empty(&self) -> bool {
        !self.google && self.email.is_none()
    }

    pub fn into_credentials(self) -> Credentials {
        if self.google {
            return Credentials::Google;
        }

        let email = self.email.unwrap_or_default();
        let password = SecretString::from(self.password.unwrap_or_default());
        if self.sign_up {
            Credentials::SignUp {
                email,
                password,
                first_name: self.first_name.unwrap_or_default(),
                last_name: self.last_name.unwrap_or_default(),
                captcha_confirmed: self.captcha,
            }
        } else {
            Credentials::SignIn { email, password }
        }
    }
}

pub fn login(args: AuthArgs) -> CommandResult {
    if args.is_empty() {
        return CommandResult::failure(
            "login",
            "invalid_request",
            "pass --email and --password, or --google",
            7,
        );
    }

    run_with_context("login", |ctx| async move {
        let identity = match MockAuthenticator.authenticate(args.into_credentials()).await {
            Ok(identity) => identity,
            Err(error) => return CommandResult::from_application_error("login", error.into()),
        };
        if let Err(error) = ctx.session.start(identity.clone()).await {
            return CommandResult::from_application_error("login", error);
        }

        CommandResult::success_with_data(
            "login",
            format!("signed in as {}", identity.display_name()),
            &identity,
        )
    })
}

pub fn logout() -> CommandResult {
    run_with_context("logout", |ctx| async move {
        match ctx.session.end().await {
            Ok(()) => CommandResult::success("logout", "signed out"),
            Err(error) => CommandResult::from_application_error("logout", error),
        }
    })
}

pub fn whoami() -> CommandResult {
    run_with_context("whoami", |ctx| async move {
        match ctx.session.current().await {
            Ok(Some(identity)) => CommandResult::success_with_data(
                "whoami",
                format!("signed in as {}", identity.display_name()),
                &identity,
            ),
            Ok(None) => CommandResult::success("whoami", "not signed in"),
            Err(error) => CommandResult::from_application_error("whoami", error),
        }
    })
}
