use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::domain::identity::{is_plausible_email, Identity};

#[derive(Debug)]
pub enum Credentials {
    SignUp {
        email: String,
        password: SecretString,
        first_name: String,
        last_name: String,
        captcha_confirmed: bool,
    },
    SignIn {
        email: String,
        password: SecretString,
    },
    Google,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("email address `{0}` is not valid")]
    InvalidEmail(String),
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("the captcha must be confirmed before creating an account")]
    CaptchaRequired,
}

/// Capability that turns submitted credentials into an identity.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credentials: Credentials) -> Result<Identity, AuthError>;
}

/// Accepts any well-formed credentials without verifying them.
///
/// This mirrors a demo sign-up form; swap in a real provider before relying
/// on identities for anything that matters.
#[derive(Clone, Debug, Default)]
pub struct MockAuthenticator;

pub const GOOGLE_DEMO_EMAIL: &str = "user@google.com";

#[async_trait]
impl Authenticator for MockAuthenticator {
    async fn authenticate(&self, credentials: Credentials) -> Result<Identity, AuthError> {
        match credentials {
            Credentials::SignUp { email, password, first_name, last_name, captcha_confirmed } => {
                let email = require_email(email)?;
                require_password(&password)?;
                if first_name.trim().is_empty() {
                    return Err(AuthError::MissingField("first_name"));
                }
                if !captcha_confirmed {
                    return Err(AuthError::CaptchaRequired);
                }
                Ok(Identity::new(email, first_name.trim(), last_name.trim()))
            }
            Credentials::SignIn { email, password } => {
                let email = require_email(email)?;
                require_password(&password)?;
                let first_name = first_name_from_email(&email);
                Ok(Identity::new(email, first_name, ""))
            }
            Credentials::Google => Ok(Identity::new(GOOGLE_DEMO_EMAIL, "Utilisateur", "Google")),
        }
    }
}

fn require_email(email: String) -> Result<String, AuthError> {
    let email = email.trim().to_owned();
    if email.is_empty() {
        return Err(AuthError::MissingField("email"));
    }
    if !is_plausible_email(&email) {
        return Err(AuthError::InvalidEmail(email));
    }
    Ok(email)
}

fn require_password(password: &SecretString) -> Result<(), AuthError> {
    if password.expose_secret().is_empty() {
        return Err(AuthError::MissingField("password"));
    }
    Ok(())
}

fn first_name_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let first = local.split(['.', '_', '-', '+']).next().unwrap_or_default();
    let mut chars = first.chars();
    match chars.next() {
        Some(initial) => initial.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
