//! Sign-in through an identity provider and the messages shown when it fails.

use rusqlite::Connection;

use crate::{
    Error,
    auth::user::{UserId, get_user_by_email},
    form::FormData,
};

/// The name of the built-in email and password provider.
pub const CREDENTIALS_PROVIDER: &str = "credentials";

/// Shown when the provider rejected the submitted credentials.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials.";
/// Shown for every other provider failure.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong.";

/// Why a provider refused a sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthErrorKind {
    /// The credentials did not match a user.
    #[error("CredentialsSignin")]
    CredentialsSignin,
    /// The provider refused the user.
    #[error("AccessDenied")]
    AccessDenied,
    /// The provider failed while checking the credentials.
    #[error("CallbackRouteError")]
    CallbackRouteError,
    /// The provider is missing or misconfigured.
    #[error("Configuration")]
    Configuration,
}

/// A failed sign-in.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum SignInError {
    /// The provider categorised the failure.
    #[error("sign-in failed: {0}")]
    Provider(AuthErrorKind),
    /// Something other than the provider failed.
    #[error(transparent)]
    Other(#[from] Error),
}

/// Verifies submitted credentials on behalf of the log-in endpoint.
pub trait IdentityProvider {
    /// Check `credentials` with the provider named `provider`.
    ///
    /// # Errors
    ///
    /// Returns [SignInError::Provider] when the provider refuses the sign-in
    /// and [SignInError::Other] for anything unexpected.
    fn sign_in(&self, provider: &str, credentials: &FormData) -> Result<UserId, SignInError>;
}

/// What the log-in form should do after an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    /// The provider accepted the credentials of this user.
    SignedIn(UserId),
    /// The attempt failed with a message to show next to the form.
    Rejected(&'static str),
}

/// Sign in with the credentials provider and map categorised failures to a
/// user-facing message.
///
/// # Errors
///
/// Failures the provider did not categorise are returned unchanged.
pub fn authenticate(
    provider: &impl IdentityProvider,
    credentials: &FormData,
) -> Result<SignInOutcome, Error> {
    match provider.sign_in(CREDENTIALS_PROVIDER, credentials) {
        Ok(user_id) => Ok(SignInOutcome::SignedIn(user_id)),
        Err(SignInError::Provider(AuthErrorKind::CredentialsSignin)) => {
            Ok(SignInOutcome::Rejected(INVALID_CREDENTIALS_MESSAGE))
        }
        Err(SignInError::Provider(kind)) => {
            tracing::warn!("sign-in failed with {kind}");
            Ok(SignInOutcome::Rejected(GENERIC_FAILURE_MESSAGE))
        }
        Err(SignInError::Other(error)) => Err(error),
    }
}

/// Checks an email and password against the `users` table.
pub struct CredentialsProvider<'a> {
    /// The database holding the `users` table.
    pub connection: &'a Connection,
}

impl IdentityProvider for CredentialsProvider<'_> {
    fn sign_in(&self, provider: &str, credentials: &FormData) -> Result<UserId, SignInError> {
        if provider != CREDENTIALS_PROVIDER {
            tracing::error!("no identity provider named {provider:?}");
            return Err(SignInError::Provider(AuthErrorKind::Configuration));
        }

        let (Some(email), Some(password)) = (credentials.get("email"), credentials.get("password"))
        else {
            return Err(SignInError::Provider(AuthErrorKind::CredentialsSignin));
        };

        let user = get_user_by_email(email, self.connection)
            .map_err(Error::from)?
            .ok_or(SignInError::Provider(AuthErrorKind::CredentialsSignin))?;

        match user.password_hash.verify(password) {
            Ok(true) => Ok(user.id),
            Ok(false) => Err(SignInError::Provider(AuthErrorKind::CredentialsSignin)),
            Err(error) => {
                tracing::error!("could not verify password for {}: {error}", user.id);
                Err(SignInError::Provider(AuthErrorKind::CallbackRouteError))
            }
        }
    }
}
