//! Accounts, sessions and the guards that keep the dashboard private.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod provider;
mod register;
mod user;

pub use cookie::DEFAULT_COOKIE_DURATION;
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{auth_guard, auth_guard_hx};
pub use password::{PasswordHash, ValidatedPassword};
pub use provider::{
    AuthErrorKind, CredentialsProvider, IdentityProvider, SignInError, SignInOutcome,
    authenticate,
};
pub use register::{get_register_page, register_user};
pub use user::{User, UserId, create_user_table};

#[cfg(test)]
pub(crate) use cookie::COOKIE_USER_ID;
