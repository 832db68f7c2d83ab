//! Defines functions for handling user authentication with cookies.
//!
//! The session lives in a single private (encrypted) cookie whose value is
//! `<user id>.<expiry as a unix timestamp>`. The browser's expiry is not trusted;
//! the timestamp inside the encrypted value is checked on every request.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::auth::user::UserId;

pub(crate) const COOKIE_USER_ID: &str = "user_id";
/// The default duration for which auth cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::hours(1);

/// Add an auth cookie to the cookie jar, indicating that a user is logged in and authenticated.
///
/// The session expires `duration` from now.
pub fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: &UserId,
    duration: Duration,
) -> PrivateCookieJar {
    let expiry = OffsetDateTime::now_utc() + duration;

    jar.add(
        Cookie::build((
            COOKIE_USER_ID,
            format!("{user_id}.{}", expiry.unix_timestamp()),
        ))
        .expires(expiry)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(true),
    )
}

/// Set the auth cookie to an invalid value and set its max age to zero, which should delete the cookie on the client side.
pub fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_USER_ID, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// The signed-in user, if the jar holds an unexpired session.
pub fn get_user_id_from_auth_cookie(jar: &PrivateCookieJar) -> Option<UserId> {
    let cookie = jar.get(COOKIE_USER_ID)?;
    let (user_id, expiry) = cookie.value_trimmed().rsplit_once('.')?;
    let expiry = expiry
        .parse::<i64>()
        .ok()
        .and_then(|timestamp| OffsetDateTime::from_unix_timestamp(timestamp).ok())?;

    if expiry <= OffsetDateTime::now_utc() || user_id.is_empty() {
        return None;
    }

    Some(UserId::new(user_id))
}
