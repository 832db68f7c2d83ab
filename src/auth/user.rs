//! Registered users and the `users` table.

use std::fmt::Display;

use rusqlite::{Connection, OptionalExtension, ToSql, params};

use crate::{
    auth::password::{PasswordHash, ValidatedPassword},
    form::{FormData, FormSchema, ValidationError},
    mutation::Record,
};

/// The shortest username accepted at registration, in characters.
pub const MIN_USERNAME_LENGTH: usize = 4;

/// The opaque id of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(String);

impl UserId {
    /// Wrap an id read from the database or the session cookie.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as stored in the `users` table.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user as stored in the database.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub password_hash: PasswordHash,
}

/// The validated fields of the registration form.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub email: String,
    pub username: String,
    pub password: ValidatedPassword,
}

impl FormSchema for Registration {
    fn parse(form: &FormData) -> Result<Self, ValidationError> {
        Ok(Self {
            email: form.email("email")?,
            username: form.min_length("username", MIN_USERNAME_LENGTH)?,
            password: ValidatedPassword::from_field(form, "password")?,
        })
    }
}

/// A registration whose password has been hashed, ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: PasswordHash,
}

impl Record for NewUser {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &["email", "name", "password"];

    fn params(&self) -> Vec<&dyn ToSql> {
        params![self.email, self.name, self.password_hash].to_vec()
    }
}

pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            password TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Look up a user by email address.
///
/// # Errors
///
/// Returns the underlying SQL error if the query fails. An unknown email is `Ok(None)`.
pub fn get_user_by_email(
    email: &str,
    connection: &Connection,
) -> Result<Option<User>, rusqlite::Error> {
    connection
        .query_row(
            "SELECT id, email, name, password FROM users WHERE email = ?1",
            [email],
            |row| {
                Ok(User {
                    id: UserId::new(row.get::<_, String>(0)?),
                    email: row.get(1)?,
                    name: row.get(2)?,
                    password_hash: row.get(3)?,
                })
            },
        )
        .optional()
}

#[cfg(test)]
mod registration_tests {
    use crate::form::{Expected, FormData, FormSchema, ValidationError};

    use super::Registration;

    #[test]
    fn accepts_valid_registration() {
        let form = FormData::from([
            ("email", "ada@example.com"),
            ("username", "ada_l"),
            ("password", "hunter22"),
        ]);

        let registration = Registration::parse(&form).unwrap();

        assert_eq!(registration.email, "ada@example.com");
        assert_eq!(registration.username, "ada_l");
    }

    #[test]
    fn rejects_three_character_username() {
        let form = FormData::from([
            ("email", "ada@example.com"),
            ("username", "ada"),
            ("password", "hunter22"),
        ]);

        assert_eq!(
            Registration::parse(&form),
            Err(ValidationError::new("username", Expected::MinLength(4)))
        );
    }

    #[test]
    fn rejects_malformed_email() {
        let form = FormData::from([
            ("email", "ada-at-example"),
            ("username", "ada_l"),
            ("password", "hunter22"),
        ]);

        assert_eq!(
            Registration::parse(&form),
            Err(ValidationError::new("email", Expected::Email))
        );
    }

    #[test]
    fn rejects_short_password() {
        let form = FormData::from([
            ("email", "ada@example.com"),
            ("username", "ada_l"),
            ("password", "abc"),
        ]);

        assert_eq!(
            Registration::parse(&form),
            Err(ValidationError::new("password", Expected::MinLength(6)))
        );
    }
}

#[cfg(test)]
mod user_table_tests {
    use rusqlite::Connection;

    use crate::auth::password::PasswordHash;

    use super::{create_user_table, get_user_by_email};

    #[test]
    fn get_user_by_email_finds_inserted_user() {
        let connection = Connection::open_in_memory().unwrap();
        create_user_table(&connection).unwrap();
        connection
            .execute(
                "INSERT INTO users (id, email, name, password) VALUES ('u-1', 'a@b.c', 'Abcd', 'hash')",
                (),
            )
            .unwrap();

        let user = get_user_by_email("a@b.c", &connection).unwrap().unwrap();

        assert_eq!(user.id.as_str(), "u-1");
        assert_eq!(user.password_hash, PasswordHash::new_unchecked("hash"));
        assert_eq!(get_user_by_email("x@y.z", &connection).unwrap(), None);
    }
}
