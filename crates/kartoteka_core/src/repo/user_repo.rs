//! User repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist the relational user records the confirmation ledger joins
//!   against.
//! - Keep authentication concerns out of the storage contract.
//!
//! # Invariants
//! - `email` is unique; a duplicate insert is classified, not opaque.
//! - Updates are guarded by the `version` counter; a stale write is an
//!   edit conflict, never a silent overwrite.

use crate::db::DbError;
use crate::model::user::{NewUser, User, UserSummary};
use rusqlite::{params, Connection, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type UserRepoResult<T> = Result<T, UserRepoError>;

/// Errors from user persistence and query operations.
#[derive(Debug)]
pub enum UserRepoError {
    /// A user with this email already exists.
    DuplicateEmail(String),
    /// No user at the given email.
    NotFound(String),
    /// The row changed since it was read; the update was not applied.
    EditConflict,
    /// Opaque storage failure.
    Db(DbError),
}

impl Display for UserRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateEmail(email) => write!(f, "duplicate email: {email}"),
            Self::NotFound(email) => write!(f, "user not found: {email}"),
            Self::EditConflict => write!(f, "edit conflict"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for UserRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for UserRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for UserRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for user records.
pub trait UserRepository {
    /// Creates one user and returns the persisted row.
    fn insert_user(&self, user: &NewUser) -> UserRepoResult<User>;
    /// Loads one user by unique email.
    fn get_user_by_email(&self, email: &str) -> UserRepoResult<User>;
    /// Applies a version-guarded update and returns the new version.
    fn update_user(&self, user: &User) -> UserRepoResult<i64>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn insert_user(&self, user: &NewUser) -> UserRepoResult<User> {
        self.conn
            .execute(
                "INSERT INTO users (name, surname, email, activated) VALUES (?1, ?2, ?3, ?4);",
                params![
                    user.name,
                    user.surname,
                    user.email,
                    bool_to_int(user.activated),
                ],
            )
            .map_err(|err| classify_unique_email(err, &user.email))?;

        let id = self.conn.last_insert_rowid();
        let (created_at, version): (i64, i64) = self.conn.query_row(
            "SELECT created_at, version FROM users WHERE id = ?1;",
            [id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(User {
            id,
            created_at,
            name: user.name.clone(),
            surname: user.surname.clone(),
            email: user.email.clone(),
            activated: user.activated,
            version,
        })
    }

    fn get_user_by_email(&self, email: &str) -> UserRepoResult<User> {
        let mut stmt = self.conn.prepare(
            "SELECT id, created_at, name, surname, email, activated, version
             FROM users
             WHERE email = ?1;",
        )?;

        let mut rows = stmt.query([email])?;
        if let Some(row) = rows.next()? {
            return Ok(User {
                id: row.get("id")?,
                created_at: row.get("created_at")?,
                name: row.get("name")?,
                surname: row.get("surname")?,
                email: row.get("email")?,
                activated: row.get::<_, i64>("activated")? != 0,
                version: row.get("version")?,
            });
        }

        Err(UserRepoError::NotFound(email.to_string()))
    }

    fn update_user(&self, user: &User) -> UserRepoResult<i64> {
        let changed = self
            .conn
            .execute(
                "UPDATE users
                 SET
                    name = ?1,
                    surname = ?2,
                    email = ?3,
                    activated = ?4,
                    version = version + 1
                 WHERE id = ?5 AND version = ?6;",
                params![
                    user.name,
                    user.surname,
                    user.email,
                    bool_to_int(user.activated),
                    user.id,
                    user.version,
                ],
            )
            .map_err(|err| classify_unique_email(err, &user.email))?;

        if changed == 0 {
            return Err(UserRepoError::EditConflict);
        }

        Ok(user.version + 1)
    }
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            surname: user.surname.clone(),
            email: user.email.clone(),
        }
    }
}

fn classify_unique_email(err: rusqlite::Error, email: &str) -> UserRepoError {
    if is_unique_violation(&err, "users.email") {
        UserRepoError::DuplicateEmail(email.to_string())
    } else {
        UserRepoError::Db(DbError::Sqlite(err))
    }
}

fn is_unique_violation(err: &rusqlite::Error, needle: &str) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(code, Some(message))
            if code.code == ErrorCode::ConstraintViolation && message.contains(needle)
    )
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
