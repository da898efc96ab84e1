//! User entity and confirmation-facing projections.
//!
//! # Responsibility
//! - Define the relational user record the confirmation ledger joins against.
//! - Keep authentication concerns (passwords, tokens) out of this crate.
//!
//! # Invariants
//! - `email` is unique across users.
//! - `version` guards updates optimistically; unlike cards, the user entity
//!   rejects concurrent lost updates.

use serde::{Deserialize, Serialize};

/// Input shape for creating a user row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub activated: bool,
}

/// Persisted user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Epoch milliseconds, server-assigned.
    pub created_at: i64,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub activated: bool,
    /// Optimistic-concurrency counter, bumped by every successful update.
    #[serde(skip)]
    pub version: i64,
}

/// Projection returned when listing the users that confirmed a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub name: String,
    pub surname: String,
    pub email: String,
}
