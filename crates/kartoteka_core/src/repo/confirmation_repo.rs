//! Confirmation ledger contracts and SQLite implementation.
//!
//! # Responsibility
//! - Record user/card acknowledgements and the card decline transition.
//! - Serve both directions of the association: users per card, cards per
//!   user.
//!
//! # Invariants
//! - One confirmation per (card, user); the schema-level uniqueness makes a
//!   duplicate confirm a storage error.
//! - `decline` is the only status write owned by this crate and is
//!   idempotent at the storage level.

use crate::model::card::{Card, CardStatus};
use crate::model::user::UserSummary;
use crate::registry::{decode_registry_number, encode_registry_number};
use crate::repo::card_repo::{
    card_status_to_db, parse_card_row, CardRepoResult, CARD_COLUMNS_SQL, CARD_JOINS_SQL,
};
use rusqlite::{params, Connection};

/// Repository interface for confirmation ledger operations.
pub trait ConfirmationRepository {
    /// Records that one user acknowledged one card.
    fn confirm(&self, user_id: i64, registry_number: &str) -> CardRepoResult<()>;
    /// Moves one card to the terminal declined status.
    fn decline(&self, card_id: i64) -> CardRepoResult<()>;
    /// Lists the users that confirmed one card; empty is not an error.
    fn users_by_card(&self, registry_number: &str) -> CardRepoResult<Vec<UserSummary>>;
    /// Lists the full aggregates confirmed by one user; empty is not an
    /// error.
    fn cards_by_user(&self, user_email: &str) -> CardRepoResult<Vec<Card>>;
}

/// SQLite-backed confirmation ledger.
pub struct SqliteConfirmationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteConfirmationRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ConfirmationRepository for SqliteConfirmationRepository<'_> {
    fn confirm(&self, user_id: i64, registry_number: &str) -> CardRepoResult<()> {
        let card_id = decode_registry_number(registry_number)?;

        // Unknown card/user or a repeated confirm violates a constraint and
        // surfaces as the opaque storage error, not a classified one.
        self.conn.execute(
            "INSERT INTO card_confirmations (card_id, user_id) VALUES (?1, ?2);",
            params![card_id, user_id],
        )?;
        Ok(())
    }

    fn decline(&self, card_id: i64) -> CardRepoResult<()> {
        self.conn.execute(
            "UPDATE cards SET status = ?1 WHERE id = ?2;",
            params![card_status_to_db(CardStatus::Declined), card_id],
        )?;
        Ok(())
    }

    fn users_by_card(&self, registry_number: &str) -> CardRepoResult<Vec<UserSummary>> {
        let card_id = decode_registry_number(registry_number)?;

        let mut stmt = self.conn.prepare(
            "SELECT users.name, users.surname, users.email
             FROM card_confirmations
             LEFT JOIN users ON users.id = card_confirmations.user_id
             WHERE card_confirmations.card_id = ?1
             ORDER BY users.email ASC;",
        )?;

        let mut rows = stmt.query([card_id])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(UserSummary {
                name: row.get("name")?,
                surname: row.get("surname")?,
                email: row.get("email")?,
            });
        }

        Ok(users)
    }

    fn cards_by_user(&self, user_email: &str) -> CardRepoResult<Vec<Card>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CARD_COLUMNS_SQL}
             FROM card_confirmations
             LEFT JOIN cards ON cards.id = card_confirmations.card_id
             {CARD_JOINS_SQL}
             INNER JOIN users ON card_confirmations.user_id = users.id
             WHERE users.email = ?1;"
        ))?;

        let mut rows = stmt.query([user_email])?;
        let mut cards = Vec::new();
        while let Some(row) = rows.next()? {
            let card_id: i64 = row.get("card_id")?;
            cards.push(parse_card_row(row, encode_registry_number(card_id))?);
        }

        Ok(cards)
    }
}
