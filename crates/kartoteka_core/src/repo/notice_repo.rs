//! Summons notice projection repository.
//!
//! # Responsibility
//! - Serve the narrow read model consumed by document rendering.
//! - Keep the projection on the same registry-number decode as every other
//!   card read path.
//!
//! # Invariants
//! - Read-only; never touches card state.

use crate::model::notice::Notice;
use crate::registry::decode_registry_number;
use crate::repo::card_repo::{CardRepoError, CardRepoResult};
use rusqlite::Connection;

/// Repository interface for the notice projection.
pub trait NoticeRepository {
    /// Loads the rendering projection for one card.
    fn get_notice(&self, registry_number: &str) -> CardRepoResult<Notice>;
}

/// SQLite-backed notice projection repository.
pub struct SqliteNoticeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoticeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NoticeRepository for SqliteNoticeRepository<'_> {
    fn get_notice(&self, registry_number: &str) -> CardRepoResult<Notice> {
        let card_id = decode_registry_number(registry_number)?;

        let mut stmt = self.conn.prepare(
            "SELECT
                case_details.case_number,
                person_details.invited_person_full_name,
                investigation_details.scheduled_date_time,
                investigation_details.location,
                case_details.criminal_code_article,
                organizer_details.investigator,
                case_details.relation_to_event
             FROM cards
             JOIN case_details ON cards.case_details_id = case_details.id
             JOIN person_details ON cards.person_details_id = person_details.id
             JOIN investigation_details ON cards.investigation_details_id = investigation_details.id
             JOIN organizer_details ON cards.organizer_details_id = organizer_details.id
             WHERE cards.id = ?1;",
        )?;

        let mut rows = stmt.query([card_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Notice {
                case_number: row.get("case_number")?,
                recipient_full_name: row.get("invited_person_full_name")?,
                scheduled_date_time: row.get("scheduled_date_time")?,
                location: row.get("location")?,
                criminal_code_article: row.get("criminal_code_article")?,
                investigator: row.get("investigator")?,
                relation_to_event: row.get("relation_to_event")?,
            });
        }

        Err(CardRepoError::NotFound(registry_number.to_string()))
    }
}
