//! Card aggregate repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over the card aggregate spread across six detail tables
//!   plus the parent `cards` row.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Insert/update/delete touch all involved tables inside one immediate
//!   transaction; a failure in any statement rolls the whole operation back.
//! - Delete removes children before the parent; the deferred foreign keys
//!   are checked at commit.
//! - The parent row is the unit of existence: a card exists iff its `cards`
//!   row exists, regardless of orphaned detail rows.
//! - Status writes are owned by the confirmation ledger, never by `update`.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::card::{
    BasicInfo, BusinessDetails, Card, CardStatus, CaseDetails, DefenderDetails,
    InvestigationDetails, OrganizerDetails, PersonDetails,
};
use crate::registry::{decode_registry_number, encode_registry_number, RegistryNumberError};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Column list shared by every full-aggregate read.
pub(crate) const CARD_COLUMNS_SQL: &str = "
    cards.id AS card_id,
    cards.creation_date,
    cards.region,
    cards.status,
    case_details.case_number,
    case_details.registration_date,
    case_details.criminal_code_article,
    case_details.case_decision,
    case_details.case_summary,
    case_details.relation_to_event,
    person_details.invited_person_iin,
    person_details.invited_person_full_name,
    person_details.invited_person_position,
    person_details.organization_bin_or_iin,
    person_details.workplace,
    person_details.invited_person_status,
    investigation_details.planned_investigative_actions,
    investigation_details.scheduled_date_time,
    investigation_details.location,
    investigation_details.type_of_investigation,
    investigation_details.expected_outcome,
    organizer_details.investigator,
    business_details.is_business_related,
    business_details.pension_bin_or_iin,
    business_details.pension_workplace,
    business_details.entrepreneur_participation,
    defender_details.defender_iin,
    defender_details.defender_full_name";

/// Left joins keep a card readable even when a detail row is missing; the
/// missing section reads back as empty fields instead of dropping the card.
pub(crate) const CARD_JOINS_SQL: &str = "
    LEFT JOIN case_details ON cards.case_details_id = case_details.id
    LEFT JOIN person_details ON cards.person_details_id = person_details.id
    LEFT JOIN investigation_details ON cards.investigation_details_id = investigation_details.id
    LEFT JOIN organizer_details ON cards.organizer_details_id = organizer_details.id
    LEFT JOIN business_details ON cards.business_details_id = business_details.id
    LEFT JOIN defender_details ON cards.defender_details_id = defender_details.id";

const CARD_TABLES: [&str; 7] = [
    "cards",
    "case_details",
    "person_details",
    "investigation_details",
    "organizer_details",
    "business_details",
    "defender_details",
];

pub type CardRepoResult<T> = Result<T, CardRepoError>;

/// Errors from card persistence and query operations.
#[derive(Debug)]
pub enum CardRepoError {
    /// Malformed public identifier supplied by the caller.
    InvalidRegistryNumber(RegistryNumberError),
    /// No aggregate exists at the given identifier.
    NotFound(String),
    /// A statement of a multi-table transaction failed; the whole
    /// transaction was rolled back and no partial state is visible.
    PartialWrite {
        table: &'static str,
        source: DbError,
    },
    /// Opaque storage failure (connectivity, constraint, lock timeout).
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for CardRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRegistryNumber(err) => write!(f, "{err}"),
            Self::NotFound(registry_number) => write!(f, "card not found: {registry_number}"),
            Self::PartialWrite { table, source } => {
                write!(f, "card write aborted in `{table}`, rolled back: {source}")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "card repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "card repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "card repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted card data: {message}"),
        }
    }
}

impl Error for CardRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidRegistryNumber(err) => Some(err),
            Self::PartialWrite { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RegistryNumberError> for CardRepoError {
    fn from(value: RegistryNumberError) -> Self {
        Self::InvalidRegistryNumber(value)
    }
}

impl From<DbError> for CardRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for CardRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Server-assigned values returned by a successful insert.
///
/// The caller writes these back onto the card value it already holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertedCard {
    pub registry_number: String,
    pub creation_date: i64,
}

/// Repository interface for card aggregate operations.
pub trait CardRepository {
    /// Creates all seven rows of one aggregate atomically.
    fn insert_card(&mut self, card: &Card) -> CardRepoResult<InsertedCard>;
    /// Loads one aggregate by public registry number.
    fn get_card(&self, registry_number: &str) -> CardRepoResult<Card>;
    /// Lists aggregates in one region; empty result is not an error.
    fn list_cards_by_region(&self, region: &str) -> CardRepoResult<Vec<Card>>;
    /// Rewrites the editable detail sections and the parent region.
    fn update_card(&mut self, registry_number: &str, card: &Card) -> CardRepoResult<()>;
    /// Removes all seven rows of one aggregate atomically.
    fn delete_card(&mut self, registry_number: &str) -> CardRepoResult<()>;
}

/// SQLite-backed card repository.
pub struct SqliteCardRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteCardRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> CardRepoResult<Self> {
        ensure_card_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CardRepository for SqliteCardRepository<'_> {
    fn insert_card(&mut self, card: &Card) -> CardRepoResult<InsertedCard> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let case_id = insert_section(
            &tx,
            "case_details",
            "INSERT INTO case_details (
                case_number,
                registration_date,
                criminal_code_article,
                case_decision,
                case_summary,
                relation_to_event
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                card.case_details.case_number,
                card.case_details.registration_date,
                card.case_details.criminal_code_article,
                card.case_details.case_decision,
                card.case_details.case_summary,
                card.case_details.relation_to_event,
            ],
        )?;

        let person_id = insert_section(
            &tx,
            "person_details",
            "INSERT INTO person_details (
                invited_person_iin,
                invited_person_full_name,
                invited_person_position,
                organization_bin_or_iin,
                workplace,
                invited_person_status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                card.person_details.invited_person_iin,
                card.person_details.invited_person_full_name,
                card.person_details.invited_person_position,
                card.person_details.organization_bin_or_iin,
                card.person_details.workplace,
                card.person_details.invited_person_status,
            ],
        )?;

        let investigation_id = insert_section(
            &tx,
            "investigation_details",
            "INSERT INTO investigation_details (
                planned_investigative_actions,
                scheduled_date_time,
                location,
                type_of_investigation,
                expected_outcome
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                card.investigation_details.planned_investigative_actions,
                card.investigation_details.scheduled_date_time,
                card.investigation_details.location,
                card.investigation_details.type_of_investigation,
                card.investigation_details.expected_outcome,
            ],
        )?;

        let organizer_id = insert_section(
            &tx,
            "organizer_details",
            "INSERT INTO organizer_details (investigator) VALUES (?1);",
            params![card.organizer_details.investigator],
        )?;

        let business_id = insert_section(
            &tx,
            "business_details",
            "INSERT INTO business_details (
                is_business_related,
                pension_bin_or_iin,
                pension_workplace,
                entrepreneur_participation
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                bool_to_int(card.business_details.is_business_related),
                card.business_details.pension_bin_or_iin,
                card.business_details.pension_workplace,
                card.business_details.entrepreneur_participation,
            ],
        )?;

        let defender_id = insert_section(
            &tx,
            "defender_details",
            "INSERT INTO defender_details (defender_iin, defender_full_name) VALUES (?1, ?2);",
            params![
                card.defender_details.defender_iin,
                card.defender_details.defender_full_name,
            ],
        )?;

        let card_id = insert_section(
            &tx,
            "cards",
            "INSERT INTO cards (
                region,
                status,
                case_details_id,
                person_details_id,
                investigation_details_id,
                organizer_details_id,
                business_details_id,
                defender_details_id
            ) VALUES (?1, 'In work', ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                card.basic_info.region,
                case_id,
                person_id,
                investigation_id,
                organizer_id,
                business_id,
                defender_id,
            ],
        )?;

        let creation_date: i64 = tx
            .query_row(
                "SELECT creation_date FROM cards WHERE id = ?1;",
                [card_id],
                |row| row.get(0),
            )
            .map_err(partial("cards"))?;

        tx.commit()?;

        Ok(InsertedCard {
            registry_number: encode_registry_number(card_id),
            creation_date,
        })
    }

    fn get_card(&self, registry_number: &str) -> CardRepoResult<Card> {
        let card_id = decode_registry_number(registry_number)?;

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CARD_COLUMNS_SQL} FROM cards {CARD_JOINS_SQL} WHERE cards.id = ?1;"
        ))?;

        let mut rows = stmt.query([card_id])?;
        if let Some(row) = rows.next()? {
            // The input identifier round-trips verbatim, whatever padding the
            // caller used.
            return parse_card_row(row, registry_number.to_string());
        }

        Err(CardRepoError::NotFound(registry_number.to_string()))
    }

    fn list_cards_by_region(&self, region: &str) -> CardRepoResult<Vec<Card>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CARD_COLUMNS_SQL} FROM cards {CARD_JOINS_SQL} WHERE cards.region = ?1;"
        ))?;

        let mut rows = stmt.query([region])?;
        let mut cards = Vec::new();
        while let Some(row) = rows.next()? {
            let card_id: i64 = row.get("card_id")?;
            cards.push(parse_card_row(row, encode_registry_number(card_id))?);
        }

        Ok(cards)
    }

    fn update_card(&mut self, registry_number: &str, card: &Card) -> CardRepoResult<()> {
        let card_id = decode_registry_number(registry_number)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !card_exists_in_tx(&tx, card_id)? {
            return Err(CardRepoError::NotFound(registry_number.to_string()));
        }

        tx.execute(
            "UPDATE case_details
             SET
                case_number = ?1,
                registration_date = ?2,
                criminal_code_article = ?3,
                case_decision = ?4,
                case_summary = ?5,
                relation_to_event = ?6
             WHERE id = (SELECT case_details_id FROM cards WHERE id = ?7);",
            params![
                card.case_details.case_number,
                card.case_details.registration_date,
                card.case_details.criminal_code_article,
                card.case_details.case_decision,
                card.case_details.case_summary,
                card.case_details.relation_to_event,
                card_id,
            ],
        )
        .map_err(partial("case_details"))?;

        tx.execute(
            "UPDATE person_details
             SET
                invited_person_iin = ?1,
                invited_person_full_name = ?2,
                invited_person_position = ?3,
                organization_bin_or_iin = ?4,
                workplace = ?5,
                invited_person_status = ?6
             WHERE id = (SELECT person_details_id FROM cards WHERE id = ?7);",
            params![
                card.person_details.invited_person_iin,
                card.person_details.invited_person_full_name,
                card.person_details.invited_person_position,
                card.person_details.organization_bin_or_iin,
                card.person_details.workplace,
                card.person_details.invited_person_status,
                card_id,
            ],
        )
        .map_err(partial("person_details"))?;

        tx.execute(
            "UPDATE investigation_details
             SET
                planned_investigative_actions = ?1,
                scheduled_date_time = ?2,
                location = ?3,
                type_of_investigation = ?4,
                expected_outcome = ?5
             WHERE id = (SELECT investigation_details_id FROM cards WHERE id = ?6);",
            params![
                card.investigation_details.planned_investigative_actions,
                card.investigation_details.scheduled_date_time,
                card.investigation_details.location,
                card.investigation_details.type_of_investigation,
                card.investigation_details.expected_outcome,
                card_id,
            ],
        )
        .map_err(partial("investigation_details"))?;

        tx.execute(
            "UPDATE business_details
             SET
                is_business_related = ?1,
                pension_bin_or_iin = ?2,
                pension_workplace = ?3,
                entrepreneur_participation = ?4
             WHERE id = (SELECT business_details_id FROM cards WHERE id = ?5);",
            params![
                bool_to_int(card.business_details.is_business_related),
                card.business_details.pension_bin_or_iin,
                card.business_details.pension_workplace,
                card.business_details.entrepreneur_participation,
                card_id,
            ],
        )
        .map_err(partial("business_details"))?;

        tx.execute(
            "UPDATE defender_details
             SET
                defender_iin = ?1,
                defender_full_name = ?2
             WHERE id = (SELECT defender_details_id FROM cards WHERE id = ?3);",
            params![
                card.defender_details.defender_iin,
                card.defender_details.defender_full_name,
                card_id,
            ],
        )
        .map_err(partial("defender_details"))?;

        // Organizer data is pulled from the investigator's account, never
        // hand-edited, so it stays out of the update path. Status is owned
        // by the confirmation ledger.
        tx.execute(
            "UPDATE cards SET region = ?1 WHERE id = ?2;",
            params![card.basic_info.region, card_id],
        )
        .map_err(partial("cards"))?;

        tx.commit()?;
        Ok(())
    }

    fn delete_card(&mut self, registry_number: &str) -> CardRepoResult<()> {
        let card_id = decode_registry_number(registry_number)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !card_exists_in_tx(&tx, card_id)? {
            return Err(CardRepoError::NotFound(registry_number.to_string()));
        }

        // Children first, parent last; the deferred foreign keys make the
        // intermediate states legal until commit.
        for (table, sql) in [
            (
                "case_details",
                "DELETE FROM case_details
                 WHERE id = (SELECT case_details_id FROM cards WHERE id = ?1);",
            ),
            (
                "person_details",
                "DELETE FROM person_details
                 WHERE id = (SELECT person_details_id FROM cards WHERE id = ?1);",
            ),
            (
                "investigation_details",
                "DELETE FROM investigation_details
                 WHERE id = (SELECT investigation_details_id FROM cards WHERE id = ?1);",
            ),
            (
                "organizer_details",
                "DELETE FROM organizer_details
                 WHERE id = (SELECT organizer_details_id FROM cards WHERE id = ?1);",
            ),
            (
                "business_details",
                "DELETE FROM business_details
                 WHERE id = (SELECT business_details_id FROM cards WHERE id = ?1);",
            ),
            (
                "defender_details",
                "DELETE FROM defender_details
                 WHERE id = (SELECT defender_details_id FROM cards WHERE id = ?1);",
            ),
            ("cards", "DELETE FROM cards WHERE id = ?1;"),
        ] {
            tx.execute(sql, [card_id]).map_err(partial(table))?;
        }

        tx.commit()?;
        Ok(())
    }
}

fn insert_section(
    tx: &Transaction<'_>,
    table: &'static str,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> CardRepoResult<i64> {
    tx.execute(sql, params).map_err(partial(table))?;
    Ok(tx.last_insert_rowid())
}

fn partial(table: &'static str) -> impl FnOnce(rusqlite::Error) -> CardRepoError {
    move |source| CardRepoError::PartialWrite {
        table,
        source: DbError::Sqlite(source),
    }
}

fn card_exists_in_tx(tx: &Transaction<'_>, card_id: i64) -> CardRepoResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM cards WHERE id = ?1);",
        [card_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Converts one joined row into the aggregate read model.
///
/// Detail columns come through left joins and may be NULL when a child row
/// is missing; they read back as empty values so the card is never dropped.
pub(crate) fn parse_card_row(row: &Row<'_>, registry_number: String) -> CardRepoResult<Card> {
    let status_text: String = row.get("status")?;
    let status = parse_card_status(&status_text).ok_or_else(|| {
        CardRepoError::InvalidData(format!("invalid status `{status_text}` in cards.status"))
    })?;

    let is_business_related = match row.get::<_, Option<i64>>("is_business_related")? {
        None | Some(0) => false,
        Some(1) => true,
        Some(other) => {
            return Err(CardRepoError::InvalidData(format!(
                "invalid is_business_related value `{other}` in business_details"
            )));
        }
    };

    Ok(Card {
        basic_info: BasicInfo {
            registry_number,
            creation_date: row.get("creation_date")?,
            region: row.get("region")?,
            status,
        },
        case_details: CaseDetails {
            case_number: text_or_empty(row, "case_number")?,
            registration_date: int_or_zero(row, "registration_date")?,
            criminal_code_article: text_or_empty(row, "criminal_code_article")?,
            case_decision: text_or_empty(row, "case_decision")?,
            case_summary: text_or_empty(row, "case_summary")?,
            relation_to_event: text_or_empty(row, "relation_to_event")?,
        },
        person_details: PersonDetails {
            invited_person_iin: text_or_empty(row, "invited_person_iin")?,
            invited_person_full_name: text_or_empty(row, "invited_person_full_name")?,
            invited_person_position: text_or_empty(row, "invited_person_position")?,
            organization_bin_or_iin: text_or_empty(row, "organization_bin_or_iin")?,
            workplace: text_or_empty(row, "workplace")?,
            invited_person_status: text_or_empty(row, "invited_person_status")?,
        },
        investigation_details: InvestigationDetails {
            planned_investigative_actions: text_or_empty(row, "planned_investigative_actions")?,
            scheduled_date_time: int_or_zero(row, "scheduled_date_time")?,
            location: text_or_empty(row, "location")?,
            type_of_investigation: text_or_empty(row, "type_of_investigation")?,
            expected_outcome: text_or_empty(row, "expected_outcome")?,
        },
        organizer_details: OrganizerDetails {
            investigator: text_or_empty(row, "investigator")?,
        },
        business_details: BusinessDetails {
            is_business_related,
            pension_bin_or_iin: text_or_empty(row, "pension_bin_or_iin")?,
            pension_workplace: text_or_empty(row, "pension_workplace")?,
            entrepreneur_participation: text_or_empty(row, "entrepreneur_participation")?,
        },
        defender_details: DefenderDetails {
            defender_iin: text_or_empty(row, "defender_iin")?,
            defender_full_name: text_or_empty(row, "defender_full_name")?,
        },
    })
}

pub(crate) fn card_status_to_db(status: CardStatus) -> &'static str {
    match status {
        CardStatus::InWork => "In work",
        CardStatus::Declined => "decline",
        CardStatus::Confirmed => "confirm",
    }
}

pub(crate) fn parse_card_status(value: &str) -> Option<CardStatus> {
    match value {
        "In work" => Some(CardStatus::InWork),
        "decline" => Some(CardStatus::Declined),
        "confirm" => Some(CardStatus::Confirmed),
        _ => None,
    }
}

fn text_or_empty(row: &Row<'_>, column: &str) -> Result<String, rusqlite::Error> {
    Ok(row.get::<_, Option<String>>(column)?.unwrap_or_default())
}

fn int_or_zero(row: &Row<'_>, column: &str) -> Result<i64, rusqlite::Error> {
    Ok(row.get::<_, Option<i64>>(column)?.unwrap_or_default())
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_card_connection_ready(conn: &Connection) -> CardRepoResult<()> {
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(CardRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in CARD_TABLES {
        if !table_exists(conn, table)? {
            return Err(CardRepoError::MissingRequiredTable(table));
        }
    }

    for column in [
        "creation_date",
        "region",
        "status",
        "case_details_id",
        "person_details_id",
        "investigation_details_id",
        "organizer_details_id",
        "business_details_id",
        "defender_details_id",
    ] {
        if !table_has_column(conn, "cards", column)? {
            return Err(CardRepoError::MissingRequiredColumn {
                table: "cards",
                column,
            });
        }
    }

    Ok(())
}

pub(crate) fn table_exists(conn: &Connection, table: &str) -> Result<bool, rusqlite::Error> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> Result<bool, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
