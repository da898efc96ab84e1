//! Card aggregate model.
//!
//! # Responsibility
//! - Define the aggregate root composed of six detail groups plus metadata.
//! - Provide the digit-format validation callers run before persistence.
//!
//! # Invariants
//! - The registry number is derived from the storage id, never stored.
//! - `creation_date` is server-assigned at insert time (epoch milliseconds).
//! - Status transitions are owned by the confirmation ledger, not by writers
//!   of the detail groups.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static CASE_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{15}$").expect("valid case number regex"));
static IIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{12}$").expect("valid iin regex"));

/// Card lifecycle status persisted on the parent row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    /// Initial state, set at creation.
    InWork,
    /// Terminal state written by the confirmation ledger.
    Declined,
    /// Written by the confirmation workflow outside this crate; read-only here.
    Confirmed,
}

impl Default for CardStatus {
    fn default() -> Self {
        Self::InWork
    }
}

/// Validation failures for caller-supplied card input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardValidationError {
    /// Case number must be exactly 15 digits.
    InvalidCaseNumber(String),
    /// The named identification number must be exactly 12 digits.
    InvalidIdentificationNumber {
        field: &'static str,
        value: String,
    },
}

impl Display for CardValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCaseNumber(value) => {
                write!(f, "case number must be 15 digits, got `{value}`")
            }
            Self::InvalidIdentificationNumber { field, value } => {
                write!(f, "{field} must be 12 digits, got `{value}`")
            }
        }
    }
}

impl Error for CardValidationError {}

/// Card metadata owned by the parent row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicInfo {
    /// Public `Z-###` identifier, derived from the storage id.
    pub registry_number: String,
    /// Server-assigned creation timestamp, epoch milliseconds.
    pub creation_date: i64,
    /// Region dictionary code.
    pub region: String,
    pub status: CardStatus,
}

/// Details of the criminal case the summons belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseDetails {
    /// Case number, exactly 15 digits.
    pub case_number: String,
    /// Case registration date, epoch milliseconds.
    pub registration_date: i64,
    pub criminal_code_article: String,
    pub case_decision: String,
    pub case_summary: String,
    pub relation_to_event: String,
}

/// Details of the person invited to the investigative action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonDetails {
    /// Personal identification number of the invitee, exactly 12 digits.
    pub invited_person_iin: String,
    pub invited_person_full_name: String,
    pub invited_person_position: String,
    /// Organization BIN or IIN, exactly 12 digits.
    pub organization_bin_or_iin: String,
    pub workplace: String,
    /// Procedural status of the invitee in the case.
    pub invited_person_status: String,
}

/// Details of the planned investigative action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestigationDetails {
    pub planned_investigative_actions: String,
    /// Scheduled date and time, epoch milliseconds.
    pub scheduled_date_time: i64,
    pub location: String,
    pub type_of_investigation: String,
    pub expected_outcome: String,
}

/// Investigator organizing the action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizerDetails {
    pub investigator: String,
}

/// Business-relation context of the investigation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessDetails {
    pub is_business_related: bool,
    /// BIN or IIN from pension-contribution records.
    pub pension_bin_or_iin: String,
    /// Workplace from pension-contribution records.
    pub pension_workplace: String,
    pub entrepreneur_participation: String,
}

/// Defender of the invited person, when one exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefenderDetails {
    /// Defender identification number, 12 digits when present.
    pub defender_iin: String,
    pub defender_full_name: String,
}

/// Aggregate root exposed to callers.
///
/// Each detail group is persisted in its own table; the aggregate is only
/// ever written as a whole within one transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub basic_info: BasicInfo,
    pub case_details: CaseDetails,
    pub person_details: PersonDetails,
    pub investigation_details: InvestigationDetails,
    pub organizer_details: OrganizerDetails,
    pub business_details: BusinessDetails,
    pub defender_details: DefenderDetails,
}

impl Card {
    /// Checks the digit-format invariants on caller-supplied input.
    ///
    /// The repository layer assumes pre-validated input; services call this
    /// before every insert or update. The defender identification number is
    /// optional and only checked when non-empty.
    pub fn validate(&self) -> Result<(), CardValidationError> {
        if !CASE_NUMBER_RE.is_match(&self.case_details.case_number) {
            return Err(CardValidationError::InvalidCaseNumber(
                self.case_details.case_number.clone(),
            ));
        }
        check_iin(
            "invited_person_iin",
            &self.person_details.invited_person_iin,
        )?;
        check_iin(
            "organization_bin_or_iin",
            &self.person_details.organization_bin_or_iin,
        )?;
        if !self.defender_details.defender_iin.is_empty() {
            check_iin("defender_iin", &self.defender_details.defender_iin)?;
        }
        Ok(())
    }
}

fn check_iin(field: &'static str, value: &str) -> Result<(), CardValidationError> {
    if IIN_RE.is_match(value) {
        Ok(())
    } else {
        Err(CardValidationError::InvalidIdentificationNumber {
            field,
            value: value.to_string(),
        })
    }
}
