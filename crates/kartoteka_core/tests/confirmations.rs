use kartoteka_core::db::open_db_in_memory;
use kartoteka_core::{
    decode_registry_number, BasicInfo, Card, CardRepoError, CardRepository, CardStatus,
    CaseDetails, ConfirmationRepository, ConfirmationService, NewUser, SqliteCardRepository,
    SqliteConfirmationRepository, SqliteUserRepository, UserRepository,
};
use rusqlite::Connection;

fn sample_card(region: &str, case_number: &str) -> Card {
    Card {
        basic_info: BasicInfo {
            region: region.to_string(),
            ..BasicInfo::default()
        },
        case_details: CaseDetails {
            case_number: case_number.to_string(),
            ..CaseDetails::default()
        },
        ..Card::default()
    }
}

fn new_user(name: &str, surname: &str, email: &str) -> NewUser {
    NewUser {
        name: name.to_string(),
        surname: surname.to_string(),
        email: email.to_string(),
        activated: true,
    }
}

fn insert_card(conn: &mut Connection, region: &str, case_number: &str) -> String {
    let mut repo = SqliteCardRepository::try_new(conn).unwrap();
    repo.insert_card(&sample_card(region, case_number))
        .unwrap()
        .registry_number
}

fn card_status(conn: &Connection, card_id: i64) -> String {
    conn.query_row("SELECT status FROM cards WHERE id = ?1;", [card_id], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn users_by_card_lists_exactly_the_confirming_users() {
    let mut conn = open_db_in_memory().unwrap();
    let registry_number = insert_card(&mut conn, "Almaty", "123456789012345");

    let users = SqliteUserRepository::new(&conn);
    let anna = users
        .insert_user(&new_user("Anna", "Kim", "anna@example.com"))
        .unwrap();
    let bulat = users
        .insert_user(&new_user("Bulat", "Ospanov", "bulat@example.com"))
        .unwrap();
    users
        .insert_user(&new_user("Chingiz", "Aitov", "chingiz@example.com"))
        .unwrap();

    let ledger = SqliteConfirmationRepository::new(&conn);
    ledger.confirm(anna.id, &registry_number).unwrap();
    ledger.confirm(bulat.id, &registry_number).unwrap();

    let confirmed = ledger.users_by_card(&registry_number).unwrap();
    assert_eq!(confirmed.len(), 2);
    assert_eq!(confirmed[0].email, "anna@example.com");
    assert_eq!(confirmed[0].name, "Anna");
    assert_eq!(confirmed[0].surname, "Kim");
    assert_eq!(confirmed[1].email, "bulat@example.com");
}

#[test]
fn users_by_card_is_empty_for_unconfirmed_card() {
    let mut conn = open_db_in_memory().unwrap();
    let registry_number = insert_card(&mut conn, "Almaty", "123456789012345");

    let ledger = SqliteConfirmationRepository::new(&conn);
    assert!(ledger.users_by_card(&registry_number).unwrap().is_empty());
}

#[test]
fn duplicate_confirm_surfaces_as_storage_error() {
    let mut conn = open_db_in_memory().unwrap();
    let registry_number = insert_card(&mut conn, "Almaty", "123456789012345");

    let users = SqliteUserRepository::new(&conn);
    let anna = users
        .insert_user(&new_user("Anna", "Kim", "anna@example.com"))
        .unwrap();

    let ledger = SqliteConfirmationRepository::new(&conn);
    ledger.confirm(anna.id, &registry_number).unwrap();

    let err = ledger.confirm(anna.id, &registry_number).unwrap_err();
    assert!(matches!(err, CardRepoError::Db(_)));

    assert_eq!(ledger.users_by_card(&registry_number).unwrap().len(), 1);
}

#[test]
fn confirm_rejects_malformed_and_unknown_targets() {
    let conn = open_db_in_memory().unwrap();

    let users = SqliteUserRepository::new(&conn);
    let anna = users
        .insert_user(&new_user("Anna", "Kim", "anna@example.com"))
        .unwrap();

    let ledger = SqliteConfirmationRepository::new(&conn);

    let err = ledger.confirm(anna.id, "AB-1").unwrap_err();
    assert!(matches!(err, CardRepoError::InvalidRegistryNumber(_)));

    // Well-formed number, nonexistent card: the foreign key trips and is
    // surfaced opaquely.
    let err = ledger.confirm(anna.id, "Z-404").unwrap_err();
    assert!(matches!(err, CardRepoError::Db(_)));
}

#[test]
fn decline_is_terminal_and_idempotent() {
    let mut conn = open_db_in_memory().unwrap();
    let registry_number = insert_card(&mut conn, "Almaty", "123456789012345");
    let card_id = decode_registry_number(&registry_number).unwrap();

    let ledger = SqliteConfirmationRepository::new(&conn);
    ledger.decline(card_id).unwrap();
    assert_eq!(card_status(&conn, card_id), "decline");

    // Re-declining neither errors nor changes the stored state.
    ledger.decline(card_id).unwrap();
    assert_eq!(card_status(&conn, card_id), "decline");
}

#[test]
fn declined_status_round_trips_through_the_aggregate_read() {
    let mut conn = open_db_in_memory().unwrap();
    let registry_number = insert_card(&mut conn, "Almaty", "123456789012345");
    let card_id = decode_registry_number(&registry_number).unwrap();

    SqliteConfirmationRepository::new(&conn)
        .decline(card_id)
        .unwrap();

    let repo = SqliteCardRepository::try_new(&mut conn).unwrap();
    let loaded = repo.get_card(&registry_number).unwrap();
    assert_eq!(loaded.basic_info.status, CardStatus::Declined);
}

#[test]
fn cards_by_user_returns_full_aggregates_for_that_user_only() {
    let mut conn = open_db_in_memory().unwrap();
    let first = insert_card(&mut conn, "Almaty", "111111111111111");
    let second = insert_card(&mut conn, "Astana", "222222222222222");
    let unrelated = insert_card(&mut conn, "Shymkent", "333333333333333");

    let users = SqliteUserRepository::new(&conn);
    let anna = users
        .insert_user(&new_user("Anna", "Kim", "anna@example.com"))
        .unwrap();
    let bulat = users
        .insert_user(&new_user("Bulat", "Ospanov", "bulat@example.com"))
        .unwrap();

    let ledger = SqliteConfirmationRepository::new(&conn);
    let service = ConfirmationService::new(ledger);
    service.confirm(anna.id, &first).unwrap();
    service.confirm(anna.id, &second).unwrap();
    service.confirm(bulat.id, &unrelated).unwrap();

    let cards = service.cards_by_user("anna@example.com").unwrap();
    assert_eq!(cards.len(), 2);
    let numbers: Vec<&str> = cards
        .iter()
        .map(|card| card.basic_info.registry_number.as_str())
        .collect();
    assert!(numbers.contains(&first.as_str()));
    assert!(numbers.contains(&second.as_str()));
    // The projection carries the full detail groups, not just parent data.
    assert!(cards
        .iter()
        .any(|card| card.case_details.case_number == "111111111111111"));

    assert!(service.cards_by_user("nobody@example.com").unwrap().is_empty());
}

#[test]
fn deleting_a_card_cascades_its_confirmations() {
    let mut conn = open_db_in_memory().unwrap();
    let registry_number = insert_card(&mut conn, "Almaty", "123456789012345");

    let anna = SqliteUserRepository::new(&conn)
        .insert_user(&new_user("Anna", "Kim", "anna@example.com"))
        .unwrap();
    SqliteConfirmationRepository::new(&conn)
        .confirm(anna.id, &registry_number)
        .unwrap();

    {
        let mut repo = SqliteCardRepository::try_new(&mut conn).unwrap();
        repo.delete_card(&registry_number).unwrap();
    }

    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM card_confirmations;", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(remaining, 0);
}
