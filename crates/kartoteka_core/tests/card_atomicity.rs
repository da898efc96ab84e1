use kartoteka_core::db::open_db_in_memory;
use kartoteka_core::{
    BasicInfo, Card, CardRepoError, CardRepository, CaseDetails, SqliteCardRepository,
};
use rusqlite::Connection;

const DETAIL_TABLES: [&str; 6] = [
    "case_details",
    "person_details",
    "investigation_details",
    "organizer_details",
    "business_details",
    "defender_details",
];

fn sample_card() -> Card {
    Card {
        basic_info: BasicInfo {
            region: "Almaty".to_string(),
            ..BasicInfo::default()
        },
        case_details: CaseDetails {
            case_number: "123456789012345".to_string(),
            ..CaseDetails::default()
        },
        ..Card::default()
    }
}

fn table_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn failing_parent_insert_rolls_back_all_child_rows() {
    let mut conn = open_db_in_memory().unwrap();
    // Force the seventh insert (the parent row) to fail after all six
    // children succeeded.
    conn.execute_batch(
        "CREATE TRIGGER block_cards_insert BEFORE INSERT ON cards
         BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
    )
    .unwrap();

    {
        let mut repo = SqliteCardRepository::try_new(&mut conn).unwrap();
        let err = repo.insert_card(&sample_card()).unwrap_err();
        assert!(matches!(
            err,
            CardRepoError::PartialWrite { table: "cards", .. }
        ));
    }

    assert_eq!(table_count(&conn, "cards"), 0);
    for table in DETAIL_TABLES {
        assert_eq!(table_count(&conn, table), 0, "orphaned rows in {table}");
    }
}

#[test]
fn failing_last_child_insert_rolls_back_earlier_children() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TRIGGER block_defender_insert BEFORE INSERT ON defender_details
         BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
    )
    .unwrap();

    {
        let mut repo = SqliteCardRepository::try_new(&mut conn).unwrap();
        let err = repo.insert_card(&sample_card()).unwrap_err();
        assert!(matches!(
            err,
            CardRepoError::PartialWrite {
                table: "defender_details",
                ..
            }
        ));
    }

    assert_eq!(table_count(&conn, "cards"), 0);
    for table in DETAIL_TABLES {
        assert_eq!(table_count(&conn, table), 0, "orphaned rows in {table}");
    }
}

#[test]
fn insert_succeeds_after_a_rolled_back_attempt() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TRIGGER block_cards_insert BEFORE INSERT ON cards
         BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
    )
    .unwrap();

    {
        let mut repo = SqliteCardRepository::try_new(&mut conn).unwrap();
        repo.insert_card(&sample_card()).unwrap_err();
    }

    conn.execute_batch("DROP TRIGGER block_cards_insert;").unwrap();

    let mut repo = SqliteCardRepository::try_new(&mut conn).unwrap();
    let inserted = repo.insert_card(&sample_card()).unwrap();
    let loaded = repo.get_card(&inserted.registry_number).unwrap();
    assert_eq!(loaded.basic_info.region, "Almaty");
}

#[test]
fn failing_detail_delete_keeps_the_aggregate_intact() {
    let mut conn = open_db_in_memory().unwrap();

    let registry_number = {
        let mut repo = SqliteCardRepository::try_new(&mut conn).unwrap();
        repo.insert_card(&sample_card()).unwrap().registry_number
    };

    conn.execute_batch(
        "CREATE TRIGGER block_person_delete BEFORE DELETE ON person_details
         BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
    )
    .unwrap();

    {
        let mut repo = SqliteCardRepository::try_new(&mut conn).unwrap();
        let err = repo.delete_card(&registry_number).unwrap_err();
        assert!(matches!(
            err,
            CardRepoError::PartialWrite {
                table: "person_details",
                ..
            }
        ));

        // The aborted delete left the whole aggregate readable.
        let loaded = repo.get_card(&registry_number).unwrap();
        assert_eq!(loaded.case_details.case_number, "123456789012345");
    }

    assert_eq!(table_count(&conn, "cards"), 1);
    for table in DETAIL_TABLES {
        assert_eq!(table_count(&conn, table), 1, "missing rows in {table}");
    }
}
