use kartoteka_core::{BasicInfo, Card, CardStatus, CaseDetails};

#[test]
fn card_serializes_with_snake_case_sections() {
    let card = Card {
        basic_info: BasicInfo {
            registry_number: "Z-007".to_string(),
            creation_date: 1_700_000_000_000,
            region: "Almaty".to_string(),
            status: CardStatus::InWork,
        },
        case_details: CaseDetails {
            case_number: "123456789012345".to_string(),
            ..CaseDetails::default()
        },
        ..Card::default()
    };

    let json = serde_json::to_value(&card).unwrap();
    assert_eq!(json["basic_info"]["registry_number"], "Z-007");
    assert_eq!(json["basic_info"]["status"], "in_work");
    assert_eq!(json["case_details"]["case_number"], "123456789012345");
    assert_eq!(json["business_details"]["is_business_related"], false);
}

#[test]
fn card_round_trips_through_json() {
    let mut card = Card::default();
    card.basic_info.region = "Astana".to_string();
    card.basic_info.status = CardStatus::Declined;
    card.person_details.invited_person_full_name = "Aidar Bekov".to_string();

    let json = serde_json::to_string(&card).unwrap();
    let back: Card = serde_json::from_str(&json).unwrap();
    assert_eq!(back, card);
}

#[test]
fn default_status_is_in_work() {
    assert_eq!(Card::default().basic_info.status, CardStatus::InWork);
}
