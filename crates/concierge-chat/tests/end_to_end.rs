//! End-to-end interpreter scenarios: raw text in, interpretation and
//! directive out, backed by a seeded in-memory database.

use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate};

use concierge_chat::Interpreter;
use concierge_core::config::ConciergeConfig;
use concierge_core::types::{DateRange, DirectiveType, EntityKey, Intent, ResolutionSource};
use concierge_nlu::{FixedMemoryProbe, MemoryProbe};
use concierge_storage::{seed_demo_data, Database, SqliteHotelStore};

fn interpreter(probe: Arc<dyn MemoryProbe>) -> Interpreter {
    let db = Arc::new(Database::in_memory().unwrap());
    seed_demo_data(db.clone()).unwrap();
    Interpreter::new(
        &ConciergeConfig::default(),
        Arc::new(SqliteHotelStore::new(db)),
        probe,
    )
}

fn relaxed() -> Interpreter {
    interpreter(Arc::new(FixedMemoryProbe::new(0.1)))
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_reservation_shorthand() {
    let outcome = relaxed()
        .respond("rezervare Andrei Anton dubla 16-18 apr")
        .await;
    let interpretation = &outcome.interpretation;
    let year = Local::now().year();

    assert_eq!(interpretation.intent, Intent::Reservation);
    assert_eq!(interpretation.entities.text(EntityKey::RoomType), Some("dubla"));
    assert_eq!(
        interpretation.entities.dates()[0],
        DateRange::new(
            NaiveDate::from_ymd_opt(year, 4, 16).unwrap(),
            NaiveDate::from_ymd_opt(year, 4, 18).unwrap()
        )
    );
    assert_eq!(interpretation.extra_intents, vec![Intent::ShowCalendar]);

    let json = serde_json::to_value(interpretation).unwrap();
    assert_eq!(json["extraIntents"], serde_json::json!(["show_calendar"]));
    assert_eq!(json["entities"]["dates"]["value"][0]["startDate"], format!("{}-04-16", year));

    assert_eq!(outcome.directive.kind, DirectiveType::Overlay);
    assert_eq!(
        outcome.directive.action.as_deref(),
        Some("open_reservation_form")
    );
    assert_eq!(
        outcome.directive.payload.as_ref().unwrap()["guestName"],
        "Andrei Anton"
    );
}

#[tokio::test]
async fn test_room_problem_report() {
    let outcome = relaxed().respond("problema 301 frigider stricat").await;
    let entities = &outcome.interpretation.entities;

    assert_eq!(outcome.interpretation.intent, Intent::RoomProblem);
    assert_eq!(entities.text(EntityKey::RoomNumber), Some("301"));
    assert!(entities
        .text(EntityKey::ProblemDescription)
        .unwrap()
        .contains("frigider stricat"));
    assert_eq!(outcome.directive.kind, DirectiveType::Confirm);
    assert_eq!(outcome.directive.action.as_deref(), Some("report_problem"));
}

#[tokio::test]
async fn test_gibberish_gets_rephrase_chat() {
    let outcome = relaxed().respond("asdkjhasd").await;

    assert_eq!(outcome.interpretation.intent, Intent::Unknown);
    assert_eq!(outcome.directive.kind, DirectiveType::Chat);
    let suggestions = outcome.directive.payload.unwrap()["suggestions"]
        .as_array()
        .cloned()
        .unwrap();
    assert!(!suggestions.is_empty());
}

#[tokio::test]
async fn test_diacritics_and_case_do_not_matter() {
    let interpreter = relaxed();
    let plain = interpreter.interpret("problema 301 frigider stricat").await;
    let accented = interpreter.interpret("PROBLEMĂ 301 frigider stricat").await;
    assert_eq!(plain.intent, accented.intent);
    assert_eq!(plain.normalized, accented.normalized);
}

#[tokio::test]
async fn test_sale_opens_point_of_sale() {
    let outcome = relaxed().respond("vinde 2 cafele si 1 bere").await;
    assert_eq!(outcome.interpretation.intent, Intent::SellProduct);
    assert_eq!(outcome.interpretation.extra_intents, vec![Intent::OpenPos]);
    assert_eq!(outcome.directive.action.as_deref(), Some("pos_add_items"));
    assert_eq!(outcome.directive.payload.unwrap()["total"], 3000);
}

#[tokio::test]
async fn test_missing_entities_give_error_directive() {
    let outcome = relaxed().respond("anuleaza rezervarea lui ion").await;
    assert_eq!(outcome.interpretation.intent, Intent::CancelReservation);
    assert_eq!(
        outcome.interpretation.entities.text(EntityKey::Name),
        Some("Ion")
    );
    assert!(outcome.directive.is_error());
    assert_ne!(
        outcome.directive.message.as_deref(),
        Some(concierge_action::registry::FAILURE_MESSAGE)
    );
}

// =============================================================================
// Memory pressure
// =============================================================================

#[tokio::test]
async fn test_critical_memory_resolves_reservation_without_classifier() {
    let interpreter = interpreter(Arc::new(FixedMemoryProbe::new(0.97)));
    let interpretation = interpreter
        .interpret("rezervare Andrei Anton dubla 16-18 apr")
        .await;

    assert_eq!(interpretation.intent, Intent::Reservation);
    assert_eq!(interpretation.source, ResolutionSource::Degraded);
    assert!(interpretation.degraded);
    assert_eq!(interpreter.classifier_invocations(), 0);
}

#[tokio::test]
async fn test_identical_input_resolves_once() {
    let interpreter = relaxed();
    let first = interpreter.interpret("vreau sa rezerv o camera").await;
    let second = interpreter.interpret("vreau sa rezerv o camera").await;
    assert_eq!(first.intent, second.intent);
    assert_eq!(interpreter.stats().cascade_evaluations, 1);
}
