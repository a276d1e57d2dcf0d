//! New, modified and cancelled reservations.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use concierge_core::records::Reservation;
use concierge_core::types::{Directive, EntityKey, Intent};
use concierge_storage::HotelStore;

use super::{insert_text, reply, stay_fields, HandlerContext, IntentHandler, Responder};
use crate::directive;
use crate::error::ActionError;

/// Opens the reservation form prefilled from the message.
pub struct ReservationHandler {
    store: Arc<dyn HotelStore>,
}

impl ReservationHandler {
    pub fn new(store: Arc<dyn HotelStore>) -> Self {
        Self { store }
    }

    async fn directive(&self, ctx: &HandlerContext) -> Result<Directive, ActionError> {
        let range = ctx.require_dates("rezervare")?;
        let mut fields = stay_fields(range);

        if let Some(number) = ctx.entities.text(EntityKey::RoomNumber) {
            let room = self
                .store
                .room(number)
                .await?
                .ok_or_else(|| ActionError::Lookup(format!("Camera {} nu există.", number)))?;
            fields.insert("roomNumber".into(), json!(room.number));
            fields.insert("roomType".into(), json!(room.room_type));
        } else {
            insert_text(&mut fields, "roomType", &ctx.entities, EntityKey::RoomType);
        }
        insert_text(&mut fields, "guestName", &ctx.entities, EntityKey::Name);
        insert_text(&mut fields, "phone", &ctx.entities, EntityKey::Phone);
        fields.insert(
            "preferences".into(),
            json!(ctx.entities.list(EntityKey::Preferences)),
        );

        Ok(directive::overlay(
            ctx.intent,
            "open_reservation_form",
            Value::Object(fields),
        ))
    }
}

#[async_trait]
impl IntentHandler for ReservationHandler {
    fn intent(&self) -> Intent {
        Intent::Reservation
    }

    async fn handle(&self, ctx: HandlerContext, responder: Responder) -> Result<(), ActionError> {
        reply(responder, ctx.intent, self.directive(&ctx).await)
    }
}

/// Finds the reservation a message refers to by room and date.
async fn lookup_reservation(
    store: &dyn HotelStore,
    ctx: &HandlerContext,
    what: &str,
) -> Result<Reservation, ActionError> {
    let room = ctx.require_text(
        EntityKey::RoomNumber,
        &format!("Specificați camera pentru {}.", what),
    )?;
    let date = ctx.require_dates(what)?.start_date;
    store.reservation_for(room, date).await?.ok_or_else(|| {
        ActionError::Lookup(format!(
            "Nu există nicio rezervare activă în camera {} pe {}.",
            room, date
        ))
    })
}

/// Opens the edit form for an existing reservation.
pub struct ModifyReservationHandler {
    store: Arc<dyn HotelStore>,
}

impl ModifyReservationHandler {
    pub fn new(store: Arc<dyn HotelStore>) -> Self {
        Self { store }
    }

    async fn directive(&self, ctx: &HandlerContext) -> Result<Directive, ActionError> {
        let reservation = lookup_reservation(self.store.as_ref(), ctx, "modificare").await?;

        // A second date range, if given, is the requested new stay.
        let requested = ctx
            .entities
            .dates()
            .get(1)
            .map(|range| Value::Object(stay_fields(range)))
            .unwrap_or(Value::Null);

        Ok(directive::overlay(
            ctx.intent,
            "edit_reservation",
            json!({ "reservation": reservation, "requested": requested }),
        ))
    }
}

#[async_trait]
impl IntentHandler for ModifyReservationHandler {
    fn intent(&self) -> Intent {
        Intent::ModifyReservation
    }

    async fn handle(&self, ctx: HandlerContext, responder: Responder) -> Result<(), ActionError> {
        reply(responder, ctx.intent, self.directive(&ctx).await)
    }
}

/// Asks for confirmation before cancelling.
pub struct CancelReservationHandler {
    store: Arc<dyn HotelStore>,
}

impl CancelReservationHandler {
    pub fn new(store: Arc<dyn HotelStore>) -> Self {
        Self { store }
    }

    async fn directive(&self, ctx: &HandlerContext) -> Result<Directive, ActionError> {
        let reservation = lookup_reservation(self.store.as_ref(), ctx, "anulare").await?;
        let message = format!(
            "Anulați rezervarea lui {} din camera {} ({} - {})?",
            reservation.guest_name,
            reservation.room_number,
            reservation.start_date,
            reservation.end_date
        );
        Ok(directive::confirm(
            ctx.intent,
            "cancel_reservation",
            message,
            json!({
                "reservationId": reservation.id,
                "roomNumber": reservation.room_number,
                "guestName": reservation.guest_name,
            }),
        ))
    }
}

#[async_trait]
impl IntentHandler for CancelReservationHandler {
    fn intent(&self) -> Intent {
        Intent::CancelReservation
    }

    async fn handle(&self, ctx: HandlerContext, responder: Responder) -> Result<(), ActionError> {
        reply(responder, ctx.intent, self.directive(&ctx).await)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use chrono::NaiveDate;
    use concierge_core::types::{DateRange, DirectiveType};
    use concierge_storage::{NewReservation, ReservationCommand, ReservationDesk};

    async fn store_with_booking() -> Arc<dyn HotelStore> {
        let store = store();
        store
            .apply(ReservationCommand::Create(NewReservation {
                room_number: "305".into(),
                guest_name: "Maria Popescu".into(),
                phone: None,
                start_date: date(2025, 5, 10),
                end_date: date(2025, 5, 14),
            }))
            .await
            .unwrap();
        store
    }

    fn stay(start: NaiveDate, end: NaiveDate) -> DateRange {
        DateRange::new(start, end)
    }

    // ---- Reservation tests ----

    #[tokio::test]
    async fn test_reservation_opens_prefilled_form() {
        let handler = ReservationHandler::new(dyn_store());
        let entities = with_text(
            with_text(
                with_dates(bag(), stay(date(2025, 4, 16), date(2025, 4, 18))),
                EntityKey::Name,
                "Andrei Anton",
            ),
            EntityKey::RoomType,
            "dubla",
        );
        let d = run(&handler, entities).await;
        assert_eq!(d.kind, DirectiveType::Overlay);
        assert_eq!(d.action.as_deref(), Some("open_reservation_form"));
        let payload = d.payload.unwrap();
        assert_eq!(payload["startDate"], "2025-04-16");
        assert_eq!(payload["endDate"], "2025-04-18");
        assert_eq!(payload["guestName"], "Andrei Anton");
        assert_eq!(payload["roomType"], "dubla");
    }

    #[tokio::test]
    async fn test_single_date_books_one_night() {
        let handler = ReservationHandler::new(dyn_store());
        let entities = with_dates(bag(), DateRange::single(date(2025, 5, 12)));
        let payload = run(&handler, entities).await.payload.unwrap();
        assert_eq!(payload["endDate"], "2025-05-13");
        assert_eq!(payload["nights"], 1);
    }

    #[tokio::test]
    async fn test_reservation_requires_dates() {
        let handler = ReservationHandler::new(dyn_store());
        let message = run_rejected(&handler, with_text(bag(), EntityKey::Name, "Ion Pop")).await;
        assert!(message.contains("rezervare"));
    }

    #[tokio::test]
    async fn test_reservation_checks_room_exists() {
        let handler = ReservationHandler::new(dyn_store());
        let entities = with_text(
            with_dates(bag(), DateRange::single(date(2025, 5, 12))),
            EntityKey::RoomNumber,
            "999",
        );
        let message = run_rejected(&handler, entities).await;
        assert_eq!(message, "Camera 999 nu există.");

        let entities = with_text(
            with_dates(bag(), DateRange::single(date(2025, 5, 12))),
            EntityKey::RoomNumber,
            "305",
        );
        let payload = run(&handler, entities).await.payload.unwrap();
        assert_eq!(payload["roomType"], "apartament");
    }

    // ---- Modify / cancel tests ----

    #[tokio::test]
    async fn test_cancel_confirms_found_reservation() {
        let handler = CancelReservationHandler::new(store_with_booking().await);
        let entities = with_text(
            with_dates(bag(), DateRange::single(date(2025, 5, 12))),
            EntityKey::RoomNumber,
            "305",
        );
        let d = run(&handler, entities).await;
        assert_eq!(d.kind, DirectiveType::Confirm);
        assert_eq!(d.action.as_deref(), Some("cancel_reservation"));
        assert!(d.message.unwrap().contains("Maria Popescu"));
    }

    #[tokio::test]
    async fn test_cancel_without_match_is_lookup_error() {
        let handler = CancelReservationHandler::new(store_with_booking().await);
        let entities = with_text(
            with_dates(bag(), DateRange::single(date(2025, 6, 1))),
            EntityKey::RoomNumber,
            "305",
        );
        let message = run_rejected(&handler, entities).await;
        assert!(message.contains("Nu există nicio rezervare"));
    }

    #[tokio::test]
    async fn test_modify_requires_room() {
        let handler = ModifyReservationHandler::new(store_with_booking().await);
        let entities = with_dates(bag(), DateRange::single(date(2025, 5, 12)));
        let message = run_rejected(&handler, entities).await;
        assert!(message.contains("camera"));
    }

    #[tokio::test]
    async fn test_modify_opens_edit_form() {
        let handler = ModifyReservationHandler::new(store_with_booking().await);
        let entities = with_text(
            with_dates(bag(), DateRange::single(date(2025, 5, 11))),
            EntityKey::RoomNumber,
            "305",
        );
        let d = run(&handler, entities).await;
        assert_eq!(d.action.as_deref(), Some("edit_reservation"));
        let payload = d.payload.unwrap();
        assert_eq!(payload["reservation"]["guestName"], "Maria Popescu");
        assert!(payload["requested"].is_null());
    }
}
