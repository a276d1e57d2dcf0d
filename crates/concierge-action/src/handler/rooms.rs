//! Availability, calendar and room problem reports.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use concierge_core::types::{Directive, EntityKey, Intent};
use concierge_storage::HotelStore;

use super::{
    insert_text, period_fields, reply, stay_fields, HandlerContext, IntentHandler, Responder,
};
use crate::directive;
use crate::error::ActionError;

pub struct CheckAvailabilityHandler;

fn availability(ctx: &HandlerContext) -> Result<Directive, ActionError> {
    let range = ctx.require_dates("verificarea disponibilității")?;
    let mut fields = stay_fields(range);
    insert_text(&mut fields, "roomType", &ctx.entities, EntityKey::RoomType);
    insert_text(&mut fields, "roomNumber", &ctx.entities, EntityKey::RoomNumber);
    Ok(directive::action(
        ctx.intent,
        "show_availability",
        Value::Object(fields),
    ))
}

#[async_trait]
impl IntentHandler for CheckAvailabilityHandler {
    fn intent(&self) -> Intent {
        Intent::CheckAvailability
    }

    async fn handle(&self, ctx: HandlerContext, responder: Responder) -> Result<(), ActionError> {
        reply(responder, ctx.intent, availability(&ctx))
    }
}

pub struct ShowCalendarHandler;

#[async_trait]
impl IntentHandler for ShowCalendarHandler {
    fn intent(&self) -> Intent {
        Intent::ShowCalendar
    }

    async fn handle(&self, ctx: HandlerContext, responder: Responder) -> Result<(), ActionError> {
        let fields = period_fields(&ctx.entities);
        responder.respond(directive::action(
            ctx.intent,
            "show_calendar",
            Value::Object(fields),
        ));
        Ok(())
    }
}

/// Confirms a maintenance report for an existing room.
pub struct RoomProblemHandler {
    store: Arc<dyn HotelStore>,
}

impl RoomProblemHandler {
    pub fn new(store: Arc<dyn HotelStore>) -> Self {
        Self { store }
    }

    async fn directive(&self, ctx: &HandlerContext) -> Result<Directive, ActionError> {
        let number = ctx.require_text(
            EntityKey::RoomNumber,
            "Specificați camera în care este problema.",
        )?;
        let description = ctx.require_text(
            EntityKey::ProblemDescription,
            "Descrieți problema (de ex. „problemă 301 frigider stricat”).",
        )?;

        let room = self
            .store
            .room(number)
            .await?
            .ok_or_else(|| ActionError::Lookup(format!("Camera {} nu există.", number)))?;

        Ok(directive::confirm(
            ctx.intent,
            "report_problem",
            format!("Raportați problema din camera {}: {}?", room.number, description),
            json!({
                "roomNumber": room.number,
                "floor": room.floor,
                "description": description,
            }),
        ))
    }
}

#[async_trait]
impl IntentHandler for RoomProblemHandler {
    fn intent(&self) -> Intent {
        Intent::RoomProblem
    }

    async fn handle(&self, ctx: HandlerContext, responder: Responder) -> Result<(), ActionError> {
        reply(responder, ctx.intent, self.directive(&ctx).await)
    }
}
