//! Invoices and reports.

use async_trait::async_trait;
use serde_json::Value;

use concierge_core::types::{Directive, EntityKey, Intent};

use super::{insert_text, period_fields, reply, HandlerContext, IntentHandler, Responder};
use crate::directive;
use crate::error::ActionError;

/// Starts an invoice for a named guest or a room.
pub struct CreateInvoiceHandler;

fn invoice(ctx: &HandlerContext) -> Result<Directive, ActionError> {
    let entities = &ctx.entities;
    if !entities.contains(EntityKey::Name) && !entities.contains(EntityKey::RoomNumber) {
        return Err(ActionError::Validation(
            "Specificați clientul sau camera pentru factură.".to_string(),
        ));
    }

    let mut fields = period_fields(entities);
    insert_text(&mut fields, "guestName", entities, EntityKey::Name);
    insert_text(&mut fields, "roomNumber", entities, EntityKey::RoomNumber);
    insert_text(&mut fields, "phone", entities, EntityKey::Phone);
    Ok(directive::action(
        ctx.intent,
        "create_invoice",
        Value::Object(fields),
    ))
}

#[async_trait]
impl IntentHandler for CreateInvoiceHandler {
    fn intent(&self) -> Intent {
        Intent::CreateInvoice
    }

    async fn handle(&self, ctx: HandlerContext, responder: Responder) -> Result<(), ActionError> {
        reply(responder, ctx.intent, invoice(&ctx))
    }
}

pub struct ShowInvoicesHandler;

#[async_trait]
impl IntentHandler for ShowInvoicesHandler {
    fn intent(&self) -> Intent {
        Intent::ShowInvoices
    }

    async fn handle(&self, ctx: HandlerContext, responder: Responder) -> Result<(), ActionError> {
        let mut fields = period_fields(&ctx.entities);
        insert_text(&mut fields, "guestName", &ctx.entities, EntityKey::Name);
        insert_text(&mut fields, "roomNumber", &ctx.entities, EntityKey::RoomNumber);
        responder.respond(directive::action(
            ctx.intent,
            "show_invoices",
            Value::Object(fields),
        ));
        Ok(())
    }
}

pub struct ShowReportsHandler;

#[async_trait]
impl IntentHandler for ShowReportsHandler {
    fn intent(&self) -> Intent {
        Intent::ShowReports
    }

    async fn handle(&self, ctx: HandlerContext, responder: Responder) -> Result<(), ActionError> {
        responder.respond(directive::action(
            ctx.intent,
            "show_reports",
            Value::Object(period_fields(&ctx.entities)),
        ));
        Ok(())
    }
}
