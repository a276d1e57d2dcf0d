//! Intent handler trait and the per-intent implementations.
//!
//! A handler validates its entities first, performs at most one store read,
//! and answers through a [`Responder`], which it consumes. Missing entities and
//! failed lookups are answered with an error directive by the handler itself;
//! only unexpected failures are returned as `Err`.

pub mod billing;
pub mod conversation;
pub mod reservation;
pub mod rooms;
pub mod stock;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::sync::oneshot;
use tracing::debug;

use concierge_core::types::{DateRange, Directive, EntityBag, EntityKey, Intent};

use crate::directive;
use crate::error::ActionError;

/// Everything a handler may look at.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    pub intent: Intent,
    pub entities: EntityBag,
    pub extra_intents: Vec<Intent>,
}

impl HandlerContext {
    pub fn new(intent: Intent, entities: EntityBag, extra_intents: Vec<Intent>) -> Self {
        Self {
            intent,
            entities,
            extra_intents,
        }
    }

    pub fn first_dates(&self) -> Option<&DateRange> {
        self.entities.dates().first()
    }

    pub(crate) fn require_dates(&self, what: &str) -> Result<&DateRange, ActionError> {
        self.first_dates().ok_or_else(|| {
            ActionError::Validation(format!("Specificați data pentru {}.", what))
        })
    }

    pub(crate) fn require_text(&self, key: EntityKey, message: &str) -> Result<&str, ActionError> {
        self.entities
            .text(key)
            .ok_or_else(|| ActionError::Validation(message.to_string()))
    }
}

/// One-shot reply channel for a handler.
#[derive(Debug)]
pub struct Responder {
    tx: oneshot::Sender<Directive>,
}

impl Responder {
    pub fn channel() -> (Self, oneshot::Receiver<Directive>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    pub fn respond(self, directive: Directive) {
        if self.tx.send(directive).is_err() {
            debug!("Directive receiver dropped before response");
        }
    }
}

#[async_trait]
pub trait IntentHandler: Send + Sync {
    fn intent(&self) -> Intent;

    async fn handle(&self, ctx: HandlerContext, responder: Responder) -> Result<(), ActionError>;
}

/// Deliver a handler outcome. `Validation` and `Lookup` become an error
/// directive sent through `responder`; every other error is returned.
pub(crate) fn reply(
    responder: Responder,
    intent: Intent,
    outcome: Result<Directive, ActionError>,
) -> Result<(), ActionError> {
    match outcome {
        Ok(directive) => {
            responder.respond(directive);
            Ok(())
        }
        Err(ActionError::Validation(message)) | Err(ActionError::Lookup(message)) => {
            debug!(intent = %intent, reason = %message, "Request rejected");
            responder.respond(directive::error(intent, message));
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// `startDate`/`endDate` fields for a stay, checkout defaulted to one night.
pub(crate) fn stay_fields(range: &DateRange) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("startDate".into(), json!(range.start_date));
    fields.insert("endDate".into(), json!(range.end_or_next_day()));
    fields.insert("nights".into(), json!(range.nights()));
    fields
}

/// Optional period fields, exactly as extracted.
pub(crate) fn period_fields(entities: &EntityBag) -> Map<String, Value> {
    let mut fields = Map::new();
    if let Some(range) = entities.dates().first() {
        fields.insert("startDate".into(), json!(range.start_date));
        if let Some(end) = range.end_date {
            fields.insert("endDate".into(), json!(end));
        }
    }
    fields
}

pub(crate) fn insert_text(fields: &mut Map<String, Value>, name: &str, entities: &EntityBag, key: EntityKey) {
    if let Some(value) = entities.text(key) {
        fields.insert(name.into(), json!(value));
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use concierge_core::types::{
        DateRange, EntityBag, EntityData, EntityKey, EntityValue, ExtractorKind, ProductLine,
    };
    use concierge_storage::{seed_demo_data, Database, HotelStore, SqliteHotelStore};

    use super::*;

    pub fn store() -> Arc<SqliteHotelStore> {
        let db = Arc::new(Database::in_memory().unwrap());
        seed_demo_data(db.clone()).unwrap();
        Arc::new(SqliteHotelStore::new(db))
    }

    pub fn dyn_store() -> Arc<dyn HotelStore> {
        store()
    }

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn bag() -> EntityBag {
        EntityBag::new()
    }

    pub fn with_text(mut bag: EntityBag, key: EntityKey, value: &str) -> EntityBag {
        bag.insert(key, EntityValue::text(value, 0.9, ExtractorKind::Room));
        bag
    }

    pub fn with_dates(mut bag: EntityBag, range: DateRange) -> EntityBag {
        bag.insert(
            EntityKey::Dates,
            EntityValue::new(EntityData::Dates(vec![range]), 0.95, ExtractorKind::Date),
        );
        bag
    }

    pub fn with_products(mut bag: EntityBag, lines: &[(&str, u32)]) -> EntityBag {
        let lines = lines
            .iter()
            .map(|(name, quantity)| ProductLine {
                name: name.to_string(),
                quantity: *quantity,
            })
            .collect();
        bag.insert(
            EntityKey::Products,
            EntityValue::new(EntityData::Products(lines), 0.85, ExtractorKind::Product),
        );
        bag
    }

    /// Run `handler` directly; it must finish `Ok` and answer through its
    /// responder.
    pub async fn run(handler: &dyn IntentHandler, entities: EntityBag) -> Directive {
        let (responder, rx) = Responder::channel();
        let ctx = HandlerContext::new(handler.intent(), entities, Vec::new());
        handler
            .handle(ctx, responder)
            .await
            .expect("handler returned an error instead of responding");
        rx.await.expect("handler finished without responding")
    }

    /// Run `handler` and return the message of the error directive it sent.
    pub async fn run_rejected(handler: &dyn IntentHandler, entities: EntityBag) -> String {
        let directive = run(handler, entities).await;
        assert!(directive.is_error(), "expected an error directive: {:?}", directive);
        assert_eq!(directive.intent, handler.intent());
        directive.message.expect("error directive without a message")
    }
}
