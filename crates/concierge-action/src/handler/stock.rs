//! Stock intake, sales and the point of sale.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use concierge_core::records::StockItem;
use concierge_core::types::{Directive, EntityKey, Intent, ProductLine};
use concierge_storage::HotelStore;

use super::{reply, HandlerContext, IntentHandler, Responder};
use crate::directive;
use crate::error::ActionError;

fn require_products(ctx: &HandlerContext) -> Result<&[ProductLine], ActionError> {
    let products = ctx.entities.products();
    if products.is_empty() {
        return Err(ActionError::Validation(
            "Specificați produsele și cantitățile (de ex. „2 cafele”).".to_string(),
        ));
    }
    Ok(products)
}

/// Reads every requested item in one call; any unknown name is an error.
async fn resolve_items<'a>(
    store: &dyn HotelStore,
    products: &'a [ProductLine],
) -> Result<Vec<(&'a ProductLine, StockItem)>, ActionError> {
    let names: Vec<String> = products.iter().map(|p| p.name.clone()).collect();
    let items = store.stock_items(&names).await?;

    let mut resolved = Vec::with_capacity(products.len());
    let mut missing = Vec::new();
    for line in products {
        match items.iter().find(|item| item.name.eq_ignore_ascii_case(&line.name)) {
            Some(item) => resolved.push((line, item.clone())),
            None => missing.push(line.name.as_str()),
        }
    }
    if !missing.is_empty() {
        return Err(ActionError::Lookup(format!(
            "Produse inexistente în stoc: {}.",
            missing.join(", ")
        )));
    }
    Ok(resolved)
}

pub struct AddStockHandler {
    store: Arc<dyn HotelStore>,
}

impl AddStockHandler {
    pub fn new(store: Arc<dyn HotelStore>) -> Self {
        Self { store }
    }

    async fn directive(&self, ctx: &HandlerContext) -> Result<Directive, ActionError> {
        let products = require_products(ctx)?;
        let resolved = resolve_items(self.store.as_ref(), products).await?;

        let items: Vec<_> = resolved
            .iter()
            .map(|(line, item)| {
                json!({
                    "name": item.name,
                    "quantity": line.quantity,
                    "unit": item.unit,
                    "newQuantity": item.quantity + i64::from(line.quantity),
                })
            })
            .collect();
        let summary = resolved
            .iter()
            .map(|(line, item)| format!("{} {} {}", line.quantity, item.unit, item.name))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(directive::confirm(
            ctx.intent,
            "add_stock",
            format!("Adăugați în stoc: {}?", summary),
            json!({ "items": items }),
        ))
    }
}

#[async_trait]
impl IntentHandler for AddStockHandler {
    fn intent(&self) -> Intent {
        Intent::AddStock
    }

    async fn handle(&self, ctx: HandlerContext, responder: Responder) -> Result<(), ActionError> {
        reply(responder, ctx.intent, self.directive(&ctx).await)
    }
}

/// Puts sold items on the point-of-sale ticket after a stock check.
pub struct SellProductHandler {
    store: Arc<dyn HotelStore>,
}

impl SellProductHandler {
    pub fn new(store: Arc<dyn HotelStore>) -> Self {
        Self { store }
    }

    async fn directive(&self, ctx: &HandlerContext) -> Result<Directive, ActionError> {
        let products = require_products(ctx)?;
        let resolved = resolve_items(self.store.as_ref(), products).await?;

        if let Some((line, item)) = resolved
            .iter()
            .find(|(line, item)| i64::from(line.quantity) > item.quantity)
        {
            return Err(ActionError::Validation(format!(
                "Stoc insuficient pentru {}: cerut {}, disponibil {}.",
                item.name, line.quantity, item.quantity
            )));
        }

        let mut total = 0i64;
        let items: Vec<_> = resolved
            .iter()
            .map(|(line, item)| {
                let line_total = item.price * i64::from(line.quantity);
                total += line_total;
                json!({
                    "name": item.name,
                    "quantity": line.quantity,
                    "unitPrice": item.price,
                    "total": line_total,
                })
            })
            .collect();

        Ok(directive::action(
            ctx.intent,
            "pos_add_items",
            json!({ "items": items, "total": total }),
        ))
    }
}

#[async_trait]
impl IntentHandler for SellProductHandler {
    fn intent(&self) -> Intent {
        Intent::SellProduct
    }

    async fn handle(&self, ctx: HandlerContext, responder: Responder) -> Result<(), ActionError> {
        reply(responder, ctx.intent, self.directive(&ctx).await)
    }
}

pub struct ShowStockHandler;

#[async_trait]
impl IntentHandler for ShowStockHandler {
    fn intent(&self) -> Intent {
        Intent::ShowStock
    }

    async fn handle(&self, ctx: HandlerContext, responder: Responder) -> Result<(), ActionError> {
        let filter = ctx.entities.list(EntityKey::StockItems);
        responder.respond(directive::overlay(
            ctx.intent,
            "stock",
            json!({ "filter": filter }),
        ));
        Ok(())
    }
}

pub struct OpenPosHandler;

#[async_trait]
impl IntentHandler for OpenPosHandler {
    fn intent(&self) -> Intent {
        Intent::OpenPos
    }

    async fn handle(&self, ctx: HandlerContext, responder: Responder) -> Result<(), ActionError> {
        responder.respond(directive::overlay(ctx.intent, "pos", json!({})));
        Ok(())
    }
}
