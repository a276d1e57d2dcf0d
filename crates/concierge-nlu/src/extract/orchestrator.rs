//! Per-intent extractor plans.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};

use concierge_core::types::{ExtractorKind, Intent};
use concierge_storage::HotelStore;

use super::{contact, dates, product, room, EntityBag};

/// Extractors that run for `intent`, in merge order.
pub fn extractor_plan(intent: Intent) -> &'static [ExtractorKind] {
    use ExtractorKind::*;
    match intent {
        Intent::Reservation | Intent::ModifyReservation | Intent::CancelReservation => {
            &[Date, Room, Contact]
        }
        Intent::CheckAvailability | Intent::ShowCalendar => &[Date, Room],
        Intent::RoomProblem => &[Room],
        Intent::CreateInvoice | Intent::ShowInvoices => &[Date, Room, Contact],
        Intent::AddStock | Intent::SellProduct => &[Product, StockCatalog],
        Intent::ShowStock => &[StockCatalog],
        Intent::ShowReports => &[Date],
        Intent::OpenPos | Intent::Help | Intent::Greeting | Intent::Unknown => &[],
    }
}

/// Runs the extractors an intent needs and merges their bags.
pub struct EntityOrchestrator {
    store: Arc<dyn HotelStore>,
}

impl EntityOrchestrator {
    pub fn new(store: Arc<dyn HotelStore>) -> Self {
        Self { store }
    }

    /// Entities for `normalized` text under `intent`.
    ///
    /// The stock catalogue is read at most once; a failed read is logged and
    /// contributes no matches.
    pub async fn extract(&self, intent: Intent, normalized: &str, today: NaiveDate) -> EntityBag {
        let mut bag = EntityBag::new();

        for kind in extractor_plan(intent) {
            let found = match kind {
                ExtractorKind::Date => dates::extract(normalized, today),
                ExtractorKind::Room => room::extract(normalized),
                ExtractorKind::Contact => contact::extract(normalized),
                ExtractorKind::Product => product::extract(normalized),
                ExtractorKind::StockCatalog => match self.store.stock_item_names().await {
                    Ok(names) => product::extract_stock(normalized, &names),
                    Err(e) => {
                        warn!(error = %e, "Stock catalogue unavailable, skipping live match");
                        EntityBag::new()
                    }
                },
            };
            bag.merge(found);
        }

        debug!(
            intent = %intent,
            entities = bag.len(),
            "Entities extracted"
        );
        bag
    }
}
