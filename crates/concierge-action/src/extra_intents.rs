//! Follow-up views suggested alongside a primary intent.

use concierge_core::types::Intent;

/// Intents whose views the UI should open next to `intent`'s.
pub fn extra_intents(intent: Intent) -> Vec<Intent> {
    match intent {
        Intent::Reservation
        | Intent::ModifyReservation
        | Intent::CancelReservation
        | Intent::CheckAvailability => vec![Intent::ShowCalendar],
        Intent::SellProduct => vec![Intent::OpenPos],
        Intent::AddStock => vec![Intent::ShowStock],
        Intent::CreateInvoice => vec![Intent::ShowInvoices],
        _ => Vec::new(),
    }
}
