//! Keyword quick-route table.
//!
//! A keyword matches when it appears anywhere in the normalized text. Entries
//! are checked in declaration order and the first hit wins, so compound
//! keywords must precede the shorter keywords they contain.

use concierge_core::types::Intent;

/// Confidence attached to quick-route decisions.
pub const QUICK_ROUTE_CONFIDENCE: f32 = 0.95;

pub const QUICK_ROUTES: &[(&str, Intent)] = &[
    ("anuleaza rezervarea", Intent::CancelReservation),
    ("sterge rezervarea", Intent::CancelReservation),
    ("modifica rezervarea", Intent::ModifyReservation),
    ("schimba rezervarea", Intent::ModifyReservation),
    ("rezervare", Intent::Reservation),
    ("calendar", Intent::ShowCalendar),
    ("camere libere", Intent::CheckAvailability),
    ("disponibilitate", Intent::CheckAvailability),
    ("problema", Intent::RoomProblem),
    ("defect", Intent::RoomProblem),
    ("emite factura", Intent::CreateInvoice),
    ("factureaza", Intent::CreateInvoice),
    ("facturi", Intent::ShowInvoices),
    ("adauga", Intent::AddStock),
    ("aprovizionare", Intent::AddStock),
    ("vinde", Intent::SellProduct),
    ("stoc", Intent::ShowStock),
    ("inventar", Intent::ShowStock),
    ("deschide pos", Intent::OpenPos),
    ("casa de marcat", Intent::OpenPos),
    ("raport", Intent::ShowReports),
];

/// First quick-route intent whose keyword occurs in `normalized`.
pub fn quick_route(normalized: &str) -> Option<Intent> {
    QUICK_ROUTES
        .iter()
        .find(|(keyword, _)| normalized.contains(keyword))
        .map(|(_, intent)| *intent)
}
