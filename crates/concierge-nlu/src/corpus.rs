//! Training phrases for the fallback classifier.
//!
//! Phrases are already normalized (lower-case, no diacritics). They cover
//! wordings the regex cascade deliberately does not, so the classifier adds
//! recall rather than duplicating the patterns.

use concierge_core::types::Intent;

pub const TRAINING_PHRASES: &[(&str, Intent)] = &[
    // Reservation
    ("as dori o camera pentru doua nopti", Intent::Reservation),
    ("vreau o camera dubla pentru weekend", Intent::Reservation),
    ("am nevoie de cazare pentru o familie", Intent::Reservation),
    ("putem primi un oaspete nou de vineri", Intent::Reservation),
    ("trece un client nou la receptie pentru sejur", Intent::Reservation),
    ("inregistreaza un sejur nou", Intent::Reservation),
    ("un domn vrea o camera single de maine", Intent::Reservation),
    ("booking nou pentru doua persoane", Intent::Reservation),
    // ModifyReservation
    ("clientul vrea sa ramana inca o noapte", Intent::ModifyReservation),
    ("muta oaspetele in alta camera", Intent::ModifyReservation),
    ("schimba datele sejurului", Intent::ModifyReservation),
    ("prelungeste sederea cu doua zile", Intent::ModifyReservation),
    ("oaspetele pleaca mai devreme cu o zi", Intent::ModifyReservation),
    // CancelReservation
    ("clientul nu mai vine", Intent::CancelReservation),
    ("oaspetele a renuntat la sejur", Intent::CancelReservation),
    ("renunta la camera de vineri", Intent::CancelReservation),
    ("no show la camera", Intent::CancelReservation),
    ("sterge sejurul clientului", Intent::CancelReservation),
    // CheckAvailability
    ("mai avem locuri de vineri", Intent::CheckAvailability),
    ("este ceva liber weekendul viitor", Intent::CheckAvailability),
    ("ce camere sunt goale maine", Intent::CheckAvailability),
    ("gasim ceva liber pentru doua persoane", Intent::CheckAvailability),
    ("verifica daca e liber la etajul trei", Intent::CheckAvailability),
    // ShowCalendar
    ("arata-mi saptamana viitoare", Intent::ShowCalendar),
    ("cine soseste azi", Intent::ShowCalendar),
    ("cine pleaca maine", Intent::ShowCalendar),
    ("sosiri si plecari de azi", Intent::ShowCalendar),
    ("vizualizare pe luna", Intent::ShowCalendar),
    // RoomProblem
    ("nu avem apa calda in baie", Intent::RoomProblem),
    ("curge robinetul la chiuveta", Intent::RoomProblem),
    ("aerul conditionat face zgomot", Intent::RoomProblem),
    ("s-a ars becul pe hol", Intent::RoomProblem),
    ("televizorul nu are semnal", Intent::RoomProblem),
    ("baie inundata la etajul doi", Intent::RoomProblem),
    ("trebuie chemat instalatorul", Intent::RoomProblem),
    // CreateInvoice
    ("scoate nota de plata pentru client", Intent::CreateInvoice),
    ("clientul cere chitanta pe firma", Intent::CreateInvoice),
    ("incaseaza camera si da bon fiscal", Intent::CreateInvoice),
    ("nota de plata la check out", Intent::CreateInvoice),
    // ShowInvoices
    ("ce documente fiscale am emis azi", Intent::ShowInvoices),
    ("lista de chitante de luna asta", Intent::ShowInvoices),
    ("arata platile neincasate", Intent::ShowInvoices),
    ("documente emise saptamana trecuta", Intent::ShowInvoices),
    // AddStock
    ("a venit marfa de la furnizor", Intent::AddStock),
    ("am primit o lada de bere", Intent::AddStock),
    ("intrare marfa prosoape noi", Intent::AddStock),
    ("pune in magazie cutiile noi", Intent::AddStock),
    // SellProduct
    ("clientul din 201 a luat doua beri", Intent::SellProduct),
    ("trece pe camera o cafea", Intent::SellProduct),
    ("incaseaza doua sucuri la bar", Intent::SellProduct),
    ("a consumat din minibar", Intent::SellProduct),
    // ShowStock
    ("cate prosoape mai sunt in magazie", Intent::ShowStock),
    ("ne-am terminat de cafea", Intent::ShowStock),
    ("ce produse lipsesc", Intent::ShowStock),
    ("cat sapun mai e in magazie", Intent::ShowStock),
    // OpenPos
    ("deschide terminalul de vanzare", Intent::OpenPos),
    ("vreau ecranul de bar", Intent::OpenPos),
    ("porneste punctul de vanzare", Intent::OpenPos),
    // ShowReports
    ("cat am castigat luna asta", Intent::ShowReports),
    ("gradul de umplere pe trimestru", Intent::ShowReports),
    ("cifra de afaceri de ieri", Intent::ShowReports),
    ("sumar financiar pe saptamana", Intent::ShowReports),
    // Help
    ("nu stiu ce sa scriu", Intent::Help),
    ("cum folosesc asistentul", Intent::Help),
    ("ce comenzi exista", Intent::Help),
    ("arata-mi exemple de comenzi", Intent::Help),
    // Greeting
    ("buna dimineata", Intent::Greeting),
    ("neata colega", Intent::Greeting),
    ("ziua buna tuturor", Intent::Greeting),
    ("multumesc frumos", Intent::Greeting),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize, DEFAULT_MAX_CHARS};

    #[test]
    fn test_phrases_are_normalized() {
        for (phrase, _) in TRAINING_PHRASES {
            assert_eq!(normalize(phrase, DEFAULT_MAX_CHARS), *phrase);
        }
    }

    #[test]
    fn test_every_intent_except_unknown_is_covered() {
        for intent in Intent::ALL {
            let covered = TRAINING_PHRASES.iter().any(|(_, i)| *i == intent);
            assert_eq!(covered, intent != Intent::Unknown, "intent {}", intent);
        }
    }
}
