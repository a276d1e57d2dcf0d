//! Phone numbers and guest names.

use std::sync::LazyLock;

use regex::Regex;

use concierge_core::types::{EntityKey, EntityValue, ExtractorKind};

use super::room::room_type;
use super::EntityBag;

const PHONE_CONFIDENCE: f32 = 0.95;
const NAME_CONFIDENCE: f32 = 0.6;

/// Romanian mobile (7xx) and landline (2x/3x) numbers with any trunk prefix.
static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+40|\b0040|\b40|\b0)[\s.-]?([237](?:[\s.-]?\d){8})\b")
        .expect("Invalid phone regex")
});

/// Words that never form part of a guest name.
static STOP_WORDS: &[&str] = &[
    // commands and intent vocabulary
    "rezervare", "rezervarea", "rezervari", "rezerva", "rezerv", "booking", "book",
    "anuleaza", "anulare", "anulez", "sterge", "modifica", "schimba", "muta",
    "prelungeste", "check-in", "check-out", "cazare", "factura", "facturi",
    "factureaza", "emite", "problema", "probleme", "defect", "stricat", "calendar",
    "disponibilitate", "libere", "libera", "liber", "ocupare", "stoc", "vinde",
    "adauga", "raport", "ajutor", "salut", "buna", "ziua", "seara",
    // fillers and function words
    "pentru", "pe", "la", "de", "din", "in", "si", "cu", "sau", "nr", "numarul",
    "vreau", "as", "dori", "vrea", "doreste", "te", "rog", "va", "un", "una", "o",
    "doua", "trei", "patru", "pana", "incepand", "noapte", "nopti", "nopte",
    "night", "nights", "zi", "zile", "azi", "maine", "poimaine", "weekend",
    "saptamana", "luna", "client", "clientul", "clienta", "oaspete", "oaspetele",
    "domnul", "doamna", "dl", "dna", "d-l", "d-na", "domnului", "doamnei",
    "domnisoara", "lui", "lu", "al", "ale", "numele", "nume", "telefon", "tel",
    "mobil", "persoana", "persoane", "adulti", "copii", "copil", "ne", "e", "este",
    "are", "avem", "ce", "cine", "the", "for", "from", "room", "camera", "camerei",
    "camere", "cam", "c",
    // months
    "ianuarie", "februarie", "martie", "aprilie", "mai", "iunie", "iulie",
    "august", "septembrie", "octombrie", "noiembrie", "decembrie", "ian", "jan",
    "feb", "mar", "apr", "iun", "jun", "iul", "jul", "aug", "sept", "sep", "oct",
    "noi", "nov", "dec",
    // room types and preferences
    "single", "simpla", "dubla", "double", "matrimoniala", "twin", "tripla",
    "triple", "apartament", "suite", "family", "familiala", "balcon", "balcony",
    "vedere", "mare", "etaj", "parter", "linistita", "linistit", "nefumatori",
    "fumatori", "pat", "suplimentar", "patut",
];

/// `text` with every phone number blanked out, byte offsets preserved.
pub fn strip_phones(text: &str) -> String {
    PHONE
        .replace_all(text, |caps: &regex::Captures<'_>| " ".repeat(caps[0].len()))
        .into_owned()
}

/// First phone number in `text`, canonicalised to `0XXXXXXXXX`.
pub fn phone(text: &str) -> Option<String> {
    let caps = PHONE.captures(text)?;
    let digits: String = caps[1].chars().filter(|c| c.is_ascii_digit()).collect();
    Some(format!("0{}", digits))
}

fn is_name_token(token: &str) -> bool {
    token.chars().count() >= 2
        && token.chars().all(|c| c.is_alphabetic() || c == '-')
        && !STOP_WORDS.contains(&token)
}

fn title_case(word: &str) -> String {
    word.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Guest name guessed from the words left after removing known vocabulary.
///
/// Words after the room type are preferred, since front-desk shorthand puts
/// the type before the guest ("rezervare dubla ion pop").
pub fn name(text: &str) -> Option<String> {
    let after = room_type(text).map_or(0, |(_, end)| end);
    let tokens: Vec<(usize, &str)> = text
        .split_whitespace()
        .map(|raw| {
            let offset = raw.as_ptr() as usize - text.as_ptr() as usize;
            (
                offset,
                raw.trim_matches(|c: char| c.is_ascii_punctuation() && c != '-'),
            )
        })
        .filter(|(_, token)| is_name_token(token))
        .collect();

    let preferred: Vec<&str> = tokens
        .iter()
        .filter(|(offset, _)| *offset >= after)
        .map(|(_, t)| *t)
        .collect();
    let chosen: Vec<&str> = if preferred.is_empty() {
        tokens.iter().map(|(_, t)| *t).collect()
    } else {
        preferred
    };

    if chosen.is_empty() {
        return None;
    }
    Some(
        chosen
            .iter()
            .take(2)
            .map(|t| title_case(t))
            .collect::<Vec<_>>()
            .join(" "),
    )
}

pub fn extract(text: &str) -> EntityBag {
    let mut bag = EntityBag::new();
    if let Some(phone) = phone(text) {
        bag.insert(
            EntityKey::Phone,
            EntityValue::text(phone, PHONE_CONFIDENCE, ExtractorKind::Contact),
        );
    }
    if let Some(name) = name(&strip_phones(text)) {
        bag.insert(
            EntityKey::Name,
            EntityValue::text(name, NAME_CONFIDENCE, ExtractorKind::Contact),
        );
    }
    bag
}
