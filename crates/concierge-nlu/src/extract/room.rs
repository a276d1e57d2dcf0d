//! Room number, room type, preferences and problem description.

use std::sync::LazyLock;

use regex::Regex;

use concierge_core::types::{EntityData, EntityKey, EntityValue, ExtractorKind};

use super::contact::strip_phones;
use super::EntityBag;

const ROOM_CONFIDENCE: f32 = 0.95;
const BARE_ROOM_CONFIDENCE: f32 = 0.6;
const ROOM_TYPE_CONFIDENCE: f32 = 0.9;
const PREFERENCE_CONFIDENCE: f32 = 0.8;
const PROBLEM_CONFIDENCE: f32 = 0.8;

/// Explicit room references; the first participating group holds the number.
static ROOM_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:camera|camerei|cam\.?|room)\s*(?:nr\.?\s*|numarul\s+)?(\d{1,4})\b|\bc(\d{2,4})\b|\bnr\.?\s*(\d{1,4})\b|\b(\d{1,4})\s+camera\b",
    )
    .expect("Invalid room number regex")
});

static BARE_ROOM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([1-9]\d{2})\b").expect("Invalid bare room regex"));

static ROOM_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(single|simpla|dubla|double|matrimoniala|twin|tripla|triple|apartament|suite|family|familiala)\b",
    )
    .expect("Invalid room type regex")
});

static PREFERENCES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    let mk = |p: &str| Regex::new(p).expect("Invalid preference regex");
    vec![
        ("sea_view", mk(r"\b(?:vedere\s+(?:la|spre)\s+mare|vedere\s+mare|sea\s+view)\b")),
        ("balcony", mk(r"\b(?:balcon|balcony)\b")),
        ("high_floor", mk(r"\b(?:etaj\s+(?:inalt|superior|sus)|high\s+floor)\b")),
        ("ground_floor", mk(r"\b(?:parter|ground\s+floor)\b")),
        ("quiet", mk(r"\b(?:linistit[ae]?|quiet|fara\s+zgomot)\b")),
        ("extra_bed", mk(r"\b(?:pat\s+suplimentar|extra\s+bed|patut)\b")),
        ("non_smoking", mk(r"\b(?:nefumatori|non[\s-]?smoking)\b")),
        ("smoking", mk(r"\b(?:fumatori|smoking)\b")),
    ]
});

static PROBLEM_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:problem\w*|defect\w*|stricat\w*|avari\w*|reparat\w*|nu\s+(?:merge|functioneaza|porneste))\b",
    )
    .expect("Invalid problem keyword regex")
});

/// A room number with the byte span it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomMatch {
    pub number: String,
    pub start: usize,
    pub end: usize,
    pub explicit: bool,
}

/// Room number mentioned in `text`; explicit references win over bare numbers.
pub fn room_number(text: &str) -> Option<RoomMatch> {
    if let Some(caps) = ROOM_NUMBER.captures(text) {
        let number = (1..caps.len()).find_map(|i| caps.get(i));
        if let (Some(number), Some(whole)) = (number, caps.get(0)) {
            return Some(RoomMatch {
                number: number.as_str().to_string(),
                start: whole.start(),
                end: whole.end(),
                explicit: true,
            });
        }
    }

    // Phone digits would otherwise read as room numbers; blanking keeps offsets.
    let cleaned = strip_phones(text);
    BARE_ROOM.captures(&cleaned).and_then(|caps| {
        let m = caps.get(1)?;
        Some(RoomMatch {
            number: m.as_str().to_string(),
            start: m.start(),
            end: m.end(),
            explicit: false,
        })
    })
}

/// Canonical room type and the byte offset where its token ends.
pub fn room_type(text: &str) -> Option<(&'static str, usize)> {
    let m = ROOM_TYPE.find(text)?;
    let canonical = match m.as_str() {
        "single" | "simpla" => "single",
        "dubla" | "double" | "matrimoniala" => "dubla",
        "twin" => "twin",
        "tripla" | "triple" => "tripla",
        "apartament" | "suite" => "apartament",
        _ => "family",
    };
    Some((canonical, m.end()))
}

pub fn preferences(text: &str) -> Vec<String> {
    let mut found: Vec<String> = PREFERENCES
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(tag, _)| tag.to_string())
        .collect();
    if found.iter().any(|t| t == "non_smoking") {
        found.retain(|t| t != "smoking");
    }
    found
}

/// Free text after a room number that itself follows the problem keyword.
///
/// Without a room number after the keyword there is no description.
pub fn problem_description(text: &str, room: Option<&RoomMatch>) -> Option<String> {
    let keyword = PROBLEM_KEYWORD.find(text)?;
    let room = room.filter(|r| r.start >= keyword.end())?;
    let description = text
        .get(room.end..)?
        .trim_matches(|c: char| c.is_whitespace() || c.is_ascii_punctuation());
    (!description.is_empty()).then(|| description.to_string())
}

pub fn extract(text: &str) -> EntityBag {
    let mut bag = EntityBag::new();
    let room = room_number(text);

    if let Some(room) = &room {
        let confidence = if room.explicit {
            ROOM_CONFIDENCE
        } else {
            BARE_ROOM_CONFIDENCE
        };
        bag.insert(
            EntityKey::RoomNumber,
            EntityValue::text(room.number.clone(), confidence, ExtractorKind::Room),
        );
    }

    if let Some((kind, _)) = room_type(text) {
        bag.insert(
            EntityKey::RoomType,
            EntityValue::text(kind, ROOM_TYPE_CONFIDENCE, ExtractorKind::Room),
        );
    }

    let prefs = preferences(text);
    if !prefs.is_empty() {
        bag.insert(
            EntityKey::Preferences,
            EntityValue::new(EntityData::List(prefs), PREFERENCE_CONFIDENCE, ExtractorKind::Room),
        );
    }

    if let Some(description) = problem_description(text, room.as_ref()) {
        bag.insert(
            EntityKey::ProblemDescription,
            EntityValue::text(description, PROBLEM_CONFIDENCE, ExtractorKind::Room),
        );
    }

    bag
}
