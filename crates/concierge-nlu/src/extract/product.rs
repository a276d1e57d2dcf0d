//! Product quantities and stock-name matching.

use std::sync::LazyLock;

use regex::Regex;

use concierge_core::types::{EntityData, EntityKey, EntityValue, ExtractorKind, ProductLine};

use super::dates::month_number;
use super::EntityBag;
use crate::normalize::{normalize, DEFAULT_MAX_CHARS};

const PRODUCT_CONFIDENCE: f32 = 0.85;
const STOCK_MATCH_CONFIDENCE: f32 = 1.0;

static PRODUCT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,4})\s*(?:x\b\s*|buc(?:ati)?\b\.?\s*)?([a-z]+(?:\s+[a-z]+)?)")
        .expect("Invalid product regex")
});

/// Words that end a product phrase or show the number counts something else.
const NOT_PRODUCT: &[&str] = &[
    "si", "in", "la", "pe", "pentru", "de", "cu", "din", "sau", "x", "buc", "bucati",
    "nopti", "noapte", "nopte", "nights", "night", "persoane", "persoana", "adulti",
    "copii", "zile", "zi", "ore", "lei", "ron", "euro", "camera", "camere", "camerei",
];

/// Shorthand and plural forms mapped onto catalogue names.
const SHORTHANDS: &[(&str, &str)] = &[
    ("apa plata", "Apa plata"),
    ("hartie igienica", "Hartie igienica"),
    ("cafea", "Cafea"),
    ("cafele", "Cafea"),
    ("espresso", "Cafea"),
    ("apa", "Apa plata"),
    ("ape", "Apa plata"),
    ("bere", "Bere"),
    ("beri", "Bere"),
    ("suc", "Suc"),
    ("sucuri", "Suc"),
    ("croissant", "Croissant"),
    ("croissante", "Croissant"),
    ("cornuri", "Croissant"),
    ("prosop", "Prosop"),
    ("prosoape", "Prosop"),
    ("sapun", "Sapun"),
    ("sapunuri", "Sapun"),
    ("sampon", "Sampon"),
    ("sampoane", "Sampon"),
    ("hartie", "Hartie igienica"),
];

fn is_product_word(word: &str) -> bool {
    !NOT_PRODUCT.contains(&word) && month_number(word).is_none()
}

fn shorthand(phrase: &str) -> Option<&'static str> {
    SHORTHANDS
        .iter()
        .find(|(short, _)| *short == phrase)
        .map(|(_, canonical)| *canonical)
}

fn canonical_name(words: &[&str]) -> String {
    if words.len() == 2 {
        if let Some(name) = shorthand(&words.join(" ")) {
            return name.to_string();
        }
    }
    if let Some(name) = shorthand(words[0]) {
        return name.to_string();
    }
    let phrase = words.join(" ");
    let mut chars = phrase.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => phrase,
    }
}

/// `<quantity> [x|buc] <product>` lines in text order; repeats are summed.
pub fn products(text: &str) -> Vec<ProductLine> {
    let mut lines: Vec<ProductLine> = Vec::new();

    for caps in PRODUCT.captures_iter(text) {
        let Ok(quantity) = caps[1].parse::<u32>() else {
            continue;
        };
        if quantity == 0 {
            continue;
        }
        let mut words: Vec<&str> = Vec::with_capacity(2);
        for word in caps[2].split_whitespace() {
            if !is_product_word(word) {
                break;
            }
            words.push(word);
        }
        if words.is_empty() {
            continue;
        }

        let name = canonical_name(&words);
        match lines.iter_mut().find(|line| line.name == name) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => lines.push(ProductLine { name, quantity }),
        }
    }

    lines
}

/// Catalogue names that occur in `text` as whole words.
///
/// Matching ignores case and diacritics; `names` come straight from the store.
pub fn match_stock_names(text: &str, names: &[String]) -> Vec<String> {
    names
        .iter()
        .filter(|name| {
            let needle = normalize(name, DEFAULT_MAX_CHARS);
            !needle.is_empty() && contains_word(text, &needle)
        })
        .cloned()
        .collect()
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

pub fn extract(text: &str) -> EntityBag {
    let mut bag = EntityBag::new();
    let lines = products(text);
    if !lines.is_empty() {
        bag.insert(
            EntityKey::Products,
            EntityValue::new(
                EntityData::Products(lines),
                PRODUCT_CONFIDENCE,
                ExtractorKind::Product,
            ),
        );
    }
    bag
}

/// Stock catalogue matches as a bag.
pub fn extract_stock(text: &str, names: &[String]) -> EntityBag {
    let mut bag = EntityBag::new();
    let matched = match_stock_names(text, names);
    if !matched.is_empty() {
        bag.insert(
            EntityKey::StockItems,
            EntityValue::new(
                EntityData::List(matched),
                STOCK_MATCH_CONFIDENCE,
                ExtractorKind::StockCatalog,
            ),
        );
    }
    bag
}
