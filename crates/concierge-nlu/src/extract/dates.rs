//! Date and stay-range extraction.
//!
//! Recognizes "N nopti din <date>", cross-month and same-month ranges, dotted
//! dates and single named dates. Matches never overlap; earlier patterns in
//! `extract_dates` take priority, results come back in text order.

use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate};
use regex::{Captures, Regex};

use concierge_core::types::{DateRange, EntityData, EntityKey, EntityValue, ExtractorKind};

use super::EntityBag;

/// Month spellings after normalization; full names precede their abbreviations.
pub(crate) const MONTHS: &[(&str, u32)] = &[
    ("ianuarie", 1),
    ("februarie", 2),
    ("martie", 3),
    ("aprilie", 4),
    ("mai", 5),
    ("iunie", 6),
    ("iulie", 7),
    ("august", 8),
    ("septembrie", 9),
    ("octombrie", 10),
    ("noiembrie", 11),
    ("decembrie", 12),
    ("ian", 1),
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("iun", 6),
    ("jun", 6),
    ("iul", 7),
    ("jul", 7),
    ("aug", 8),
    ("sept", 9),
    ("sep", 9),
    ("oct", 10),
    ("noi", 11),
    ("nov", 11),
    ("dec", 12),
];

const NAMED_CONFIDENCE: f32 = 0.95;
const NIGHTS_CONFIDENCE: f32 = 0.9;
const DOTTED_CONFIDENCE: f32 = 0.85;

static MONTH_ALT: LazyLock<String> = LazyLock::new(|| {
    MONTHS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join("|")
});

struct DatePatterns {
    nights: Regex,
    cross_month: Regex,
    same_month: Regex,
    dotted_range: Regex,
    dotted: Regex,
    named: Regex,
}

static DATE_PATTERNS: LazyLock<DatePatterns> = LazyLock::new(|| {
    let m = MONTH_ALT.as_str();
    let sep = r"(?:-|–|si|pana\s+(?:pe|la|in))";
    let compile = |p: String| Regex::new(&p).expect("Invalid date regex");

    DatePatterns {
        nights: compile(format!(
            r"\b(\d{{1,2}})\s+(?:nopti|nopte|noapte|nights?)\s+(?:din|de\s+la|incepand\s+(?:cu|de\s+la|din)|cu\s+incepere\s+(?:din|de\s+la)|from)\s+(?:(\d{{1,2}})\s*({m})\b(?:\s+(\d{{4}}))?|(\d{{1,2}})[./](\d{{1,2}})(?:[./](\d{{2,4}}))?\b)"
        )),
        cross_month: compile(format!(
            r"\b(\d{{1,2}})\s*({m})\s*{sep}\s*(\d{{1,2}})\s*({m})\b(?:\s+(\d{{4}}))?"
        )),
        same_month: compile(format!(
            r"\b(\d{{1,2}})\s*{sep}\s*(\d{{1,2}})\s*({m})\b(?:\s+(\d{{4}}))?"
        )),
        dotted_range: compile(format!(
            r"\b(\d{{1,2}})[./](\d{{1,2}})(?:[./](\d{{2,4}}))?\s*{sep}\s*(\d{{1,2}})[./](\d{{1,2}})(?:[./](\d{{2,4}}))?\b"
        )),
        dotted: compile(r"\b(\d{1,2})[./](\d{1,2})(?:[./](\d{2,4}))?\b".to_string()),
        named: compile(format!(r"\b(\d{{1,2}})\s*({m})\b(?:\s+(\d{{4}}))?")),
    }
});

pub(crate) fn month_number(name: &str) -> Option<u32> {
    MONTHS
        .iter()
        .find(|(month, _)| *month == name)
        .map(|(_, number)| *number)
}

fn number<T: std::str::FromStr>(caps: &Captures<'_>, index: usize) -> Option<T> {
    caps.get(index)?.as_str().parse().ok()
}

fn year(caps: &Captures<'_>, index: usize) -> Option<i32> {
    let y: i32 = number(caps, index)?;
    Some(if y < 100 { 2000 + y } else { y })
}

fn month(caps: &Captures<'_>, index: usize) -> Option<u32> {
    month_number(caps.get(index)?.as_str())
}

fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

/// Every date or range mentioned in `text`, in text order.
///
/// Dates without a year take `today`'s year. A bare date yields a range with
/// no end; callers needing a checkout use [`DateRange::end_or_next_day`].
pub fn extract_dates(text: &str, today: NaiveDate) -> Vec<(DateRange, f32)> {
    let p = &*DATE_PATTERNS;
    let this_year = today.year();
    let mut found: Vec<(usize, usize, DateRange, f32)> = Vec::new();

    let mut scan = |re: &Regex, confidence: f32, parse: &dyn Fn(&Captures<'_>) -> Option<DateRange>| {
        for caps in re.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let overlaps = found
                .iter()
                .any(|(start, end, _, _)| whole.start() < *end && *start < whole.end());
            if overlaps {
                continue;
            }
            if let Some(range) = parse(&caps) {
                found.push((whole.start(), whole.end(), range, confidence));
            }
        }
    };

    scan(&p.nights, NIGHTS_CONFIDENCE, &|caps| {
        let nights: i64 = number(caps, 1)?;
        if nights == 0 {
            return None;
        }
        let start = if caps.get(2).is_some() {
            ymd(year(caps, 4).unwrap_or(this_year), month(caps, 3)?, number(caps, 2)?)?
        } else {
            ymd(year(caps, 7).unwrap_or(this_year), number(caps, 6)?, number(caps, 5)?)?
        };
        Some(DateRange::new(start, start + Duration::days(nights)))
    });

    scan(&p.cross_month, NAMED_CONFIDENCE, &|caps| {
        let (d1, m1) = (number(caps, 1)?, month(caps, 2)?);
        let (d2, m2) = (number(caps, 3)?, month(caps, 4)?);
        match year(caps, 5) {
            Some(y) => {
                let end = ymd(y, m2, d2)?;
                let mut start = ymd(y, m1, d1)?;
                if end <= start {
                    start = ymd(y - 1, m1, d1)?;
                }
                Some(DateRange::new(start, end))
            }
            None => {
                let start = ymd(this_year, m1, d1)?;
                let mut end = ymd(this_year, m2, d2)?;
                if end <= start {
                    end = ymd(this_year + 1, m2, d2)?;
                }
                Some(DateRange::new(start, end))
            }
        }
    });

    scan(&p.same_month, NAMED_CONFIDENCE, &|caps| {
        let (d1, d2): (u32, u32) = (number(caps, 1)?, number(caps, 2)?);
        let m = month(caps, 3)?;
        let y = year(caps, 4).unwrap_or(this_year);
        let start = ymd(y, m, d1)?;
        if d2 == d1 {
            return Some(DateRange::single(start));
        }
        let end = if d2 < d1 {
            let (ny, nm) = if m == 12 { (y + 1, 1) } else { (y, m + 1) };
            ymd(ny, nm, d2)?
        } else {
            ymd(y, m, d2)?
        };
        Some(DateRange::new(start, end))
    });

    scan(&p.dotted_range, DOTTED_CONFIDENCE, &|caps| {
        let explicit_end = year(caps, 6);
        let explicit_start = year(caps, 3);
        let end_year = explicit_end.or(explicit_start).unwrap_or(this_year);
        let start_year = explicit_start.unwrap_or(end_year);
        let start = ymd(start_year, number(caps, 2)?, number(caps, 1)?)?;
        let mut end = ymd(end_year, number(caps, 5)?, number(caps, 4)?)?;
        if end <= start && explicit_end.is_none() {
            end = ymd(end_year + 1, number(caps, 5)?, number(caps, 4)?)?;
        }
        (end > start).then(|| DateRange::new(start, end))
    });

    scan(&p.dotted, DOTTED_CONFIDENCE, &|caps| {
        let date = ymd(
            year(caps, 3).unwrap_or(this_year),
            number(caps, 2)?,
            number(caps, 1)?,
        )?;
        Some(DateRange::single(date))
    });

    scan(&p.named, NAMED_CONFIDENCE, &|caps| {
        let date = ymd(
            year(caps, 3).unwrap_or(this_year),
            month(caps, 2)?,
            number(caps, 1)?,
        )?;
        Some(DateRange::single(date))
    });

    found.sort_by_key(|(start, _, _, _)| *start);
    found
        .into_iter()
        .map(|(_, _, range, confidence)| (range, confidence))
        .collect()
}

/// Date entities for the bag: all ranges under `dates`.
pub fn extract(text: &str, today: NaiveDate) -> EntityBag {
    let mut bag = EntityBag::new();
    let dates = extract_dates(text, today);
    if dates.is_empty() {
        return bag;
    }
    let confidence = dates
        .iter()
        .map(|(_, c)| *c)
        .fold(f32::MAX, f32::min);
    let ranges = dates.into_iter().map(|(range, _)| range).collect();
    bag.insert(
        EntityKey::Dates,
        EntityValue::new(EntityData::Dates(ranges), confidence, ExtractorKind::Date),
    );
    bag
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ranges(text: &str) -> Vec<DateRange> {
        extract_dates(text, today())
            .into_iter()
            .map(|(r, _)| r)
            .collect()
    }

    #[test]
    fn test_same_month_range() {
        assert_eq!(
            ranges("rezervare dubla 16-18 apr"),
            vec![DateRange::new(date(2025, 4, 16), date(2025, 4, 18))]
        );
        assert_eq!(
            ranges("de la 3 pana la 7 iulie 2026"),
            vec![DateRange::new(date(2026, 7, 3), date(2026, 7, 7))]
        );
    }

    #[test]
    fn test_same_month_range_wraps_to_next_month() {
        assert_eq!(
            ranges("28-2 feb"),
            vec![DateRange::new(date(2025, 2, 28), date(2025, 3, 2))]
        );
        assert_eq!(
            ranges("30-2 dec"),
            vec![DateRange::new(date(2025, 12, 30), date(2026, 1, 2))]
        );
    }

    #[test]
    fn test_cross_month_range() {
        assert_eq!(
            ranges("din 30 aprilie - 2 mai"),
            vec![DateRange::new(date(2025, 4, 30), date(2025, 5, 2))]
        );
    }

    #[test]
    fn test_cross_month_range_over_new_year() {
        assert_eq!(
            ranges("28 dec - 3 ian"),
            vec![DateRange::new(date(2025, 12, 28), date(2026, 1, 3))]
        );
        assert_eq!(
            ranges("28 dec - 3 ian 2026"),
            vec![DateRange::new(date(2025, 12, 28), date(2026, 1, 3))]
        );
    }

    #[test]
    fn test_nights_from_named_date() {
        assert_eq!(
            ranges("3 nopti din 12 mai"),
            vec![DateRange::new(date(2025, 5, 12), date(2025, 5, 15))]
        );
        assert_eq!(
            ranges("o camera 2 nopti de la 30.06"),
            vec![DateRange::new(date(2025, 6, 30), date(2025, 7, 2))]
        );
    }

    #[test]
    fn test_dotted_dates() {
        assert_eq!(ranges("pe 16.04"), vec![DateRange::single(date(2025, 4, 16))]);
        assert_eq!(
            ranges("pe 16/04/2026"),
            vec![DateRange::single(date(2026, 4, 16))]
        );
        assert_eq!(ranges("pe 1.2.25"), vec![DateRange::single(date(2025, 2, 1))]);
        assert_eq!(
            ranges("16.04-18.04"),
            vec![DateRange::new(date(2025, 4, 16), date(2025, 4, 18))]
        );
    }

    #[test]
    fn test_single_named_date_has_no_end() {
        let found = ranges("anuleaza rezervarea din 305 pe 12 mai");
        assert_eq!(found, vec![DateRange::single(date(2025, 5, 12))]);
        assert_eq!(found[0].end_date, None);
        assert_eq!(found[0].end_or_next_day(), date(2025, 5, 13));
    }

    #[test]
    fn test_multiple_dates_in_text_order() {
        let found = ranges("12 mai si apoi 20.06");
        assert_eq!(
            found,
            vec![
                DateRange::single(date(2025, 5, 12)),
                DateRange::single(date(2025, 6, 20)),
            ]
        );
    }

    #[test]
    fn test_invalid_dates_are_skipped() {
        assert!(ranges("31 feb").is_empty());
        assert!(ranges("pret 12.50 lei").is_empty());
        assert!(ranges("nimic aici").is_empty());
    }

    #[test]
    fn test_month_word_without_day_is_ignored() {
        assert!(ranges("nu mai avem camere").is_empty());
    }

    #[test]
    fn test_extract_builds_dates_entity() {
        let bag = extract("16-18 apr", today());
        let value = bag.get(EntityKey::Dates).unwrap();
        assert_eq!(value.source, ExtractorKind::Date);
        assert_eq!(bag.dates().len(), 1);
        assert!(extract("fara date", today()).is_empty());
    }
}
