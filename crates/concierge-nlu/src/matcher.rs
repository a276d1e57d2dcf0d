//! Deterministic intent resolution.
//!
//! Order: intent cache, quick-route keywords, per-intent regex cascade,
//! anchored shortcuts, then `Unknown`. Every outcome is cached, including
//! `Unknown`, so repeated inputs never re-run the cascade within the TTL.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::debug;

use concierge_core::types::{Intent, Resolution, ResolutionSource};

use crate::cache::{CacheStats, TtlCache};
use crate::quick_route::{quick_route, QUICK_ROUTE_CONFIDENCE};

const PATTERN_CONFIDENCE: f32 = 0.85;
const SHORTCUT_CONFIDENCE: f32 = 0.90;

// =============================================================================
// Compiled regex sets (compiled once, reused across calls)
// =============================================================================

/// Per-intent regex lists, in intent declaration order.
static INTENT_CASCADE: LazyLock<Vec<(Intent, Vec<Regex>)>> = LazyLock::new(|| {
    let mk = |pats: &[&str]| -> Vec<Regex> {
        pats.iter()
            .map(|p| Regex::new(p).expect("Invalid intent regex"))
            .collect()
    };

    vec![
        (
            Intent::CancelReservation,
            mk(&[
                r"\banul(?:eaza|ati|are|ez)\b.*\brezerv",
                r"\bcancel\w*\b.*\b(?:booking|reservation|rezervar\w*)\b",
            ]),
        ),
        (
            Intent::ModifyReservation,
            mk(&[
                r"\b(?:modific|schimb|mut|prelung)\w*\b.*\brezerv",
                r"\bprelung\w*\s+(?:sejur|sederea)\w*\b",
            ]),
        ),
        (
            Intent::Reservation,
            mk(&[
                r"\brezerv\w*\b",
                r"\bbook(?:ing)?\b",
                r"\bcazare\b",
                r"\bcheck[- ]?in\b",
            ]),
        ),
        (
            Intent::CheckAvailability,
            mk(&[
                r"\b(?:camer[ae]|locuri)\s+(?:libere|disponibile)\b",
                r"\bdisponibil\w*\b",
                r"\bavailab\w*\b",
                r"\bavem\s+(?:loc|camer[ae])\b",
            ]),
        ),
        (
            Intent::ShowCalendar,
            mk(&[r"\bocupar\w*\b", r"\bplanning\b", r"\bgrila\b", r"\bagenda\b"]),
        ),
        (
            Intent::RoomProblem,
            mk(&[
                r"\bstricat[ae]?\b",
                r"\bnu\s+(?:merge|functioneaza|porneste)\b",
                r"\b(?:avarie|avariat\w*|reparat\w*|defecte?)\b",
                r"\bproblem\w*\b",
            ]),
        ),
        (
            Intent::CreateInvoice,
            mk(&[
                r"\b(?:emite|genereaza|fa)\s+(?:o\s+)?factura\b",
                r"\bfactureaz\w*\b",
            ]),
        ),
        (
            Intent::ShowInvoices,
            mk(&[r"\bfactur\w*\b", r"\binvoice\w*\b"]),
        ),
        (
            Intent::AddStock,
            mk(&[r"\b(?:adaug\w*|aprovizion\w*)\b", r"\breceptie\s+marfa\b"]),
        ),
        (
            Intent::SellProduct,
            mk(&[r"\b(?:vand|vinde|vindem|vanzare)\b", r"\bcomanda\s+la\s+bar\b"]),
        ),
        (
            Intent::ShowStock,
            mk(&[r"\bstoc\w*\b", r"\binventar\w*\b", r"\bce\s+mai\s+avem\b"]),
        ),
        (
            Intent::OpenPos,
            mk(&[r"\bpos\b", r"\bcasa\s+de\s+marcat\b"]),
        ),
        (
            Intent::ShowReports,
            mk(&[r"\braport\w*\b", r"\bstatistic\w*\b", r"\bincasari\w*\b"]),
        ),
        (
            Intent::Help,
            mk(&[r"\bajutor\b", r"\bce\s+poti\s+(?:sa\s+)?faci?\b", r"\bhelp\b"]),
        ),
        (
            Intent::Greeting,
            mk(&[r"\b(?:salut|buna\s+ziua|buna\s+seara|hello)\b"]),
        ),
    ]
});

/// Whole-message shortcuts for very short inputs.
static SHORTCUTS: LazyLock<Vec<(Regex, Intent)>> = LazyLock::new(|| {
    [
        (r"^(?:help|\?|meniu|info)$", Intent::Help),
        (r"^(?:buna|hei|hey|hi|servus|noroc)[!.]?$", Intent::Greeting),
        (r"^bar$", Intent::OpenPos),
    ]
    .iter()
    .map(|(p, intent)| (Regex::new(p).expect("Invalid shortcut regex"), *intent))
    .collect()
});

/// Cached, layered resolver from normalized text to an intent.
pub struct PatternMatcher {
    cache: TtlCache<Resolution>,
    cascade_evaluations: AtomicU64,
}

impl PatternMatcher {
    pub fn new(cache_ttl: Duration, cache_capacity: usize) -> Self {
        // Force compilation up front so the first message does not pay for it.
        LazyLock::force(&INTENT_CASCADE);
        LazyLock::force(&SHORTCUTS);
        Self {
            cache: TtlCache::new("intent", cache_ttl, cache_capacity),
            cascade_evaluations: AtomicU64::new(0),
        }
    }

    /// Resolve `normalized` text to an intent.
    pub fn resolve(&self, normalized: &str) -> Resolution {
        if let Some(mut cached) = self.cache.get(normalized) {
            cached.source = ResolutionSource::Cache;
            debug!(intent = %cached.intent, "Intent cache hit");
            return cached;
        }

        let resolution = self.resolve_uncached(normalized);
        debug!(
            intent = %resolution.intent,
            source = ?resolution.source,
            "Intent resolved"
        );
        self.cache.insert(normalized, resolution.clone());
        resolution
    }

    fn resolve_uncached(&self, normalized: &str) -> Resolution {
        if let Some(intent) = quick_route(normalized) {
            return Resolution::new(intent, QUICK_ROUTE_CONFIDENCE, ResolutionSource::QuickRoute);
        }

        if let Some(intent) = self.run_cascade(normalized) {
            return Resolution::new(intent, PATTERN_CONFIDENCE, ResolutionSource::Pattern);
        }

        if let Some(intent) = shortcut(normalized) {
            return Resolution::new(intent, SHORTCUT_CONFIDENCE, ResolutionSource::Shortcut);
        }

        Resolution::unknown()
    }

    fn run_cascade(&self, normalized: &str) -> Option<Intent> {
        self.cascade_evaluations.fetch_add(1, Ordering::Relaxed);
        INTENT_CASCADE
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|re| re.is_match(normalized)))
            .map(|(intent, _)| *intent)
    }

    /// Number of times the regex cascade has run.
    pub fn cascade_evaluations(&self) -> u64 {
        self.cascade_evaluations.load(Ordering::Relaxed)
    }

    pub fn cache(&self) -> &TtlCache<Resolution> {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Clear the cache and counters.
    pub fn reset(&self) {
        self.cache.clear();
        self.cache.reset_stats();
        self.cascade_evaluations.store(0, Ordering::Relaxed);
    }
}

fn shortcut(normalized: &str) -> Option<Intent> {
    SHORTCUTS
        .iter()
        .find(|(re, _)| re.is_match(normalized))
        .map(|(_, intent)| *intent)
}
