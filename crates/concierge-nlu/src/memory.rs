//! Memory pressure monitoring and the degraded resolution path.
//!
//! Pressure never produces errors; it only lowers resolution quality. At the
//! critical level the matcher, classifier and extractors are bypassed in favor
//! of substring checks against a small keyword table.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use concierge_core::config::MemoryConfig;
use concierge_core::types::{Intent, Resolution, ResolutionSource};

use crate::quick_route::quick_route;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryUsage {
    pub used_bytes: u64,
    pub total_bytes: u64,
}

impl MemoryUsage {
    pub fn ratio(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.used_bytes as f64 / self.total_bytes as f64
    }
}

/// Source of memory usage figures.
pub trait MemoryProbe: Send + Sync {
    fn usage(&self) -> MemoryUsage;
}

/// Resident set size of this process against a fixed budget.
///
/// Reads `/proc/self/statm`; reports zero usage where that file is absent.
pub struct ProcessMemoryProbe {
    budget_bytes: u64,
}

const PAGE_SIZE: u64 = 4096;

impl ProcessMemoryProbe {
    pub fn new(budget_bytes: u64) -> Self {
        Self { budget_bytes }
    }

    fn resident_bytes() -> Option<u64> {
        let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
        let resident_pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
        Some(resident_pages * PAGE_SIZE)
    }
}

impl MemoryProbe for ProcessMemoryProbe {
    fn usage(&self) -> MemoryUsage {
        MemoryUsage {
            used_bytes: Self::resident_bytes().unwrap_or(0),
            total_bytes: self.budget_bytes,
        }
    }
}

/// Probe reporting a settable ratio, for simulations and tests.
#[derive(Debug, Default)]
pub struct FixedMemoryProbe {
    ratio_bits: AtomicU64,
}

impl FixedMemoryProbe {
    const TOTAL: u64 = 1 << 30;

    pub fn new(ratio: f64) -> Self {
        let probe = Self::default();
        probe.set_ratio(ratio);
        probe
    }

    pub fn set_ratio(&self, ratio: f64) {
        self.ratio_bits
            .store(ratio.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }
}

impl MemoryProbe for FixedMemoryProbe {
    fn usage(&self) -> MemoryUsage {
        let ratio = f64::from_bits(self.ratio_bits.load(Ordering::Relaxed));
        MemoryUsage {
            used_bytes: (ratio * Self::TOTAL as f64) as u64,
            total_bytes: Self::TOTAL,
        }
    }
}

/// Pressure band derived from the configured thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryLevel {
    Normal,
    Moderate,
    High,
    Critical,
}

pub struct MemoryMonitor {
    probe: Arc<dyn MemoryProbe>,
    normal_ratio: f64,
    high_ratio: f64,
    critical_ratio: f64,
}

impl MemoryMonitor {
    pub fn new(probe: Arc<dyn MemoryProbe>, config: &MemoryConfig) -> Self {
        Self {
            probe,
            normal_ratio: config.normal_ratio,
            high_ratio: config.high_ratio,
            critical_ratio: config.critical_ratio,
        }
    }

    pub fn ratio(&self) -> f64 {
        self.probe.usage().ratio()
    }

    pub fn level(&self) -> MemoryLevel {
        self.level_for(self.ratio())
    }

    pub fn level_for(&self, ratio: f64) -> MemoryLevel {
        if ratio >= self.critical_ratio {
            MemoryLevel::Critical
        } else if ratio >= self.high_ratio {
            MemoryLevel::High
        } else if ratio >= self.normal_ratio {
            MemoryLevel::Moderate
        } else {
            MemoryLevel::Normal
        }
    }
}

const DEGRADED_QUICK_CONFIDENCE: f32 = 0.9;

/// Stems checked against the start of each word when memory is critical.
const DEGRADED_STEMS: &[(&str, Intent, f32)] = &[
    ("rezerv", Intent::Reservation, 0.8),
    ("ocupare", Intent::ShowCalendar, 0.75),
    ("disponibil", Intent::CheckAvailability, 0.75),
    ("problem", Intent::RoomProblem, 0.75),
    ("stricat", Intent::RoomProblem, 0.75),
    ("factur", Intent::ShowInvoices, 0.75),
    ("stoc", Intent::ShowStock, 0.8),
    ("inventar", Intent::ShowStock, 0.8),
    ("marcat", Intent::OpenPos, 0.7),
    ("vand", Intent::SellProduct, 0.7),
    ("vanzare", Intent::SellProduct, 0.7),
];

/// Short keywords that only count as a whole word.
const DEGRADED_WORDS: &[(&str, Intent, f32)] = &[("pos", Intent::OpenPos, 0.7)];

/// Cheap resolution used under critical memory pressure.
///
/// Quick-route keywords still decide first, so a leading keyword maps to the
/// same intent in every memory mode.
pub fn degraded_resolution(normalized: &str) -> Resolution {
    if let Some(intent) = quick_route(normalized) {
        return Resolution::new(intent, DEGRADED_QUICK_CONFIDENCE, ResolutionSource::Degraded);
    }
    let words: Vec<&str> = normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    DEGRADED_STEMS
        .iter()
        .find(|(stem, _, _)| words.iter().any(|w| w.starts_with(stem)))
        .or_else(|| {
            DEGRADED_WORDS
                .iter()
                .find(|(word, _, _)| words.contains(word))
        })
        .map(|(_, intent, confidence)| {
            Resolution::new(*intent, *confidence, ResolutionSource::Degraded)
        })
        .unwrap_or_else(|| Resolution::new(Intent::Unknown, 0.0, ResolutionSource::Degraded))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(ratio: f64) -> (Arc<FixedMemoryProbe>, MemoryMonitor) {
        let probe = Arc::new(FixedMemoryProbe::new(ratio));
        let monitor = MemoryMonitor::new(probe.clone(), &MemoryConfig::default());
        (probe, monitor)
    }

    #[test]
    fn test_levels_follow_thresholds() {
        let (probe, m) = monitor(0.1);
        assert_eq!(m.level(), MemoryLevel::Normal);
        probe.set_ratio(0.5);
        assert_eq!(m.level(), MemoryLevel::Moderate);
        probe.set_ratio(0.8);
        assert_eq!(m.level(), MemoryLevel::High);
        probe.set_ratio(0.95);
        assert_eq!(m.level(), MemoryLevel::Critical);
        assert!(MemoryLevel::Critical > MemoryLevel::High);
    }

    #[test]
    fn test_fixed_probe_clamps_ratio() {
        let probe = FixedMemoryProbe::new(3.0);
        assert!((probe.usage().ratio() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_total_is_zero_ratio() {
        let usage = MemoryUsage {
            used_bytes: 10,
            total_bytes: 0,
        };
        assert_eq!(usage.ratio(), 0.0);
    }

    #[test]
    fn test_process_probe_reports_budget() {
        let probe = ProcessMemoryProbe::new(512 * 1024 * 1024);
        let usage = probe.usage();
        assert_eq!(usage.total_bytes, 512 * 1024 * 1024);
    }

    #[test]
    fn test_degraded_uses_quick_route_first() {
        let resolution = degraded_resolution("rezervare ion 12 mai");
        assert_eq!(resolution.intent, Intent::Reservation);
        assert_eq!(resolution.source, ResolutionSource::Degraded);
        assert!((0.7..=0.9).contains(&resolution.confidence));
    }

    #[test]
    fn test_degraded_stem_fallback() {
        let resolution = degraded_resolution("vreau sa rezerv ceva");
        assert_eq!(resolution.intent, Intent::Reservation);
        assert!((0.7..=0.9).contains(&resolution.confidence));
        assert_eq!(degraded_resolution("e ceva stricat").intent, Intent::RoomProblem);
    }

    #[test]
    fn test_degraded_keyword_ties_follow_declaration_order() {
        let text = "stoc problema";
        assert_eq!(quick_route(text), Some(Intent::RoomProblem));
        assert_eq!(degraded_resolution(text).intent, Intent::RoomProblem);
    }

    #[test]
    fn test_degraded_short_keyword_needs_whole_word() {
        assert_eq!(degraded_resolution("pos bar").intent, Intent::OpenPos);
        assert_eq!(
            degraded_resolution("este posibil sa ramanem").intent,
            Intent::Unknown
        );
        assert_eq!(degraded_resolution("am pus un depozit").intent, Intent::Unknown);
    }

    #[test]
    fn test_degraded_unknown() {
        let resolution = degraded_resolution("asdkjhasd");
        assert_eq!(resolution.intent, Intent::Unknown);
        assert_eq!(resolution.source, ResolutionSource::Degraded);
    }
}
