//! Interpreter counters exposed over HTTP.

use serde::Serialize;

use concierge_nlu::{CacheStats, MemoryLevel};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpreterStats {
    pub intent_cache_entries: usize,
    pub result_cache_entries: usize,
    pub intent_cache: CacheStats,
    pub result_cache: CacheStats,
    pub memory_level: MemoryLevel,
    pub memory_ratio: f64,
    pub cascade_evaluations: u64,
    pub classifier_invocations: u64,
    pub degraded_responses: u64,
    pub reclaims: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_serialize_camel_case() {
        let stats = InterpreterStats {
            intent_cache_entries: 3,
            result_cache_entries: 1,
            intent_cache: CacheStats::default(),
            result_cache: CacheStats::default(),
            memory_level: MemoryLevel::High,
            memory_ratio: 0.8,
            cascade_evaluations: 2,
            classifier_invocations: 0,
            degraded_responses: 0,
            reclaims: 0,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["intentCacheEntries"], 3);
        assert_eq!(json["memoryLevel"], "high");
        assert_eq!(json["intentCache"]["overflowClears"], 0);
    }
}
