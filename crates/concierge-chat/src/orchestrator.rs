//! Interpreter service: the single entry point from raw text to a directive.
//!
//! `new` is the init step (classifier training, regex compilation, cache
//! creation); `reset` returns the caches and counters to their initial state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use concierge_action::{extra_intents, HandlerContext, HandlerRegistry};
use concierge_core::config::{ConciergeConfig, InterpreterConfig};
use concierge_core::types::{
    Directive, EntityBag, Interpretation, Resolution, ResolutionSource,
};
use concierge_nlu::{
    degraded_resolution, normalize, EntityOrchestrator, IntentClassifier, MemoryLevel,
    MemoryMonitor, MemoryProbe, PatternMatcher, TtlCache,
};
use concierge_storage::HotelStore;

use crate::stats::InterpreterStats;

/// An interpretation together with the directive its handler produced.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub interpretation: Interpretation,
    pub directive: Directive,
}

pub struct Interpreter {
    config: InterpreterConfig,
    matcher: PatternMatcher,
    classifier: IntentClassifier,
    memory: MemoryMonitor,
    results: TtlCache<Interpretation>,
    extractor: EntityOrchestrator,
    registry: HandlerRegistry,
    classifier_invocations: AtomicU64,
    degraded_responses: AtomicU64,
    reclaims: AtomicU64,
}

impl Interpreter {
    pub fn new(
        config: &ConciergeConfig,
        store: Arc<dyn HotelStore>,
        probe: Arc<dyn MemoryProbe>,
    ) -> Self {
        let settings = config.interpreter.clone();
        let matcher = PatternMatcher::new(
            Duration::from_secs(settings.intent_cache_ttl_secs),
            settings.intent_cache_capacity,
        );
        let results = TtlCache::new(
            "result",
            Duration::from_secs(settings.result_cache_ttl_secs),
            settings.result_cache_capacity,
        );
        let classifier = IntentClassifier::from_default_corpus();

        info!(
            vocabulary = classifier.vocabulary_size(),
            threshold = settings.classifier_threshold,
            "Interpreter initialized"
        );

        Self {
            matcher,
            classifier,
            memory: MemoryMonitor::new(probe, &config.memory),
            results,
            extractor: EntityOrchestrator::new(store.clone()),
            registry: HandlerRegistry::with_defaults(store),
            config: settings,
            classifier_invocations: AtomicU64::new(0),
            degraded_responses: AtomicU64::new(0),
            reclaims: AtomicU64::new(0),
        }
    }

    /// Interpret `raw` with relative dates anchored on the local calendar day.
    pub async fn interpret(&self, raw: &str) -> Interpretation {
        self.interpret_on(raw, Local::now().date_naive()).await
    }

    /// Interpret `raw` with dates lacking a year resolved against `today`.
    pub async fn interpret_on(&self, raw: &str, today: NaiveDate) -> Interpretation {
        let normalized = normalize(raw, self.config.max_input_chars);

        if let Some(mut hit) = self.results.get(&normalized) {
            debug!(intent = %hit.intent, "Result cache hit");
            hit.text = raw.to_string();
            hit.source = ResolutionSource::Cache;
            return hit;
        }

        let level = self.memory.level();
        match level {
            MemoryLevel::Critical => return self.interpret_degraded(raw, normalized),
            MemoryLevel::High => {
                let swept = self.sweep();
                debug!(swept = swept, "High memory pressure, swept expired entries");
            }
            MemoryLevel::Normal | MemoryLevel::Moderate => {}
        }

        let resolution = self.resolve(&normalized);
        let entities = self
            .extractor
            .extract(resolution.intent, &normalized, today)
            .await;

        let interpretation = Interpretation {
            text: raw.to_string(),
            extra_intents: extra_intents(resolution.intent),
            intent: resolution.intent,
            confidence: resolution.confidence,
            source: resolution.source,
            entities,
            normalized: normalized.clone(),
            degraded: false,
        };
        self.results.insert(normalized, interpretation.clone());
        interpretation
    }

    /// Matcher first; the classifier only sees what the matcher left unknown.
    fn resolve(&self, normalized: &str) -> Resolution {
        let resolution = self.matcher.resolve(normalized);
        if !resolution.intent.is_unknown() || normalized.is_empty() {
            return resolution;
        }

        self.classifier_invocations.fetch_add(1, Ordering::Relaxed);
        match self
            .classifier
            .decide(normalized, self.config.classifier_threshold)
        {
            Some((intent, score)) => {
                debug!(intent = %intent, score = score, "Classifier accepted");
                Resolution::new(intent, score as f32, ResolutionSource::Classifier)
            }
            None => {
                debug!("Classifier uncertain");
                resolution
            }
        }
    }

    fn interpret_degraded(&self, raw: &str, normalized: String) -> Interpretation {
        warn!(
            ratio = self.memory.ratio(),
            "Critical memory pressure, using degraded resolution"
        );
        self.reclaim();
        let resolution = degraded_resolution(&normalized);
        self.reclaim();
        self.degraded_responses.fetch_add(1, Ordering::Relaxed);

        Interpretation {
            text: raw.to_string(),
            normalized,
            intent: resolution.intent,
            confidence: resolution.confidence,
            source: resolution.source,
            entities: EntityBag::new(),
            extra_intents: extra_intents(resolution.intent),
            degraded: true,
        }
    }

    /// Interpret `raw` and dispatch it to its handler.
    pub async fn respond(&self, raw: &str) -> ChatOutcome {
        self.respond_on(raw, Local::now().date_naive()).await
    }

    pub async fn respond_on(&self, raw: &str, today: NaiveDate) -> ChatOutcome {
        let interpretation = self.interpret_on(raw, today).await;
        let ctx = HandlerContext::new(
            interpretation.intent,
            interpretation.entities.clone(),
            interpretation.extra_intents.clone(),
        );
        let directive = self.registry.dispatch(ctx).await;
        ChatOutcome {
            interpretation,
            directive,
        }
    }

    /// Drop the result cache and expired intents.
    pub fn reclaim(&self) {
        self.results.clear();
        let swept = self.matcher.cache().sweep_expired();
        self.reclaims.fetch_add(1, Ordering::Relaxed);
        debug!(swept = swept, "Reclaimed interpreter caches");
    }

    /// Remove expired entries from both tiers; returns how many were dropped.
    pub fn sweep(&self) -> usize {
        self.matcher.cache().sweep_expired() + self.results.sweep_expired()
    }

    /// Clear both caches and every counter.
    pub fn reset(&self) {
        self.matcher.reset();
        self.results.clear();
        self.results.reset_stats();
        self.classifier_invocations.store(0, Ordering::Relaxed);
        self.degraded_responses.store(0, Ordering::Relaxed);
        self.reclaims.store(0, Ordering::Relaxed);
        info!("Interpreter reset");
    }

    pub fn memory_level(&self) -> MemoryLevel {
        self.memory.level()
    }

    pub fn classifier_invocations(&self) -> u64 {
        self.classifier_invocations.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> InterpreterStats {
        let ratio = self.memory.ratio();
        InterpreterStats {
            intent_cache_entries: self.matcher.cache().len(),
            result_cache_entries: self.results.len(),
            intent_cache: self.matcher.cache_stats(),
            result_cache: self.results.stats(),
            memory_level: self.memory.level_for(ratio),
            memory_ratio: ratio,
            cascade_evaluations: self.matcher.cascade_evaluations(),
            classifier_invocations: self.classifier_invocations(),
            degraded_responses: self.degraded_responses.load(Ordering::Relaxed),
            reclaims: self.reclaims.load(Ordering::Relaxed),
        }
    }

    /// Sweep expired cache entries every `interval` until `cancel` fires.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let interpreter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Cache sweeper stopped");
                        return;
                    }
                    _ = ticker.tick() => {
                        let swept = interpreter.sweep();
                        if swept > 0 {
                            debug!(swept = swept, "Scheduled cache sweep");
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_core::types::{EntityKey, Intent};
    use concierge_nlu::FixedMemoryProbe;
    use concierge_storage::{seed_demo_data, Database, SqliteHotelStore};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn interpreter_with(ratio: f64) -> (Interpreter, Arc<FixedMemoryProbe>) {
        let db = Arc::new(Database::in_memory().unwrap());
        seed_demo_data(db.clone()).unwrap();
        let probe = Arc::new(FixedMemoryProbe::new(ratio));
        let interpreter = Interpreter::new(
            &ConciergeConfig::default(),
            Arc::new(SqliteHotelStore::new(db)),
            probe.clone(),
        );
        (interpreter, probe)
    }

    // ---- Resolution tests ----

    #[tokio::test]
    async fn test_quick_route_with_entities() {
        let (interpreter, _) = interpreter_with(0.1);
        let result = interpreter
            .interpret_on("Rezervare Andrei Anton dublă 16-18 apr", today())
            .await;
        assert_eq!(result.intent, Intent::Reservation);
        assert_eq!(result.source, ResolutionSource::QuickRoute);
        assert_eq!(result.extra_intents, vec![Intent::ShowCalendar]);
        assert_eq!(result.entities.text(EntityKey::Name), Some("Andrei Anton"));
        assert!(!result.degraded);
    }

    #[tokio::test]
    async fn test_classifier_fallback_counts_invocations() {
        let (interpreter, _) = interpreter_with(0.1);
        let result = interpreter
            .interpret_on("as dori o camera pentru weekend", today())
            .await;
        assert_eq!(result.intent, Intent::Reservation);
        assert_eq!(result.source, ResolutionSource::Classifier);
        assert_eq!(interpreter.classifier_invocations(), 1);
    }

    #[tokio::test]
    async fn test_gibberish_stays_unknown() {
        let (interpreter, _) = interpreter_with(0.1);
        let outcome = interpreter.respond_on("asdkjhasd", today()).await;
        assert_eq!(outcome.interpretation.intent, Intent::Unknown);
        assert!(outcome.interpretation.extra_intents.is_empty());
        assert_eq!(outcome.directive.intent, Intent::Unknown);
        assert!(!outcome.directive.is_error());
    }

    // ---- Cache tier tests ----

    #[tokio::test]
    async fn test_result_cache_hit_skips_pipeline() {
        let (interpreter, _) = interpreter_with(0.1);
        interpreter.interpret_on("vreau sa rezerv o camera", today()).await;
        let second = interpreter.interpret_on("Vreau să rezerv o cameră", today()).await;
        assert_eq!(second.source, ResolutionSource::Cache);
        assert_eq!(second.text, "Vreau să rezerv o cameră");
        assert_eq!(interpreter.stats().cascade_evaluations, 1);
        assert_eq!(interpreter.stats().result_cache.hits, 1);
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let (interpreter, _) = interpreter_with(0.1);
        interpreter.interpret_on("asdkjhasd", today()).await;
        interpreter.reset();
        let stats = interpreter.stats();
        assert_eq!(stats.intent_cache_entries, 0);
        assert_eq!(stats.result_cache_entries, 0);
        assert_eq!(stats.classifier_invocations, 0);
        assert_eq!(stats.cascade_evaluations, 0);
    }

    // ---- Memory pressure tests ----

    #[tokio::test]
    async fn test_critical_memory_skips_classifier_and_cache() {
        let (interpreter, _) = interpreter_with(0.95);
        let result = interpreter
            .interpret_on("vreau sa rezerv ceva", today())
            .await;
        assert_eq!(result.intent, Intent::Reservation);
        assert!(result.degraded);
        assert!(result.entities.is_empty());
        assert_eq!(interpreter.classifier_invocations(), 0);

        let stats = interpreter.stats();
        assert_eq!(stats.memory_level, MemoryLevel::Critical);
        assert_eq!(stats.result_cache_entries, 0);
        assert_eq!(stats.degraded_responses, 1);
        assert_eq!(stats.reclaims, 2);
    }

    #[tokio::test]
    async fn test_leading_keyword_wins_at_every_level() {
        for ratio in [0.1, 0.6, 0.8, 0.95] {
            let (interpreter, _) = interpreter_with(ratio);
            let result = interpreter
                .interpret_on("rezervare ion pop 12 mai", today())
                .await;
            assert_eq!(result.intent, Intent::Reservation, "ratio {}", ratio);
        }
    }

    #[tokio::test]
    async fn test_recovery_after_pressure_drops() {
        let (interpreter, probe) = interpreter_with(0.95);
        assert!(interpreter.interpret_on("problema 301 frigider stricat", today()).await.degraded);
        probe.set_ratio(0.1);
        let result = interpreter
            .interpret_on("problema 301 frigider stricat", today())
            .await;
        assert!(!result.degraded);
        assert_eq!(
            result.entities.text(EntityKey::ProblemDescription),
            Some("frigider stricat")
        );
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_cancel() {
        let (interpreter, _) = interpreter_with(0.1);
        let interpreter = Arc::new(interpreter);
        let cancel = CancellationToken::new();
        let handle = interpreter.spawn_sweeper(Duration::from_millis(10), cancel.clone());
        tokio::time::sleep(Duration::from_millis(30)).await;
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("sweeper should stop after cancel")
            .unwrap();
    }
}
