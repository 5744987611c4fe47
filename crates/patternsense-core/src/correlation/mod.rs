//! Passive correlation of user actions with document mutations.
//!
//! The host feeds interactions and mutation batches as they happen. A
//! periodic tick pairs each recent action with the mutations that followed
//! it inside the correlation window and infers a pattern from the pair,
//! without any explicit scan of the document.

mod record;
mod rules;

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use patternsense_config::CorrelationConfig;
use patternsense_protocols::{DocumentEnv, InferredPattern, InteractionEvent, MutationBatch};

use record::{ActionEntry, MutationEntry};

#[cfg(test)]
#[path = "correlation_tests.rs"]
mod tests;

/// Capacity of the inference broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Millisecond clock used to stamp ticks.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

fn wall_clock() -> Clock {
    Arc::new(|| chrono::Utc::now().timestamp_millis())
}

#[derive(Default)]
struct State {
    actions: VecDeque<ActionEntry>,
    mutations: VecDeque<MutationEntry>,
    inferred: Vec<InferredPattern>,
}

struct Ticker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct Shared {
    env: Arc<dyn DocumentEnv>,
    config: CorrelationConfig,
    clock: Clock,
    state: Mutex<State>,
    events: broadcast::Sender<InferredPattern>,
    ticker: Mutex<Option<Ticker>>,
}

impl Shared {
    fn correlate_at(&self, now: i64) -> Vec<InferredPattern> {
        let window = self.config.window_ms as i64;
        let env = self.env.as_ref();
        let mut state = self.state.lock();

        let horizon = now - 2 * window;
        state.actions.retain(|a| a.timestamp_ms() >= horizon);
        state.mutations.retain(|m| m.timestamp_ms >= horizon);

        let State {
            actions,
            mutations,
            inferred,
        } = &mut *state;

        let mut reported = Vec::new();
        for action in actions.iter_mut() {
            let t = action.timestamp_ms();
            if action.correlated || now - t > window {
                continue;
            }
            let in_window: Vec<&MutationEntry> = mutations
                .iter()
                .filter(|m| m.timestamp_ms >= t && m.timestamp_ms <= t + window)
                .collect();
            if in_window.is_empty() {
                continue;
            }
            let Some(hit) = rules::infer(env, action, &in_window) else {
                continue;
            };
            if hit.confidence < self.config.min_confidence {
                debug!(pattern = %hit.pattern, confidence = hit.confidence, "Inference below threshold");
                continue;
            }
            action.correlated = true;

            let candidate = InferredPattern {
                pattern: hit.pattern,
                confidence: hit.confidence,
                evidence: hit.evidence,
                container: hit.container.node,
                container_tag: hit.container.tag,
                container_id: hit.container.id,
                extra_parts: hit.parts,
                inferred_at_ms: now,
            };
            let key = candidate.dedup_key();
            match inferred.iter_mut().find(|p| p.dedup_key() == key) {
                Some(existing) if existing.confidence > candidate.confidence => continue,
                Some(existing) => *existing = candidate.clone(),
                None => inferred.push(candidate.clone()),
            }
            reported.push(candidate);
        }
        drop(state);

        for pattern in &reported {
            info!(
                pattern = %pattern.pattern,
                confidence = pattern.confidence,
                container = %pattern.container_tag,
                evidence = %pattern.evidence,
                "Inferred pattern"
            );
            let _ = self.events.send(pattern.clone());
        }
        reported
    }
}

/// Correlates interactions with the mutations that follow them.
pub struct CorrelationEngine {
    inner: Arc<Shared>,
}

impl CorrelationEngine {
    pub fn new(env: Arc<dyn DocumentEnv>) -> Self {
        Self::with_config(env, CorrelationConfig::default())
    }

    pub fn with_config(env: Arc<dyn DocumentEnv>, config: CorrelationConfig) -> Self {
        Self::with_clock(env, config, wall_clock())
    }

    /// Engine whose ticks read time from `clock`.
    pub fn with_clock(env: Arc<dyn DocumentEnv>, config: CorrelationConfig, clock: Clock) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Shared {
                env,
                config,
                clock,
                state: Mutex::new(State::default()),
                events,
                ticker: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &CorrelationConfig {
        &self.inner.config
    }

    /// Queue an interaction. Keys other than Enter are ignored.
    pub fn record_action(&self, event: InteractionEvent) {
        let shared = &self.inner;
        let Some(entry) = ActionEntry::capture(
            shared.env.as_ref(),
            event,
            shared.config.bottom_threshold_px,
        ) else {
            return;
        };
        let mut state = shared.state.lock();
        state.actions.push_back(entry);
        while state.actions.len() > shared.config.max_queue {
            state.actions.pop_front();
        }
    }

    /// Queue every record of a mutation batch.
    pub fn record_mutations(&self, batch: &MutationBatch) {
        let shared = &self.inner;
        let entries: Vec<MutationEntry> = batch
            .records
            .iter()
            .map(|r| {
                MutationEntry::capture(
                    shared.env.as_ref(),
                    r.clone(),
                    batch.timestamp_ms,
                    shared.config.overlay_viewport_ratio,
                )
            })
            .collect();
        let mut state = shared.state.lock();
        state.mutations.extend(entries);
        while state.mutations.len() > shared.config.max_queue {
            state.mutations.pop_front();
        }
    }

    /// Run one correlation pass as of `now_ms`. Returns the inferences that
    /// were new or replaced an existing one.
    pub fn correlate_at(&self, now_ms: i64) -> Vec<InferredPattern> {
        self.inner.correlate_at(now_ms)
    }

    /// Run one correlation pass stamped by the engine clock.
    pub fn correlate(&self) -> Vec<InferredPattern> {
        self.inner.correlate_at((self.inner.clock)())
    }

    /// Start the periodic tick on the current tokio runtime. Returns `false`
    /// if already running or no runtime is available.
    pub fn start(&self) -> bool {
        let mut ticker = self.inner.ticker.lock();
        if ticker.is_some() {
            return false;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("Correlation tick needs a tokio runtime");
            return false;
        };

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let shared = self.inner.clone();
        let period = shared.config.tick_interval();
        let handle = runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        shared.correlate_at((shared.clock)());
                    }
                }
            }
            debug!("Correlation tick stopped");
        });

        *ticker = Some(Ticker { cancel, handle });
        debug!(interval_ms = period.as_millis() as u64, "Correlation tick started");
        true
    }

    /// Stop the tick. Returns `false` if it was not running.
    pub fn stop(&self) -> bool {
        match self.inner.ticker.lock().take() {
            Some(ticker) => {
                ticker.cancel.cancel();
                drop(ticker.handle);
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .ticker
            .lock()
            .as_ref()
            .map(|t| !t.handle.is_finished())
            .unwrap_or(false)
    }

    /// Receive inferences as they are reported.
    pub fn subscribe(&self) -> broadcast::Receiver<InferredPattern> {
        self.inner.events.subscribe()
    }

    /// Every retained inference, one per deduplication key.
    pub fn get_inferred(&self) -> Vec<InferredPattern> {
        self.inner.state.lock().inferred.clone()
    }

    /// Empty both queues and forget all inferences.
    pub fn clear(&self) {
        let mut state = self.inner.state.lock();
        state.actions.clear();
        state.mutations.clear();
        state.inferred.clear();
    }

    /// `(actions, mutations)` currently queued.
    pub fn queue_sizes(&self) -> (usize, usize) {
        let state = self.inner.state.lock();
        (state.actions.len(), state.mutations.len())
    }
}

impl Drop for CorrelationEngine {
    fn drop(&mut self) {
        if let Some(ticker) = self.inner.ticker.lock().take() {
            ticker.cancel.cancel();
        }
    }
}
