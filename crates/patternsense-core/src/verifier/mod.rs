//! Behavioral verification of a bound pattern instance.
//!
//! A verifier holds the components of one detection. `verify` checks the
//! action's preconditions, captures the pre-action state, runs the caller's
//! action and then waits for each postcondition in turn. Waiting is a race
//! between the check turning true, the frame tick, an optional host change
//! signal and the check's deadline. A fully passing run raises the guarantee
//! to `Verified`; nothing ever lowers it.

mod actions;
mod state;

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use patternsense_config::VerifierConfig;
use patternsense_protocols::{
    ActionError, Components, DetectionResult, DocumentEnv, GuaranteeLevel, Pattern,
};

pub use actions::{ActionSpec, Check, PostCheck, VerifyAction, action_spec, actions_for};
pub use state::StateCapture;

#[cfg(test)]
#[path = "verifier_tests.rs"]
mod tests;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckPhase {
    Precondition,
    Execution,
    Postcondition,
    Config,
}

/// Result of one check, or of the action itself for `Execution`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<Check>,
    pub phase: CheckPhase,
    pub passed: bool,
    pub detail: String,
    #[serde(default)]
    pub elapsed_ms: u64,
}

impl CheckOutcome {
    fn checked(check: Check, phase: CheckPhase, passed: bool, detail: String, elapsed_ms: u64) -> Self {
        Self {
            check: Some(check),
            phase,
            passed,
            detail,
            elapsed_ms,
        }
    }

    fn failure(phase: CheckPhase, detail: String) -> Self {
        Self {
            check: None,
            phase,
            passed: false,
            detail,
            elapsed_ms: 0,
        }
    }
}

/// One `verify` call as recorded by the verifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifierTrace {
    pub action: String,
    pub timestamp_ms: i64,
    pub preconditions: Vec<CheckOutcome>,
    pub postconditions: Vec<CheckOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<CheckOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<StateCapture>,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub passed: bool,
    pub results: Vec<CheckOutcome>,
    pub guarantee: GuaranteeLevel,
}

pub struct BehaviorVerifier {
    env: Arc<dyn DocumentEnv>,
    pattern: Pattern,
    parts: Components,
    guarantee: GuaranteeLevel,
    config: VerifierConfig,
    change_signal: Option<Arc<Notify>>,
    traces: Vec<VerifierTrace>,
}

impl BehaviorVerifier {
    pub fn new(env: Arc<dyn DocumentEnv>, result: &DetectionResult) -> Self {
        Self::for_parts(env, result.pattern, result.components.clone(), result.guarantee)
    }

    /// Verifier over explicitly bound parts, e.g. from an inferred pattern.
    pub fn for_parts(
        env: Arc<dyn DocumentEnv>,
        pattern: Pattern,
        parts: Components,
        guarantee: GuaranteeLevel,
    ) -> Self {
        Self {
            env,
            pattern,
            parts,
            guarantee,
            config: VerifierConfig::default(),
            change_signal: None,
            traces: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: VerifierConfig) -> Self {
        self.config = config;
        self
    }

    /// Wake postcondition polling whenever the host notifies a document change.
    pub fn with_change_signal(mut self, signal: Arc<Notify>) -> Self {
        self.change_signal = Some(signal);
        self
    }

    pub fn pattern(&self) -> Pattern {
        self.pattern
    }

    pub fn components(&self) -> &Components {
        &self.parts
    }

    pub fn guarantee(&self) -> GuaranteeLevel {
        self.guarantee
    }

    pub fn traces(&self) -> &[VerifierTrace] {
        &self.traces
    }

    pub fn available_actions(&self) -> Vec<VerifyAction> {
        actions_for(self.pattern).iter().map(|s| s.action).collect()
    }

    /// Run `action_fn` as the named action and verify its effects.
    pub async fn verify<F, Fut>(&mut self, action: &str, action_fn: F) -> VerificationOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), ActionError>>,
    {
        let timestamp_ms = chrono::Utc::now().timestamp_millis();

        let spec = action
            .parse::<VerifyAction>()
            .ok()
            .and_then(|a| action_spec(self.pattern, a));
        let Some(spec) = spec else {
            let entry = CheckOutcome::failure(
                CheckPhase::Config,
                format!("unknown action '{}' for pattern {}", action, self.pattern),
            );
            warn!(pattern = %self.pattern, action, "Unknown verification action");
            return self.finish(action, timestamp_ms, Vec::new(), None, Vec::new(), None, vec![entry]);
        };

        let env = self.env.clone();
        let before = StateCapture::capture(env.as_ref(), &self.parts);

        let mut preconditions = Vec::with_capacity(spec.preconditions.len());
        for &check in spec.preconditions {
            let (passed, detail) = state::evaluate(env.as_ref(), &self.parts, &before, check);
            if !passed {
                warn!(pattern = %self.pattern, action, %check, %detail, "Precondition failed");
            }
            preconditions.push(CheckOutcome::checked(check, CheckPhase::Precondition, passed, detail, 0));
        }

        if let Err(err) = run_isolated(action_fn).await {
            warn!(pattern = %self.pattern, action, error = %err, "Verification action failed");
            let execution = CheckOutcome::failure(CheckPhase::Execution, err.to_string());
            return self.finish(
                action,
                timestamp_ms,
                preconditions,
                Some(execution),
                Vec::new(),
                Some(before),
                Vec::new(),
            );
        }

        let mut postconditions = Vec::with_capacity(spec.postconditions.len());
        for post in spec.postconditions {
            let timeout = self.config.scaled(post.timeout_ms);
            postconditions.push(self.settle(post.check, &before, timeout).await);
        }

        self.finish(
            action,
            timestamp_ms,
            preconditions,
            None,
            postconditions,
            Some(before),
            Vec::new(),
        )
    }

    /// Wait for `check` to hold, re-evaluating on every frame and change
    /// signal until `timeout` elapses.
    async fn settle(&self, check: Check, before: &StateCapture, timeout: Duration) -> CheckOutcome {
        let env = self.env.as_ref();
        let started = Instant::now();
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);
        let mut frames = tokio::time::interval(self.config.frame_interval());
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        frames.tick().await;

        loop {
            let (passed, detail) = state::evaluate(env, &self.parts, before, check);
            if passed {
                return outcome(check, true, detail, started);
            }
            tokio::select! {
                biased;
                _ = &mut deadline => {
                    let (passed, detail) = state::evaluate(env, &self.parts, before, check);
                    let detail = if passed {
                        detail
                    } else {
                        format!("timed out after {}ms: {}", timeout.as_millis(), detail)
                    };
                    return outcome(check, passed, detail, started);
                }
                _ = changed(self.change_signal.as_deref()) => {}
                _ = frames.tick() => {}
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &mut self,
        action: &str,
        timestamp_ms: i64,
        preconditions: Vec<CheckOutcome>,
        execution: Option<CheckOutcome>,
        postconditions: Vec<CheckOutcome>,
        before: Option<StateCapture>,
        config: Vec<CheckOutcome>,
    ) -> VerificationOutcome {
        let results: Vec<CheckOutcome> = config
            .into_iter()
            .chain(preconditions.iter().cloned())
            .chain(execution.iter().cloned())
            .chain(postconditions.iter().cloned())
            .collect();
        let passed = !results.is_empty() && results.iter().all(|r| r.passed);
        if passed {
            self.guarantee = GuaranteeLevel::Verified;
        }

        self.traces.push(VerifierTrace {
            action: action.to_string(),
            timestamp_ms,
            preconditions,
            postconditions,
            execution,
            before,
            passed,
        });
        info!(
            pattern = %self.pattern,
            action,
            passed,
            guarantee = %self.guarantee,
            checks = results.len(),
            "Verification finished"
        );
        VerificationOutcome {
            passed,
            results,
            guarantee: self.guarantee,
        }
    }
}

fn outcome(check: Check, passed: bool, detail: String, started: Instant) -> CheckOutcome {
    let elapsed_ms = started.elapsed().as_millis() as u64;
    debug!(%check, passed, elapsed_ms, "Postcondition settled");
    CheckOutcome::checked(check, CheckPhase::Postcondition, passed, detail, elapsed_ms)
}

async fn changed(signal: Option<&Notify>) {
    match signal {
        Some(notify) => notify.notified().await,
        None => std::future::pending().await,
    }
}

/// Run the caller's action, turning a panic in either the call or the
/// returned future into `ActionError::Panicked`.
async fn run_isolated<F, Fut>(action_fn: F) -> Result<(), ActionError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), ActionError>>,
{
    let future = std::panic::catch_unwind(AssertUnwindSafe(action_fn))
        .map_err(|payload| ActionError::Panicked(panic_message(payload)))?;
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(ActionError::Panicked(panic_message(payload))),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
