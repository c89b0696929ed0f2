//! Timing and simulation settings for the mock providers and the runner.

use std::time::Duration;

/// Settings shared by the template generator, the simulated executor, and
/// the workflow runner.
///
/// `Default` reproduces the pacing of the hosted demo; [`WorkflowConfig::instant`]
/// removes every artificial delay for tests and scripted runs.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowConfig {
    /// Artificial latency of plan generation
    pub plan_latency: Duration,
    /// Artificial latency of code generation
    pub code_latency: Duration,
    /// Artificial latency of a debug revision
    pub debug_latency: Duration,
    /// Artificial latency of explanation and follow-up generation
    pub follow_up_latency: Duration,
    /// Artificial latency of a simulated execution
    pub execution_latency: Duration,
    /// Pause between a debug revision and the automatic re-execution
    pub post_debug_delay: Duration,
    /// Probability that the simulated environment has its dependencies
    pub success_rate: f64,
    /// Seed for the simulated executor; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            plan_latency: Duration::from_millis(2000),
            code_latency: Duration::from_millis(3000),
            debug_latency: Duration::from_millis(2000),
            follow_up_latency: Duration::from_millis(1500),
            execution_latency: Duration::from_millis(2000),
            post_debug_delay: Duration::from_millis(1000),
            success_rate: 0.7,
            seed: None,
        }
    }
}

impl WorkflowConfig {
    /// Configuration without any artificial delay.
    pub fn instant() -> Self {
        Self {
            plan_latency: Duration::ZERO,
            code_latency: Duration::ZERO,
            debug_latency: Duration::ZERO,
            follow_up_latency: Duration::ZERO,
            execution_latency: Duration::ZERO,
            post_debug_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Sets the simulated success probability, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn with_success_rate(mut self, rate: f64) -> Self {
        self.success_rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        self
    }

    /// Fixes the executor seed for reproducible runs.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
