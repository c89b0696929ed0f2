//! Simulated execution provider.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tokio::sync::Mutex;

use super::{templates, Category, ExecutionProvider};
use crate::{config::WorkflowConfig, error::ProviderError, models::ExecutionResult};

/// Pretends to run Python code.
///
/// The outcome is decided by inspecting the source and flipping a seeded
/// coin:
///
/// 1. If the coin fails and the code has no `try:`/`except` handling, the run
///    fails with a missing-module error.
/// 2. Otherwise, code without `def main():` fails with a `NameError`.
/// 3. Anything else succeeds with canned console output.
///
/// Code with error handling is therefore never affected by the coin.
#[derive(Debug)]
pub struct SimulatedExecutor {
    latency: Duration,
    success_rate: f64,
    rng: Mutex<StdRng>,
}

impl SimulatedExecutor {
    pub fn new(config: &WorkflowConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            latency: config.execution_latency,
            success_rate: config.success_rate.clamp(0.0, 1.0),
            rng: Mutex::new(rng),
        }
    }

    /// Decides the outcome for `code` given a coin result.
    pub fn outcome(code: &str, coin_succeeded: bool) -> ExecutionResult {
        let has_main = code.contains("def main():");
        let has_error_handling = code.contains("try:") && code.contains("except");

        if !coin_succeeded && !has_error_handling {
            return ExecutionResult::Failure {
                errors: templates::MISSING_MODULE_ERRORS
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            };
        }

        if !has_main {
            return ExecutionResult::Failure {
                errors: templates::MISSING_MAIN_ERRORS
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            };
        }

        ExecutionResult::Success {
            output: templates::execution_output(Category::classify(code)).to_string(),
        }
    }
}

impl Default for SimulatedExecutor {
    fn default() -> Self {
        Self::new(&WorkflowConfig::default())
    }
}

#[async_trait]
impl ExecutionProvider for SimulatedExecutor {
    async fn execute_code(&self, code: &str) -> Result<ExecutionResult, ProviderError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let coin_succeeded = {
            let mut rng = self.rng.lock().await;
            rng.gen::<f64>() < self.success_rate
        };
        debug!(
            "Simulated run: coin={coin_succeeded}, imports={}",
            code.contains("import ")
        );

        Ok(Self::outcome(code, coin_succeeded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_HANDLER_WITH_MAIN: &str = "def main():\n    print('hi')\n";

    #[test]
    fn test_csv_template_reports_name_error_regardless_of_coin() {
        let csv = templates::code(Category::Csv);
        for coin in [true, false] {
            match SimulatedExecutor::outcome(csv, coin) {
                ExecutionResult::Failure { errors } => {
                    assert_eq!(errors[0], "NameError: name 'main' is not defined");
                }
                other => panic!("expected failure, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_default_template_always_succeeds() {
        let code = templates::code(Category::Default);
        for coin in [true, false] {
            assert_eq!(
                SimulatedExecutor::outcome(code, coin),
                ExecutionResult::Success {
                    output: templates::execution_output(Category::Default).to_string()
                }
            );
        }
    }

    #[test]
    fn test_unhandled_code_depends_on_coin() {
        assert!(SimulatedExecutor::outcome(NO_HANDLER_WITH_MAIN, true).is_success());
        match SimulatedExecutor::outcome(NO_HANDLER_WITH_MAIN, false) {
            ExecutionResult::Failure { errors } => {
                assert_eq!(errors.len(), 3);
                assert!(errors[0].starts_with("ModuleNotFoundError"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_success_rate_extremes_are_deterministic() {
        let always = SimulatedExecutor::new(&WorkflowConfig::instant().with_success_rate(1.0));
        let never = SimulatedExecutor::new(&WorkflowConfig::instant().with_success_rate(0.0));
        for _ in 0..20 {
            assert!(always
                .execute_code(NO_HANDLER_WITH_MAIN)
                .await
                .expect("execution")
                .is_success());
            assert!(!never
                .execute_code(NO_HANDLER_WITH_MAIN)
                .await
                .expect("execution")
                .is_success());
        }
    }

    #[tokio::test]
    async fn test_seeded_runs_repeat() {
        let config = WorkflowConfig::instant().with_seed(42);
        let first = SimulatedExecutor::new(&config);
        let second = SimulatedExecutor::new(&config);
        for _ in 0..10 {
            let a = first
                .execute_code(NO_HANDLER_WITH_MAIN)
                .await
                .expect("execution");
            let b = second
                .execute_code(NO_HANDLER_WITH_MAIN)
                .await
                .expect("execution");
            assert_eq!(a, b);
        }
    }
}
