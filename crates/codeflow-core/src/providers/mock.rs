//! Template-matching generation provider.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use super::{templates, Category, GenerationProvider};
use crate::{config::WorkflowConfig, error::ProviderError};

const ENTRY_POINT: &str = "def main():";
const BROAD_HANDLER: &str = "except Exception as e:";

/// Deterministic generator that answers from category templates.
///
/// The category is chosen from the task description, so the same kind of
/// request always receives the same plan, code, and explanation.
#[derive(Debug, Clone)]
pub struct TemplateGenerator {
    plan_latency: Duration,
    code_latency: Duration,
    debug_latency: Duration,
    follow_up_latency: Duration,
}

impl TemplateGenerator {
    pub fn new(config: &WorkflowConfig) -> Self {
        Self {
            plan_latency: config.plan_latency,
            code_latency: config.code_latency,
            debug_latency: config.debug_latency,
            follow_up_latency: config.follow_up_latency,
        }
    }

    /// Generator with no artificial latency.
    pub fn instant() -> Self {
        Self::new(&WorkflowConfig::instant())
    }

    /// The canned debugging pass: imports for tracing before the entry
    /// point and a traceback dump in the first broad handler.
    pub fn revise(code: &str) -> String {
        code.replacen(
            ENTRY_POINT,
            "import sys\nimport traceback\n\ndef main():",
            1,
        )
        .replacen(
            BROAD_HANDLER,
            "except Exception as e:\n        print(f\"Detailed error: {str(e)}\")\n        traceback.print_exc()",
            1,
        )
    }
}

impl Default for TemplateGenerator {
    fn default() -> Self {
        Self::new(&WorkflowConfig::default())
    }
}

async fn simulate_latency(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

#[async_trait]
impl GenerationProvider for TemplateGenerator {
    fn name(&self) -> &str {
        "template"
    }

    async fn generate_plan(&self, description: &str) -> Result<String, ProviderError> {
        simulate_latency(self.plan_latency).await;
        let category = Category::classify(description);
        debug!("Plan template selected: {category}");
        Ok(templates::plan(category).to_string())
    }

    async fn generate_code(&self, description: &str, _plan: &str) -> Result<String, ProviderError> {
        simulate_latency(self.code_latency).await;
        let category = Category::classify(description);
        debug!("Code template selected: {category}");
        Ok(templates::code(category).to_string())
    }

    async fn debug_code(&self, code: &str, errors: &[String]) -> Result<String, ProviderError> {
        simulate_latency(self.debug_latency).await;
        debug!("Revising code for {} error line(s)", errors.len());
        Ok(Self::revise(code))
    }

    async fn generate_explanation(
        &self,
        description: &str,
        _code: &str,
    ) -> Result<String, ProviderError> {
        simulate_latency(self.follow_up_latency).await;
        Ok(templates::explanation(Category::classify(description)).to_string())
    }

    async fn generate_follow_up_question(
        &self,
        description: &str,
        _code: &str,
    ) -> Result<String, ProviderError> {
        simulate_latency(self.follow_up_latency).await;
        Ok(templates::follow_up_question(Category::classify(description)).to_string())
    }
}
