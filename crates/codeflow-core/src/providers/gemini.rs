//! Google Gemini generation provider.
//!
//! A direct pass-through: every operation is one `generateContent` call with
//! a fixed prompt. There is no retry, backoff, or streaming.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::GenerationProvider;
use crate::error::ProviderError;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Environment variable the CLI reads the API key from.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Connection settings for [`GeminiGenerator`].
#[derive(Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiConfig {
    /// Settings for the public endpoint and default model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: GEMINI_API_BASE.to_string(),
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Request URL. The key travels in a header so it never shows up in
    /// transport errors.
    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

/// Generation provider backed by the Gemini `generateContent` endpoint.
pub struct GeminiGenerator {
    client: Client,
    config: GeminiConfig,
}

impl GeminiGenerator {
    /// Creates a generator.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Configuration` when the API key or model is
    /// blank.
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderError::Configuration(
                "Gemini API key must not be empty".to_string(),
            ));
        }
        if config.model.trim().is_empty() {
            return Err(ProviderError::Configuration(
                "Gemini model must not be empty".to_string(),
            ));
        }
        Ok(Self {
            client: Client::new(),
            config,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, prompt: String) -> Result<String, ProviderError> {
        debug!("Gemini request to model {}", self.config.model);

        let request = GeminiRequest::user(prompt);
        let response = self
            .client
            .post(self.config.endpoint())
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = api_error(status, &body);
            warn!("Gemini call failed: {err}");
            return Err(err);
        }

        let body: GeminiResponse = response.json().await?;
        extract_text(body)
    }
}

#[derive(Serialize, Debug)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

impl GeminiRequest {
    fn user(prompt: String) -> Self {
        Self {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart { text: prompt }],
            }],
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize, Debug)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Debug)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize, Debug)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

fn extract_text(body: GeminiResponse) -> Result<String, ProviderError> {
    let text: String = body
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        Err(ProviderError::EmptyResponse)
    } else {
        Ok(text)
    }
}

fn api_error(status: StatusCode, body: &str) -> ProviderError {
    match serde_json::from_str::<GeminiError>(body) {
        Ok(parsed) => ProviderError::Api(format!("{status}: {}", parsed.error.message)),
        Err(_) => ProviderError::Api(status.to_string()),
    }
}

fn plan_prompt(description: &str) -> String {
    format!(
        "Create a detailed implementation plan for the following coding request:
\"{description}\"

Format your response as a step-by-step plan with clear sections:
## Step 1: [Title]
- [Details]

## Step 2: [Title]
- [Details]

And so on..."
    )
}

fn code_prompt(description: &str, plan: &str) -> String {
    format!(
        "Based on this plan:
\"{plan}\"

Generate Python code that implements the following request:
\"{description}\"

Requirements:
- Write complete, working Python code
- Include proper error handling
- Add comments for clarity
- Make sure the code is executable
- Include a main() function if appropriate"
    )
}

fn debug_prompt(code: &str, errors: &[String]) -> String {
    format!(
        "Debug this Python code that has the following errors:
Errors: {}

Code:
```python
{code}
```

Provide the corrected code with fixes for the errors:",
        errors.join(", ")
    )
}

fn explanation_prompt(description: &str, code: &str) -> String {
    format!(
        "Explain this Python code in simple terms:
Original request: \"{description}\"

Code:
```python
{code}
```

Provide a clear explanation of what the code does and its key features."
    )
}

fn question_prompt(description: &str) -> String {
    format!(
        "Based on this coding project:
Request: \"{description}\"

Suggest 3-4 follow-up questions or improvements that would enhance this project. Format as a friendly, engaging message."
    )
}

#[async_trait]
impl GenerationProvider for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate_plan(&self, description: &str) -> Result<String, ProviderError> {
        self.generate(plan_prompt(description)).await
    }

    async fn generate_code(&self, description: &str, plan: &str) -> Result<String, ProviderError> {
        self.generate(code_prompt(description, plan)).await
    }

    async fn debug_code(&self, code: &str, errors: &[String]) -> Result<String, ProviderError> {
        self.generate(debug_prompt(code, errors)).await
    }

    async fn generate_explanation(
        &self,
        description: &str,
        code: &str,
    ) -> Result<String, ProviderError> {
        self.generate(explanation_prompt(description, code)).await
    }

    async fn generate_follow_up_question(
        &self,
        description: &str,
        _code: &str,
    ) -> Result<String, ProviderError> {
        self.generate(question_prompt(description)).await
    }
}
