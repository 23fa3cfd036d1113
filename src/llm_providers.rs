use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Which external text-generation service backs card and quiz generation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LLMProviderType {
    OpenAI,
    Gemini,
}

/// Chat message in the shape both providers understand after adaptation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMMessage {
    pub role: String,
    pub content: String,
}

/// Enum-based provider client; generation requests fan out to the concrete
/// implementation.
#[derive(Debug, Clone)]
pub enum LLMProvider {
    OpenAI(OpenAIClient),
    Gemini(GeminiClient),
}

impl LLMProvider {
    pub fn new(
        provider_type: LLMProviderType,
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
    ) -> Self {
        match provider_type {
            LLMProviderType::OpenAI => {
                LLMProvider::OpenAI(OpenAIClient::new(api_key, base_url, model))
            }
            LLMProviderType::Gemini => {
                LLMProvider::Gemini(GeminiClient::new(api_key, base_url, model))
            }
        }
    }

    /// Send one prompt (with an optional system message) and return the raw
    /// model text.
    pub async fn generate(&self, system_message: Option<&str>, prompt: &str) -> Result<String> {
        match self {
            LLMProvider::OpenAI(client) => client.generate(system_message, prompt).await,
            LLMProvider::Gemini(client) => client.generate(system_message, prompt).await,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        match self {
            LLMProvider::OpenAI(_) => "OpenAI",
            LLMProvider::Gemini(_) => "Gemini",
        }
    }

    pub fn model_name(&self) -> &str {
        match self {
            LLMProvider::OpenAI(client) => &client.model,
            LLMProvider::Gemini(client) => &client.model,
        }
    }
}

/// OpenAI chat-completions client
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<LLMMessage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: LLMMessage,
}

impl OpenAIClient {
    pub fn new(api_key: String, base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: model.unwrap_or_else(|| "gpt-4o-mini".to_string()),
        }
    }

    pub async fn generate(&self, system_message: Option<&str>, prompt: &str) -> Result<String> {
        let mut messages = Vec::new();
        if let Some(system) = system_message {
            messages.push(LLMMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(LLMMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        info!(
            provider = "OpenAI",
            model = %self.model,
            prompt_length = prompt.len(),
            "Making LLM request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&OpenAIRequest {
                model: self.model.clone(),
                messages,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(provider = "OpenAI", status = %status, error = %body, "LLM API request failed");
            return Err(anyhow::anyhow!("OpenAI API request failed: {}", body));
        }

        let parsed: OpenAIResponse = response.json().await?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("No choices in OpenAI response"))?;

        Ok(choice.message.content)
    }
}

/// Gemini generateContent client
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".to_string()),
            model: model.unwrap_or_else(|| "gemini-pro".to_string()),
        }
    }

    pub async fn generate(&self, system_message: Option<&str>, prompt: &str) -> Result<String> {
        // Gemini has no separate system role here; prepend it to the prompt.
        let full_prompt = match system_message {
            Some(system) => format!("{}\n\n{}", system, prompt),
            None => prompt.to_string(),
        };

        info!(
            provider = "Gemini",
            model = %self.model,
            prompt_length = prompt.len(),
            "Making LLM request"
        );

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&GeminiRequest {
                contents: vec![GeminiContent {
                    parts: vec![GeminiPart { text: full_prompt }],
                }],
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(provider = "Gemini", status = %status, error = %body, "LLM API request failed");
            return Err(anyhow::anyhow!("Gemini API request failed: {}", body));
        }

        let parsed: GeminiResponse = response.json().await?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| anyhow::anyhow!("No candidates in Gemini response"))?;

        Ok(text)
    }
}

/// Strip the markdown fences LLMs like to wrap JSON in. Looks for a
/// ```json fence first, then a plain fence holding something JSON-shaped,
/// and otherwise returns the trimmed content as-is.
pub fn extract_json_from_markdown(content: &str) -> String {
    if let Some(start) = content.find("```json") {
        let rest = &content[start + 7..];
        let end = rest.rfind("```").unwrap_or(rest.len());
        return rest[..end].trim().to_string();
    }

    if let Some(start) = content.find("```") {
        let rest = &content[start + 3..];
        if let Some(end) = rest.find("```") {
            let inner = rest[..end].trim();
            if inner.starts_with('{') || inner.starts_with('[') {
                return inner.to_string();
            }
        }
    }

    content.trim().to_string()
}

/// Parse a model response as `T` after fence extraction.
pub fn parse_json_response<T>(content: &str) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let json = extract_json_from_markdown(content);
    serde_json::from_str::<T>(&json)
        .map_err(|e| anyhow::anyhow!("Failed to parse JSON response: {}", e))
}
