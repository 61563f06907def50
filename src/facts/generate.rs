//! Fact generation via an external chat model
//!
//! Generation is strictly best-effort: any failure here means the
//! engine serves an already-cached fact instead.

use async_trait::async_trait;

#[cfg(feature = "openai")]
use crate::error::LoreError;
use crate::error::Result;
use crate::types::FactCategory;

/// External fact generation seam
#[async_trait]
pub trait FactGenerator: Send + Sync {
    /// Produce one candidate fact text for the category.
    ///
    /// The caller validates length and runs duplicate checks; this
    /// only has to return plausible text.
    async fn generate(&self, category: FactCategory) -> Result<String>;
}

/// OpenAI-backed fact generator
///
/// Requires the `openai` feature.
#[cfg(feature = "openai")]
pub struct OpenAiGenerator {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[cfg(feature = "openai")]
impl OpenAiGenerator {
    pub fn new(api_key: String) -> Self {
        Self::with_config(api_key, None, None)
    }

    pub fn with_config(api_key: String, base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: model.unwrap_or_else(|| "gpt-4o-mini".to_string()),
        }
    }

    fn prompt_for(category: FactCategory) -> String {
        format!(
            "Write one interesting, specific, true piece of Dungeons & Dragons trivia \
             about the topic \"{}\". One or two sentences, 50 to 500 characters, \
             no preamble, no quotation marks.",
            category
        )
    }
}

#[cfg(feature = "openai")]
#[async_trait]
impl FactGenerator for OpenAiGenerator {
    async fn generate(&self, category: FactCategory) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": self.model,
                "messages": [
                    {"role": "user", "content": Self::prompt_for(category)}
                ],
                "max_tokens": 200,
                "temperature": 0.9,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LoreError::Generation(format!(
                "Chat API error {}: {}",
                status, body
            )));
        }

        let data: serde_json::Value = response.json().await?;
        let text = data["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| LoreError::Generation("Invalid response format".to_string()))?
            .trim()
            .to_string();

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic generator for engine tests
    pub struct StaticGenerator(pub String);

    #[async_trait]
    impl FactGenerator for StaticGenerator {
        async fn generate(&self, _category: FactCategory) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_static_generator() {
        let gen = StaticGenerator("A fact".to_string());
        assert_eq!(gen.generate(FactCategory::Lore).await.unwrap(), "A fact");
    }

    #[cfg(feature = "openai")]
    #[test]
    fn test_prompt_names_the_category() {
        let prompt = OpenAiGenerator::prompt_for(FactCategory::Monsters);
        assert!(prompt.contains("monsters"));
    }
}
