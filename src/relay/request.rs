//! Inbound request validation.

use serde_json::Value;

use crate::error::RelayError;

pub const DEFAULT_PROVIDER: &str = "gemini";
pub const DEFAULT_LANGUAGE: &str = "javascript";
pub const DEFAULT_COMPLEXITY: &str = "intermediate";

/// A validated prompt request.
///
/// `model_provider` keeps the caller's spelling; it is matched
/// case-insensitively only when the relay dispatches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub prompt: String,
    pub model_provider: String,
    pub language: String,
    pub complexity: String,
}

impl PromptRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model_provider: DEFAULT_PROVIDER.to_owned(),
            language: DEFAULT_LANGUAGE.to_owned(),
            complexity: DEFAULT_COMPLEXITY.to_owned(),
        }
    }

    #[must_use]
    pub fn provider(mut self, name: impl Into<String>) -> Self {
        self.model_provider = name.into();
        self
    }

    /// Validate a decoded JSON body.
    ///
    /// `None` stands for an absent or undecodable body. The prompt must be a
    /// string with at least one non-whitespace character. Optional fields
    /// that are missing, `null` or not strings fall back to their defaults.
    pub fn from_json(body: Option<&Value>) -> Result<Self, RelayError> {
        let fields = body.and_then(Value::as_object).ok_or(RelayError::MissingPrompt)?;

        let prompt = fields
            .get("prompt")
            .and_then(Value::as_str)
            .filter(|p| !p.trim().is_empty())
            .ok_or(RelayError::MissingPrompt)?;

        let text = |key: &str, default: &str| {
            fields
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or(default)
                .to_owned()
        };

        Ok(Self {
            prompt: prompt.to_owned(),
            model_provider: text("modelProvider", DEFAULT_PROVIDER),
            language: text("language", DEFAULT_LANGUAGE),
            complexity: text("complexity", DEFAULT_COMPLEXITY),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validate(body: Value) -> Result<PromptRequest, RelayError> {
        PromptRequest::from_json(Some(&body))
    }

    #[test]
    fn defaults_apply() {
        let req = validate(json!({ "prompt": "Write a Python function to add two numbers." })).unwrap();
        assert_eq!(req, PromptRequest::new("Write a Python function to add two numbers."));
        assert_eq!(req.model_provider, "gemini");
        assert_eq!(req.language, "javascript");
        assert_eq!(req.complexity, "intermediate");
    }

    #[test]
    fn provider_spelling_is_preserved() {
        let req = validate(json!({ "prompt": "p", "modelProvider": "GROQ" })).unwrap();
        assert_eq!(req.model_provider, "GROQ");
    }

    #[test]
    fn generate_fields_are_read() {
        let req = validate(json!({
            "prompt": "p",
            "language": "rust",
            "complexity": "advanced"
        }))
        .unwrap();
        assert_eq!(req.language, "rust");
        assert_eq!(req.complexity, "advanced");
    }

    #[test]
    fn missing_or_unusable_prompt() {
        for body in [
            json!({}),
            json!({ "modelProvider": "groq" }),
            json!({ "prompt": "" }),
            json!({ "prompt": "   \n" }),
            json!({ "prompt": null }),
            json!({ "prompt": 42 }),
            json!(["prompt"]),
            json!("prompt"),
        ] {
            assert!(
                matches!(validate(body.clone()), Err(RelayError::MissingPrompt)),
                "{body} should be rejected"
            );
        }
        assert!(matches!(
            PromptRequest::from_json(None),
            Err(RelayError::MissingPrompt)
        ));
    }

    #[test]
    fn non_string_optionals_fall_back() {
        let req = validate(json!({
            "prompt": "p",
            "modelProvider": null,
            "language": 3
        }))
        .unwrap();
        assert_eq!(req.model_provider, DEFAULT_PROVIDER);
        assert_eq!(req.language, DEFAULT_LANGUAGE);
    }

    #[test]
    fn prompt_is_not_trimmed() {
        let req = validate(json!({ "prompt": "  keep my spacing  " })).unwrap();
        assert_eq!(req.prompt, "  keep my spacing  ");
    }
}
