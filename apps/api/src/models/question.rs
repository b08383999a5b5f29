use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const DEFAULT_CATEGORY: &str = "General";
pub const FALLBACK_TEXT: &str = "Failed to generate questions. Please try again.";
pub const ERROR_TEXT: &str = "Error generating questions.";

/// Longest upstream excerpt ever echoed back to a caller.
pub const SNIPPET_CHARS: usize = 2000;

/// Difficulty of a single interview question.
///
/// Deserialization is lenient because the oracle is untrusted: casing is
/// ignored, and anything that is not one of the three levels becomes `Medium`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(raw
            .as_ref()
            .and_then(Value::as_str)
            .map(Difficulty::parse_lenient)
            .unwrap_or_default())
    }
}

/// Machine-readable context attached to a fallback question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(default)]
    pub raw_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_body_snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default = "Utc::now")]
    pub recorded_at: DateTime<Utc>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            http_status: None,
            raw_text: None,
            parsed_body_snippet: None,
            error: None,
            recorded_at: Utc::now(),
        }
    }
}

/// A single generated interview question. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default, deserialize_with = "string_or_empty")]
    pub text: String,
    #[serde(default = "default_category", deserialize_with = "category_or_default")]
    pub category: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(
        rename = "_diagnostic",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub diagnostic: Option<Diagnostic>,
}

impl Question {
    pub fn new(text: impl Into<String>, category: impl Into<String>, difficulty: Difficulty) -> Self {
        Self {
            text: text.into(),
            category: category.into(),
            difficulty,
            diagnostic: None,
        }
    }

    /// The placeholder returned instead of an empty list.
    pub fn fallback(text: &str, diagnostic: Diagnostic) -> Self {
        Self {
            text: text.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            difficulty: Difficulty::default(),
            diagnostic: Some(diagnostic),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.diagnostic.is_some()
    }
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn string_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn category_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(default_category))
}
