//! Oracle reply normalization.
//!
//! The oracle is untrusted: the transport body may not be JSON, may be an
//! error object, or may carry the requested array wrapped in prose or code
//! fences. `interpret_reply` sorts every reply into exactly one of
//! questions / fallback / error, and never into an empty list.

use serde_json::Value;
use tracing::{error, warn};

use crate::generation::{GatewayError, GenerationOutcome};
use crate::llm_client::{GenerateContentResponse, OracleReply};
use crate::models::question::{Diagnostic, Question, FALLBACK_TEXT, SNIPPET_CHARS};
use crate::text::truncate_chars;

/// Why no questions could be pulled out of the candidate text.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractFailure {
    NoCandidateText,
    NoArray,
    Unparseable(String),
    Empty,
}

impl ExtractFailure {
    fn describe(&self) -> String {
        match self {
            ExtractFailure::NoCandidateText => "Oracle response carried no candidate text".to_string(),
            ExtractFailure::NoArray => "No JSON array found in candidate text".to_string(),
            ExtractFailure::Unparseable(e) => format!("Candidate array failed to parse: {e}"),
            ExtractFailure::Empty => "Oracle returned an empty question array".to_string(),
        }
    }
}

/// Turns a raw oracle reply into a generation outcome.
///
/// Order matters: a non-JSON body and an explicit `error` object are hard
/// errors; everything past that point degrades to a diagnosed fallback.
pub fn interpret_reply(reply: &OracleReply) -> Result<GenerationOutcome, GatewayError> {
    let body: Value = serde_json::from_str(&reply.body).map_err(|e| {
        error!("Failed to parse oracle response JSON: {e}");
        GatewayError::MalformedBody {
            status: reply.status,
            reason: e.to_string(),
            snippet: truncate_chars(&reply.body, SNIPPET_CHARS).to_string(),
        }
    })?;

    if let Some(details) = body.get("error").filter(|e| !e.is_null()) {
        error!("Oracle returned error object: {details}");
        return Err(GatewayError::Upstream {
            status: reply.status,
            details: details.clone(),
        });
    }

    let parsed: GenerateContentResponse =
        serde_json::from_value(body.clone()).unwrap_or_default();
    let raw_text = parsed.text();
    if raw_text.is_none() {
        warn!("No candidate text found in oracle response: {body}");
    }

    let failure = match raw_text.map(extract_questions) {
        Some(Ok(questions)) => return Ok(GenerationOutcome::Questions(questions)),
        Some(Err(failure)) => failure,
        None => ExtractFailure::NoCandidateText,
    };

    let diagnostic = Diagnostic {
        http_status: Some(reply.status),
        raw_text: raw_text.map(|t| truncate_chars(t, SNIPPET_CHARS).to_string()),
        parsed_body_snippet: Some(truncate_chars(&body.to_string(), SNIPPET_CHARS).to_string()),
        ..Diagnostic::new(format!(
            "No valid questions produced by oracle ({}). Returning fallback.",
            failure.describe()
        ))
    };
    warn!(?diagnostic, "Returning fallback question");

    Ok(GenerationOutcome::Fallback(Question::fallback(
        FALLBACK_TEXT,
        diagnostic,
    )))
}

/// Pulls a non-empty question array out of free-form candidate text.
///
/// Tried in order: the whole (fence-stripped) text, the span from the
/// leftmost `[` to the rightmost `]`, then each balanced top-level array.
pub fn extract_questions(text: &str) -> Result<Vec<Question>, ExtractFailure> {
    let stripped = strip_json_fences(text);

    let mut attempts: Vec<&str> = vec![stripped];
    if let Some(span) = outer_bracket_span(stripped) {
        attempts.push(span);
    }
    attempts.extend(balanced_arrays(stripped));

    let mut last_error = None;
    let mut saw_array = false;
    for candidate in attempts {
        if !candidate.trim_start().starts_with('[') {
            continue;
        }
        saw_array = true;
        match serde_json::from_str::<Vec<Question>>(candidate) {
            Ok(questions) if questions.is_empty() => last_error = Some(ExtractFailure::Empty),
            Ok(questions) => return Ok(questions),
            Err(e) => {
                if last_error.is_none() {
                    last_error = Some(ExtractFailure::Unparseable(e.to_string()));
                }
            }
        }
    }

    if !saw_array {
        return Err(ExtractFailure::NoArray);
    }
    Err(last_error.unwrap_or(ExtractFailure::NoArray))
}

/// Leftmost `[` through rightmost `]`, if both exist in that order.
fn outer_bracket_span(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

/// Every top-level `[...]` span whose brackets balance, in order.
/// Brackets inside JSON strings are ignored once inside an array.
fn balanced_arrays(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' if depth > 0 => in_string = true,
            '[' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            ']' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    spans.push(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    spans
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::Difficulty;
    use serde_json::json;

    fn gemini_body(text: &str) -> String {
        json!({"candidates": [{"content": {"parts": [{"text": text}]}}]}).to_string()
    }

    fn reply(status: u16, body: String) -> OracleReply {
        OracleReply { status, body }
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n[1]\n```";
        assert_eq!(strip_json_fences(input), "[1]");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n[1]\n```";
        assert_eq!(strip_json_fences(input), "[1]");
    }

    #[test]
    fn test_extracts_array_wrapped_in_prose() {
        let text = r#"Here you go: [{"text":"Q1","category":"C","difficulty":"easy"}] thanks"#;
        let questions = extract_questions(text).unwrap();
        assert_eq!(questions, vec![Question::new("Q1", "C", Difficulty::Easy)]);
    }

    #[test]
    fn test_extracts_fenced_array() {
        let text = "```json\n[{\"text\":\"Q\",\"category\":\"Rust\",\"difficulty\":\"hard\"}]\n```";
        let questions = extract_questions(text).unwrap();
        assert_eq!(questions[0].category, "Rust");
        assert_eq!(questions[0].difficulty, Difficulty::Hard);
    }

    #[test]
    fn test_balanced_scan_recovers_when_outer_span_overreaches() {
        // Leftmost '[' to rightmost ']' swallows the trailing "[sic]".
        let text = r#"[{"text":"Q1"}] note: answers vary [sic]"#;
        let questions = extract_questions(text).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].text, "Q1");
    }

    #[test]
    fn test_brackets_inside_strings_do_not_break_balance() {
        let text = r#"prefix [{"text":"What does v[0] return?"}] [x]"#;
        let questions = extract_questions(text).unwrap();
        assert_eq!(questions[0].text, "What does v[0] return?");
    }

    #[test]
    fn test_no_array_is_reported() {
        assert_eq!(
            extract_questions("I cannot help with that."),
            Err(ExtractFailure::NoArray)
        );
    }

    #[test]
    fn test_empty_array_is_reported() {
        assert_eq!(extract_questions("[]"), Err(ExtractFailure::Empty));
    }

    #[test]
    fn test_garbled_array_is_unparseable() {
        assert!(matches!(
            extract_questions("[{\"text\": }]"),
            Err(ExtractFailure::Unparseable(_))
        ));
    }

    #[test]
    fn test_interpret_reply_returns_questions() {
        let body = gemini_body(
            r#"Here you go: [{"text":"Q1","category":"C","difficulty":"easy"}] thanks"#,
        );
        let outcome = interpret_reply(&reply(200, body)).unwrap();
        assert_eq!(
            outcome,
            GenerationOutcome::Questions(vec![Question::new("Q1", "C", Difficulty::Easy)])
        );
    }

    #[test]
    fn test_interpret_reply_without_array_falls_back_with_diagnostic() {
        let body = gemini_body("Sorry, no questions today.");
        let outcome = interpret_reply(&reply(200, body)).unwrap();

        let questions = outcome.into_questions();
        assert_eq!(questions.len(), 1);
        let fallback = &questions[0];
        assert_eq!(fallback.text, FALLBACK_TEXT);
        assert_eq!(fallback.category, "General");
        assert_eq!(fallback.difficulty, Difficulty::Medium);

        let diagnostic = fallback.diagnostic.as_ref().unwrap();
        assert_eq!(diagnostic.http_status, Some(200));
        assert_eq!(diagnostic.raw_text.as_deref(), Some("Sorry, no questions today."));
        assert!(diagnostic.parsed_body_snippet.is_some());
    }

    #[test]
    fn test_interpret_reply_without_candidates_falls_back() {
        let outcome = interpret_reply(&reply(200, r#"{"candidates":[]}"#.to_string())).unwrap();
        match outcome {
            GenerationOutcome::Fallback(q) => {
                let diagnostic = q.diagnostic.unwrap();
                assert!(diagnostic.raw_text.is_none());
                assert!(diagnostic.message.contains("no candidate text"));
            }
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[test]
    fn test_interpret_reply_error_object_is_upstream_error() {
        let body = json!({"error": {"code": 429, "message": "quota", "status": "RESOURCE_EXHAUSTED"}});
        let err = interpret_reply(&reply(429, body.to_string())).unwrap_err();
        match err {
            GatewayError::Upstream { status, details } => {
                assert_eq!(status, 429);
                assert_eq!(details["message"], "quota");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[test]
    fn test_interpret_reply_non_json_body_is_malformed() {
        let err = interpret_reply(&reply(502, "<html>Bad Gateway</html>".to_string())).unwrap_err();
        match err {
            GatewayError::MalformedBody { status, snippet, .. } => {
                assert_eq!(status, 502);
                assert_eq!(snippet, "<html>Bad Gateway</html>");
            }
            other => panic!("expected malformed body, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_snippet_is_truncated() {
        let body = "x".repeat(5000);
        match interpret_reply(&reply(200, body)).unwrap_err() {
            GatewayError::MalformedBody { snippet, .. } => assert_eq!(snippet.len(), SNIPPET_CHARS),
            other => panic!("unexpected {other:?}"),
        }
    }
}
