// Prompt constants for question generation.

use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;

/// Number of questions requested from the oracle per call.
pub const QUESTIONS_PER_CALL: usize = 5;

pub const DEFAULT_COMPANY: &str = "General";
pub const DEFAULT_DIFFICULTY: &str = "easy";

/// Question generation prompt. Placeholders are replaced verbatim;
/// the resume text is not escaped.
pub const QUESTION_PROMPT_TEMPLATE: &str = r#"
You are an interview question generator.
Read this resume and position and generate exactly {count} questions as JSON array only.
Each element must have:
{
  "text": "question text",
  "category": "topic name",
  "difficulty": "easy | medium | hard"
}

Resume:
{resume}

Position: {position}
Company: {company}
Preferred difficulty: {difficulty}

{json_only}
"#;

/// Builds the generation prompt. Blank company / difficulty take their defaults.
pub fn build_question_prompt(resume: &str, position: &str, company: &str, difficulty: &str) -> String {
    let company = non_blank_or(company, DEFAULT_COMPANY);
    let difficulty = non_blank_or(difficulty, DEFAULT_DIFFICULTY);

    let count = QUESTIONS_PER_CALL.to_string();
    render_template(
        QUESTION_PROMPT_TEMPLATE,
        &[
            ("count", count.as_str()),
            ("resume", resume),
            ("position", position),
            ("company", company),
            ("difficulty", difficulty),
            ("json_only", JSON_ONLY_INSTRUCTION),
        ],
    )
}

/// Single-pass `{name}` substitution. Substituted values are never rescanned,
/// and braces that do not name a known placeholder are copied through.
fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let hit = tail.find('}').and_then(|close| {
            let name = &tail[..close];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match hit {
            Some((value, close)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

fn non_blank_or<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() {
        default
    } else {
        value
    }
}
