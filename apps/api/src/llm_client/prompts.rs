// Cross-cutting prompt fragments shared by every prompt sent to the oracle.
// Feature prompts live in a prompts.rs next to the code that uses them.

/// Closing instruction appended to prompts whose answer must be bare JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "Return ONLY JSON. No explanations or text outside the JSON.";
