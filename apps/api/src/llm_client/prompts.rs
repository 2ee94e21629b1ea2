// Shared prompt fragments. Each feature module keeps its own prompts.rs;
// only cross-cutting instructions live here.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with a single valid JSON object. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to prompts that describe a real person or company.
pub const FACTUALITY_INSTRUCTION: &str = "\
    Only state facts that appear in the provided profile or research results. \
    If a detail is not provided, leave it out rather than guessing. \
    Never invent employers, schools, dates or numbers.";

/// Builds a system prompt from a role description and the JSON-only rule.
pub fn json_system(role: &str) -> String {
    format!("{role} {JSON_ONLY_SYSTEM}")
}

/// Substitutes `{name}` placeholders in a single pass over the template.
///
/// Substituted values are never rescanned, so user text that happens to
/// contain `{research}` or similar stays literal. Braces that do not open a
/// known placeholder (JSON examples in templates) are copied through.
pub fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];

        let hit = vars.iter().find_map(|(name, value)| {
            tail.strip_prefix('{')
                .and_then(|t| t.strip_prefix(name))
                .filter(|t| t.starts_with('}'))
                .map(|_| (name.len() + 2, *value))
        });

        match hit {
            Some((consumed, value)) => {
                out.push_str(value);
                rest = &tail[consumed..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}
