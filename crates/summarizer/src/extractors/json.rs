use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use monitor_core::{ConversationSummary, SessionId};

/// Drops a leading ```lang line and a trailing ``` fence around a JSON reply.
pub fn strip_json_fences(raw: &str) -> String {
    let mut text = raw.trim();
    if text.starts_with("```") {
        text = text.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
    }
    if let Some(body) = text.trim_end().strip_suffix("```") {
        text = body;
    }
    text.trim().to_string()
}

/// Drops ```markdown, ```md or bare ``` fences around a Markdown reply.
pub fn strip_markdown_fences(raw: &str) -> String {
    let mut text = raw.trim();
    for opener in ["```markdown", "```md", "```"] {
        if let Some(rest) = text.strip_prefix(opener) {
            text = rest.trim_start();
            break;
        }
    }
    if let Some(body) = text.strip_suffix("```") {
        text = body.trim_end();
    }
    text.to_string()
}

/// Parses the model's analysis into a summary. Missing sections default to empty.
pub fn parse_summary(session_id: &SessionId, raw: &str) -> Result<ConversationSummary> {
    let cleaned = strip_json_fences(raw);
    let json: Value = serde_json::from_str(&cleaned).context("model response is not valid JSON")?;
    if !json.is_object() {
        return Err(anyhow!("model response is not a JSON object"));
    }

    Ok(ConversationSummary {
        session_id: session_id.clone(),
        employee_profile: object_field(&json, "employee_profile"),
        workflow_analysis: object_field(&json, "workflow_analysis"),
        conversation_quality: object_field(&json, "conversation_quality"),
        key_insights: string_list(&json, "key_insights"),
        suggested_actions: string_list(&json, "suggested_actions"),
        overall_summary: json.get("overall_summary")
            .and_then(|s| s.as_str())
            .unwrap_or_default()
            .to_string(),
    })
}

fn object_field(json: &Value, key: &str) -> Value {
    json.get(key)
        .filter(|v| v.is_object())
        .cloned()
        .unwrap_or_else(|| Value::Object(Default::default()))
}

fn string_list(json: &Value, key: &str) -> Vec<String> {
    json.get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items.iter()
                .filter_map(|i| i.as_str())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_code_block() {
        let raw = "```json\n{\"overall_summary\": \"ok\"}\n```";
        assert_eq!(strip_json_fences(raw), "{\"overall_summary\": \"ok\"}");
        assert_eq!(strip_json_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn strips_markdown_variants() {
        assert_eq!(strip_markdown_fences("```markdown\n# Skill: X\n```"), "# Skill: X");
        assert_eq!(strip_markdown_fences("```md\n# Skill: X\n```"), "# Skill: X");
        assert_eq!(strip_markdown_fences("```\n# Skill: X\n```"), "# Skill: X");
        assert_eq!(strip_markdown_fences("# Skill: X"), "# Skill: X");
    }

    #[test]
    fn parses_summary_with_defaults() {
        let id = SessionId::new("s1");
        let raw = r#"{"key_insights": ["Uses Excel daily", 3], "overall_summary": "Payroll clerk."}"#;
        let summary = parse_summary(&id, raw).unwrap();

        assert_eq!(summary.session_id, id);
        assert_eq!(summary.key_insights, vec!["Uses Excel daily"]);
        assert!(summary.suggested_actions.is_empty());
        assert!(summary.employee_profile.as_object().unwrap().is_empty());
        assert_eq!(summary.overall_summary, "Payroll clerk.");
    }

    #[test]
    fn rejects_non_json() {
        let id = SessionId::new("s1");
        assert!(parse_summary(&id, "Sorry, I can't help with that.").is_err());
        assert!(parse_summary(&id, "[1, 2]").is_err());
    }
}
