use once_cell::sync::Lazy;
use regex::Regex;

static THINK_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<think>[\s\S]*?</think>|<think\s*/>").unwrap());

static REASONING_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<reasoning>[\s\S]*?</reasoning>").unwrap());

static INTERNAL_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<internal>[\s\S]*?</internal>").unwrap());

static RESULT_PLACEHOLDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{result\}\}").unwrap());

static MULTIPLE_NEWLINES_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Strip reasoning tags and template leftovers some models emit around their answer.
pub fn clean_llm_response(response: &str) -> String {
    let cleaned = THINK_TAG_PATTERN.replace_all(response, "");
    let cleaned = REASONING_TAG_PATTERN.replace_all(&cleaned, "");
    let cleaned = INTERNAL_TAG_PATTERN.replace_all(&cleaned, "");
    let cleaned = RESULT_PLACEHOLDER_PATTERN.replace_all(&cleaned, "");
    MULTIPLE_NEWLINES_PATTERN
        .replace_all(cleaned.trim(), "\n\n")
        .to_string()
}

/// Reduce a model reply to the JSON object it carries.
///
/// Handles a raw chat-completion envelope, markdown code fences and prose
/// wrapped around the object. Returns the trimmed input when no object is found.
pub fn extract_json_payload(output: &str) -> String {
    let trimmed = output.trim();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(content) = value
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
        {
            return extract_json_payload(content);
        }
        return trimmed.to_string();
    }

    let unfenced = strip_code_fence(trimmed);
    if serde_json::from_str::<serde_json::Value>(&unfenced).is_ok() {
        return unfenced;
    }

    match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if start < end => unfenced[start..=end].to_string(),
        _ => unfenced,
    }
}

fn strip_code_fence(value: &str) -> String {
    let trimmed = value.trim();
    if let Some(stripped) = trimmed.strip_prefix("```json") {
        return stripped.trim().trim_end_matches("```").trim().to_string();
    }
    if let Some(stripped) = trimmed.strip_prefix("```") {
        return stripped.trim().trim_end_matches("```").trim().to_string();
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_think_tags() {
        let input = "<think>Some reasoning here</think>{\"figure\": 1}";
        assert_eq!(clean_llm_response(input), "{\"figure\": 1}");
    }

    #[test]
    fn test_clean_self_closing_think() {
        assert_eq!(clean_llm_response("<think />Output"), "Output");
    }

    #[test]
    fn test_clean_reasoning_and_internal() {
        let input = "<reasoning>r</reasoning><internal>i</internal>Final";
        assert_eq!(clean_llm_response(input), "Final");
    }

    #[test]
    fn test_clean_multiple_newlines() {
        assert_eq!(clean_llm_response("a\n\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_extract_plain_object() {
        assert_eq!(extract_json_payload(" {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_fenced_object() {
        let input = "```json\n{\"revenue\": 10.5}\n```";
        assert_eq!(extract_json_payload(input), "{\"revenue\": 10.5}");
    }

    #[test]
    fn test_extract_from_chat_envelope() {
        let input = r#"{"choices":[{"message":{"content":"```\n{\"figure\": 3}\n```"}}]}"#;
        assert_eq!(extract_json_payload(input), "{\"figure\": 3}");
    }

    #[test]
    fn test_extract_object_inside_prose() {
        let input = "Sure! Here it is: {\"figure\": 12345.67} Let me know.";
        assert_eq!(extract_json_payload(input), "{\"figure\": 12345.67}");
    }

    #[test]
    fn test_extract_without_object_returns_input() {
        assert_eq!(extract_json_payload("no json here"), "no json here");
    }
}
