//! Best-effort extraction of code and JSON from LLM responses
//!
//! LLM output frequently wraps the payload in markdown code fences, with or
//! without a language tag, and sometimes with prose around it. Both the
//! intent resolver and the code synthesizer share these helpers.

/// Extract the contents of the first fenced code block, if any.
///
/// Handles ```python, ```json, bare ``` and ignores anything after the
/// closing fence. Returns `None` when the response has no fenced block.
pub fn first_code_block(response: &str) -> Option<String> {
    let start = response.find("```")?;
    let after_fence = &response[start + 3..];

    // Skip an optional language tag on the opening fence line
    let body_start = match after_fence.find('\n') {
        Some(newline) => {
            let tag = after_fence[..newline].trim();
            if tag.chars().all(|c| c.is_ascii_alphanumeric()) {
                newline + 1
            } else {
                0
            }
        }
        None => return None,
    };

    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim().to_string())
}

/// Extract code from a response: first fenced block if present, otherwise
/// the trimmed raw text.
pub fn extract_code(response: &str) -> String {
    first_code_block(response).unwrap_or_else(|| response.trim().to_string())
}

/// Strip markdown fences and surrounding prose before JSON decoding.
///
/// Prefers the span between the first `{` or `[` and the last `}` or `]`;
/// falls back to fenced-block contents, then the trimmed raw text.
pub fn extract_json(response: &str) -> String {
    let json_start = response.find('{').or_else(|| response.find('['));
    let json_end = response.rfind('}').or_else(|| response.rfind(']'));

    if let (Some(start), Some(end)) = (json_start, json_end) {
        if start < end {
            return response[start..=end].to_string();
        }
    }

    if let Some(block) = first_code_block(response) {
        return block;
    }

    response.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_code_block_with_language_tag() {
        let response = "Here is the code:\n```python\nimport pandas as pd\ndf.head()\n```\nDone.";
        let code = first_code_block(response).unwrap();
        assert_eq!(code, "import pandas as pd\ndf.head()");
    }

    #[test]
    fn test_first_code_block_bare_fence() {
        let response = "```\nprint('hi')\n```";
        assert_eq!(first_code_block(response).unwrap(), "print('hi')");
    }

    #[test]
    fn test_first_code_block_only_first() {
        let response = "```python\nfirst\n```\ntext\n```python\nsecond\n```";
        assert_eq!(first_code_block(response).unwrap(), "first");
    }

    #[test]
    fn test_extract_code_raw_fallback() {
        let response = "  df.describe()  ";
        assert_eq!(extract_code(response), "df.describe()");
    }

    #[test]
    fn test_extract_json_from_markdown() {
        let response = "Here's the JSON:\n```json\n{\"task_type\": \"eda\"}\n```";
        let extracted = extract_json(response);
        assert!(extracted.contains("task_type"));
        assert!(serde_json::from_str::<serde_json::Value>(&extracted).is_ok());
    }

    #[test]
    fn test_extract_json_with_prose() {
        let response = "Sure! {\"a\": 1} hope that helps";
        assert_eq!(extract_json(response), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_json_unfenced_passthrough() {
        let response = "not json at all";
        assert_eq!(extract_json(response), "not json at all");
    }
}
