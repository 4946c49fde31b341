//! Fenced Block Extraction
//!
//! Generator output wraps payloads in markdown fences tagged with a language
//! hint (```` ```sql ```` for queries, ```` ```json ```` for chart directives).

use lazy_static::lazy_static;
use regex::Regex;

pub const SQL_TAG: &str = "sql";
pub const JSON_TAG: &str = "json";

lazy_static! {
    static ref JSON_BLOCK: Regex = block_regex(JSON_TAG);
    static ref BLANK_RUNS: Regex = Regex::new(r"\n{3,}").unwrap();
}

fn block_regex(tag: &str) -> Regex {
    // Tag is escaped, so the pattern is always valid.
    Regex::new(&format!(
        r"(?is)```{}(?:[ \t]+|[ \t]*\r?\n)(.*?)```",
        regex::escape(tag)
    ))
    .unwrap()
}

/// Content of the first fenced block tagged `tag`, trimmed. `None` if there is no such block.
pub fn extract_block(text: &str, tag: &str) -> Option<String> {
    let re = if tag.eq_ignore_ascii_case(JSON_TAG) {
        JSON_BLOCK.clone()
    } else {
        block_regex(tag)
    };
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// SQL from a generator response: the fenced `sql` block if present, otherwise the whole trimmed response.
pub fn extract_sql(response: &str) -> String {
    extract_block(response, SQL_TAG).unwrap_or_else(|| response.trim().to_string())
}

/// Remove every `json` fenced block, leaving the surrounding prose.
pub fn strip_json_blocks(text: &str) -> String {
    let stripped = JSON_BLOCK.replace_all(text, "");
    BLANK_RUNS.replace_all(stripped.trim(), "\n\n").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_fenced_sql() {
        let response = "Here you go:\n```sql\n  SELECT region, SUM(amount) FROM sales GROUP BY region;  \n```\nAnything else?";
        assert_eq!(
            extract_sql(response),
            "SELECT region, SUM(amount) FROM sales GROUP BY region;"
        );
    }

    #[test]
    fn test_fallback_to_whole_response() {
        let response = "  SELECT * FROM customers  \n";
        assert_eq!(extract_sql(response), "SELECT * FROM customers");
    }

    #[test]
    fn test_tag_is_case_insensitive_and_exact() {
        assert_eq!(extract_block("```SQL\nSELECT 1\n```", SQL_TAG).as_deref(), Some("SELECT 1"));
        assert!(extract_block("```sqlite\nSELECT 1\n```", SQL_TAG).is_none());
        assert!(extract_block("```\nSELECT 1\n```", SQL_TAG).is_none());
    }

    #[test]
    fn test_first_block_wins() {
        let response = "```sql\nSELECT 1\n```\n```sql\nSELECT 2\n```";
        assert_eq!(extract_sql(response), "SELECT 1");
    }

    #[test]
    fn test_json_block_extracted_and_stripped() {
        let response = "Sales are highest in the West.\n\n```json\n{\"plot_type\": \"bar\", \"x_axis\": \"region\"}\n```\n";
        assert_eq!(
            extract_block(response, JSON_TAG).as_deref(),
            Some("{\"plot_type\": \"bar\", \"x_axis\": \"region\"}")
        );
        assert_eq!(strip_json_blocks(response), "Sales are highest in the West.");
    }

    #[test]
    fn test_strip_keeps_text_without_blocks() {
        assert_eq!(strip_json_blocks("  plain answer \n"), "plain answer");
    }
}
