//! Repair Prompt
//!
//! Follow-up prompt built from the failed query and its error.

use crate::execution_loop::error_classifier::ErrorClassifier;

#[derive(Debug, Clone, Default)]
pub struct RepairPromptBuilder {
    classifier: ErrorClassifier,
}

impl RepairPromptBuilder {
    pub fn new() -> Self {
        Self {
            classifier: ErrorClassifier::new(),
        }
    }

    /// The failed SQL and error text are embedded verbatim.
    pub fn build(&self, failed_sql: &str, error: &str) -> String {
        let class = self.classifier.classify(error);

        let mut parts = Vec::new();
        parts.push("The previous SQL query failed.".to_string());
        parts.push(format!("**Query:** {}", failed_sql));
        parts.push(format!("**Error:** {}", error));
        parts.push(String::new());
        parts.push(
            "Please examine the Schema again and correct the query. Return ONLY the corrected SQL inside a ```sql block."
                .to_string(),
        );
        parts.push(format!("Hint: {}", class.hint()));

        parts.join("\n")
    }
}

/// Repair prompt with schema context prepended, as sent to the generator.
pub fn repair_prompt(system_context: &str, failed_sql: &str, error: &str) -> String {
    format!(
        "{}\n\n{}",
        system_context,
        RepairPromptBuilder::new().build(failed_sql, error)
    )
}
