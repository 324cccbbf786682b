//! Prompt templates for compliance analysis

use drhp_core::{AnalysisPrompt, MatchSet};

/// Separator placed between excerpts in the context block
pub const EXCERPT_SEPARATOR: &str = "\n\n---\n\n";

/// Regulatory review instructions; `{context}` receives the excerpts
pub const COMPLIANCE_REVIEW: &str = include_str!("../assets/prompts/compliance_review.txt");

pub fn format_prompt(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}

/// Joins every match's text in ranked order, ignoring scores
pub fn build_context(matches: &MatchSet) -> String {
    matches.texts().collect::<Vec<_>>().join(EXCERPT_SEPARATOR)
}

/// Build the review prompt for a non-empty set of matches
///
/// Callers short-circuit on an empty [`MatchSet`] rather than sending an
/// empty excerpt block.
pub fn build_prompt(matches: &MatchSet) -> AnalysisPrompt {
    build_prompt_with_template(COMPLIANCE_REVIEW, matches)
}

/// Same as [`build_prompt`] with a caller-supplied template containing `{context}`
pub fn build_prompt_with_template(template: &str, matches: &MatchSet) -> AnalysisPrompt {
    let context = build_context(matches);
    AnalysisPrompt::new(format_prompt(template, &[("context", &context)]))
}
