//! Prompt builders for the answer and summary endpoints.

use kuppi_core::defaults;

/// Tone requested for a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryStyle {
    #[default]
    Casual,
    Formal,
    Academic,
}

impl SummaryStyle {
    /// Parse a style name; unknown names fall back to casual.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("formal") => SummaryStyle::Formal,
            Some("academic") => SummaryStyle::Academic,
            _ => SummaryStyle::Casual,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SummaryStyle::Casual => "conversational and easy to understand",
            SummaryStyle::Formal => "professional and straightforward",
            SummaryStyle::Academic => "scholarly with precise terminology",
        }
    }
}

/// Clamp a requested summary length into 1..=100 percent.
pub fn clamp_percentage(raw: Option<i64>) -> u8 {
    match raw {
        Some(p) => p.clamp(1, 100) as u8,
        None => defaults::SUMMARY_PERCENTAGE,
    }
}

/// The question is sent to the model as-is.
pub fn answer_prompt(question: &str) -> String {
    question.trim().to_string()
}

pub fn summary_prompt(content: &str, percentage: u8, style: SummaryStyle) -> String {
    format!(
        "You are a helpful AI that provides concise summaries of text. \
         Summarize the following content in a {} style. \
         The summary should be approximately {}% of the original length \
         (summarize the content in the provided language itself):\n\n{}",
        style.description(),
        percentage,
        content
    )
}
