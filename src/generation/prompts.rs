// file: src/generation/prompts.rs
// description: system prompt templates for paper summaries and feedback
// reference: internal prompt standards

use crate::models::{DocumentSummary, PaperMetadata};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::HashMap;

lazy_static! {
    static ref PLACEHOLDER: Regex =
        Regex::new(r"\{([a-z_]+)\}").expect("PLACEHOLDER regex is valid");
}

pub const DEFAULT_SUMMARY_PROMPT: &str = "You are a research assistant. Summarize the paper \
\"{title}\" by {authors} ({year}) for a researcher comparing it against their own draft. \
Cover the problem, the method, the main results and the limitations in at most five sentences. \
Use only the information provided.";

pub const DEFAULT_FEEDBACK_PROMPT: &str = "You are an experienced peer reviewer. You receive a \
draft paper followed by summaries of the most similar published papers. Give concrete feedback \
on the draft: how it differs from the related work, what is novel, what is missing, and which \
claims need stronger evidence. Refer to related papers by their titles.";

const SUMMARY_SEPARATOR: &str = "\n\n==========\n\n";

/// A prompt with `{placeholder}` slots filled from paper metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn summary(custom: Option<&str>) -> Self {
        Self::new(custom.unwrap_or(DEFAULT_SUMMARY_PROMPT))
    }

    pub fn feedback(custom: Option<&str>) -> Self {
        Self::new(custom.unwrap_or(DEFAULT_FEEDBACK_PROMPT))
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Fills `{title}`, `{authors}`, `{year}`, `{abstract}`, `{source}` and
    /// `{rank}`. Unknown placeholders are left as written.
    pub fn render(&self, metadata: &PaperMetadata, rank: usize) -> String {
        let rank = rank.to_string();
        let values = HashMap::from([
            ("title", metadata.title.as_str()),
            ("authors", metadata.authors.as_str()),
            ("year", metadata.year.as_str()),
            ("abstract", metadata.abstract_text.as_str()),
            ("source", metadata.source.as_str()),
            ("rank", rank.as_str()),
        ]);

        self.render_with_map(&values)
    }

    /// Substitutes every placeholder in one pass over the template, so
    /// placeholder text inside a value is kept literally.
    pub fn render_with_map(&self, values: &HashMap<&str, &str>) -> String {
        PLACEHOLDER
            .replace_all(&self.template, |caps: &Captures| match values.get(&caps[1]) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

/// User content sent when summarizing one stored paper.
pub fn paper_input(metadata: &PaperMetadata) -> String {
    format!(
        "Title: {}\nAuthors: {}\nYear: {}\nAbstract: {}",
        metadata.title, metadata.authors, metadata.year, metadata.abstract_text
    )
}

/// User content for the final feedback call: the draft, then every summary.
pub fn feedback_input(user_text: &str, summaries: &[DocumentSummary]) -> String {
    let mut sections = vec![format!("[Draft paper]\n{}", user_text.trim())];

    sections.extend(summaries.iter().enumerate().map(|(i, summary)| {
        format!(
            "[Similar paper {}: {}]\n{}",
            i + 1,
            summary.title,
            summary.summary.trim()
        )
    }));

    sections.join(SUMMARY_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> PaperMetadata {
        PaperMetadata {
            id: "p1".to_string(),
            title: "Sparse Attention".to_string(),
            authors: "Kim, Lee".to_string(),
            year: "2021".to_string(),
            abstract_text: "We study sparse attention.".to_string(),
            source: "papers/sparse.pdf".to_string(),
        }
    }

    #[test]
    fn test_render_fills_placeholders() {
        let template = PromptTemplate::new("#{rank} {title} by {authors} ({year}) from {source}: {unknown}");
        assert_eq!(
            template.render(&metadata(), 2),
            "#2 Sparse Attention by Kim, Lee (2021) from papers/sparse.pdf: {unknown}"
        );
    }

    #[test]
    fn test_placeholders_inside_values_stay_literal() {
        let mut paper = metadata();
        paper.title = "On {year} and {source}".to_string();
        paper.abstract_text = "Mentions {rank}.".to_string();

        let template = PromptTemplate::new("{title} / {abstract} / {year}");
        assert_eq!(
            template.render(&paper, 4),
            "On {year} and {source} / Mentions {rank}. / 2021"
        );
    }

    #[test]
    fn test_default_summary_prompt() {
        let rendered = PromptTemplate::summary(None).render(&metadata(), 1);
        assert!(rendered.contains("\"Sparse Attention\" by Kim, Lee (2021)"));
        assert!(!rendered.contains('{'));
    }

    #[test]
    fn test_custom_prompt_overrides_default() {
        let template = PromptTemplate::feedback(Some("Be brief."));
        assert_eq!(template.as_str(), "Be brief.");
    }

    #[test]
    fn test_feedback_input_separates_summaries() {
        let summaries = vec![
            DocumentSummary {
                document_key: "a.pdf".to_string(),
                title: "A".to_string(),
                summary: "Summary of A.".to_string(),
            },
            DocumentSummary {
                document_key: "b.pdf".to_string(),
                title: "B".to_string(),
                summary: "Summary of B.".to_string(),
            },
        ];

        let input = feedback_input("My draft.", &summaries);
        let sections: Vec<&str> = input.split(SUMMARY_SEPARATOR).collect();
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0], "[Draft paper]\nMy draft.");
        assert_eq!(sections[2], "[Similar paper 2: B]\nSummary of B.");
    }

    #[test]
    fn test_paper_input() {
        let input = paper_input(&metadata());
        assert!(input.starts_with("Title: Sparse Attention\n"));
        assert!(input.ends_with("Abstract: We study sparse attention."));
    }
}
