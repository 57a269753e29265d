// file: src/text/normalizer.rs
// description: Whitespace and punctuation normalization shared by ingestion and query paths
// reference: https://docs.rs/regex

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HORIZONTAL_WHITESPACE: Regex =
        Regex::new(r"[^\S\n]+").expect("HORIZONTAL_WHITESPACE regex is valid");
    static ref EXCESS_BLANK_LINES: Regex =
        Regex::new(r"\n{3,}").expect("EXCESS_BLANK_LINES regex is valid");
    static ref PUNCTUATION: Regex = Regex::new(r"\p{P}+").expect("PUNCTUATION regex is valid");
}

/// Text preparation policy. The same instance must serve both the ingestion
/// and the query path, otherwise stored and query vectors are not comparable.
#[derive(Debug, Clone, Default)]
pub struct TextNormalizer {
    strip_punctuation: bool,
}

impl TextNormalizer {
    pub fn new(strip_punctuation: bool) -> Self {
        Self { strip_punctuation }
    }

    pub fn strips_punctuation(&self) -> bool {
        self.strip_punctuation
    }

    /// Collapses whitespace inside lines and keeps single blank lines as
    /// paragraph breaks.
    pub fn normalize(&self, content: &str) -> String {
        let unified = content.replace("\r\n", "\n").replace('\r', "\n");

        let lines: Vec<String> = unified
            .lines()
            .map(|line| HORIZONTAL_WHITESPACE.replace_all(line, " ").trim().to_string())
            .collect();

        EXCESS_BLANK_LINES
            .replace_all(&lines.join("\n"), "\n\n")
            .trim()
            .to_string()
    }

    /// Final shaping of a chunk right before it is sent to the embedding backend.
    pub fn prepare_for_embedding(&self, chunk: &str) -> String {
        if !self.strip_punctuation {
            return chunk.to_string();
        }

        let stripped = PUNCTUATION.replace_all(chunk, " ");
        stripped.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_normalization() {
        let normalizer = TextNormalizer::default();
        let content = "  Deep   learning\tmodels \r\nare   large.  ";
        assert_eq!(
            normalizer.normalize(content),
            "Deep learning models\nare large."
        );
    }

    #[test]
    fn test_paragraph_breaks_collapse() {
        let normalizer = TextNormalizer::default();
        let content = "Intro.\n\n\n\n   \nMethods.";
        assert_eq!(normalizer.normalize(content), "Intro.\n\nMethods.");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let normalizer = TextNormalizer::default();
        let once = normalizer.normalize("A  b\n\n\n c \r\n\r\nd");
        assert_eq!(normalizer.normalize(&once), once);
    }

    #[test]
    fn test_punctuation_policy() {
        let keep = TextNormalizer::new(false);
        assert_eq!(keep.prepare_for_embedding("Hello, world!"), "Hello, world!");

        let strip = TextNormalizer::new(true);
        assert_eq!(strip.prepare_for_embedding("Hello, world! (v2.0)"), "Hello world v2 0");
    }

    #[test]
    fn test_whitespace_only_input() {
        let normalizer = TextNormalizer::default();
        assert!(normalizer.normalize(" \n\t \n ").is_empty());
    }
}
