// file: src/text/chunker.rs
// description: token-bounded text chunking by paragraph, sentence, then word
// reference: recursive splitting with greedy accumulation

use crate::error::PipelineError;
use crate::text::tokenizer::TokenCounter;
use std::sync::Arc;
use tracing::{debug, warn};

const PARAGRAPH_SEPARATOR: &str = "\n\n";
const UNIT_SEPARATOR: &str = " ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Granularity {
    Paragraph,
    Sentence,
    Word,
}

impl Granularity {
    fn finer(self) -> Option<Self> {
        match self {
            Granularity::Paragraph => Some(Granularity::Sentence),
            Granularity::Sentence => Some(Granularity::Word),
            Granularity::Word => None,
        }
    }

    fn split(self, text: &str) -> Vec<&str> {
        match self {
            Granularity::Paragraph => split_paragraphs(text),
            Granularity::Sentence => split_sentences(text),
            Granularity::Word => text.split_whitespace().collect(),
        }
    }
}

pub struct TextChunker {
    counter: Arc<dyn TokenCounter>,
}

impl TextChunker {
    pub fn new(counter: Arc<dyn TokenCounter>) -> Self {
        Self { counter }
    }

    pub fn count_tokens(&self, text: &str) -> usize {
        self.counter.count(text)
    }

    /// Splits `text` into chunks of at most `max_tokens` tokens. A single word
    /// larger than the budget is emitted on its own rather than cut.
    pub fn chunk(&self, text: &str, max_tokens: usize) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut builder = ChunkBuilder::new(max_tokens);

        for paragraph in split_paragraphs(text) {
            self.push_unit(&mut builder, paragraph, Granularity::Paragraph, PARAGRAPH_SEPARATOR);
        }

        let chunks = builder.finish();
        debug!(
            "Split {} chars into {} chunk(s) with budget {}",
            text.len(),
            chunks.len(),
            max_tokens
        );
        chunks
    }

    fn push_unit(
        &self,
        builder: &mut ChunkBuilder,
        unit: &str,
        level: Granularity,
        separator: &'static str,
    ) {
        let tokens = self.counter.count(unit);

        if tokens <= builder.max_tokens {
            builder.push(self.counter.as_ref(), unit, separator);
            return;
        }

        match level.finer() {
            Some(finer) => {
                let parts = finer.split(unit);
                // a unit that does not split any further goes down a level directly
                if parts.len() <= 1 && finer != Granularity::Word {
                    self.push_unit(builder, unit, finer, separator);
                    return;
                }
                for (i, part) in parts.into_iter().enumerate() {
                    let sep = if i == 0 { separator } else { UNIT_SEPARATOR };
                    self.push_unit(builder, part, finer, sep);
                }
            }
            None => {
                warn!("{}", oversized_word(tokens, builder.max_tokens));
                builder.push_oversized(unit, tokens);
            }
        }
    }
}

fn oversized_word(tokens: usize, max_tokens: usize) -> PipelineError {
    PipelineError::Chunking(format!(
        "word of {} tokens exceeds budget {}, keeping it as an oversized chunk",
        tokens, max_tokens
    ))
}

struct ChunkBuilder {
    max_tokens: usize,
    chunks: Vec<String>,
    current: String,
}

impl ChunkBuilder {
    fn new(max_tokens: usize) -> Self {
        Self {
            max_tokens,
            chunks: Vec::new(),
            current: String::new(),
        }
    }

    /// Appends `unit`, which fits the budget alone. The joined chunk is
    /// recounted so separator tokens are charged too.
    fn push(&mut self, counter: &dyn TokenCounter, unit: &str, separator: &str) {
        if !self.current.is_empty() {
            let candidate = format!("{}{}{}", self.current, separator, unit);
            if counter.count(&candidate) <= self.max_tokens {
                self.current = candidate;
                return;
            }
            self.flush();
        }

        self.current.push_str(unit);
    }

    fn push_oversized(&mut self, unit: &str, tokens: usize) {
        self.flush();
        self.chunks.push(unit.to_string());
        debug!("Emitted oversized chunk of {} tokens", tokens);
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.chunks.push(std::mem::take(&mut self.current));
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.chunks
    }
}

fn split_paragraphs(text: &str) -> Vec<&str> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Splits after sentence-final punctuation that is followed by whitespace.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if !matches!(ch, '.' | '!' | '?' | '。' | '！' | '？') {
            continue;
        }

        let end = idx + ch.len_utf8();
        if let Some(&(_, next)) = chars.peek()
            && next.is_whitespace()
        {
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::tokenizer::HeuristicTokenCounter;
    use pretty_assertions::assert_eq;

    fn chunker() -> TextChunker {
        TextChunker::new(Arc::new(HeuristicTokenCounter::new(1.0)))
    }

    fn words(text: &str) -> Vec<&str> {
        text.split_whitespace().collect()
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        assert!(chunker().chunk("", 10).is_empty());
        assert!(chunker().chunk("  \n\n \t ", 10).is_empty());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = chunker().chunk("A short paragraph.", 10);
        assert_eq!(chunks, vec!["A short paragraph.".to_string()]);
    }

    #[test]
    fn test_paragraphs_are_packed_within_budget() {
        let text = "one two three\n\nfour five\n\nsix seven eight nine";
        let chunks = chunker().chunk(text, 5);
        assert_eq!(
            chunks,
            vec!["one two three\n\nfour five".to_string(), "six seven eight nine".to_string()]
        );
    }

    #[test]
    fn test_long_paragraph_splits_on_sentences() {
        let text = "First sentence here. Second one follows! Third asks why? Fourth ends.";
        let chunks = chunker().chunk(text, 6);
        assert_eq!(
            chunks,
            vec![
                "First sentence here. Second one follows!".to_string(),
                "Third asks why? Fourth ends.".to_string(),
            ]
        );
    }

    #[test]
    fn test_long_sentence_splits_on_words() {
        let text = "alpha beta gamma delta epsilon zeta eta theta";
        let chunks = chunker().chunk(text, 3);
        assert_eq!(
            chunks,
            vec![
                "alpha beta gamma".to_string(),
                "delta epsilon zeta".to_string(),
                "eta theta".to_string(),
            ]
        );
    }

    /// One token per non-whitespace character.
    struct CharCounter;

    impl TokenCounter for CharCounter {
        fn count(&self, text: &str) -> usize {
            text.chars().filter(|c| !c.is_whitespace()).count()
        }

        fn name(&self) -> &str {
            "chars"
        }
    }

    #[test]
    fn test_oversized_word_is_its_own_chunk() {
        let chunker = TextChunker::new(Arc::new(CharCounter));
        let chunks = chunker.chunk("tiny supercalifragilistic end", 6);
        assert_eq!(
            chunks,
            vec![
                "tiny".to_string(),
                "supercalifragilistic".to_string(),
                "end".to_string(),
            ]
        );
    }

    #[test]
    fn test_oversized_word_warning_is_chunking_error() {
        let err = oversized_word(20, 6);
        assert!(matches!(err, PipelineError::Chunking(_)));
        assert_eq!(
            err.to_string(),
            "Chunking error: word of 20 tokens exceeds budget 6, keeping it as an oversized chunk"
        );
    }

    /// Words plus one token per paragraph break, like BPE tokenizers.
    struct SeparatorCounter;

    impl TokenCounter for SeparatorCounter {
        fn count(&self, text: &str) -> usize {
            text.split_whitespace().count() + text.matches("\n\n").count()
        }

        fn name(&self) -> &str {
            "separator"
        }
    }

    #[test]
    fn test_separator_tokens_count_against_budget() {
        let counter = SeparatorCounter;
        let chunker = TextChunker::new(Arc::new(SeparatorCounter));
        let chunks = chunker.chunk("a b\n\nc d\n\ne f", 6);

        assert_eq!(chunks, vec!["a b\n\nc d".to_string(), "e f".to_string()]);
        assert!(chunks.iter().all(|c| counter.count(c) <= 6));
    }

    #[test]
    fn test_chunks_respect_budget_and_reconstruct_text() {
        let counter = HeuristicTokenCounter::default();
        let chunker = TextChunker::new(Arc::new(counter.clone()));
        let text = "Transformers dominate sequence modelling. They rely on attention. \
                    Recurrent networks were common before.\n\n\
                    We propose a retrieval step that grounds generation in related work. \
                    The approach is evaluated on three benchmarks!\n\n\
                    Results show consistent gains? Yes, across all settings.";

        for budget in [3, 5, 8, 13, 40, 200] {
            let chunks = chunker.chunk(text, budget);
            assert!(!chunks.is_empty());
            for chunk in &chunks {
                let is_single_word = chunk.split_whitespace().count() == 1;
                assert!(
                    counter.count(chunk) <= budget || is_single_word,
                    "chunk {:?} exceeds budget {}",
                    chunk,
                    budget
                );
            }
            let joined = chunks.join(" ");
            assert_eq!(words(&joined), words(text));
        }
    }

    #[test]
    fn test_sentence_splitting() {
        assert_eq!(
            split_sentences("Hello world. How are you? Fine!"),
            vec!["Hello world.", "How are you?", "Fine!"]
        );
        assert_eq!(split_sentences("Version 2.0 is out"), vec!["Version 2.0 is out"]);
        assert_eq!(split_sentences("논문입니다。 다음 문장"), vec!["논문입니다。", "다음 문장"]);
    }
}
