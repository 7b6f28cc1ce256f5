use unicode_segmentation::UnicodeSegmentation;

use bookqa_core::traits::SentenceSplitter;

/// UAX#29 sentence boundaries, trimmed, with whitespace-only pieces dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeSentenceSplitter;

impl SentenceSplitter for UnicodeSentenceSplitter {
    fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text.split_sentence_bounds()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminal_punctuation() {
        let text = "The Ganges is a major river in India. It rises in the Himalayas!  Does it flood? Often.";
        assert_eq!(
            UnicodeSentenceSplitter.split(text),
            vec![
                "The Ganges is a major river in India.",
                "It rises in the Himalayas!",
                "Does it flood?",
                "Often.",
            ]
        );
    }

    #[test]
    fn blank_text_has_no_sentences() {
        assert!(UnicodeSentenceSplitter.split("   \n ").is_empty());
    }
}
