use rand::Rng;

/// Words dropped from a query before it is echoed back in a fallback line.
const STOP_WORDS: &[&str] = &[
    "what", "who", "whom", "whose", "which", "when", "where", "why", "how",
    "is", "are", "was", "were", "be", "been", "am",
    "does", "do", "did", "can", "could", "would", "should", "will",
    "the", "a", "an",
    "in", "of", "on", "at", "to", "for", "from", "with", "by", "about", "into",
];

const TEMPLATES: [&str; 5] = [
    "While I couldn't find a direct answer, {subject} offers insights on {keywords}.",
    "Although no specific information is available, {keywords} are discussed throughout {subject}.",
    "{Subject} does not provide an exact match, but covers aspects related to {keywords}.",
    "No direct answer, but {subject} explores topics connected to {keywords}.",
    "Unfortunately, no exact match, but themes around {keywords} appear in {subject}.",
];

const GENERIC: &str = "No exact answer, but {subject} covers relevant themes.";

/// Builds a templated reply for queries the retriever has nothing for.
#[derive(Debug, Clone)]
pub struct FallbackGenerator {
    subject: String,
}

impl Default for FallbackGenerator {
    fn default() -> Self {
        Self::new("the book")
    }
}

impl FallbackGenerator {
    /// `subject` names the corpus in generated sentences, e.g. "the book".
    pub fn new(subject: impl Into<String>) -> Self {
        Self { subject: subject.into() }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn generate(&self, query: &str) -> String {
        self.generate_with(query, &mut rand::thread_rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(&self, query: &str, rng: &mut R) -> String {
        let keywords = keywords(query);
        if keywords.is_empty() {
            return self.render(GENERIC, "");
        }
        let template = TEMPLATES[rng.gen_range(0..TEMPLATES.len())];
        self.render(template, &keywords.join(" "))
    }

    fn render(&self, template: &str, keywords: &str) -> String {
        template
            .replace("{Subject}", &capitalize(&self.subject))
            .replace("{subject}", &self.subject)
            .replace("{keywords}", keywords)
    }
}

/// Query words that are not stop words, trimmed of surrounding punctuation,
/// in their original case and order.
pub fn keywords(query: &str) -> Vec<&str> {
    query
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .filter(|w| !STOP_WORDS.iter().any(|stop| stop.eq_ignore_ascii_case(w)))
        .collect()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn keywords_drop_stop_words_and_punctuation() {
        assert_eq!(keywords("What is the role of the Ganges in India?"), vec!["role", "Ganges", "India"]);
        assert_eq!(keywords("Tell me about Mars colonization."), vec!["Tell", "me", "Mars", "colonization"]);
        assert!(keywords("What is the?").is_empty());
    }

    #[test]
    fn apostrophes_inside_words_survive() {
        assert_eq!(keywords("How did India's economy grow"), vec!["India's", "economy", "grow"]);
    }

    #[test]
    fn every_template_mentions_keywords_and_subject() {
        let generator = FallbackGenerator::new("the report");
        for template in TEMPLATES {
            let line = generator.render(template, "Mars colonization");
            assert!(line.contains("Mars colonization"), "{line}");
            assert!(line.to_lowercase().contains("the report"), "{line}");
            assert!(!line.contains('{'), "{line}");
        }
    }

    #[test]
    fn subject_at_sentence_start_is_capitalized() {
        let line = FallbackGenerator::default().render(TEMPLATES[2], "rivers");
        assert!(line.starts_with("The book does not provide"));
    }

    #[test]
    fn no_keywords_gives_generic_sentence() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(
            FallbackGenerator::default().generate_with("what is the", &mut rng),
            "No exact answer, but the book covers relevant themes."
        );
        assert_eq!(FallbackGenerator::default().generate(""), "No exact answer, but the book covers relevant themes.");
    }

    #[test]
    fn seeded_rng_is_deterministic() {
        let generator = FallbackGenerator::default();
        let a = generator.generate_with("Mars colonization", &mut StdRng::seed_from_u64(42));
        let b = generator.generate_with("Mars colonization", &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn all_templates_are_reachable() {
        let generator = FallbackGenerator::default();
        let mut rng = StdRng::seed_from_u64(1);
        let seen: std::collections::HashSet<String> =
            (0..200).map(|_| generator.generate_with("Mars colonization", &mut rng)).collect();
        assert_eq!(seen.len(), TEMPLATES.len());
    }
}
