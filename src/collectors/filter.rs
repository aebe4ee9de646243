//! Cheap keyword gate applied before anything is stored or sent to a model.

/// Job postings are rarely shorter than this many characters.
pub const DEFAULT_MIN_LENGTH: usize = 100;

const WHITELIST: &[&str] = &[
    // Russian
    "вакансия",
    "ищем",
    "требуется",
    "работа",
    "зарплата",
    "оклад",
    "удаленка",
    "удалённо",
    "офис",
    "опыт работы",
    "тимлид",
    "разработчик",
    "программист",
    "инженер",
    // English
    "junior",
    "middle",
    "senior",
    "lead",
    "vacancy",
    "hiring",
    "job",
    "position",
    "salary",
    "remote",
    "on-site",
    "experience",
    "looking for",
    "join our team",
    "opportunity",
    "engineer",
    "developer",
    "programmer",
    // Stack
    "golang",
    "python",
    "javascript",
    "typescript",
    "react",
    "backend",
    "frontend",
    "fullstack",
    "devops",
    "sre",
    "kubernetes",
    "docker",
    "aws",
    "gcp",
    "azure",
];

const BLACKLIST: &[&str] = &[
    "реклама",
    "продам",
    "куплю",
    "скидка",
    "акция",
    "casino",
    "казино",
    "betting",
    "ставки",
    "crypto pump",
    "#резюме",
];

#[derive(Debug, Clone)]
pub struct KeywordFilter {
    whitelist: Vec<String>,
    blacklist: Vec<String>,
    min_length: usize,
    strict_whitelist: bool,
}

impl Default for KeywordFilter {
    fn default() -> Self {
        KeywordFilter {
            whitelist: WHITELIST.iter().map(|s| s.to_string()).collect(),
            blacklist: BLACKLIST.iter().map(|s| s.to_string()).collect(),
            min_length: DEFAULT_MIN_LENGTH,
            strict_whitelist: false,
        }
    }
}

impl KeywordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    /// Require a whitelist hit instead of accepting unmatched text.
    pub fn with_strict_whitelist(mut self, strict: bool) -> Self {
        self.strict_whitelist = strict;
        self
    }

    pub fn with_extra_blacklist<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.blacklist.extend(
            terms
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty()),
        );
        self
    }

    /// Length gate, then blacklist, then whitelist. Text that matches neither
    /// list passes unless `strict_whitelist` is set.
    pub fn should_process(&self, text: &str) -> bool {
        if text.chars().count() < self.min_length {
            return false;
        }

        let lower = text.to_lowercase();
        if self.blacklist.iter().any(|kw| lower.contains(kw.as_str())) {
            return false;
        }

        if self.whitelist.iter().any(|kw| lower.contains(kw.as_str())) {
            return true;
        }

        !self.strict_whitelist
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padded(text: &str) -> String {
        format!("{text} {}", "x".repeat(DEFAULT_MIN_LENGTH))
    }

    #[test]
    fn short_text_is_rejected() {
        let filter = KeywordFilter::new();
        assert!(!filter.should_process("We are hiring a senior developer"));
        assert!(!filter.should_process(""));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let filter = KeywordFilter::new().with_min_length(10);
        // 9 Cyrillic characters, 18 bytes.
        assert!(!filter.should_process("вакансияя"));
        assert!(filter.should_process("вакансия!!"));
    }

    #[test]
    fn blacklist_wins_over_whitelist() {
        let filter = KeywordFilter::new();
        assert!(!filter.should_process(&padded("Senior developer wanted, Casino project")));
        assert!(!filter.should_process(&padded("Вакансия! РЕКЛАМА")));
    }

    #[test]
    fn whitelisted_text_passes() {
        let filter = KeywordFilter::new();
        assert!(filter.should_process(&padded("We are hiring a Senior Golang Developer")));
    }

    #[test]
    fn unmatched_text_passes_by_default() {
        let text = padded("lorem ipsum dolor sit amet");
        assert!(KeywordFilter::new().should_process(&text));
        assert!(
            !KeywordFilter::new()
                .with_strict_whitelist(true)
                .should_process(&text)
        );
    }

    #[test]
    fn extra_blacklist_terms_are_normalized() {
        let filter = KeywordFilter::new().with_extra_blacklist(["  Giveaway ", ""]);
        assert!(!filter.should_process(&padded("hiring giveaway")));
        assert!(filter.should_process(&padded("hiring backend engineer")));
    }
}
