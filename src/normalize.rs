//! Name canonicalisation ahead of phonetic encoding.
//!
//! A raw name goes through these steps in order:
//!
//! 1. Unicode canonical composition (NFC)
//! 2. hyphens become spaces
//! 3. trim and lower-case
//! 4. split on whitespace
//! 5. apostrophe handling (per variant) and attached prefixes such as `d'`
//! 6. discard-word stripping, which never removes the last remaining word

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// What a variant does with apostrophes inside a word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApostropheMode {
    /// Leave apostrophes in place (prefix discards such as `d'` still apply)
    #[default]
    Keep,
    /// Keep only the text after the last apostrophe
    LastSegment,
}

/// Articles and particles removed from a name before encoding.
///
/// Entries ending in an apostrophe (`d'`) are attached prefixes. All other
/// entries are whole words or word sequences (`de la`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscardList {
    /// Token sequences, longest first
    sequences: Vec<Vec<String>>,
    prefixes: Vec<String>,
}

impl DiscardList {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut sequences = Vec::new();
        let mut prefixes = Vec::new();
        for entry in entries {
            let entry = entry.as_ref().trim().to_lowercase();
            if entry.is_empty() {
                continue;
            }
            if entry.ends_with('\'') {
                prefixes.push(entry.clone());
            }
            let tokens: Vec<String> = entry.split_whitespace().map(str::to_string).collect();
            if !sequences.contains(&tokens) {
                sequences.push(tokens);
            }
        }
        // "de la" must be tried before "de"
        sequences.sort_by(|a, b| b.len().cmp(&a.len()));
        DiscardList {
            sequences,
            prefixes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Whether `word` is a single-word discard entry
    pub fn contains(&self, word: &str) -> bool {
        self.sequences
            .iter()
            .any(|seq| seq.len() == 1 && seq[0] == word)
    }

    fn strip_prefixes<'a>(&self, mut word: &'a str) -> &'a str {
        loop {
            let stripped = self.prefixes.iter().find_map(|prefix| {
                word.strip_prefix(prefix.as_str())
                    .filter(|rest| !rest.is_empty())
            });
            match stripped {
                Some(rest) => word = rest,
                None => return word,
            }
        }
    }

    /// Length of the longest entry matching at `start` that is shorter than `limit`
    fn sequence_at(&self, words: &[String], start: usize, limit: usize) -> Option<usize> {
        self.sequences
            .iter()
            .find(|seq| {
                seq.len() < limit
                    && words.len() >= start + seq.len()
                    && seq.iter().zip(&words[start..]).all(|(a, b)| a == b)
            })
            .map(Vec::len)
    }
}

/// Splits and cleans names for one variant
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalizer {
    discards: DiscardList,
    apostrophes: ApostropheMode,
}

impl Normalizer {
    pub fn new(discards: DiscardList, apostrophes: ApostropheMode) -> Self {
        Normalizer {
            discards,
            apostrophes,
        }
    }

    pub fn discards(&self) -> &DiscardList {
        &self.discards
    }

    pub fn apostrophes(&self) -> ApostropheMode {
        self.apostrophes
    }

    /// Turn a raw name into its ordered list of words.
    ///
    /// Any input is accepted; an empty or blank name gives an empty list.
    pub fn normalize(&self, raw: &str) -> Vec<String> {
        let composed: String = raw.nfc().collect();
        let cleaned = composed.replace('-', " ").trim().to_lowercase();

        let words: Vec<String> = cleaned
            .split_whitespace()
            .filter_map(|word| {
                let word = match self.apostrophes {
                    ApostropheMode::Keep => word,
                    ApostropheMode::LastSegment => word.rsplit('\'').next().unwrap_or(word),
                };
                let word = self.discards.strip_prefixes(word);
                if word.is_empty() {
                    None
                } else {
                    Some(word.to_string())
                }
            })
            .collect();

        self.strip_discards(words)
    }

    fn strip_discards(&self, words: Vec<String>) -> Vec<String> {
        if self.discards.is_empty() {
            return words;
        }

        let mut kept = Vec::with_capacity(words.len());
        let mut remaining = words.len();
        let mut i = 0;
        while i < words.len() {
            if let Some(len) = self.discards.sequence_at(&words, i, remaining) {
                remaining -= len;
                i += len;
                continue;
            }
            kept.push(words[i].clone());
            i += 1;
        }
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn generic() -> Normalizer {
        Normalizer::new(
            DiscardList::new(["da ", "de", "de la", "van", "von", "d'"]),
            ApostropheMode::Keep,
        )
    }

    #[test]
    fn test_empty_input() {
        assert!(generic().normalize("").is_empty());
        assert!(generic().normalize("   ").is_empty());
    }

    #[test]
    fn test_lowercase_and_hyphen() {
        assert_eq!(
            generic().normalize("  Smith-JONES "),
            vec!["smith".to_string(), "jones".to_string()]
        );
    }

    #[test]
    fn test_nfc_composition() {
        // e + combining acute composes to a single é
        let words = generic().normalize("Rene\u{301}");
        assert_eq!(words, vec!["rené".to_string()]);
        assert_eq!(words[0].chars().count(), 4);
    }

    #[test]
    fn test_discard_word_removed() {
        assert_eq!(generic().normalize("van Berg"), vec!["berg".to_string()]);
        assert_eq!(generic().normalize("Berg VON"), vec!["berg".to_string()]);
    }

    #[test]
    fn test_discard_keeps_last_word() {
        assert_eq!(generic().normalize("van"), vec!["van".to_string()]);
        assert_eq!(generic().normalize("van de"), vec!["de".to_string()]);
    }

    #[test]
    fn test_shorter_discard_tried_when_longer_empties_name() {
        let normalizer = Normalizer::new(
            DiscardList::new(["de", "de la", "van"]),
            ApostropheMode::Keep,
        );
        assert_eq!(normalizer.normalize("de la"), vec!["la".to_string()]);
        assert_eq!(normalizer.normalize("van de la"), vec!["la".to_string()]);
        assert_eq!(
            normalizer.normalize("de la Fontaine"),
            vec!["fontaine".to_string()]
        );
    }

    #[test]
    fn test_multi_word_discard() {
        assert_eq!(
            generic().normalize("de la Fontaine"),
            vec!["fontaine".to_string()]
        );
    }

    #[test]
    fn test_apostrophe_prefix() {
        assert_eq!(
            generic().normalize("d'Artagnan"),
            vec!["artagnan".to_string()]
        );
        assert_eq!(generic().normalize("d'"), vec!["d'".to_string()]);
    }

    #[test]
    fn test_apostrophe_last_segment() {
        let normalizer = Normalizer::new(DiscardList::default(), ApostropheMode::LastSegment);
        assert_eq!(
            normalizer.normalize("O'Brien d'Israeli"),
            vec!["brien".to_string(), "israeli".to_string()]
        );
        assert!(normalizer.normalize("'").is_empty());
    }

    #[test]
    fn test_discard_list_contains() {
        let list = DiscardList::new(["Van ", "de la"]);
        assert!(list.contains("van"));
        assert!(!list.contains("de"));
        assert!(!list.contains("de la"));
    }

    proptest! {
        /// Normalizing already-normalized output changes nothing
        #[test]
        fn prop_normalize_idempotent(raw in "[a-zA-Zéü' -]{0,24}") {
            let normalizer = generic();
            let once = normalizer.normalize(&raw);
            let twice = normalizer.normalize(&once.join(" "));
            prop_assert_eq!(once, twice);
        }
    }
}
