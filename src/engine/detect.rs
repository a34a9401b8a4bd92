//! Language guessing from spelling.
//!
//! Each detection rule is a regex searched anywhere in the word. A match
//! either narrows the candidates to the rule's languages (`accept`) or vetoes
//! them. Rules only ever remove candidates, and the universal `any` language
//! is restored if nothing survives.

use regex::Regex;
use tracing::trace;

use crate::language::LanguageSet;

#[derive(Debug, Clone)]
pub struct DetectionRule {
    pub pattern: Regex,
    pub languages: LanguageSet,
    pub accept: bool,
}

impl DetectionRule {
    pub fn new(pattern: &str, languages: LanguageSet, accept: bool) -> Result<Self, regex::Error> {
        Ok(DetectionRule {
            pattern: Regex::new(pattern)?,
            languages,
            accept,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct LanguageDetectionTable {
    rules: Vec<DetectionRule>,
}

impl LanguageDetectionTable {
    pub fn new(rules: Vec<DetectionRule>) -> Self {
        LanguageDetectionTable { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[DetectionRule] {
        &self.rules
    }

    /// Narrow `universe` to the languages `word` could be written in
    pub fn detect(&self, word: &str, universe: LanguageSet) -> LanguageSet {
        let mut choices = universe;
        for rule in &self.rules {
            if !rule.pattern.is_match(word) {
                continue;
            }
            if rule.accept {
                choices &= rule.languages;
            } else {
                choices &= rule.languages.complement_within(universe);
            }
            trace!(word, pattern = rule.pattern.as_str(), %choices, "detection rule matched");
        }
        if choices.is_empty() {
            LanguageSet::ANY
        } else {
            choices
        }
    }
}
