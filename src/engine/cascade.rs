//! The three-stage rewrite pipeline.
//!
//! Each word goes through the main, common and final stages once per
//! selected language. Every stage walks the text left to right: at each
//! position the first applicable rule (or a one-character copy) is taken,
//! its replacement is resolved against the active languages, and every
//! in-progress candidate is extended by every surviving alternative.
//!
//! Candidate sets are capped after each step (`max_branches`) and each word's
//! reported codes are capped at `max_codes`. Hitting a cap drops the
//! latest-produced candidates and marks the result as truncated.

use indexmap::IndexSet;
use tracing::{debug, trace, warn};

use super::rule::{RuleTable, Step};
use crate::PhoneticCodeSet;
use crate::config::{EngineConfig, LanguageStrategy};
use crate::language::{Language, LanguageSet};
use crate::store::{Stage, VariantRules};

/// The encoding of one normalized word
#[derive(Debug, Clone, PartialEq)]
pub struct WordEncoding {
    pub word: String,
    /// What the language guesser found
    pub detected: LanguageSet,
    /// What drove branch filtering: a usable hint, otherwise `detected`
    pub active: LanguageSet,
    pub codes: PhoneticCodeSet,
    /// Whether a candidate cap dropped codes for this word
    pub truncated: bool,
}

/// Runs the rule cascade of one variant
#[derive(Debug, Clone, Copy)]
pub struct Cascade<'a> {
    rules: &'a VariantRules,
    config: &'a EngineConfig,
}

impl<'a> Cascade<'a> {
    pub fn new(rules: &'a VariantRules, config: &'a EngineConfig) -> Self {
        Cascade { rules, config }
    }

    /// Guess the languages of `word` and settle the set used for filtering.
    ///
    /// Returns `(detected, active)`. A hint replaces detection only when it
    /// names at least one language of this variant.
    pub fn languages(&self, word: &str, hint: Option<LanguageSet>) -> (LanguageSet, LanguageSet) {
        let universe = self.rules.universe();
        let detected = self.rules.detection().detect(word, universe);

        let active = match hint {
            Some(hint) if hint.intersects(universe) => hint & universe,
            Some(hint) => {
                debug!(word, %hint, variant = %self.rules.variant(), "hint names no language of this variant; using detection");
                detected
            }
            None => detected,
        };

        debug!(word, %detected, %active, "languages resolved");
        (detected, active)
    }

    pub fn encode_word(&self, word: &str, hint: Option<LanguageSet>) -> WordEncoding {
        let (detected, active) = self.languages(word, hint);
        let mut truncated = false;
        let mut codes = IndexSet::new();

        for (language, filter) in self.runs(active) {
            let main = self.apply_stage(
                Stage::Main,
                language,
                [word.to_string()],
                filter,
                self.config.max_branches,
                &mut truncated,
            );
            let common = self.apply_stage(
                Stage::Common,
                language,
                main,
                filter,
                self.config.max_branches,
                &mut truncated,
            );
            let finals = self.apply_stage(
                Stage::Final,
                language,
                common,
                filter,
                self.config.max_codes,
                &mut truncated,
            );
            extend_capped(&mut codes, finals, self.config.max_codes, &mut truncated);
        }

        if truncated {
            warn!(
                word,
                variant = %self.rules.variant(),
                max_branches = self.config.max_branches,
                max_codes = self.config.max_codes,
                "candidate cap reached; keeping the earliest codes"
            );
        }

        WordEncoding {
            word: word.to_string(),
            detected,
            active,
            codes: codes.into_iter().collect(),
            truncated,
        }
    }

    /// The cascade runs for an active set, as (table language, branch filter)
    fn runs(&self, active: LanguageSet) -> Vec<(Language, LanguageSet)> {
        match self.config.language_strategy {
            LanguageStrategy::PerLanguage => active
                .iter()
                .map(|language| (language, LanguageSet::single(language)))
                .collect(),
            LanguageStrategy::Combined => {
                vec![(active.sole().unwrap_or(Language::Any), active)]
            }
        }
    }

    fn apply_stage(
        &self,
        stage: Stage,
        language: Language,
        inputs: impl IntoIterator<Item = String>,
        active: LanguageSet,
        cap: usize,
        truncated: &mut bool,
    ) -> IndexSet<String> {
        let table = self.rules.table(stage, language);
        let mut out = IndexSet::new();
        for input in inputs {
            let rewritten = rewrite(table, &input, active, self.config.max_branches, truncated);
            extend_capped(&mut out, rewritten, cap, truncated);
        }
        trace!(%stage, %language, candidates = out.len(), "stage done");
        out
    }
}

/// Rewrite `text` with one table, keeping at most `max_branches` candidates
pub fn rewrite(
    table: &RuleTable,
    text: &str,
    active: LanguageSet,
    max_branches: usize,
    truncated: &mut bool,
) -> IndexSet<String> {
    let mut partials: IndexSet<String> = IndexSet::from([String::new()]);
    let mut pos = 0;

    while let Some(step) = table.step_at(text, pos) {
        let consumed = step.consumed();
        debug_assert!(consumed >= 1, "rule step at {} consumed nothing", pos);

        let pieces = match step {
            Step::Rule { replacement, .. } => replacement.resolve(active),
            Step::Copy(ch) => IndexSet::from([ch]),
        };
        trace!(text, pos, consumed, ?pieces, "rule step");

        let mut next = IndexSet::with_capacity((partials.len() * pieces.len()).min(max_branches));
        'extend: for prefix in &partials {
            for piece in &pieces {
                let candidate = format!("{}{}", prefix, piece);
                if next.contains(&candidate) {
                    continue;
                }
                if next.len() >= max_branches {
                    *truncated = true;
                    break 'extend;
                }
                next.insert(candidate);
            }
        }

        partials = next;
        pos += consumed;
    }

    partials
}

/// Union `items` into `target` in order, stopping at `cap` distinct entries
pub fn extend_capped(
    target: &mut IndexSet<String>,
    items: impl IntoIterator<Item = String>,
    cap: usize,
    truncated: &mut bool,
) {
    for item in items {
        if target.contains(&item) {
            continue;
        }
        if target.len() >= cap {
            *truncated = true;
            return;
        }
        target.insert(item);
    }
}

/// Cartesian join of per-word codes, separated by a single space
pub fn concatenate(words: &[WordEncoding], cap: usize, truncated: &mut bool) -> IndexSet<String> {
    let mut joined: IndexSet<String> = IndexSet::from([String::new()]);
    for (i, word) in words.iter().enumerate() {
        let mut next = IndexSet::new();
        let combos = joined.iter().flat_map(move |prefix| {
            word.codes.iter().map(move |code| {
                if i == 0 {
                    code.to_string()
                } else {
                    format!("{} {}", prefix, code)
                }
            })
        });
        extend_capped(&mut next, combos, cap, truncated);
        joined = next;
    }
    joined
}

/// Ordered, deduplicated union of per-word codes
pub fn union(words: &[WordEncoding], cap: usize, truncated: &mut bool) -> IndexSet<String> {
    let mut all = IndexSet::new();
    for word in words {
        extend_capped(&mut all, word.codes.iter().map(str::to_string), cap, truncated);
    }
    all
}
