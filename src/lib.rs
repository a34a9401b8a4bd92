//! Beider-Morse Phonetic Matching.
//!
//! Turns a personal name into a set of approximate phonetic codes. Two names
//! whose code sets intersect are treated as possibly the same name.
//!
//! ```
//! use beider_morse::{BeiderMorse, Variant};
//!
//! let bmpm = BeiderMorse::bundled().unwrap();
//! let codes = bmpm.encode("Schwarz", Variant::Generic, None);
//! assert!(!codes.is_empty());
//! assert!(bmpm.is_match("Schwarz", "Shvarts", Variant::Ashkenazi));
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexSet;
use serde::{Serialize, Serializer};
use tracing::debug;

pub mod config;
pub mod engine;
pub mod error;
pub mod language;
pub mod loader;
pub mod normalize;
pub mod store;

pub use config::{EngineConfig, LanguageStrategy};
pub use engine::{Cascade, WordEncoding};
pub use error::{BmpmError, BmpmResult};
pub use language::{Language, LanguageSet};
pub use normalize::{ApostropheMode, DiscardList, Normalizer};
pub use store::{RuleTableStore, Stage, Variant, VariantRules};

/// An ordered, duplicate-free set of phonetic codes.
///
/// Iteration follows generation order. Equality ignores order.
#[derive(Debug, Clone, Default)]
pub struct PhoneticCodeSet(IndexSet<String>);

impl PhoneticCodeSet {
    pub fn new() -> Self {
        PhoneticCodeSet(IndexSet::new())
    }

    /// Returns true if the code was not already present
    pub fn insert(&mut self, code: impl Into<String>) -> bool {
        self.0.insert(code.into())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.0.contains(code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Whether the two sets share at least one code
    pub fn intersects(&self, other: &PhoneticCodeSet) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.iter().any(|code| large.contains(code))
    }
}

impl PartialEq for PhoneticCodeSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|code| other.contains(code))
    }
}

impl Eq for PhoneticCodeSet {}

impl FromIterator<String> for PhoneticCodeSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        PhoneticCodeSet(iter.into_iter().collect())
    }
}

impl IntoIterator for PhoneticCodeSet {
    type Item = String;
    type IntoIter = indexmap::set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Serialize for PhoneticCodeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl fmt::Display for PhoneticCodeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<&str> = self.iter().collect();
        write!(f, "{}", codes.join("|"))
    }
}

/// The full result of encoding one name
#[derive(Debug, Clone, PartialEq)]
pub struct Encoding {
    /// One entry per word left after normalization, in name order
    pub words: Vec<WordEncoding>,
    /// Codes for the whole name: the joined words when concatenating,
    /// otherwise the union of every word's codes
    pub codes: PhoneticCodeSet,
    /// Whether any candidate cap dropped codes
    pub truncated: bool,
}

/// The phonetic encoder.
///
/// Holds the compiled rule data behind an [`Arc`], so clones are cheap and
/// can be sent to other threads. Encoding never locks or mutates anything.
#[derive(Debug, Clone)]
pub struct BeiderMorse {
    store: Arc<RuleTableStore>,
    config: EngineConfig,
}

impl BeiderMorse {
    pub fn new(store: RuleTableStore, config: EngineConfig) -> Self {
        Self::with_store(Arc::new(store), config)
    }

    /// Share an already loaded store between several encoders
    pub fn with_store(store: Arc<RuleTableStore>, config: EngineConfig) -> Self {
        BeiderMorse {
            store,
            config: config.clamped(),
        }
    }

    /// An encoder over the bundled rule data with default options
    pub fn bundled() -> BmpmResult<Self> {
        Ok(Self::new(RuleTableStore::bundled()?, EngineConfig::default()))
    }

    /// The same rule data with different options
    pub fn with_config(&self, config: EngineConfig) -> Self {
        Self::with_store(Arc::clone(&self.store), config)
    }

    pub fn store(&self) -> &RuleTableStore {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Encode a name into its phonetic codes.
    ///
    /// `hint` names the source language (`spanish`, `es-MX`, `french+italian`).
    /// A hint that is not recognised, or that names no language of the
    /// variant, is ignored and the languages are guessed from spelling.
    pub fn encode(&self, name: &str, variant: Variant, hint: Option<&str>) -> PhoneticCodeSet {
        self.encode_detailed(name, variant, hint).codes
    }

    /// Like [`encode`](Self::encode), with per-word languages and codes
    pub fn encode_detailed(&self, name: &str, variant: Variant, hint: Option<&str>) -> Encoding {
        let rules = self.store.variant(variant);
        let words = rules.normalizer().normalize(name);

        if words.is_empty() {
            return Encoding {
                words: Vec::new(),
                codes: std::iter::once(String::new()).collect(),
                truncated: false,
            };
        }

        let hint = hint.and_then(|raw| {
            let parsed = LanguageSet::parse_hint(raw);
            debug!(hint = raw, parsed = ?parsed.map(|set| set.to_string()), "language hint");
            parsed
        });

        let cascade = Cascade::new(rules, &self.config);
        let encoded: Vec<WordEncoding> = words
            .iter()
            .map(|word| cascade.encode_word(word, hint))
            .collect();

        let mut truncated = encoded.iter().any(|word| word.truncated);
        let concatenate = self.config.concatenate.unwrap_or(rules.concat());
        let codes = if concatenate {
            engine::cascade::concatenate(&encoded, self.config.max_codes, &mut truncated)
        } else {
            engine::cascade::union(&encoded, self.config.max_codes, &mut truncated)
        };

        Encoding {
            words: encoded,
            codes: codes.into_iter().collect(),
            truncated,
        }
    }

    /// Languages the guesser finds for each word of `name`
    pub fn detect_languages(&self, name: &str, variant: Variant) -> Vec<(String, LanguageSet)> {
        let rules = self.store.variant(variant);
        rules
            .normalizer()
            .normalize(name)
            .into_iter()
            .map(|word| {
                let languages = rules.detection().detect(&word, rules.universe());
                (word, languages)
            })
            .collect()
    }

    /// Whether two names share a phonetic code under `variant`
    pub fn is_match(&self, a: &str, b: &str, variant: Variant) -> bool {
        let a = self.encode(a, variant, None);
        let b = self.encode(b, variant, None);
        a.intersects(&b)
    }
}
