//! Source languages and the language bitmask.
//!
//! Every language the rule data can mention owns one bit of a [`LanguageSet`].
//! Bit 0 is [`Language::Any`], the universal fallback that detection can never
//! eliminate.

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign};

use icu_locale::Locale;

/// A source language known to the rule data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    Any,
    Arabic,
    Cyrillic,
    Czech,
    Dutch,
    English,
    French,
    German,
    Greek,
    GreekLatin,
    Hebrew,
    Hungarian,
    Italian,
    Latvian,
    Polish,
    Portuguese,
    Romanian,
    Russian,
    Spanish,
    Turkish,
}

impl Language {
    /// All languages, in bit order
    pub const ALL: [Language; 20] = [
        Language::Any,
        Language::Arabic,
        Language::Cyrillic,
        Language::Czech,
        Language::Dutch,
        Language::English,
        Language::French,
        Language::German,
        Language::Greek,
        Language::GreekLatin,
        Language::Hebrew,
        Language::Hungarian,
        Language::Italian,
        Language::Latvian,
        Language::Polish,
        Language::Portuguese,
        Language::Romanian,
        Language::Russian,
        Language::Spanish,
        Language::Turkish,
    ];

    pub fn bit(self) -> u32 {
        1 << (self as u32)
    }

    /// The name used for this language in rule data and hints
    pub fn name(self) -> &'static str {
        match self {
            Language::Any => "any",
            Language::Arabic => "arabic",
            Language::Cyrillic => "cyrillic",
            Language::Czech => "czech",
            Language::Dutch => "dutch",
            Language::English => "english",
            Language::French => "french",
            Language::German => "german",
            Language::Greek => "greek",
            Language::GreekLatin => "greeklatin",
            Language::Hebrew => "hebrew",
            Language::Hungarian => "hungarian",
            Language::Italian => "italian",
            Language::Latvian => "latvian",
            Language::Polish => "polish",
            Language::Portuguese => "portuguese",
            Language::Romanian => "romanian",
            Language::Russian => "russian",
            Language::Spanish => "spanish",
            Language::Turkish => "turkish",
        }
    }

    /// Look up a language by its rule-data name, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Language::ALL.into_iter().find(|lang| lang.name() == name)
    }

    /// Map a BCP-47 tag such as `es-MX` or `sr-Cyrl` onto a language.
    ///
    /// The script subtag wins over the language subtag for Cyrillic and for
    /// romanised Greek, since BMPM treats those as separate orthographies.
    pub fn from_locale_tag(tag: &str) -> Option<Self> {
        let locale: Locale = tag.trim().parse().ok()?;
        let language = locale.id.language.as_str();
        let script = locale.id.script.as_ref().map(|s| s.as_str());

        match (language, script) {
            ("el", Some("Latn")) => Some(Language::GreekLatin),
            (_, Some("Cyrl")) => Some(Language::Cyrillic),
            ("uk" | "be" | "bg" | "mk", _) => Some(Language::Cyrillic),
            ("ar", _) => Some(Language::Arabic),
            ("cs", _) => Some(Language::Czech),
            ("nl", _) => Some(Language::Dutch),
            ("en", _) => Some(Language::English),
            ("fr", _) => Some(Language::French),
            ("de", _) => Some(Language::German),
            ("el", _) => Some(Language::Greek),
            ("he" | "iw" | "yi", _) => Some(Language::Hebrew),
            ("hu", _) => Some(Language::Hungarian),
            ("it", _) => Some(Language::Italian),
            ("lv", _) => Some(Language::Latvian),
            ("pl", _) => Some(Language::Polish),
            ("pt", _) => Some(Language::Portuguese),
            ("ro", _) => Some(Language::Romanian),
            ("ru", _) => Some(Language::Russian),
            ("es", _) => Some(Language::Spanish),
            ("tr", _) => Some(Language::Turkish),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A set of candidate languages, one bit per [`Language`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LanguageSet(u32);

impl LanguageSet {
    pub const EMPTY: LanguageSet = LanguageSet(0);
    pub const ANY: LanguageSet = LanguageSet(1);

    pub fn from_bits(bits: u32) -> Self {
        LanguageSet(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn single(language: Language) -> Self {
        LanguageSet(language.bit())
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn contains(self, language: Language) -> bool {
        self.0 & language.bit() != 0
    }

    pub fn intersects(self, other: LanguageSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, language: Language) {
        self.0 |= language.bit();
    }

    /// Languages of `universe` that are not in `self`
    pub fn complement_within(self, universe: LanguageSet) -> LanguageSet {
        LanguageSet(!self.0 & universe.0)
    }

    /// The only language in the set, if there is exactly one
    pub fn sole(self) -> Option<Language> {
        if self.len() == 1 {
            self.iter().next()
        } else {
            None
        }
    }

    /// Member languages in bit order
    pub fn iter(self) -> impl Iterator<Item = Language> {
        Language::ALL
            .into_iter()
            .filter(move |lang| self.contains(*lang))
    }

    /// Parse a caller-supplied language hint.
    ///
    /// Accepts rule-data names (`spanish`), BCP-47 tags (`es-MX`) and lists of
    /// either joined by `+` or `,`. Returns `None` when any part is not
    /// recognised, so the caller can fall back to detection.
    pub fn parse_hint(hint: &str) -> Option<LanguageSet> {
        let mut set = LanguageSet::EMPTY;
        for part in hint.split(['+', ',']) {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let language = Language::from_name(part).or_else(|| Language::from_locale_tag(part))?;
            set.insert(language);
        }
        if set.is_empty() { None } else { Some(set) }
    }
}

impl FromIterator<Language> for LanguageSet {
    fn from_iter<I: IntoIterator<Item = Language>>(iter: I) -> Self {
        let mut set = LanguageSet::EMPTY;
        for language in iter {
            set.insert(language);
        }
        set
    }
}

impl From<Language> for LanguageSet {
    fn from(language: Language) -> Self {
        LanguageSet::single(language)
    }
}

impl BitAnd for LanguageSet {
    type Output = LanguageSet;

    fn bitand(self, rhs: LanguageSet) -> LanguageSet {
        LanguageSet(self.0 & rhs.0)
    }
}

impl BitAndAssign for LanguageSet {
    fn bitand_assign(&mut self, rhs: LanguageSet) {
        self.0 &= rhs.0;
    }
}

impl BitOr for LanguageSet {
    type Output = LanguageSet;

    fn bitor(self, rhs: LanguageSet) -> LanguageSet {
        LanguageSet(self.0 | rhs.0)
    }
}

impl BitOrAssign for LanguageSet {
    fn bitor_assign(&mut self, rhs: LanguageSet) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for LanguageSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let names: Vec<&str> = self.iter().map(Language::name).collect();
        write!(f, "{}", names.join("+"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_are_distinct() {
        let all: LanguageSet = Language::ALL.into_iter().collect();
        assert_eq!(all.len(), Language::ALL.len());
        assert_eq!(Language::Any.bit(), 1);
        assert_eq!(LanguageSet::ANY, LanguageSet::single(Language::Any));
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Language::from_name("Spanish"), Some(Language::Spanish));
        assert_eq!(Language::from_name(" greeklatin "), Some(Language::GreekLatin));
        assert_eq!(Language::from_name("klingon"), None);
    }

    #[test]
    fn test_from_locale_tag() {
        assert_eq!(Language::from_locale_tag("es-MX"), Some(Language::Spanish));
        assert_eq!(Language::from_locale_tag("de"), Some(Language::German));
        assert_eq!(Language::from_locale_tag("ru"), Some(Language::Russian));
        assert_eq!(Language::from_locale_tag("sr-Cyrl"), Some(Language::Cyrillic));
        assert_eq!(Language::from_locale_tag("el-Latn"), Some(Language::GreekLatin));
        assert_eq!(Language::from_locale_tag("ja"), None);
        assert_eq!(Language::from_locale_tag("not a tag"), None);
    }

    #[test]
    fn test_complement_within() {
        let universe: LanguageSet = [Language::Any, Language::English, Language::French]
            .into_iter()
            .collect();
        let vetoed = LanguageSet::single(Language::English);
        let rest = vetoed.complement_within(universe);
        assert!(rest.contains(Language::Any));
        assert!(rest.contains(Language::French));
        assert!(!rest.contains(Language::English));
        assert!(!rest.contains(Language::German));
    }

    #[test]
    fn test_parse_hint() {
        let hint = LanguageSet::parse_hint("french+it").unwrap();
        assert!(hint.contains(Language::French));
        assert!(hint.contains(Language::Italian));
        assert_eq!(hint.len(), 2);

        assert_eq!(
            LanguageSet::parse_hint("polish, hungarian").map(|s| s.len()),
            Some(2)
        );
        assert_eq!(LanguageSet::parse_hint(""), None);
        assert_eq!(LanguageSet::parse_hint("french+klingon"), None);
    }

    #[test]
    fn test_display() {
        let set: LanguageSet = [Language::French, Language::Any].into_iter().collect();
        assert_eq!(set.to_string(), "any+french");
        assert_eq!(LanguageSet::EMPTY.to_string(), "none");
        assert_eq!(set.sole(), None);
        assert_eq!(LanguageSet::ANY.sole(), Some(Language::Any));
    }
}
