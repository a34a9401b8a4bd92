//! The read-only rule registry.
//!
//! A [`RuleTableStore`] holds the compiled rule data of all three variants. It
//! is built once, validated completely, and only read afterwards. Every
//! configuration error is reported here, before any name is encoded.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::engine::branch::{BranchPattern, ReplacementIssue};
use crate::engine::detect::{DetectionRule, LanguageDetectionTable};
use crate::engine::rule::{Rule, RuleTable};
use crate::error::{BmpmError, BmpmResult};
use crate::language::{Language, LanguageSet};
use crate::loader::{self, RawRule, RawVariant};
use crate::normalize::{DiscardList, Normalizer};

/// A rule bundle tuned for one naming tradition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Variant {
    Generic,
    Ashkenazi,
    Sephardic,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Generic, Variant::Ashkenazi, Variant::Sephardic];

    pub fn code(self) -> &'static str {
        match self {
            Variant::Generic => "gen",
            Variant::Ashkenazi => "ash",
            Variant::Sephardic => "sep",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Variant {
    type Err = BmpmError;

    /// Accepts `gen`/`generic`, `ash`/`ashkenazi`, `sep`/`sephardic`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gen" | "generic" => Ok(Variant::Generic),
            "ash" | "ashkenazi" => Ok(Variant::Ashkenazi),
            "sep" | "sephardic" => Ok(Variant::Sephardic),
            _ => Err(BmpmError::UnknownVariant(s.to_string())),
        }
    }
}

/// The three cascade stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Language-specific spelling to phonetic alphabet
    Main,
    /// Shared approximation rules
    Common,
    /// Language-specific final collapse
    Final,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Main => "main",
            Stage::Common => "common",
            Stage::Final => "final",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Compiled rule data of one variant
#[derive(Debug, Clone)]
pub struct VariantRules {
    variant: Variant,
    universe: LanguageSet,
    concat: bool,
    normalizer: Normalizer,
    detection: LanguageDetectionTable,
    /// Always has an entry for [`Language::Any`]
    main: BTreeMap<Language, RuleTable>,
    common: RuleTable,
    /// Always has an entry for [`Language::Any`]
    final_tables: BTreeMap<Language, RuleTable>,
}

impl VariantRules {
    /// Validate and compile raw rule data
    pub fn compile(variant: Variant, raw: RawVariant) -> BmpmResult<Self> {
        let compiler = Compiler { variant };

        let mut universe = LanguageSet::ANY;
        for name in &raw.languages {
            universe.insert(compiler.language(name)?);
        }

        let detection = raw
            .detection
            .iter()
            .map(|(pattern, languages, accept)| {
                let languages = compiler.language_set(languages, universe)?;
                DetectionRule::new(pattern, languages, *accept).map_err(|source| {
                    BmpmError::InvalidContext {
                        variant: variant.code().to_string(),
                        pattern: pattern.clone(),
                        source,
                    }
                })
            })
            .collect::<BmpmResult<Vec<_>>>()?;

        let main = compiler.language_tables(Stage::Main, &raw.main, universe)?;
        let common = raw.common.as_deref().ok_or_else(|| BmpmError::MissingTable {
            variant: variant.code().to_string(),
            stage: Stage::Common.name().to_string(),
        })?;
        let common = compiler.table(Stage::Common, Language::Any, common, universe)?;
        let final_tables = compiler.language_tables(Stage::Final, &raw.final_rules, universe)?;

        let rules = VariantRules {
            variant,
            universe,
            concat: raw.concat,
            normalizer: Normalizer::new(DiscardList::new(&raw.discards), raw.apostrophes),
            detection: LanguageDetectionTable::new(detection),
            main,
            common,
            final_tables,
        };

        debug!(
            %variant,
            languages = %rules.universe,
            detection_rules = rules.detection.len(),
            main_rules = rules.main.values().map(RuleTable::len).sum::<usize>(),
            common_rules = rules.common.len(),
            final_rules = rules.final_tables.values().map(RuleTable::len).sum::<usize>(),
            "compiled variant rules"
        );

        Ok(rules)
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Every language this variant knows, plus `any`
    pub fn universe(&self) -> LanguageSet {
        self.universe
    }

    /// Whether multi-word names are joined into one code by default
    pub fn concat(&self) -> bool {
        self.concat
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn detection(&self) -> &LanguageDetectionTable {
        &self.detection
    }

    /// The table for `stage` and `language`.
    ///
    /// Languages without their own table use the `any` table of that stage;
    /// the common stage has a single table shared by all languages.
    pub fn table(&self, stage: Stage, language: Language) -> &RuleTable {
        let tables = match stage {
            Stage::Common => return &self.common,
            Stage::Main => &self.main,
            Stage::Final => &self.final_tables,
        };
        // compile() refuses rule data without an `any` table
        tables
            .get(&language)
            .unwrap_or_else(|| &tables[&Language::Any])
    }
}

struct Compiler {
    variant: Variant,
}

impl Compiler {
    fn unknown_language(&self, name: &str) -> BmpmError {
        BmpmError::UnknownLanguage {
            variant: self.variant.code().to_string(),
            name: name.to_string(),
        }
    }

    fn language(&self, name: &str) -> BmpmResult<Language> {
        Language::from_name(name).ok_or_else(|| self.unknown_language(name))
    }

    /// A language that must also belong to this variant
    fn member(&self, name: &str, universe: LanguageSet) -> BmpmResult<Language> {
        let language = self.language(name)?;
        if universe.contains(language) {
            Ok(language)
        } else {
            Err(self.unknown_language(name))
        }
    }

    fn language_set(&self, names: &[String], universe: LanguageSet) -> BmpmResult<LanguageSet> {
        let mut set = LanguageSet::EMPTY;
        for name in names {
            set.insert(self.member(name, universe)?);
        }
        Ok(set)
    }

    fn language_tables(
        &self,
        stage: Stage,
        raw: &BTreeMap<String, Vec<RawRule>>,
        universe: LanguageSet,
    ) -> BmpmResult<BTreeMap<Language, RuleTable>> {
        let mut tables = BTreeMap::new();
        for (name, rules) in raw {
            let language = self.member(name, universe)?;
            tables.insert(language, self.table(stage, language, rules, universe)?);
        }
        if !tables.contains_key(&Language::Any) {
            return Err(BmpmError::MissingTable {
                variant: self.variant.code().to_string(),
                stage: stage.name().to_string(),
            });
        }
        Ok(tables)
    }

    fn table(
        &self,
        stage: Stage,
        language: Language,
        raw: &[RawRule],
        universe: LanguageSet,
    ) -> BmpmResult<RuleTable> {
        let variant = self.variant.code().to_string();
        let mut rules = Vec::with_capacity(raw.len());

        for (index, (pattern, left, right, replacement)) in raw.iter().enumerate() {
            if pattern.is_empty() {
                return Err(BmpmError::EmptyPattern {
                    variant,
                    stage: stage.name().to_string(),
                    language: language.name().to_string(),
                    index,
                });
            }

            let branch = BranchPattern::parse(replacement).map_err(|issue| match issue {
                ReplacementIssue::Malformed(reason) => BmpmError::MalformedReplacement {
                    variant: variant.clone(),
                    replacement: replacement.clone(),
                    reason,
                },
                ReplacementIssue::UnknownLanguage(name) => self.unknown_language(&name),
            })?;
            // filters may only name languages of this variant
            let foreign = universe.complement_within(branch.filter_languages());
            if let Some(stray) = foreign.iter().next() {
                return Err(self.unknown_language(stray.name()));
            }

            let rule = Rule::new(pattern, left, right, branch).map_err(|err| {
                BmpmError::InvalidContext {
                    variant: variant.clone(),
                    pattern: err.pattern,
                    source: err.source,
                }
            })?;
            rules.push(rule);
        }

        Ok(RuleTable::new(rules))
    }
}

/// Compiled rule data for the generic, Ashkenazi and Sephardic variants
#[derive(Debug, Clone)]
pub struct RuleTableStore {
    variants: BTreeMap<Variant, VariantRules>,
}

impl RuleTableStore {
    /// Build a store from raw rule data; all three variants are required
    pub fn from_raw(raw: BTreeMap<Variant, RawVariant>) -> BmpmResult<Self> {
        let mut raw = raw;
        let mut variants = BTreeMap::new();
        for variant in Variant::ALL {
            let data = raw
                .remove(&variant)
                .ok_or_else(|| BmpmError::MissingVariant(variant.code().to_string()))?;
            variants.insert(variant, VariantRules::compile(variant, data)?);
        }
        Ok(RuleTableStore { variants })
    }

    /// The rule data shipped with the crate
    pub fn bundled() -> BmpmResult<Self> {
        Self::from_raw(loader::bundled_variants()?)
    }

    /// Load `gen.json`, `ash.json` and `sep.json` from a directory
    pub fn from_dir(dir: &Path) -> BmpmResult<Self> {
        Self::from_raw(loader::load_variants_from_dir(dir)?)
    }

    pub fn variant(&self, variant: Variant) -> &VariantRules {
        // from_raw guarantees every variant is present
        &self.variants[&variant]
    }

    pub fn tables_for(&self, variant: Variant, stage: Stage, language: Language) -> &RuleTable {
        self.variant(variant).table(stage, language)
    }

    pub fn discards_for(&self, variant: Variant) -> &DiscardList {
        self.variant(variant).normalizer().discards()
    }

    pub fn detection_table_for(&self, variant: Variant) -> &LanguageDetectionTable {
        self.variant(variant).detection()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_variant;

    fn raw(json: &str) -> RawVariant {
        parse_variant(json, Path::new("test.json")).unwrap()
    }

    const VALID: &str = r#"{
        "languages": ["any", "french", "spanish"],
        "discards": ["de", "d'"],
        "detection": [["eau", ["french"], true], ["ñ", ["spanish"], true]],
        "main": {
            "any": [["ph", "", "", "f"]],
            "french": [["eau", "", "", "o"], ["ch", "", "", "(S|tS[spanish])"]]
        },
        "common": [["aa", "", "", "a"]],
        "final": { "any": [] }
    }"#;

    fn compile(json: &str) -> BmpmResult<VariantRules> {
        VariantRules::compile(Variant::Generic, raw(json))
    }

    #[test]
    fn test_variant_from_str() {
        assert_eq!("gen".parse::<Variant>().unwrap(), Variant::Generic);
        assert_eq!("Ashkenazi".parse::<Variant>().unwrap(), Variant::Ashkenazi);
        assert_eq!(" sep ".parse::<Variant>().unwrap(), Variant::Sephardic);
        assert!(matches!(
            "xyz".parse::<Variant>(),
            Err(BmpmError::UnknownVariant(_))
        ));
    }

    #[test]
    fn test_compile_valid() {
        let rules = compile(VALID).unwrap();
        assert!(rules.universe().contains(Language::Any));
        assert!(rules.universe().contains(Language::French));
        assert_eq!(rules.universe().len(), 3);
        assert_eq!(rules.detection().len(), 2);
        assert_eq!(rules.table(Stage::Main, Language::French).len(), 2);
        assert_eq!(rules.table(Stage::Common, Language::French).len(), 1);
    }

    #[test]
    fn test_missing_language_table_uses_any() {
        let rules = compile(VALID).unwrap();
        let spanish = rules.table(Stage::Main, Language::Spanish);
        let any = rules.table(Stage::Main, Language::Any);
        assert_eq!(spanish.len(), any.len());
        assert_eq!(spanish.rules()[0].pattern, "ph");
        assert!(rules.table(Stage::Final, Language::French).is_empty());
    }

    #[test]
    fn test_empty_pattern_rejected() {
        let json = VALID.replace(r#"["aa", "", "", "a"]"#, r#"["", "", "", "a"]"#);
        assert!(matches!(
            compile(&json),
            Err(BmpmError::EmptyPattern { index: 0, .. })
        ));
    }

    #[test]
    fn test_unknown_filter_language_rejected() {
        let json = VALID.replace("tS[spanish]", "tS[klingon]");
        match compile(&json) {
            Err(BmpmError::UnknownLanguage { name, .. }) => assert_eq!(name, "klingon"),
            other => panic!("Expected UnknownLanguage, got {:?}", other),
        }
    }

    #[test]
    fn test_filter_outside_variant_rejected() {
        let json = VALID.replace("tS[spanish]", "tS[german]");
        assert!(matches!(
            compile(&json),
            Err(BmpmError::UnknownLanguage { .. })
        ));
    }

    #[test]
    fn test_detection_language_outside_variant_rejected() {
        let json = VALID.replace(r#"["ñ", ["spanish"], true]"#, r#"["ß", ["german"], true]"#);
        assert!(matches!(
            compile(&json),
            Err(BmpmError::UnknownLanguage { .. })
        ));
    }

    #[test]
    fn test_invalid_context_rejected() {
        let json = VALID.replace(r#"["eau", "", "", "o"]"#, r#"["eau", "[ab", "", "o"]"#);
        assert!(matches!(
            compile(&json),
            Err(BmpmError::InvalidContext { .. })
        ));
    }

    #[test]
    fn test_invalid_detection_pattern_rejected() {
        let json = VALID.replace(r#"["eau", ["french"], true]"#, r#"["[ab", ["french"], true]"#);
        match compile(&json) {
            Err(BmpmError::InvalidContext { pattern, .. }) => assert_eq!(pattern, "[ab"),
            other => panic!("expected InvalidContext, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_malformed_replacement_rejected() {
        let json = VALID.replace("(S|tS[spanish])", "(S|(tS))");
        assert!(matches!(
            compile(&json),
            Err(BmpmError::MalformedReplacement { .. })
        ));
    }

    #[test]
    fn test_missing_any_table_rejected() {
        let json = VALID.replace(r#""final": { "any": [] }"#, r#""final": {}"#);
        assert!(matches!(
            compile(&json),
            Err(BmpmError::MissingTable { .. })
        ));
    }

    #[test]
    fn test_missing_common_table_rejected() {
        let json = VALID.replace(r#""common": [["aa", "", "", "a"]],"#, "");
        match compile(&json) {
            Err(BmpmError::MissingTable { stage, .. }) => assert_eq!(stage, "common"),
            other => panic!("Expected MissingTable, got {:?}", other),
        }
    }

    #[test]
    fn test_store_requires_all_variants() {
        let mut data = BTreeMap::new();
        data.insert(Variant::Generic, raw(VALID));
        data.insert(Variant::Sephardic, raw(VALID));
        assert!(matches!(
            RuleTableStore::from_raw(data),
            Err(BmpmError::MissingVariant(code)) if code == "ash"
        ));
    }

    #[test]
    fn test_bundled_store() {
        let store = RuleTableStore::bundled().unwrap();
        for variant in Variant::ALL {
            assert!(!store.detection_table_for(variant).is_empty());
            assert!(!store.tables_for(variant, Stage::Main, Language::Any).is_empty());
        }
        assert!(store.discards_for(Variant::Generic).contains("van"));
        assert!(store.discards_for(Variant::Ashkenazi).contains("ben"));
    }
}
