//! Replacement patterns and their language-filtered expansion.
//!
//! A rule's replacement is either a literal (possibly empty, i.e. a deletion)
//! or a flat alternation such as `(k[italian]|s[french+spanish]|ts)`. The
//! alternation is compiled once when the rule data is loaded. At encode time,
//! [`BranchPattern::resolve`] picks the alternatives allowed for the active
//! languages.

use std::fmt;

use indexmap::IndexSet;

use crate::language::{Language, LanguageSet};

/// One candidate of an alternation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternative {
    pub text: String,
    /// Languages this alternative is limited to; `None` means always allowed
    pub filter: Option<LanguageSet>,
}

impl Alternative {
    pub fn allowed_for(&self, active: LanguageSet) -> bool {
        match self.filter {
            Some(filter) => filter.intersects(active),
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchPattern {
    Literal(String),
    Alternation(Vec<Alternative>),
}

/// Why a replacement string was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplacementIssue {
    Malformed(String),
    UnknownLanguage(String),
}

impl BranchPattern {
    /// Compile a replacement string from rule data
    pub fn parse(replacement: &str) -> Result<Self, ReplacementIssue> {
        let inner = match replacement
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
        {
            Some(inner) => inner,
            None => {
                if replacement.contains(['(', ')', '|', '[', ']']) {
                    return Err(ReplacementIssue::Malformed(
                        "unbalanced alternation or stray filter".to_string(),
                    ));
                }
                return Ok(BranchPattern::Literal(replacement.to_string()));
            }
        };

        if inner.contains(['(', ')']) {
            return Err(ReplacementIssue::Malformed(
                "nested alternation".to_string(),
            ));
        }

        let alternatives = inner
            .split('|')
            .map(parse_alternative)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BranchPattern::Alternation(alternatives))
    }

    /// Expand this pattern against the active languages.
    ///
    /// Never returns an empty set: if every alternative is filtered out, the
    /// first unfiltered alternative (or failing that, the first alternative)
    /// is kept.
    pub fn resolve(&self, active: LanguageSet) -> IndexSet<&str> {
        let mut out = IndexSet::new();
        match self {
            BranchPattern::Literal(text) => {
                out.insert(text.as_str());
            }
            BranchPattern::Alternation(alternatives) => {
                for alt in alternatives.iter().filter(|alt| alt.allowed_for(active)) {
                    out.insert(alt.text.as_str());
                }
                if out.is_empty() {
                    let fallback = alternatives
                        .iter()
                        .find(|alt| alt.filter.is_none())
                        .or_else(|| alternatives.first());
                    out.insert(fallback.map(|alt| alt.text.as_str()).unwrap_or(""));
                }
            }
        }
        out
    }

    /// Languages referenced by any filter tag in this pattern
    pub fn filter_languages(&self) -> LanguageSet {
        match self {
            BranchPattern::Literal(_) => LanguageSet::EMPTY,
            BranchPattern::Alternation(alternatives) => alternatives
                .iter()
                .filter_map(|alt| alt.filter)
                .fold(LanguageSet::EMPTY, |acc, filter| acc | filter),
        }
    }
}

fn parse_alternative(raw: &str) -> Result<Alternative, ReplacementIssue> {
    let Some(open) = raw.find('[') else {
        if raw.contains(']') {
            return Err(ReplacementIssue::Malformed(format!(
                "stray ']' in alternative '{}'",
                raw
            )));
        }
        return Ok(Alternative {
            text: raw.to_string(),
            filter: None,
        });
    };

    let tag = raw[open + 1..].strip_suffix(']').ok_or_else(|| {
        ReplacementIssue::Malformed(format!("unterminated filter in alternative '{}'", raw))
    })?;
    if tag.contains(['[', ']']) {
        return Err(ReplacementIssue::Malformed(format!(
            "more than one filter in alternative '{}'",
            raw
        )));
    }

    let mut filter = LanguageSet::EMPTY;
    for name in tag.split('+') {
        let language = Language::from_name(name)
            .ok_or_else(|| ReplacementIssue::UnknownLanguage(name.trim().to_string()))?;
        filter.insert(language);
    }
    if filter.is_empty() {
        return Err(ReplacementIssue::Malformed(format!(
            "empty filter in alternative '{}'",
            raw
        )));
    }

    Ok(Alternative {
        text: raw[..open].to_string(),
        filter: Some(filter),
    })
}

impl fmt::Display for BranchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchPattern::Literal(text) => write!(f, "{}", text),
            BranchPattern::Alternation(alternatives) => {
                let parts: Vec<String> = alternatives
                    .iter()
                    .map(|alt| match alt.filter {
                        Some(filter) => format!("{}[{}]", alt.text, filter),
                        None => alt.text.clone(),
                    })
                    .collect();
                write!(f, "({})", parts.join("|"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set(languages: &[Language]) -> LanguageSet {
        languages.iter().copied().collect()
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(
            BranchPattern::parse("tS").unwrap(),
            BranchPattern::Literal("tS".to_string())
        );
        assert_eq!(
            BranchPattern::parse("").unwrap(),
            BranchPattern::Literal(String::new())
        );
    }

    #[test]
    fn test_parse_alternation_with_filters() {
        let pattern = BranchPattern::parse("(k[italian]|S[portuguese+french]|tS)").unwrap();
        let BranchPattern::Alternation(alts) = &pattern else {
            panic!("Expected alternation, got {:?}", pattern);
        };
        assert_eq!(alts.len(), 3);
        assert_eq!(alts[0].text, "k");
        assert_eq!(alts[0].filter, Some(set(&[Language::Italian])));
        assert_eq!(
            alts[1].filter,
            Some(set(&[Language::Portuguese, Language::French]))
        );
        assert_eq!(alts[2].filter, None);
        assert_eq!(pattern.to_string(), "(k[italian]|S[french+portuguese]|tS)");
    }

    #[test]
    fn test_parse_deletion_alternative() {
        let pattern = BranchPattern::parse("(t|)").unwrap();
        let resolved = pattern.resolve(LanguageSet::ANY);
        assert_eq!(resolved.len(), 2);
        assert!(resolved.contains("t"));
        assert!(resolved.contains(""));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            BranchPattern::parse("(a|(b|c))"),
            Err(ReplacementIssue::Malformed(_))
        ));
        assert!(matches!(
            BranchPattern::parse("(a|b"),
            Err(ReplacementIssue::Malformed(_))
        ));
        assert!(matches!(
            BranchPattern::parse("(a[french|b)"),
            Err(ReplacementIssue::Malformed(_))
        ));
        assert_eq!(
            BranchPattern::parse("(a[klingon]|b)"),
            Err(ReplacementIssue::UnknownLanguage("klingon".to_string()))
        );
    }

    #[test]
    fn test_resolve_filters_by_language() {
        let pattern = BranchPattern::parse("(gli|l[italian])").unwrap();

        let italian = pattern.resolve(set(&[Language::Italian]));
        assert_eq!(italian.into_iter().collect::<Vec<_>>(), vec!["gli", "l"]);

        let spanish = pattern.resolve(set(&[Language::Spanish]));
        assert_eq!(spanish.into_iter().collect::<Vec<_>>(), vec!["gli"]);
    }

    #[test]
    fn test_resolve_fallback_when_all_filtered() {
        let pattern = BranchPattern::parse("(x[spanish]|Z[french])").unwrap();
        let resolved = pattern.resolve(set(&[Language::German]));
        assert_eq!(resolved.into_iter().collect::<Vec<_>>(), vec!["x"]);
    }

    #[test]
    fn test_filter_languages() {
        let pattern = BranchPattern::parse("(a|b[french]|c[spanish+french])").unwrap();
        assert_eq!(
            pattern.filter_languages(),
            set(&[Language::French, Language::Spanish])
        );
    }

    fn arb_alternative() -> impl Strategy<Value = Alternative> {
        (
            "[a-zA-Z]{0,3}",
            prop::option::of(1u32..(1 << 20)),
        )
            .prop_map(|(text, bits)| Alternative {
                text,
                filter: bits.map(LanguageSet::from_bits),
            })
    }

    proptest! {
        /// Every pattern resolves to at least one string for any non-empty set
        #[test]
        fn prop_resolve_is_total(
            alternatives in prop::collection::vec(arb_alternative(), 1..6),
            active in 1u32..(1 << 20),
        ) {
            let pattern = BranchPattern::Alternation(alternatives);
            let resolved = pattern.resolve(LanguageSet::from_bits(active));
            prop_assert!(!resolved.is_empty());
        }
    }
}
