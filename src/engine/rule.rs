//! Context-sensitive rewrite rules and first-match lookup.
//!
//! A [`Rule`] rewrites a literal `pattern` when the text before it matches
//! the left context and the text after it matches the right context. A
//! [`RuleTable`] is scanned in declared order and the first applicable rule
//! wins. Tables are hand-ordered from most to least specific, so this order
//! must never be changed.

use regex::Regex;

use super::branch::BranchPattern;

/// A context regex that failed to compile
#[derive(Debug)]
pub struct ContextError {
    pub pattern: String,
    pub source: regex::Error,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub pattern: String,
    left_source: String,
    right_source: String,
    /// Anchored to the end of the consumed prefix
    left: Option<Regex>,
    /// Anchored to the start of the unconsumed suffix
    right: Option<Regex>,
    pub replacement: BranchPattern,
}

impl Rule {
    pub fn new(
        pattern: &str,
        left_context: &str,
        right_context: &str,
        replacement: BranchPattern,
    ) -> Result<Self, ContextError> {
        Ok(Rule {
            pattern: pattern.to_string(),
            left_source: left_context.to_string(),
            right_source: right_context.to_string(),
            left: compile_context(left_context, |ctx| format!("(?:{})$", ctx))?,
            right: compile_context(right_context, |ctx| format!("^(?:{})", ctx))?,
            replacement,
        })
    }

    pub fn left_context(&self) -> &str {
        &self.left_source
    }

    pub fn right_context(&self) -> &str {
        &self.right_source
    }

    /// Whether this rule applies at byte offset `pos` of `text`
    pub fn applies_at(&self, text: &str, pos: usize) -> bool {
        let Some(rest) = text.get(pos..) else {
            return false;
        };
        if !rest.starts_with(&self.pattern) {
            return false;
        }
        if let Some(left) = &self.left {
            if !left.is_match(&text[..pos]) {
                return false;
            }
        }
        if let Some(right) = &self.right {
            if !right.is_match(&rest[self.pattern.len()..]) {
                return false;
            }
        }
        true
    }
}

fn compile_context(
    context: &str,
    anchor: impl Fn(&str) -> String,
) -> Result<Option<Regex>, ContextError> {
    if context.is_empty() {
        return Ok(None);
    }
    Regex::new(&anchor(context))
        .map(Some)
        .map_err(|source| ContextError {
            pattern: context.to_string(),
            source,
        })
}

/// The outcome of one matching step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step<'a> {
    /// A rule matched; advance by `consumed` bytes and emit its replacement
    Rule {
        consumed: usize,
        replacement: &'a BranchPattern,
    },
    /// No rule matched; copy this one character verbatim
    Copy(&'a str),
}

impl Step<'_> {
    pub fn consumed(&self) -> usize {
        match self {
            Step::Rule { consumed, .. } => *consumed,
            Step::Copy(ch) => ch.len(),
        }
    }
}

/// An ordered rule list for one (variant, stage, language)
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>) -> Self {
        RuleTable { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// First rule applicable at `pos`, as (consumed bytes, replacement)
    pub fn match_at(&self, text: &str, pos: usize) -> Option<(usize, &BranchPattern)> {
        self.rules
            .iter()
            .find(|rule| rule.applies_at(text, pos))
            .map(|rule| (rule.pattern.len(), &rule.replacement))
    }

    /// One matching step at `pos`, falling back to a verbatim copy.
    ///
    /// Returns `None` only at the end of the text.
    pub fn step_at<'a>(&'a self, text: &'a str, pos: usize) -> Option<Step<'a>> {
        if let Some((consumed, replacement)) = self.match_at(text, pos) {
            return Some(Step::Rule {
                consumed,
                replacement,
            });
        }
        let ch = text.get(pos..)?.chars().next()?;
        Some(Step::Copy(&text[pos..pos + ch.len_utf8()]))
    }
}
