//! Ban-word redaction applied to titles, bodies and comments before display.

use std::borrow::Cow;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Replacement written over every banned occurrence.
pub const MASK: &str = "*****";

/// How a configured term is turned into a matcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BanMatch {
    /// The term is used as a regular expression, as the site has always done.
    #[default]
    Pattern,
    /// The term is matched as plain text.
    Literal,
}

impl std::str::FromStr for BanMatch {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pattern" => Ok(Self::Pattern),
            "literal" => Ok(Self::Literal),
            other => Err(format!("unknown ban match mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BanWordFilter {
    patterns: Vec<Regex>,
}

impl BanWordFilter {
    /// Builds a filter from the comma-separated `banWords` setting.
    pub fn from_config(raw: &str, mode: BanMatch) -> Self {
        let patterns = split_terms(raw)
            .filter_map(|term| compile(term, mode))
            .collect();
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn redact(&self, text: &str) -> String {
        if text.is_empty() || self.patterns.is_empty() {
            return text.to_string();
        }
        let mut out = text.to_string();
        for pattern in &self.patterns {
            let replaced = pattern.replace_all(&out, MASK).into_owned();
            out = replaced;
        }
        out
    }
}

/// One-shot redaction with the default matching mode.
pub fn redact(text: &str, banned_terms: &str) -> String {
    BanWordFilter::from_config(banned_terms, BanMatch::Pattern).redact(text)
}

pub fn split_terms(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|term| !term.is_empty())
}

fn compile(term: &str, mode: BanMatch) -> Option<Regex> {
    let source = match mode {
        BanMatch::Pattern => Cow::Borrowed(term),
        BanMatch::Literal => Cow::Owned(regex::escape(term)),
    };
    let pattern = match build(&source) {
        Ok(pattern) => pattern,
        Err(err) => {
            warn!(term, error = %err, "ban word is not a valid pattern, matching it literally");
            build(&regex::escape(term)).ok()?
        }
    };
    // A pattern that matches nothing at all would mask between every character.
    if pattern.is_match("") {
        warn!(term, "ban word matches the empty string, ignoring it");
        return None;
    }
    Some(pattern)
}

fn build(source: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(source).case_insensitive(true).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_clean(output: &str, terms: &[&str]) {
        let lowered = output.to_lowercase();
        for term in terms {
            assert!(
                !lowered.contains(&term.to_lowercase()),
                "{output:?} still contains {term:?}"
            );
        }
    }

    #[test]
    fn masks_every_case_insensitive_occurrence() {
        let out = redact("Darn it, DARN this darnation", "darn");
        assert_eq!(out, "***** it, ***** this *****ation");
    }

    #[test]
    fn terms_are_split_and_trimmed() {
        let filter = BanWordFilter::from_config(" foo , bar,,  ", BanMatch::Pattern);
        assert_eq!(filter.len(), 2);
        assert_eq!(filter.redact("foo and BAR"), "***** and *****");
    }

    #[test]
    fn empty_inputs_return_text_unchanged() {
        assert_eq!(redact("", "foo"), "");
        assert_eq!(redact("hello world", ""), "hello world");
        assert_eq!(redact("hello world", " , ,"), "hello world");
    }

    #[test]
    fn output_never_contains_listed_terms() {
        let cases: &[(&str, &[&str])] = &[
            ("spam Spam SPAM eggs", &["spam"]),
            ("the quick brown fox", &["quick", "fox", "dog"]),
            ("abcabcabc", &["bca", "abc"]),
            ("Mixed CASE words", &["mixed", "case", "WORDS"]),
        ];
        for (text, terms) in cases {
            let out = redact(text, &terms.join(","));
            assert_clean(&out, terms);
        }
    }

    #[test]
    fn pattern_mode_treats_terms_as_patterns() {
        let out = redact("cat cot cut", "c.t");
        assert_eq!(out, "***** ***** *****");
    }

    #[test]
    fn literal_mode_escapes_special_characters() {
        let filter = BanWordFilter::from_config("c.t", BanMatch::Literal);
        assert_eq!(filter.redact("cat c.t"), "cat *****");
    }

    #[test]
    fn invalid_pattern_falls_back_to_literal() {
        let out = redact("a (b c", "(b");
        assert_eq!(out, "a ***** c");
    }

    #[test]
    fn empty_matching_pattern_is_ignored() {
        let filter = BanWordFilter::from_config("x*", BanMatch::Pattern);
        assert!(filter.is_empty());
        assert_eq!(filter.redact("abc"), "abc");
    }

    #[test]
    fn ban_match_parses() {
        assert_eq!("Literal".parse::<BanMatch>(), Ok(BanMatch::Literal));
        assert!("fuzzy".parse::<BanMatch>().is_err());
    }
}
