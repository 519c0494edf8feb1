//! Leaf-name search patterns.
//!
//! Only two wildcards exist: `*` for any run of characters and `?` for exactly
//! one. Everything else is escaped before the regex is built, so a pattern
//! can never smuggle in regex syntax. A pattern without wildcards is a
//! starts-with match; with wildcards it must match the whole leaf name.

use crate::errors::{IndexError, IndexResult};
use regex::{Regex, RegexBuilder};

#[derive(Clone, Debug)]
pub struct NamePattern {
    regex: Regex,
}

impl NamePattern {
    pub fn compile(pattern: &str, case_sensitive: bool) -> IndexResult<Self> {
        if let Some(c) = pattern
            .chars()
            .find(|c| matches!(c, '/' | '\\' | '[' | ']') || c.is_control())
        {
            return Err(IndexError::invalid_pattern(
                pattern,
                format!("character {c:?} is not allowed, only '*' and '?' are wildcards"),
            ));
        }

        let anchored = pattern.contains(['*', '?']);
        let mut source = String::with_capacity(pattern.len() * 2 + 2);
        source.push('^');
        let mut literal = String::new();
        for c in pattern.chars() {
            match c {
                '*' | '?' => {
                    source.push_str(&regex::escape(&literal));
                    literal.clear();
                    source.push_str(if c == '*' { ".*" } else { "." });
                }
                other => literal.push(other),
            }
        }
        source.push_str(&regex::escape(&literal));
        if anchored {
            source.push('$');
        }

        let regex = RegexBuilder::new(&source)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|err| IndexError::invalid_pattern(pattern, err.to_string()))?;
        Ok(Self { regex })
    }

    pub fn matches(&self, leaf_name: &str) -> bool {
        self.regex.is_match(leaf_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMES: [&str; 4] = ["abc.txt", "def.txt", "ghi.png", "jkl.png"];

    fn matching(pattern: &str) -> Vec<&'static str> {
        let compiled = NamePattern::compile(pattern, true).unwrap();
        NAMES.into_iter().filter(|n| compiled.matches(n)).collect()
    }

    #[test]
    fn leading_star() {
        assert_eq!(matching("*.png"), ["ghi.png", "jkl.png"]);
    }

    #[test]
    fn leading_question_mark() {
        assert_eq!(matching("?bc?txt"), ["abc.txt"]);
    }

    #[test]
    fn trailing_star() {
        assert_eq!(matching("d*"), ["def.txt"]);
    }

    #[test]
    fn no_wildcard_is_starts_with() {
        assert_eq!(matching("a"), ["abc.txt"]);
        assert_eq!(matching("abc.t"), ["abc.txt"]);
        assert!(matching("bc").is_empty());
    }

    #[test]
    fn regex_syntax_is_literal() {
        // '.' must not act as "any character"
        assert!(matching("abc.tx.").is_empty());
        assert!(NamePattern::compile("a+b(c)", true).unwrap().matches("a+b(c).txt"));
        assert!(!NamePattern::compile("a+b", true).unwrap().matches("aab"));
    }

    #[test]
    fn case_sensitivity_is_configurable() {
        assert!(!NamePattern::compile("ABC*", true).unwrap().matches("abc.txt"));
        assert!(NamePattern::compile("ABC*", false).unwrap().matches("abc.txt"));
    }

    #[test]
    fn rejects_characters_outside_alphabet() {
        for bad in ["a/b", "[a-z]*", "a\\b", "a\nb"] {
            assert!(
                matches!(
                    NamePattern::compile(bad, true),
                    Err(IndexError::InvalidPattern { .. })
                ),
                "{bad:?}"
            );
        }
    }
}
