//! Signature catalog: the immutable, ordered set of detection rules.
//!
//! Rules are declared as plain data (`SignatureSpec`) and compiled once
//! into a `Catalog`. A compiled catalog has no mutation path.

use std::collections::HashSet;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SignatureId(pub String);

impl SignatureId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SignatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    CodeExecution,
    DynamicImport,
    ShellEscape,
    DeferredExecution,
    FilesystemDestructive,
}

/// Uncompiled matcher source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherSpec {
    /// Case-sensitive substring.
    Literal(&'static str),
    /// `regex` crate syntax.
    Pattern(&'static str),
}

/// Declarative signature entry.
#[derive(Debug, Clone, Copy)]
pub struct SignatureSpec {
    pub id: &'static str,
    pub title: &'static str,
    pub category: Category,
    pub severity: Severity,
    pub matcher: MatcherSpec,
}

#[derive(Debug, Clone)]
pub enum Matcher {
    Literal(String),
    Pattern(Regex),
}

impl Matcher {
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Matcher::Literal(needle) => text.contains(needle.as_str()),
            Matcher::Pattern(re) => re.is_match(text),
        }
    }

    /// Byte offsets of every non-overlapping match in `text`.
    pub fn match_offsets(&self, text: &str) -> Vec<usize> {
        match self {
            Matcher::Literal(needle) => text
                .match_indices(needle.as_str())
                .map(|(i, _)| i)
                .collect(),
            Matcher::Pattern(re) => re.find_iter(text).map(|m| m.start()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Signature {
    id: SignatureId,
    title: String,
    category: Category,
    severity: Severity,
    matcher: Matcher,
}

impl Signature {
    pub fn id(&self) -> &SignatureId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }

    pub fn match_offsets(&self, text: &str) -> Vec<usize> {
        self.matcher.match_offsets(text)
    }
}

/// Compiled, ordered signature set.
#[derive(Debug, Clone)]
pub struct Catalog {
    signatures: Vec<Signature>,
}

impl Catalog {
    /// Compile a signature table.
    ///
    /// Fails on the first entry whose matcher is empty or does not compile,
    /// and on duplicate ids. Table order is preserved.
    pub fn compile(specs: &[SignatureSpec]) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(specs.len());
        let mut signatures = Vec::with_capacity(specs.len());

        for spec in specs {
            if !seen.insert(spec.id) {
                return Err(CatalogError::DuplicateId(spec.id.to_string()));
            }

            let matcher = match spec.matcher {
                MatcherSpec::Literal(text) | MatcherSpec::Pattern(text) if text.is_empty() => {
                    return Err(CatalogError::EmptyMatcher(spec.id.to_string()));
                }
                MatcherSpec::Literal(text) => Matcher::Literal(text.to_string()),
                MatcherSpec::Pattern(pattern) => {
                    let re = Regex::new(pattern).map_err(|source| CatalogError::InvalidPattern {
                        id: spec.id.to_string(),
                        source,
                    })?;
                    Matcher::Pattern(re)
                }
            };

            signatures.push(Signature {
                id: SignatureId(spec.id.to_string()),
                title: spec.title.to_string(),
                category: spec.category,
                severity: spec.severity,
                matcher,
            });
        }

        Ok(Self { signatures })
    }

    /// Compile the builtin signature table.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::compile(crate::rules::builtin::BUILTIN_SIGNATURES)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Signature> {
        self.signatures.iter()
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Signature> {
        self.signatures.iter().find(|s| s.id.as_str() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &[SignatureSpec] = &[
        SignatureSpec {
            id: "T-LIT",
            title: "literal",
            category: Category::DynamicImport,
            severity: Severity::Low,
            matcher: MatcherSpec::Literal("__import__"),
        },
        SignatureSpec {
            id: "T-RE",
            title: "pattern",
            category: Category::CodeExecution,
            severity: Severity::High,
            matcher: MatcherSpec::Pattern(r"\beval\s*\("),
        },
    ];

    #[test]
    fn compiles_table_in_order() {
        let catalog = Catalog::compile(TABLE).unwrap();
        let ids: Vec<&str> = catalog.iter().map(|s| s.id().as_str()).collect();
        assert_eq!(ids, vec!["T-LIT", "T-RE"]);
        assert_eq!(catalog.len(), 2);
        assert!(!catalog.is_empty());
    }

    #[test]
    fn literal_and_pattern_matchers() {
        let catalog = Catalog::compile(TABLE).unwrap();
        let lit = catalog.get("T-LIT").unwrap();
        let re = catalog.get("T-RE").unwrap();

        assert!(lit.is_match("x = __import__('os')"));
        assert!(!lit.is_match("import os"));
        assert!(re.is_match("eval (\"1\")"));
        assert!(!re.is_match("evalDeferred(\"1\")"));
    }

    #[test]
    fn match_offsets_cover_every_occurrence() {
        let catalog = Catalog::compile(TABLE).unwrap();
        let text = "__import__('a'); eval(x)\n__import__('b')";
        assert_eq!(catalog.get("T-LIT").unwrap().match_offsets(text), vec![0, 25]);
        assert_eq!(catalog.get("T-RE").unwrap().match_offsets(text), vec![17]);
        assert!(catalog.get("T-RE").unwrap().match_offsets("clean").is_empty());
    }

    #[test]
    fn matching_is_case_sensitive() {
        let catalog = Catalog::compile(TABLE).unwrap();
        assert!(!catalog.get("T-RE").unwrap().is_match("EVAL(\"1\")"));
        assert!(!catalog.get("T-LIT").unwrap().is_match("__IMPORT__"));
    }

    #[test]
    fn invalid_pattern_names_the_signature() {
        let bad = [SignatureSpec {
            id: "T-BAD",
            title: "broken",
            category: Category::ShellEscape,
            severity: Severity::High,
            matcher: MatcherSpec::Pattern("(unclosed"),
        }];
        match Catalog::compile(&bad) {
            Err(CatalogError::InvalidPattern { id, .. }) => assert_eq!(id, "T-BAD"),
            other => panic!("expected InvalidPattern, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let dup = [TABLE[0], TABLE[0]];
        assert!(matches!(
            Catalog::compile(&dup),
            Err(CatalogError::DuplicateId(id)) if id == "T-LIT"
        ));
    }

    #[test]
    fn empty_matcher_is_rejected() {
        let empty = [SignatureSpec {
            matcher: MatcherSpec::Literal(""),
            ..TABLE[0]
        }];
        assert!(matches!(
            Catalog::compile(&empty),
            Err(CatalogError::EmptyMatcher(_))
        ));
    }

    #[test]
    fn severity_ordering_is_semantic() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }
}
