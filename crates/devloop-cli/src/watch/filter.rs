//! Include/exclude path filtering for change batches.
//!
//! A pattern containing `*`, `?` or `[` is a glob matched against the whole
//! relative path (`*` crosses `/`, so `*.go` matches `a/b.go`). Anything else
//! matches as a plain substring. `{a,b}` alternatives are expanded before the
//! glob is compiled.

use crate::error::ConfigError;
use crate::watch::ChangeEvent;
use glob::Pattern;

const GLOB_META: &[char] = &['*', '?', '['];

#[derive(Debug, Clone)]
enum Matcher {
    Glob(Pattern),
    Substring(String),
}

impl Matcher {
    fn compile(pattern: &str) -> Result<Vec<Self>, ConfigError> {
        if !is_glob(pattern) {
            return Ok(vec![Matcher::Substring(pattern.to_string())]);
        }

        expand_braces(pattern)
            .into_iter()
            .map(|expanded| {
                Pattern::new(&expanded)
                    .map(Matcher::Glob)
                    .map_err(|e| ConfigError::InvalidPattern {
                        pattern: pattern.to_string(),
                        reason: e.msg.to_string(),
                    })
            })
            .collect()
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            Matcher::Glob(glob) => glob.matches(path),
            Matcher::Substring(needle) => path.contains(needle.as_str()),
        }
    }
}

/// A compiled `path -> bool` predicate.
///
/// Immutable once built. What an empty pattern list means depends on the
/// constructor: [`Predicate::include`] accepts everything, [`Predicate::exclude`]
/// rejects nothing.
#[derive(Debug, Clone)]
pub struct Predicate {
    matchers: Vec<Matcher>,
    when_empty: bool,
}

impl Predicate {
    /// Compile an include list. No patterns means every path is included.
    pub fn include<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        Self::compile(patterns, true)
    }

    /// Compile an exclude list. No patterns means no path is excluded.
    pub fn exclude<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        Self::compile(patterns, false)
    }

    fn compile<S: AsRef<str>>(patterns: &[S], when_empty: bool) -> Result<Self, ConfigError> {
        let mut matchers = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            matchers.extend(Matcher::compile(pattern.as_ref())?);
        }
        Ok(Self {
            matchers,
            when_empty,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        if self.matchers.is_empty() {
            return self.when_empty;
        }
        self.matchers.iter().any(|m| m.matches(path))
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

/// The include/exclude pair for one session.
#[derive(Debug, Clone)]
pub struct ChangeFilter {
    include: Predicate,
    exclude: Predicate,
}

impl ChangeFilter {
    /// Compile both pattern lists. An invalid glob in either is a configuration
    /// error.
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<Self, ConfigError> {
        Ok(Self {
            include: Predicate::include(include)?,
            exclude: Predicate::exclude(exclude)?,
        })
    }

    /// A filter that lets every path through.
    pub fn allow_all() -> Self {
        Self {
            include: Predicate {
                matchers: Vec::new(),
                when_empty: true,
            },
            exclude: Predicate {
                matchers: Vec::new(),
                when_empty: false,
            },
        }
    }

    /// A path qualifies iff it is not excluded and it is included.
    pub fn accepts(&self, path: &str) -> bool {
        !self.exclude.matches(path) && self.include.matches(path)
    }

    /// First event of the batch that qualifies, in delivery order.
    pub fn first_match<'a>(&self, batch: &'a [ChangeEvent]) -> Option<&'a ChangeEvent> {
        batch.iter().find(|event| self.accepts(&event.path))
    }

    /// Whole-batch trigger: true iff any event qualifies.
    pub fn qualifies(&self, batch: &[ChangeEvent]) -> bool {
        self.first_match(batch).is_some()
    }
}

impl Default for ChangeFilter {
    fn default() -> Self {
        Self::allow_all()
    }
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(GLOB_META)
}

/// Expand the first `{a,b,...}` group, recursively, into separate patterns.
///
/// Unbalanced braces are left alone and end up as literals.
fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };
    let Some(close_rel) = pattern[open..].find('}') else {
        return vec![pattern.to_string()];
    };
    let close = open + close_rel;

    let prefix = &pattern[..open];
    let suffix = &pattern[close + 1..];
    pattern[open + 1..close]
        .split(',')
        .flat_map(|alt| expand_braces(&format!("{prefix}{alt}{suffix}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watch::ChangeOp;

    fn batch() -> Vec<ChangeEvent> {
        vec![
            ChangeEvent::new(ChangeOp::Modify, "a/b.go"),
            ChangeEvent::new(ChangeOp::Create, "c/ignored.txt"),
        ]
    }

    #[test]
    fn test_empty_include_accepts_everything() {
        let include = Predicate::include::<&str>(&[]).unwrap();
        for path in ["", "a", "deep/nested/file.rs", ".hidden"] {
            assert!(include.matches(path), "{path}");
        }
    }

    #[test]
    fn test_empty_exclude_rejects_nothing() {
        let exclude = Predicate::exclude::<&str>(&[]).unwrap();
        for path in ["", "a", "deep/nested/file.rs", ".hidden"] {
            assert!(!exclude.matches(path), "{path}");
        }
    }

    #[test]
    fn test_glob_matches_full_path() {
        let include = Predicate::include(&["*.go"]).unwrap();
        assert!(include.matches("main.go"));
        assert!(include.matches("a/b.go"));
        assert!(!include.matches("a/b.rs"));
        assert!(!include.matches("main.go.bak"));
    }

    #[test]
    fn test_literal_matches_substring() {
        let include = Predicate::include(&["src/"]).unwrap();
        assert!(include.matches("src/lib.rs"));
        assert!(include.matches("crates/x/src/lib.rs"));
        assert!(!include.matches("tests/it.rs"));
    }

    #[test]
    fn test_any_pattern_is_enough() {
        let include = Predicate::include(&["*.rs", "Cargo.toml"]).unwrap();
        assert!(include.matches("src/main.rs"));
        assert!(include.matches("Cargo.toml"));
        assert!(!include.matches("README.md"));
    }

    #[test]
    fn test_brace_expansion() {
        let include = Predicate::include(&["*.{js,ts}"]).unwrap();
        assert!(include.matches("app.js"));
        assert!(include.matches("lib/app.ts"));
        assert!(!include.matches("app.css"));
        assert_eq!(expand_braces("a/{b,c}/{d,e}").len(), 4);
        assert_eq!(expand_braces("no-braces"), vec!["no-braces".to_string()]);
    }

    #[test]
    fn test_invalid_glob_is_config_error() {
        let err = Predicate::include(&["src/[z-a"]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
        assert!(ChangeFilter::new(&["*.rs"], &["[unclosed"]).is_err());
    }

    #[test]
    fn test_batch_qualifies_with_include() {
        let filter = ChangeFilter::new(&["*.go"], &[]).unwrap();
        assert!(filter.qualifies(&batch()));
    }

    #[test]
    fn test_batch_rejected_when_match_is_excluded() {
        let filter = ChangeFilter::new(&["*.go"], &["a/*"]).unwrap();
        assert!(!filter.qualifies(&batch()));
    }

    #[test]
    fn test_first_match_skips_rejected_events() {
        let filter = ChangeFilter::new(&[], &["*.go"]).unwrap();
        let events = batch();
        let first = filter.first_match(&events).unwrap();
        assert_eq!(first.path, "c/ignored.txt");
    }

    #[test]
    fn test_empty_batch_never_qualifies() {
        assert!(!ChangeFilter::allow_all().qualifies(&[]));
    }
}
