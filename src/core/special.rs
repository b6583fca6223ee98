//! Special-token scanning.
//!
//! Special tokens are literal strings with reserved ids outside the rank
//! range. They are intercepted before pre-tokenization so BPE never splits
//! them, but only when the caller has allow-listed them: a special literal
//! that is not allowed must tokenize as ordinary text.

use aho_corasick::{AhoCorasick, BuildError, MatchKind};

/// A confirmed special-token occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialMatch<'a> {
    /// Byte offset of the literal in the scanned text.
    pub start: usize,
    /// Byte offset one past the literal.
    pub end: usize,
    /// The matched literal.
    pub literal: &'a str,
}

/// Multi-pattern scanner over the fixed special-token literals.
pub struct SpecialScanner {
    matcher: Option<AhoCorasick>,
    literals: Vec<String>,
}

impl SpecialScanner {
    /// Build a scanner for the given literals. An empty set is valid and
    /// never matches.
    pub fn new(literals: Vec<String>) -> Result<Self, BuildError> {
        let matcher = if literals.is_empty() {
            None
        } else {
            Some(
                AhoCorasick::builder()
                    .match_kind(MatchKind::LeftmostLongest)
                    .build(&literals)?,
            )
        };
        Ok(Self { matcher, literals })
    }

    /// Find the next allowed special token at or after `start`.
    ///
    /// Returns the match (if any) and the end of the literal span preceding
    /// it: the match start, or `text.len()` when no allowed literal remains.
    ///
    /// A disallowed occurrence does not end the literal span; scanning
    /// resumes one byte past its start, so an allowed literal overlapping a
    /// disallowed prefix is still found.
    pub fn find_next<'s>(
        &'s self,
        text: &str,
        allowed: &[&str],
        start: usize,
    ) -> (Option<SpecialMatch<'s>>, usize) {
        let Some(matcher) = &self.matcher else {
            return (None, text.len());
        };

        let bytes = text.as_bytes();
        let mut from = start;
        while from <= bytes.len() {
            let Some(m) = matcher.find(&bytes[from..]) else {
                break;
            };
            let literal = &self.literals[m.pattern().as_usize()];
            let m_start = from + m.start();
            if allowed.contains(&literal.as_str()) {
                return (
                    Some(SpecialMatch {
                        start: m_start,
                        end: from + m.end(),
                        literal,
                    }),
                    m_start,
                );
            }
            // Literals are ASCII-delimited, so one past a match start is a
            // valid scan position.
            from = m_start + 1;
        }

        (None, text.len())
    }
}
