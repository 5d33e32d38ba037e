//! Page range selection
//!
//! Parses expressions like `"1,3-5,8"` into a sorted, deduplicated set of
//! 1-based page numbers.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\s*(?:-\s*(\d+)\s*)?$").unwrap());

/// A malformed or out-of-bounds page range token
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("malformed page range token {0:?}")]
    Malformed(String),
    #[error("page range {start}-{end} ends before it starts")]
    Reversed { start: u32, end: u32 },
    #[error("page {page} is outside 1-{total}")]
    OutOfBounds { page: u32, total: u32 },
}

/// Ordered, deduplicated 1-based page numbers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageRangeSet {
    pages: Vec<u32>,
}

impl PageRangeSet {
    /// Parse a range expression against a document of `total_pages` pages.
    ///
    /// `None`, an empty or whitespace-only expression selects every page.
    /// Any bad token rejects the whole expression.
    pub fn parse(expr: Option<&str>, total_pages: u32) -> Result<Self, RangeError> {
        let expr = expr.map(str::trim).unwrap_or("");
        if expr.is_empty() {
            return Ok(Self::all(total_pages));
        }

        let mut pages = BTreeSet::new();
        for token in expr.split(',') {
            let caps = TOKEN_RE
                .captures(token)
                .ok_or_else(|| RangeError::Malformed(token.trim().to_string()))?;
            let start = parse_page(&caps[1], token)?;
            let end = match caps.get(2) {
                Some(m) => parse_page(m.as_str(), token)?,
                None => start,
            };
            if end < start {
                return Err(RangeError::Reversed { start, end });
            }
            for page in [start, end] {
                if page < 1 || page > total_pages {
                    return Err(RangeError::OutOfBounds {
                        page,
                        total: total_pages,
                    });
                }
            }
            pages.extend(start..=end);
        }

        Ok(Self {
            pages: pages.into_iter().collect(),
        })
    }

    /// Every page of a `total_pages` document
    pub fn all(total_pages: u32) -> Self {
        Self {
            pages: (1..=total_pages).collect(),
        }
    }

    pub fn pages(&self) -> &[u32] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.iter().copied()
    }
}

fn parse_page(digits: &str, token: &str) -> Result<u32, RangeError> {
    digits
        .parse()
        .map_err(|_| RangeError::Malformed(token.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_expression() {
        let set = PageRangeSet::parse(Some("1,3-5,8"), 10).unwrap();
        assert_eq!(set.pages(), &[1, 3, 4, 5, 8]);
    }

    #[test]
    fn test_empty_selects_all() {
        assert_eq!(PageRangeSet::parse(None, 5).unwrap().pages(), &[1, 2, 3, 4, 5]);
        assert_eq!(PageRangeSet::parse(Some(""), 5).unwrap().pages(), &[1, 2, 3, 4, 5]);
        assert_eq!(PageRangeSet::parse(Some("   "), 3).unwrap().pages(), &[1, 2, 3]);
    }

    #[test]
    fn test_out_of_bounds() {
        assert_eq!(
            PageRangeSet::parse(Some("6"), 5),
            Err(RangeError::OutOfBounds { page: 6, total: 5 })
        );
        assert_eq!(
            PageRangeSet::parse(Some("0"), 5),
            Err(RangeError::OutOfBounds { page: 0, total: 5 })
        );
        assert!(PageRangeSet::parse(Some("4-7"), 5).is_err());
    }

    #[test]
    fn test_sorted_and_deduplicated() {
        let set = PageRangeSet::parse(Some("5, 2-4,3 ,1-2"), 5).unwrap();
        assert_eq!(set.pages(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_malformed_tokens() {
        for expr in ["a", "1,,2", "1-", "-3", "1-2-3", "2.5", "1;2"] {
            assert!(
                matches!(PageRangeSet::parse(Some(expr), 10), Err(RangeError::Malformed(_))),
                "expected {expr:?} to be malformed"
            );
        }
    }

    #[test]
    fn test_reversed_range() {
        assert_eq!(
            PageRangeSet::parse(Some("5-3"), 10),
            Err(RangeError::Reversed { start: 5, end: 3 })
        );
    }

    #[test]
    fn test_huge_number_is_malformed() {
        assert!(matches!(
            PageRangeSet::parse(Some("99999999999"), 10),
            Err(RangeError::Malformed(_))
        ));
    }

    #[test]
    fn test_single_page_range() {
        assert_eq!(PageRangeSet::parse(Some("2-2"), 3).unwrap().pages(), &[2]);
    }
}
