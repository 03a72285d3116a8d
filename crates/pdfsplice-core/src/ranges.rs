//! Page-range specification parsing
//!
//! Turns a comma-separated expression like `"1,3-5"` into validated groups
//! of zero-based page indices. Validation is all-or-nothing: the first
//! invalid token rejects the whole expression.

use serde::{Deserialize, Serialize};

use crate::error::SpliceError;

/// One group of pages selected by a single token: a single page or an
/// inclusive span. Indices are zero-based and ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    /// Zero-based page indices covered by this group, ascending.
    pub fn pages(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }

    pub fn contains(&self, index: u32) -> bool {
        (self.start..=self.end).contains(&index)
    }

    /// Number of pages in the group.
    pub fn page_count(&self) -> u32 {
        self.end - self.start + 1
    }

    /// 1-based start/end label used in artifact names, e.g. `"3-5"`.
    pub fn label(&self) -> String {
        format!("{}-{}", self.start + 1, self.end + 1)
    }
}

/// Parse a page-range expression against a document's page count.
///
/// Each comma-delimited token is either a single page number or an
/// inclusive `start-end` span, both 1-based in the expression and converted
/// to zero-based indices here. Groups come back in token order, neither
/// sorted nor deduplicated. An empty expression, a malformed token, an
/// out-of-bounds page, or a backwards span invalidates the entire
/// expression.
pub fn parse_ranges(expression: &str, page_count: u32) -> Result<Vec<PageRange>, SpliceError> {
    if expression.trim().is_empty() {
        return Err(SpliceError::InvalidRange(
            "Empty page range expression".into(),
        ));
    }

    let mut groups = Vec::new();

    for token in expression.split(',') {
        let token = token.trim();

        let group = if let Some((start, end)) = token.split_once('-') {
            let start = parse_page(start, page_count)?;
            let end = parse_page(end, page_count)?;
            if start > end {
                return Err(SpliceError::InvalidRange(format!(
                    "Start {} > end {}",
                    start + 1,
                    end + 1
                )));
            }
            PageRange { start, end }
        } else {
            let page = parse_page(token, page_count)?;
            PageRange {
                start: page,
                end: page,
            }
        };

        groups.push(group);
    }

    Ok(groups)
}

/// Parse one 1-based page number into a zero-based in-bounds index.
fn parse_page(token: &str, page_count: u32) -> Result<u32, SpliceError> {
    let number: i64 = token
        .trim()
        .parse()
        .map_err(|_| SpliceError::InvalidRange(format!("Invalid page number: {:?}", token.trim())))?;

    if number < 1 || number > i64::from(page_count) {
        return Err(SpliceError::InvalidRange(format!(
            "Page {} out of bounds (document has {} pages)",
            number, page_count
        )));
    }

    Ok((number - 1) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn range(start: u32, end: u32) -> PageRange {
        PageRange { start, end }
    }

    #[test]
    fn test_parse_single_page() {
        let result = parse_ranges("3", 5).unwrap();
        assert_eq!(result, vec![range(2, 2)]);
    }

    #[test]
    fn test_parse_span() {
        let result = parse_ranges("2-4", 5).unwrap();
        assert_eq!(result, vec![range(1, 3)]);
    }

    #[test]
    fn test_parse_preserves_token_order() {
        let result = parse_ranges("3,1-2", 5).unwrap();
        assert_eq!(result, vec![range(2, 2), range(0, 1)]);
    }

    #[test]
    fn test_parse_keeps_duplicates() {
        let result = parse_ranges("2,2", 5).unwrap();
        assert_eq!(result, vec![range(1, 1), range(1, 1)]);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let result = parse_ranges(" 1 , 3 - 4 ", 5).unwrap();
        assert_eq!(result, vec![range(0, 0), range(2, 3)]);
    }

    #[test]
    fn test_parse_rejects_out_of_bounds_span() {
        assert!(parse_ranges("1-10", 5).is_err());
    }

    #[test]
    fn test_parse_rejects_out_of_bounds_single() {
        assert!(parse_ranges("6", 5).is_err());
    }

    #[test]
    fn test_parse_rejects_page_zero() {
        assert!(parse_ranges("0", 5).is_err());
        assert!(parse_ranges("0-3", 5).is_err());
    }

    #[test]
    fn test_parse_rejects_backwards_span() {
        assert!(parse_ranges("2-1", 5).is_err());
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(parse_ranges("abc", 5).is_err());
        assert!(parse_ranges("1,abc", 5).is_err());
    }

    #[test]
    fn test_parse_rejects_empty_expression() {
        assert!(parse_ranges("", 5).is_err());
        assert!(parse_ranges("   ", 5).is_err());
    }

    #[test]
    fn test_parse_rejects_empty_token() {
        assert!(parse_ranges("1,,2", 5).is_err());
        assert!(parse_ranges("1,", 5).is_err());
    }

    #[test]
    fn test_parse_is_all_or_nothing() {
        // A valid prefix must not leak through when a later token is bad
        assert!(parse_ranges("1,2,99", 5).is_err());
    }

    #[test]
    fn test_label_is_one_based() {
        assert_eq!(range(2, 2).label(), "3-3");
        assert_eq!(range(0, 4).label(), "1-5");
    }

    #[test]
    fn test_page_iteration_ascending() {
        let pages: Vec<u32> = range(1, 3).pages().collect();
        assert_eq!(pages, vec![1, 2, 3]);
    }

    proptest! {
        /// Property: every parsed group is ascending and in bounds
        #[test]
        fn parsed_groups_ascending_in_bounds(
            spans in prop::collection::vec((1u32..=20, 1u32..=20), 1..6),
        ) {
            let page_count = 20;
            let expression = spans
                .iter()
                .map(|&(a, b)| {
                    let (start, end) = if a <= b { (a, b) } else { (b, a) };
                    format!("{}-{}", start, end)
                })
                .collect::<Vec<_>>()
                .join(",");

            let groups = parse_ranges(&expression, page_count).unwrap();
            prop_assert_eq!(groups.len(), spans.len());
            for group in groups {
                prop_assert!(group.start <= group.end);
                prop_assert!(group.end < page_count);
            }
        }

        /// Property: non-numeric tokens always reject the whole expression
        #[test]
        fn garbage_tokens_rejected(token in "[a-zA-Z!@#$%^&*]{1,8}") {
            prop_assert!(parse_ranges(&token, 20).is_err());
            let prefixed = format!("1,{}", token);
            prop_assert!(parse_ranges(&prefixed, 20).is_err());
        }
    }
}
