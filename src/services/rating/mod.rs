use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RatingError {
    #[error("rating file is not valid utf-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("malformed rating line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, RatingError>;

/// Parse the line-oriented sparse set format used for both the precomputed
/// user stacks and the item-to-user mapping.
///
/// Each line is whitespace-separated tokens `count id_1 .. id_count`; a
/// leading `count` of zero denotes an empty set for that row. Row order is
/// significant: row `i` aligns with row `i` of the corresponding factor
/// matrix.
pub fn parse_rating_file(contents: &[u8]) -> Result<Vec<HashSet<usize>>> {
    let text = std::str::from_utf8(contents)?;
    let mut rows = Vec::new();

    for (line_no, line) in text.trim().lines().enumerate() {
        let mut tokens = line.split_whitespace();
        let count: usize = tokens
            .next()
            .ok_or_else(|| RatingError::MalformedLine {
                line: line_no,
                reason: "empty line".to_string(),
            })?
            .parse()
            .map_err(|e| RatingError::MalformedLine {
                line: line_no,
                reason: format!("bad count: {}", e),
            })?;

        let ids: Vec<usize> = tokens
            .map(|tok| {
                tok.parse().map_err(|e| RatingError::MalformedLine {
                    line: line_no,
                    reason: format!("bad item id {:?}: {}", tok, e),
                })
            })
            .collect::<Result<_>>()?;

        if ids.len() != count {
            return Err(RatingError::MalformedLine {
                line: line_no,
                reason: format!("declared {} items, found {}", count, ids.len()),
            });
        }

        rows.push(ids.into_iter().collect());
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_rows() {
        let rows = parse_rating_file(b"3 1 2 3\n2 10 20\n").unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], HashSet::from([1, 2, 3]));
        assert_eq!(rows[1], HashSet::from([10, 20]));
    }

    #[test]
    fn test_zero_count_is_empty_set() {
        let rows = parse_rating_file(b"0\n1 5\n0\n").unwrap();

        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_empty());
        assert_eq!(rows[1], HashSet::from([5]));
        assert!(rows[2].is_empty());
    }

    #[test]
    fn test_trailing_newline_ignored() {
        let rows = parse_rating_file(b"1 42\n\n").unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_count_mismatch_rejected() {
        let result = parse_rating_file(b"3 1 2\n");
        assert!(matches!(
            result,
            Err(RatingError::MalformedLine { line: 0, .. })
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let result = parse_rating_file(b"1 abc\n");
        assert!(matches!(result, Err(RatingError::MalformedLine { .. })));
    }
}
