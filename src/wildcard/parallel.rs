//! Parallel batch matching
//!
//! Uses Rayon to match one pattern against many tokens, or many cached
//! queries against one token.

use rayon::prelude::*;

use super::{PatternCache, Wildcard};
use crate::error::CompileError;

/// Match every token; results are in input order.
pub fn match_all<T>(pattern: &Wildcard, tokens: &[T]) -> Vec<bool>
where
    T: AsRef<[u8]> + Sync,
{
    tokens
        .par_iter()
        .map(|token| pattern.matches_bytes(token.as_ref()))
        .collect()
}

/// Tokens that match, in input order
pub fn filter_matches<'a, T>(pattern: &Wildcard, tokens: &'a [T]) -> Vec<&'a T>
where
    T: AsRef<[u8]> + Sync,
{
    tokens
        .par_iter()
        .filter(|token| pattern.matches_bytes((**token).as_ref()))
        .collect()
}

/// Match one token against several queries compiled through `cache`
pub fn match_queries(
    cache: &PatternCache,
    queries: &[&str],
    token: &[u8],
) -> Vec<Result<bool, CompileError>> {
    queries
        .par_iter()
        .map(|query| cache.get_or_compile(query).map(|p| p.matches_bytes(token)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_all_keeps_order() {
        let pattern = Wildcard::parse("t.st").unwrap();
        let tokens: Vec<&[u8]> = vec![b"test", b"tost", b"toast", b"tst", b"t.st"];
        assert_eq!(
            match_all(&pattern, &tokens),
            vec![true, true, false, false, true]
        );
    }

    #[test]
    fn test_filter_matches() {
        let pattern = Wildcard::parse("data.*").unwrap();
        let tokens = vec![
            "database".to_string(),
            "date".to_string(),
            "data".to_string(),
            "metadata".to_string(),
        ];
        let hits = filter_matches(&pattern, &tokens);
        assert_eq!(hits, vec![&tokens[0], &tokens[2]]);
    }

    #[test]
    fn test_match_queries() {
        let cache = PatternCache::new(8);
        let results = match_queries(&cache, &["x.z", "x.{2,3}", "x\\"], b"xyz");
        assert_eq!(results[0], Ok(true));
        assert_eq!(results[1], Ok(true));
        assert_eq!(results[2], Err(CompileError::DanglingEscape));
        assert_eq!(cache.len(), 2);
    }
}
