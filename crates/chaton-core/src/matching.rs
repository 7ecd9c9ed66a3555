//! Fuzzy product-name resolution.
//!
//! Names are compared with a matching-block similarity ratio (Ratcliff/Obershelp):
//! the longest common contiguous block is found, the same search recurses on
//! the unmatched text either side of it, and the ratio is `2 * M / T` where
//! `M` is the total matched length and `T` the combined length of both strings.
//!
//! As with the classic sequence matcher, when the second string has 200 or
//! more characters, characters making up more than 1% of it are "popular":
//! they cannot seed a block, only extend one found around them.
//!
//! Resolution returns catalog entries in their stored order. Callers that need
//! a single product take the first entry, so ties are decided by scan order,
//! not by similarity rank.

use std::collections::HashMap;

use crate::types::Product;

/// Ratio a stored name must strictly exceed to count as a match.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.5;

/// Anything that can be resolved by name against a free-text candidate.
pub trait CatalogName {
    fn owner_id(&self) -> i64;
    fn catalog_name(&self) -> &str;
}

impl CatalogName for (i64, String) {
    fn owner_id(&self) -> i64 {
        self.0
    }

    fn catalog_name(&self) -> &str {
        &self.1
    }
}

impl CatalogName for Product {
    fn owner_id(&self) -> i64 {
        self.owner_id
    }

    fn catalog_name(&self) -> &str {
        &self.name
    }
}

/// Case-insensitive similarity of two strings in `0.0..=1.0`.
///
/// Two empty strings are identical (`1.0`).
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matched = matched_len(&a, &b);
    2.0 * matched as f64 / total as f64
}

/// Length of `b` from which popular characters are dropped from the index.
const AUTOJUNK_MIN_LEN: usize = 200;

/// Sum of all matching block lengths between `a` and `b`.
fn matched_len(a: &[char], b: &[char]) -> usize {
    let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, c) in b.iter().enumerate() {
        b2j.entry(*c).or_default().push(j);
    }
    if b.len() >= AUTOJUNK_MIN_LEN {
        let popular = b.len() / 100 + 1;
        b2j.retain(|_, positions| positions.len() <= popular);
    }

    let mut total = 0;
    let mut queue = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, b, &b2j, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        total += k;
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            queue.push((i + k, ahi, j + k, bhi));
        }
    }
    total
}

/// Longest block `a[i..i+k] == b[j..j+k]` inside the given window.
///
/// Among equally long blocks the one starting earliest in `a` wins, then the
/// one starting earliest in `b`. A block is then widened over equal
/// characters the index left out.
fn longest_match(
    a: &[char],
    b: &[char],
    b2j: &HashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
    // j2len[j] = length of the match ending at a[i-1], b[j]
    let mut j2len: HashMap<usize, usize> = HashMap::new();

    for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next: HashMap<usize, usize> = HashMap::new();
        if let Some(positions) = b2j.get(c) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let k = if j > 0 {
                    j2len.get(&(j - 1)).copied().unwrap_or(0) + 1
                } else {
                    1
                };
                next.insert(j, k);
                if k > best_k {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_k = k;
                }
            }
        }
        j2len = next;
    }

    while best_i > alo && best_j > blo && a[best_i - 1] == b[best_j - 1] {
        best_i -= 1;
        best_j -= 1;
        best_k += 1;
    }
    while best_i + best_k < ahi && best_j + best_k < bhi && a[best_i + best_k] == b[best_j + best_k]
    {
        best_k += 1;
    }

    (best_i, best_j, best_k)
}

/// Threshold-bound resolver used by the action handlers.
#[derive(Debug, Clone, Copy)]
pub struct ProductResolver {
    threshold: f64,
}

impl Default for ProductResolver {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl ProductResolver {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Whether `a` and `b` are similar enough to be the same product.
    pub fn is_similar(&self, a: &str, b: &str) -> bool {
        similarity(a, b) > self.threshold
    }

    /// Every catalog entry whose name matches `candidate`, in catalog order.
    pub fn resolve<'a, T: CatalogName>(&self, candidate: &str, catalog: &'a [T]) -> Vec<&'a T> {
        let candidate = candidate.trim();
        catalog
            .iter()
            .filter(|entry| self.is_similar(candidate, entry.catalog_name()))
            .collect()
    }

    /// First matching entry in catalog order.
    pub fn resolve_first<'a, T: CatalogName>(
        &self,
        candidate: &str,
        catalog: &'a [T],
    ) -> Option<&'a T> {
        let candidate = candidate.trim();
        catalog
            .iter()
            .find(|entry| self.is_similar(candidate, entry.catalog_name()))
    }
}

/// [`ProductResolver::resolve`] with the default threshold.
pub fn resolve<'a, T: CatalogName>(candidate: &str, catalog: &'a [T]) -> Vec<&'a T> {
    ProductResolver::default().resolve(candidate, catalog)
}

/// [`ProductResolver::resolve_first`] with the default threshold.
pub fn resolve_first<'a, T: CatalogName>(candidate: &str, catalog: &'a [T]) -> Option<&'a T> {
    ProductResolver::default().resolve_first(candidate, catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(names: &[(i64, &str)]) -> Vec<(i64, String)> {
        names.iter().map(|(id, n)| (*id, n.to_string())).collect()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_similarity_identical_and_empty() {
        assert_close(similarity("widget", "widget"), 1.0);
        assert_close(similarity("", ""), 1.0);
        assert_close(similarity("abc", ""), 0.0);
        assert_close(similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_similarity_is_case_insensitive() {
        assert_close(similarity("WIDGET", "widget"), 1.0);
        assert_close(similarity("Blue Mug", "blue mug"), 1.0);
    }

    #[test]
    fn test_similarity_matching_blocks() {
        // "bcd" is the only block: 2 * 3 / 8
        assert_close(similarity("abcd", "bcde"), 0.75);
        // "dget" is shared: 2 * 4 / 12
        assert_close(similarity("widget", "gadget"), 2.0 * 4.0 / 12.0);
        // blocks "a" and "c" around a mismatch: 2 * 2 / 6
        assert_close(similarity("abc", "axc"), 2.0 * 2.0 / 6.0);
    }

    #[test]
    fn test_similarity_recurses_both_sides() {
        // longest block "blue ", then "mug" on the right
        assert_close(similarity("blue mug", "blue  mug"), 2.0 * 8.0 / 17.0);
    }

    #[test]
    fn test_similarity_long_names_ignore_popular_chars() {
        // 199 chars: every "a" can still seed a block
        let short_b = format!("x{}", "a".repeat(198));
        assert_close(similarity("aaaa", &short_b), 8.0 / 203.0);

        // 200 chars: "a" is popular and nothing else matches
        let long_b = format!("x{}", "a".repeat(199));
        assert_close(similarity("aaaa", &long_b), 0.0);
    }

    #[test]
    fn test_similarity_popular_chars_extend_blocks() {
        // "b" is popular but still widens the "xaaa" block by one
        let b = format!("xaaa{}", "b".repeat(196));
        assert_close(similarity("xaaab", &b), 10.0 / 205.0);
    }

    #[test]
    fn test_threshold_is_strict() {
        let resolver = ProductResolver::default();
        // exactly 0.5: "ab" vs "ac" shares one char out of four
        assert_close(similarity("ab", "ac"), 0.5);
        assert!(!resolver.is_similar("ab", "ac"));
        assert!(resolver.is_similar("abc", "abd"));
    }

    #[test]
    fn test_resolve_first_prefers_scan_order() {
        let cat = catalog(&[(1, "Widget"), (2, "Gadget")]);
        let first = resolve_first("widget", &cat).unwrap();
        assert_eq!(first, &(1, "Widget".to_string()));
    }

    #[test]
    fn test_resolve_returns_every_match_in_order() {
        let cat = catalog(&[(1, "Widget"), (2, "Gadget"), (3, "Sprocket")]);
        let matches = resolve("widget", &cat);
        // "gadget" scores 0.667 against "widget", above the threshold
        let owners: Vec<i64> = matches.iter().map(|m| m.owner_id()).collect();
        assert_eq!(owners, vec![1, 2]);
    }

    #[test]
    fn test_resolve_first_not_ranked_by_similarity() {
        let cat = catalog(&[(7, "Red Mugs"), (8, "Red Mug")]);
        let first = resolve_first("red mug", &cat).unwrap();
        assert_eq!(first.owner_id(), 7);
    }

    #[test]
    fn test_resolve_no_match() {
        let cat = catalog(&[(1, "Widget"), (2, "Gadget")]);
        assert!(resolve("zzz", &cat).is_empty());
        assert!(resolve_first("zzz", &cat).is_none());
        assert!(resolve::<(i64, String)>("widget", &[]).is_empty());
    }

    #[test]
    fn test_resolve_trims_candidate() {
        let cat = catalog(&[(1, "Widget")]);
        assert_eq!(resolve("  widget \n", &cat).len(), 1);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let cat = catalog(&[(1, "Widget"), (2, "Gadget"), (3, "Wide Gadget")]);
        let first = resolve("gadget", &cat);
        let second = resolve("gadget", &cat);
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolve_over_products() {
        let products = vec![Product {
            id: 10,
            owner_id: 3,
            name: "Ceramic Mug".to_string(),
            brand: "Potter".to_string(),
            size: "350ml".to_string(),
            price: 12.5,
            description: "Glazed stoneware mug".to_string(),
        }];
        let hit = resolve_first("ceramic mugs", &products).unwrap();
        assert_eq!(hit.id, 10);
        assert_eq!(hit.owner_id(), 3);
    }

    #[test]
    fn test_custom_threshold() {
        let strict = ProductResolver::new(0.9);
        let cat = catalog(&[(1, "Widget"), (2, "Gadget")]);
        assert_eq!(strict.resolve("widget", &cat).len(), 1);
        assert_eq!(strict.threshold(), 0.9);
    }
}
