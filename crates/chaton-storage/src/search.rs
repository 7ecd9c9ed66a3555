//! Full-text search over product descriptions using SQLite FTS5.
//!
//! Queries run against the `product_catalog_fts` virtual table and return
//! catalog rows ranked by BM25, ties broken by storage order.

use std::sync::Arc;

use chaton_core::error::ChatonError;
use chaton_core::types::Product;

use crate::db::Database;

/// A catalog row matched by a description search.
#[derive(Debug, Clone)]
pub struct DescriptionMatch {
    pub product: Product,
    /// BM25 relevance, higher is better.
    pub rank: f64,
}

/// Turn arbitrary user text into a safe FTS5 query.
///
/// Every alphanumeric run becomes a quoted term and the terms are OR-joined,
/// so punctuation and FTS5 operators typed by a customer are never
/// interpreted. Returns `None` when nothing searchable remains.
pub fn sanitize_fts5_query(text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{}\"", t.to_lowercase()))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}

/// Description search engine backed by FTS5.
pub struct ProductSearch {
    db: Arc<Database>,
}

impl ProductSearch {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Products whose description matches any term of `query`.
    pub fn search_descriptions(
        &self,
        query: &str,
        limit: u64,
    ) -> Result<Vec<DescriptionMatch>, ChatonError> {
        let Some(fts_query) = sanitize_fts5_query(query) else {
            return Ok(Vec::new());
        };

        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT pc.id, pc.user_id, pc.name, pc.brand, pc.size, pc.price,
                            pc.description, product_catalog_fts.rank
                     FROM product_catalog_fts
                     JOIN product_catalog pc ON pc.id = product_catalog_fts.rowid
                     WHERE product_catalog_fts MATCH ?1
                     ORDER BY product_catalog_fts.rank, pc.id
                     LIMIT ?2",
                )
                .map_err(|e| ChatonError::Storage(format!("FTS5 query prepare failed: {}", e)))?;

            let rows = stmt
                .query_map(rusqlite::params![fts_query, limit], |row| {
                    let rank: f64 = row.get(7)?;
                    Ok(DescriptionMatch {
                        product: Product {
                            id: row.get(0)?,
                            owner_id: row.get(1)?,
                            name: row.get(2)?,
                            brand: row.get(3)?,
                            size: row.get(4)?,
                            price: row.get(5)?,
                            description: row.get(6)?,
                        },
                        // FTS5 rank is negative (lower = better)
                        rank: -rank,
                    })
                })
                .map_err(|e| ChatonError::Storage(format!("FTS5 query failed: {}", e)))?;

            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|e| ChatonError::Storage(e.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{ProductRepository, UserRepository};
    use chaton_core::types::{NewUser, ProductInput};

    fn seeded() -> (ProductSearch, ProductRepository, i64) {
        let db = Arc::new(Database::in_memory().unwrap());
        let owner = UserRepository::new(Arc::clone(&db))
            .create(&NewUser {
                username: "shop".to_string(),
                password_hash: "x".to_string(),
                ..Default::default()
            })
            .unwrap();
        (
            ProductSearch::new(Arc::clone(&db)),
            ProductRepository::new(db),
            owner,
        )
    }

    fn add(repo: &ProductRepository, owner: i64, name: &str, description: &str) -> i64 {
        repo.insert(
            owner,
            &ProductInput {
                name: name.to_string(),
                description: description.to_string(),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_sanitize_quotes_and_joins_terms() {
        assert_eq!(
            sanitize_fts5_query("Red mug, please!").as_deref(),
            Some("\"red\" OR \"mug\" OR \"please\"")
        );
        assert_eq!(
            sanitize_fts5_query("NOT \"x\" AND (y*)").as_deref(),
            Some("\"not\" OR \"x\" OR \"and\" OR \"y\"")
        );
        assert!(sanitize_fts5_query("  ?!  ").is_none());
    }

    #[test]
    fn test_search_finds_description_terms() {
        let (search, repo, owner) = seeded();
        let mug = add(&repo, owner, "Mug", "stoneware coffee mug");
        add(&repo, owner, "Lamp", "brass desk lamp");

        let hits = search.search_descriptions("coffee", 5).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].product.id, mug);
        assert_eq!(hits[0].product.name, "Mug");
    }

    #[test]
    fn test_search_tolerates_operator_text() {
        let (search, repo, owner) = seeded();
        add(&repo, owner, "Mug", "coffee mug");
        let hits = search.search_descriptions("coffee\" OR (", 5).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_search_empty_query() {
        let (search, repo, owner) = seeded();
        add(&repo, owner, "Mug", "coffee mug");
        assert!(search.search_descriptions("   ", 5).unwrap().is_empty());
    }

    #[test]
    fn test_search_respects_limit() {
        let (search, repo, owner) = seeded();
        for i in 0..8 {
            add(&repo, owner, &format!("Cup {}", i), "ceramic cup");
        }
        assert_eq!(search.search_descriptions("ceramic", 5).unwrap().len(), 5);
    }

    #[test]
    fn test_search_ties_in_storage_order() {
        let (search, repo, owner) = seeded();
        let first = add(&repo, owner, "Cup A", "ceramic cup");
        let second = add(&repo, owner, "Cup B", "ceramic cup");
        let hits = search.search_descriptions("ceramic cup", 5).unwrap();
        let ids: Vec<i64> = hits.iter().map(|h| h.product.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn test_search_more_terms_rank_higher() {
        let (search, repo, owner) = seeded();
        add(&repo, owner, "Lamp", "brass lamp with linen shade");
        let both = add(&repo, owner, "Desk Lamp", "brass desk lamp");
        let hits = search.search_descriptions("brass desk", 5).unwrap();
        assert_eq!(hits[0].product.id, both);
        assert!(hits[0].rank >= hits[1].rank);
    }

    #[test]
    fn test_search_follows_updates_and_deletes() {
        let (search, repo, owner) = seeded();
        let id = add(&repo, owner, "Mug", "coffee mug");
        repo.update(
            id,
            owner,
            &ProductInput {
                name: "Mug".to_string(),
                description: "tea cup".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(search.search_descriptions("coffee", 5).unwrap().is_empty());
        assert_eq!(search.search_descriptions("tea", 5).unwrap().len(), 1);

        repo.delete(id, owner).unwrap();
        assert!(search.search_descriptions("tea", 5).unwrap().is_empty());
    }
}
