//! Repository implementations for SQLite-backed persistence.
//!
//! Provides UserRepository, ProductRepository and FeedbackRepository that
//! operate on the Database struct using raw SQL.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use chaton_core::error::ChatonError;
use chaton_core::types::{
    FeedbackEntry, NewFeedback, NewUser, Product, ProductInput, Role, Sentiment, ShopContact, User,
};

use crate::db::Database;

/// Row shown in the admin user listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

/// Feedback row as displayed on a shop dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardFeedback {
    pub product_name: String,
    pub feedback_text: String,
    pub created_at: DateTime<Utc>,
}

fn storage_err(e: rusqlite::Error) -> ChatonError {
    ChatonError::Storage(e.to_string())
}

/// Repository for storefront users.
pub struct UserRepository {
    db: Arc<Database>,
}

impl UserRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new user and return its id.
    ///
    /// A taken username yields [`ChatonError::Conflict`].
    pub fn create(&self, user: &NewUser) -> Result<i64, ChatonError> {
        self.db.with_conn(|conn| {
            let result = conn.execute(
                "INSERT INTO users (username, password_hash, role, shop_name, shop_address,
                                    contact_email, phone_number, shop_description)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    user.username,
                    user.password_hash,
                    user.role.to_string(),
                    user.shop_name,
                    user.shop_address,
                    user.contact_email,
                    user.phone_number,
                    user.shop_description,
                ],
            );
            match result {
                Ok(_) => Ok(conn.last_insert_rowid()),
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Err(ChatonError::Conflict(format!(
                        "Username '{}' already exists",
                        user.username
                    )))
                }
                Err(e) => Err(ChatonError::Storage(format!("Failed to create user: {}", e))),
            }
        })
    }

    pub fn find_by_username(&self, username: &str) -> Result<Option<User>, ChatonError> {
        self.find_where("username = ?1", params![username])
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<User>, ChatonError> {
        self.find_where("id = ?1", params![id])
    }

    fn find_where(
        &self,
        clause: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Option<User>, ChatonError> {
        let sql = format!(
            "SELECT id, username, password_hash, role, shop_name, shop_address,
                    contact_email, phone_number, shop_description, created_at
             FROM users WHERE {}",
            clause
        );
        self.db.with_conn(|conn| {
            let found = conn
                .query_row(&sql, params, |row| Ok(row_to_user(row)))
                .optional()
                .map_err(storage_err)?;
            found.transpose()
        })
    }

    /// Address and contact details of a product owner.
    pub fn contact_for(&self, owner_id: i64) -> Result<Option<ShopContact>, ChatonError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT shop_address, contact_email, phone_number FROM users WHERE id = ?1",
                params![owner_id],
                |row| {
                    Ok(ShopContact {
                        shop_address: non_empty(row.get(0)?),
                        contact_email: non_empty(row.get(1)?),
                        phone_number: non_empty(row.get(2)?),
                    })
                },
            )
            .optional()
            .map_err(storage_err)
        })
    }

    /// All users, oldest first.
    pub fn list_summaries(&self) -> Result<Vec<UserSummary>, ChatonError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, username, role FROM users ORDER BY id")
                .map_err(storage_err)?;
            let rows = stmt
                .query_map([], |row| {
                    let role: String = row.get(2)?;
                    Ok(UserSummary {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        role: role.parse().unwrap_or_default(),
                    })
                })
                .map_err(storage_err)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(storage_err)
        })
    }

    /// Change a user's role. Returns false when the username is unknown.
    pub fn set_role(&self, username: &str, role: Role) -> Result<bool, ChatonError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE users SET role = ?1 WHERE username = ?2",
                    params![role.to_string(), username],
                )
                .map_err(storage_err)?;
            Ok(changed > 0)
        })
    }

    pub fn count(&self) -> Result<u64, ChatonError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
                .map_err(storage_err)?;
            Ok(count as u64)
        })
    }
}

/// Repository for the per-shop product catalog.
pub struct ProductRepository {
    db: Arc<Database>,
}

const PRODUCT_COLUMNS: &str = "id, user_id, name, brand, size, price, description";

impl ProductRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Add a product to `owner_id`'s catalog and return its id.
    pub fn insert(&self, owner_id: i64, input: &ProductInput) -> Result<i64, ChatonError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO product_catalog (user_id, name, brand, size, price, description)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    owner_id,
                    input.name,
                    input.brand,
                    input.size,
                    input.price,
                    input.description,
                ],
            )
            .map_err(|e| ChatonError::Storage(format!("Failed to save product: {}", e)))?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Update a product owned by `owner_id`. Returns false if no such row.
    pub fn update(
        &self,
        id: i64,
        owner_id: i64,
        input: &ProductInput,
    ) -> Result<bool, ChatonError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE product_catalog
                     SET name = ?1, brand = ?2, size = ?3, price = ?4, description = ?5
                     WHERE id = ?6 AND user_id = ?7",
                    params![
                        input.name,
                        input.brand,
                        input.size,
                        input.price,
                        input.description,
                        id,
                        owner_id,
                    ],
                )
                .map_err(|e| ChatonError::Storage(format!("Failed to update product: {}", e)))?;
            Ok(changed > 0)
        })
    }

    /// Delete a product owned by `owner_id`. Returns false if no such row.
    pub fn delete(&self, id: i64, owner_id: i64) -> Result<bool, ChatonError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "DELETE FROM product_catalog WHERE id = ?1 AND user_id = ?2",
                    params![id, owner_id],
                )
                .map_err(|e| ChatonError::Storage(format!("Failed to delete product: {}", e)))?;
            Ok(changed > 0)
        })
    }

    /// A single product, only if `owner_id` owns it.
    pub fn find_owned(&self, id: i64, owner_id: i64) -> Result<Option<Product>, ChatonError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {} FROM product_catalog WHERE id = ?1 AND user_id = ?2",
                    PRODUCT_COLUMNS
                ),
                params![id, owner_id],
                row_to_product,
            )
            .optional()
            .map_err(storage_err)
        })
    }

    pub fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Product>, ChatonError> {
        self.query_products(
            &format!(
                "SELECT {} FROM product_catalog WHERE user_id = ?1 ORDER BY id",
                PRODUCT_COLUMNS
            ),
            params![owner_id],
        )
    }

    /// The whole catalog in primary-key order, the scan order resolution relies on.
    pub fn list_all(&self) -> Result<Vec<Product>, ChatonError> {
        self.query_products(
            &format!("SELECT {} FROM product_catalog ORDER BY id", PRODUCT_COLUMNS),
            params![],
        )
    }

    fn query_products(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<Product>, ChatonError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(sql).map_err(storage_err)?;
            let rows = stmt.query_map(params, row_to_product).map_err(storage_err)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(storage_err)
        })
    }

    pub fn count(&self) -> Result<u64, ChatonError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM product_catalog", [], |row| row.get(0))
                .map_err(storage_err)?;
            Ok(count as u64)
        })
    }
}

/// Repository for customer feedback.
pub struct FeedbackRepository {
    db: Arc<Database>,
}

impl FeedbackRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store one feedback entry inside a committed transaction.
    pub fn insert(&self, feedback: &NewFeedback) -> Result<i64, ChatonError> {
        self.db.with_conn(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| ChatonError::Storage(format!("Failed to begin transaction: {}", e)))?;
            tx.execute(
                "INSERT INTO feedback (product_id, product_name, feedback_text, sentiment)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    feedback.product_id,
                    feedback.product_name,
                    feedback.text,
                    feedback.sentiment.to_string(),
                ],
            )
            .map_err(|e| ChatonError::Storage(format!("Failed to save feedback: {}", e)))?;
            let id = tx.last_insert_rowid();
            tx.commit()
                .map_err(|e| ChatonError::Storage(format!("Failed to commit feedback: {}", e)))?;
            Ok(id)
        })
    }

    /// Every feedback row for a product name, oldest first.
    pub fn list_for_product(&self, product_name: &str) -> Result<Vec<FeedbackEntry>, ChatonError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, product_id, product_name, feedback_text, sentiment, created_at
                     FROM feedback
                     WHERE product_name = ?1 COLLATE NOCASE
                     ORDER BY id",
                )
                .map_err(storage_err)?;
            let rows = stmt
                .query_map(params![product_name], |row| Ok(row_to_feedback(row)))
                .map_err(storage_err)?;

            let mut entries = Vec::new();
            for row in rows {
                entries.push(row.map_err(storage_err)??);
            }
            Ok(entries)
        })
    }

    /// Most recent feedback for a shop's products, plus feedback that never
    /// resolved to a catalog row.
    pub fn recent_for_owner(
        &self,
        owner_id: i64,
        limit: u64,
    ) -> Result<Vec<DashboardFeedback>, ChatonError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT COALESCE(pc.name, f.product_name), f.feedback_text, f.created_at
                     FROM feedback f
                     LEFT JOIN product_catalog pc ON f.product_id = pc.id
                     WHERE pc.user_id = ?1 OR f.product_id IS NULL
                     ORDER BY f.created_at DESC, f.id DESC
                     LIMIT ?2",
                )
                .map_err(storage_err)?;
            let rows = stmt
                .query_map(params![owner_id, limit], |row| {
                    let created_at: i64 = row.get(2)?;
                    Ok(DashboardFeedback {
                        product_name: row.get(0)?,
                        feedback_text: row.get(1)?,
                        created_at: from_epoch(created_at),
                    })
                })
                .map_err(storage_err)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(storage_err)
        })
    }
}

// ============================================================================
// Helper functions for row-to-entity conversion.
// ============================================================================

fn from_epoch(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> Result<User, ChatonError> {
    let role: String = row.get(3).map_err(storage_err)?;
    let created_at: i64 = row.get(9).map_err(storage_err)?;
    Ok(User {
        id: row.get(0).map_err(storage_err)?,
        username: row.get(1).map_err(storage_err)?,
        password_hash: row.get(2).map_err(storage_err)?,
        role: role.parse().map_err(ChatonError::Storage)?,
        shop_name: row.get(4).map_err(storage_err)?,
        shop_address: row.get(5).map_err(storage_err)?,
        contact_email: row.get(6).map_err(storage_err)?,
        phone_number: row.get(7).map_err(storage_err)?,
        shop_description: row.get(8).map_err(storage_err)?,
        created_at: from_epoch(created_at),
    })
}

fn row_to_product(row: &rusqlite::Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        brand: row.get(3)?,
        size: row.get(4)?,
        price: row.get(5)?,
        description: row.get(6)?,
    })
}

fn row_to_feedback(row: &rusqlite::Row<'_>) -> Result<FeedbackEntry, ChatonError> {
    let sentiment: String = row.get(4).map_err(storage_err)?;
    let created_at: i64 = row.get(5).map_err(storage_err)?;
    Ok(FeedbackEntry {
        id: row.get(0).map_err(storage_err)?,
        product_id: row.get(1).map_err(storage_err)?,
        product_name: row.get(2).map_err(storage_err)?,
        text: row.get(3).map_err(storage_err)?,
        sentiment: sentiment.parse::<Sentiment>().map_err(ChatonError::Storage)?,
        created_at: from_epoch(created_at),
    })
}
