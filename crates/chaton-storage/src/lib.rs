//! ChatOn storage crate - SQLite persistence for shops, catalog and feedback.
//!
//! Provides a WAL-mode SQLite database with migrations, repository
//! implementations for users/products/feedback, and FTS5 search over
//! product descriptions.

pub mod db;
pub mod migrations;
pub mod repository;
pub mod search;

pub use db::Database;
pub use repository::{
    DashboardFeedback, FeedbackRepository, ProductRepository, UserRepository, UserSummary,
};
pub use search::{sanitize_fts5_query, DescriptionMatch, ProductSearch};
