//! Shared dependencies handed to every action handler.

use std::sync::Arc;

use chaton_core::config::{ChatonConfig, SearchConfig};
use chaton_core::matching::ProductResolver;
use chaton_core::sentiment::PolarityScorer;
use chaton_core::types::Product;
use chaton_storage::{Database, FeedbackRepository, ProductRepository, ProductSearch, UserRepository};

use crate::error::ActionError;

/// Repositories plus the matching and scoring policy the handlers apply.
pub struct ActionServices {
    pub users: UserRepository,
    pub products: ProductRepository,
    pub feedback: FeedbackRepository,
    pub search: ProductSearch,
    pub resolver: ProductResolver,
    pub scorer: PolarityScorer,
    pub search_config: SearchConfig,
}

impl ActionServices {
    pub fn new(db: Arc<Database>, config: &ChatonConfig) -> Self {
        Self {
            users: UserRepository::new(Arc::clone(&db)),
            products: ProductRepository::new(Arc::clone(&db)),
            feedback: FeedbackRepository::new(Arc::clone(&db)),
            search: ProductSearch::new(db),
            resolver: ProductResolver::new(config.matching.similarity_threshold),
            scorer: PolarityScorer::from_config(&config.sentiment),
            search_config: config.search.clone(),
        }
    }

    /// Services with default matching, scoring and search settings.
    pub fn with_defaults(db: Arc<Database>) -> Self {
        Self::new(db, &ChatonConfig::default())
    }

    /// The current catalog in scan order.
    pub fn catalog(&self) -> Result<Vec<Product>, ActionError> {
        Ok(self.products.list_all()?)
    }

    /// First catalog product matching `candidate`.
    pub fn find_product(&self, candidate: &str) -> Result<Option<Product>, ActionError> {
        let catalog = self.catalog()?;
        Ok(self.resolver.resolve_first(candidate, &catalog).cloned())
    }

    /// First catalog product whose name equals `name`, ignoring case.
    pub fn find_exact(&self, name: &str) -> Result<Option<Product>, ActionError> {
        let wanted = name.trim().to_lowercase();
        Ok(self
            .catalog()?
            .into_iter()
            .find(|p| p.name.to_lowercase() == wanted))
    }

    /// Every catalog product matching `candidate`, in scan order.
    pub fn find_products(&self, candidate: &str) -> Result<Vec<Product>, ActionError> {
        let catalog = self.catalog()?;
        Ok(self
            .resolver
            .resolve(candidate, &catalog)
            .into_iter()
            .cloned()
            .collect())
    }
}
