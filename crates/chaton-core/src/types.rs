use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// Account role of a storefront user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Shop owner managing their own catalog.
    #[default]
    User,
    /// Can see every user and product.
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Sentiment label attached to a feedback entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Negative => write!(f, "negative"),
            Sentiment::Neutral => write!(f, "neutral"),
        }
    }
}

impl std::str::FromStr for Sentiment {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            _ => Err(format!("Unknown sentiment: {}", s)),
        }
    }
}

// =============================================================================
// Users
// =============================================================================

/// A registered shop owner (or admin).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// PBKDF2 hash string; never serialized to clients.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub shop_name: String,
    pub shop_address: String,
    pub contact_email: String,
    pub phone_number: String,
    pub shop_description: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn profile(&self) -> ShopProfile {
        ShopProfile {
            shop_name: self.shop_name.clone(),
            shop_address: self.shop_address.clone(),
            contact_email: self.contact_email.clone(),
            phone_number: self.phone_number.clone(),
            shop_description: self.shop_description.clone(),
        }
    }
}

/// Fields required to register a new user.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub shop_name: String,
    pub shop_address: String,
    pub contact_email: String,
    pub phone_number: String,
    pub shop_description: String,
}

/// Public shop details shown on the dashboard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShopProfile {
    pub shop_name: String,
    pub shop_address: String,
    pub contact_email: String,
    pub phone_number: String,
    pub shop_description: String,
}

/// Owner contact details used by the location and contact actions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShopContact {
    pub shop_address: Option<String>,
    pub contact_email: Option<String>,
    pub phone_number: Option<String>,
}

// =============================================================================
// Catalog
// =============================================================================

/// A catalog row owned by one shop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub brand: String,
    pub size: String,
    pub price: f64,
    pub description: String,
}

/// Editable product fields (create and update).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub description: String,
}

// =============================================================================
// Feedback
// =============================================================================

/// A stored customer feedback message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub id: i64,
    /// Catalog row the feedback was resolved to, if any.
    pub product_id: Option<i64>,
    pub product_name: String,
    pub text: String,
    pub sentiment: Sentiment,
    pub created_at: DateTime<Utc>,
}

/// Feedback about to be inserted.
#[derive(Clone, Debug, PartialEq)]
pub struct NewFeedback {
    pub product_id: Option<i64>,
    pub product_name: String,
    pub text: String,
    pub sentiment: Sentiment,
}
