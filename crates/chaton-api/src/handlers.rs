//! Route handler functions for all API endpoints.
//!
//! Each handler extracts path parameters, JSON bodies and the login session
//! via axum extractors, calls into the shared services, and returns JSON.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use chaton_action::{ActionContext, ActionError, BotMessage, Entity, SlotEvent};
use chaton_core::types::{NewUser, Product, ProductInput, Role, ShopProfile};
use chaton_storage::{DashboardFeedback, UserSummary};

use crate::auth::{self, Session};
use crate::error::ApiError;
use crate::state::AppState;

/// Feedback rows shown on a shop dashboard.
pub const DASHBOARD_FEEDBACK_LIMIT: u64 = 20;

// =============================================================================
// Health
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub product_count: u64,
}

/// GET /health - liveness plus the catalog size.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let product_count = state.services.products.count()?;
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        product_count,
    }))
}

// =============================================================================
// Action server
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct LatestMessage {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Tracker {
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub slots: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub latest_message: LatestMessage,
}

/// Body the dialogue manager posts to run one action.
#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    #[serde(default)]
    pub next_action: String,
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub tracker: Tracker,
}

impl ActionRequest {
    fn into_context(self) -> ActionContext {
        let sender_id = self
            .sender_id
            .or(self.tracker.sender_id)
            .unwrap_or_default();
        ActionContext {
            sender_id,
            latest_text: self.tracker.latest_message.text.unwrap_or_default(),
            entities: self.tracker.latest_message.entities,
            slots: self.tracker.slots,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActionResponse {
    pub events: Vec<SlotEvent>,
    pub responses: Vec<BotMessage>,
}

/// POST /webhook - run the requested action against the tracker state.
pub async fn run_action(
    State(state): State<AppState>,
    Json(req): Json<ActionRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    let action = req.next_action.trim().to_string();
    if action.is_empty() {
        return Err(ActionError::InvalidRequest("next_action is required".to_string()).into());
    }

    let ctx = req.into_context();
    let outcome = state.actions.dispatch(&action, &ctx).await?;
    tracing::info!(
        action = %action,
        sender = %ctx.sender_id,
        events = outcome.events.len(),
        "Action completed"
    );

    Ok(Json(ActionResponse {
        events: outcome.events,
        responses: outcome.messages,
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActionsResponse {
    pub actions: Vec<String>,
}

/// GET /actions - names of every registered action.
pub async fn list_actions(State(state): State<AppState>) -> Json<ActionsResponse> {
    Json(ActionsResponse {
        actions: state
            .actions
            .names()
            .into_iter()
            .map(|n| n.to_string())
            .collect(),
    })
}

// =============================================================================
// Chat relay
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub sender: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// POST /chat - forward a visitor message to the dialogue server.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message is required".to_string()));
    }
    let response = state
        .relay
        .reply_for(req.sender.as_deref(), &req.message)
        .await;
    Ok(Json(ChatResponse { response }))
}

// =============================================================================
// Accounts
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub shop_name: String,
    pub shop_address: String,
    pub contact_email: String,
    pub phone_number: String,
    pub shop_description: String,
}

impl SignupRequest {
    /// Trimmed copy with every required field checked.
    fn validated(self) -> Result<Self, ApiError> {
        let req = Self {
            username: self.username.trim().to_string(),
            password: self.password,
            shop_name: self.shop_name.trim().to_string(),
            shop_address: self.shop_address.trim().to_string(),
            contact_email: self.contact_email.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
            shop_description: self.shop_description.trim().to_string(),
        };
        let required = [
            (&req.username, "Username is required."),
            (&req.password, "Password is required."),
            (&req.shop_name, "Shop name is required."),
            (&req.shop_address, "Shop address is required."),
            (&req.contact_email, "Contact email is required."),
            (&req.phone_number, "Phone number is required."),
        ];
        if let Some((_, message)) = required.iter().find(|(value, _)| value.is_empty()) {
            return Err(ApiError::BadRequest(message.to_string()));
        }
        Ok(req)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

/// POST /signup - create a shop account and log it in.
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let req = req.validated()?;

    let iterations = state.config.auth.pbkdf2_iterations;
    let password = req.password.clone();
    let password_hash =
        tokio::task::spawn_blocking(move || auth::hash_password(&password, iterations))
            .await
            .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))??;

    let user_id = state.services.users.create(&NewUser {
        username: req.username,
        password_hash,
        role: Role::User,
        shop_name: req.shop_name,
        shop_address: req.shop_address,
        contact_email: req.contact_email,
        phone_number: req.phone_number,
        shop_description: req.shop_description,
    })?;
    let user = state
        .services
        .users
        .find_by_id(user_id)?
        .ok_or_else(|| ApiError::Internal("Created user vanished".to_string()))?;

    let token = state.sessions.create(&user);
    tracing::info!(user_id, username = %user.username, "Shop account created");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user_id,
            username: user.username,
            role: user.role,
        }),
    ))
}

/// POST /login - verify credentials and start a session.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let invalid = || ApiError::Unauthorized("Invalid username or password.".to_string());

    let Some(user) = state.services.users.find_by_username(req.username.trim())? else {
        return Err(invalid());
    };

    let stored = user.password_hash.clone();
    let password = req.password;
    let verified = tokio::task::spawn_blocking(move || auth::verify_password(&password, &stored))
        .await
        .map_err(|e| ApiError::Internal(format!("Password check failed: {}", e)))?;
    if !verified {
        tracing::warn!(username = %user.username, "Failed login attempt");
        return Err(invalid());
    }

    let token = state.sessions.create(&user);
    Ok(Json(AuthResponse {
        token,
        user_id: user.id,
        username: user.username,
        role: user.role,
    }))
}

/// POST /logout - drop the caller's session.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    if let Some(token) = auth::bearer_token(&headers) {
        state.sessions.remove(token);
    }
    StatusCode::NO_CONTENT
}

// =============================================================================
// Shop dashboard and catalog
// =============================================================================

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub username: String,
    pub profile: ShopProfile,
    pub products: Vec<Product>,
    pub feedback: Vec<DashboardFeedback>,
}

/// GET /dashboard - the caller's catalog, profile and recent feedback.
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<DashboardResponse>, ApiError> {
    if session.is_admin() {
        return Err(ApiError::Forbidden(
            "Admin accounts use /admin".to_string(),
        ));
    }

    let user = state
        .services
        .users
        .find_by_id(session.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;
    let products = state.services.products.list_by_owner(user.id)?;
    let feedback = state
        .services
        .feedback
        .recent_for_owner(user.id, DASHBOARD_FEEDBACK_LIMIT)?;

    Ok(Json(DashboardResponse {
        username: user.username.clone(),
        profile: user.profile(),
        products,
        feedback,
    }))
}

/// Trim text fields and reject a blank name or a bad price.
fn validate_product(input: ProductInput) -> Result<ProductInput, ApiError> {
    let input = ProductInput {
        name: input.name.trim().to_string(),
        brand: input.brand.trim().to_string(),
        size: input.size.trim().to_string(),
        price: input.price,
        description: input.description.trim().to_string(),
    };
    if input.name.is_empty() {
        return Err(ApiError::BadRequest("Product name is required.".to_string()));
    }
    if !input.price.is_finite() || input.price < 0.0 {
        return Err(ApiError::BadRequest(
            "Price must be a non-negative number.".to_string(),
        ));
    }
    Ok(input)
}

fn product_not_found() -> ApiError {
    ApiError::NotFound("Product not found.".to_string())
}

/// POST /products - add a product to the caller's catalog.
pub async fn create_product(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let input = validate_product(input)?;
    let id = state.services.products.insert(session.user_id, &input)?;
    tracing::info!(product_id = id, owner = session.user_id, name = %input.name, "Product added");

    Ok((
        StatusCode::CREATED,
        Json(Product {
            id,
            owner_id: session.user_id,
            name: input.name,
            brand: input.brand,
            size: input.size,
            price: input.price,
            description: input.description,
        }),
    ))
}

/// GET /products/{id} - one of the caller's products.
pub async fn get_product(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Result<Json<Product>, ApiError> {
    state
        .services
        .products
        .find_owned(id, session.user_id)?
        .map(Json)
        .ok_or_else(product_not_found)
}

/// PUT /products/{id} - replace one of the caller's products.
pub async fn update_product(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>, ApiError> {
    let input = validate_product(input)?;
    if !state
        .services
        .products
        .update(id, session.user_id, &input)?
    {
        return Err(product_not_found());
    }
    state
        .services
        .products
        .find_owned(id, session.user_id)?
        .map(Json)
        .ok_or_else(product_not_found)
}

/// DELETE /products/{id} - remove one of the caller's products.
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.services.products.delete(id, session.user_id)? {
        tracing::info!(product_id = id, owner = session.user_id, "Product deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(product_not_found())
    }
}

// =============================================================================
// Admin
// =============================================================================

#[derive(Debug, Serialize)]
pub struct AdminResponse {
    pub users: Vec<UserSummary>,
    pub products: Vec<Product>,
}

/// GET /admin - every account and every product.
pub async fn admin_panel(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<AdminResponse>, ApiError> {
    if !session.is_admin() {
        return Err(ApiError::Forbidden("Admin access required.".to_string()));
    }
    Ok(Json(AdminResponse {
        users: state.services.users.list_summaries()?,
        products: state.services.products.list_all()?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_validation_order() {
        let err = SignupRequest {
            username: "  ".to_string(),
            ..Default::default()
        }
        .validated()
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref m) if m == "Username is required."));

        let err = SignupRequest {
            username: "alice".to_string(),
            password: "pw".to_string(),
            shop_name: "Shop".to_string(),
            shop_address: "Street".to_string(),
            contact_email: "a@b.c".to_string(),
            ..Default::default()
        }
        .validated()
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref m) if m == "Phone number is required."));
    }

    #[test]
    fn test_signup_description_optional_and_trimmed() {
        let req = SignupRequest {
            username: " alice ".to_string(),
            password: " pw ".to_string(),
            shop_name: "Shop".to_string(),
            shop_address: "Street".to_string(),
            contact_email: "a@b.c".to_string(),
            phone_number: "555".to_string(),
            shop_description: String::new(),
        }
        .validated()
        .unwrap();
        assert_eq!(req.username, "alice");
        // passwords are taken verbatim
        assert_eq!(req.password, " pw ");
    }

    #[test]
    fn test_validate_product() {
        let ok = validate_product(ProductInput {
            name: " Mug ".to_string(),
            price: 4.5,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(ok.name, "Mug");

        assert!(validate_product(ProductInput::default()).is_err());
        assert!(validate_product(ProductInput {
            name: "Mug".to_string(),
            price: -1.0,
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn test_action_request_into_context() {
        let req: ActionRequest = serde_json::from_value(serde_json::json!({
            "next_action": "action_getting_price",
            "tracker": {
                "sender_id": "visitor-9",
                "slots": {"product_name": "Mug", "sentiment": null},
                "latest_message": {
                    "text": "how much is the mug",
                    "entities": [{"entity": "product_name", "value": "mug", "start": 16, "end": 19}]
                }
            }
        }))
        .unwrap();
        let ctx = req.into_context();
        assert_eq!(ctx.sender_id, "visitor-9");
        assert_eq!(ctx.latest_text, "how much is the mug");
        assert_eq!(ctx.entity("product_name"), Some("mug"));
        assert_eq!(ctx.slot("product_name"), Some("Mug"));
        assert_eq!(ctx.slot("sentiment"), None);
    }
}
