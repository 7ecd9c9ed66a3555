//! Integration tests for the ChatOn API.
//!
//! Covers the action-server webhook, the chat relay fallback, shop accounts,
//! catalog management and the admin overview. Each test is independent with
//! its own in-memory state.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use chaton_api::auth::hash_password;
use chaton_api::create_router;
use chaton_api::handlers::HealthResponse;
use chaton_api::relay::UNAVAILABLE;
use chaton_api::state::AppState;
use chaton_core::config::ChatonConfig;
use chaton_core::types::{NewUser, ProductInput, Role};
use chaton_storage::Database;

// =============================================================================
// Helpers
// =============================================================================

/// Create a fresh AppState with an in-memory DB, cheap password hashing and
/// a dialogue server that is never reachable.
fn make_state() -> AppState {
    let mut config = ChatonConfig::default();
    config.auth.pbkdf2_iterations = 1000;
    config.chat.nlu_url = "http://127.0.0.1:9/webhooks/rest/webhook".to_string();
    config.chat.timeout_secs = 2;
    let db = Database::in_memory().unwrap();
    AppState::new(config, db).unwrap()
}

fn make_app() -> axum::Router {
    create_router(make_state())
}

fn post_json(uri: &str, json: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

fn authed(method: &str, uri: &str, token: &str, json: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token));
    match json {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn signup_body(username: &str) -> Value {
    json!({
        "username": username,
        "password": "hunter22",
        "shop_name": format!("{} store", username),
        "shop_address": "1 High Street",
        "contact_email": format!("{}@example.com", username),
        "phone_number": "555-0100"
    })
}

/// Sign up `username` and return the session token.
async fn signup(app: &axum::Router, username: &str) -> String {
    let resp = app
        .clone()
        .oneshot(post_json("/signup", signup_body(username)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await["token"].as_str().unwrap().to_string()
}

/// Insert an admin account directly and return its token via /login.
async fn admin_token(state: &AppState, app: &axum::Router) -> String {
    state
        .services
        .users
        .create(&NewUser {
            username: "root".to_string(),
            password_hash: hash_password("adminpw", 1000).unwrap(),
            role: Role::Admin,
            ..Default::default()
        })
        .unwrap();
    let resp = app
        .clone()
        .oneshot(post_json(
            "/login",
            json!({"username": "root", "password": "adminpw"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await["token"].as_str().unwrap().to_string()
}

fn action(name: &str, text: &str, product: Option<&str>) -> Value {
    let entities = match product {
        Some(p) => json!([{"entity": "product_name", "value": p}]),
        None => json!([]),
    };
    json!({
        "next_action": name,
        "sender_id": "visitor-1",
        "tracker": {
            "slots": {},
            "latest_message": {"text": text, "entities": entities}
        }
    })
}

fn seed_catalog(state: &AppState) -> i64 {
    let owner = state
        .services
        .users
        .create(&NewUser {
            username: "carol".to_string(),
            password_hash: "x".to_string(),
            shop_address: "9 Harbour Road".to_string(),
            contact_email: "carol@example.com".to_string(),
            phone_number: "555-0111".to_string(),
            ..Default::default()
        })
        .unwrap();
    state
        .services
        .products
        .insert(
            owner,
            &ProductInput {
                name: "Teapot".to_string(),
                brand: "Clay Co".to_string(),
                size: "1L".to_string(),
                price: 20.0,
                description: "ceramic teapot with bamboo handle".to_string(),
            },
        )
        .unwrap();
    owner
}

// =============================================================================
// Public endpoints
// =============================================================================

#[tokio::test]
async fn test_health_happy_path() {
    let state = make_state();
    seed_catalog(&state);
    let resp = create_router(state)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let health: HealthResponse = serde_json::from_value(body_json(resp).await).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.product_count, 1);
}

#[tokio::test]
async fn test_list_actions() {
    let resp = make_app()
        .oneshot(Request::get("/actions").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let names: Vec<&str> = body["actions"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert_eq!(names.len(), 10);
    assert!(names.contains(&"action_store_feedback"));
    assert!(names.contains(&"action_search_by_description"));
}

// =============================================================================
// Action server
// =============================================================================

#[tokio::test]
async fn test_webhook_price_sets_slot() {
    let state = make_state();
    seed_catalog(&state);
    let resp = create_router(state)
        .oneshot(post_json(
            "/webhook",
            action("action_getting_price", "how much is the teapot", Some("teapot")),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["responses"][0]["text"], "The price of 'Teapot' is 20.0.");
    assert_eq!(body["responses"][1]["response"], "utter_offer_more_options");
    assert_eq!(
        body["events"][0],
        json!({"event": "slot", "name": "product_name", "value": "Teapot"})
    );
}

#[tokio::test]
async fn test_webhook_uses_slot_when_no_entity() {
    let state = make_state();
    seed_catalog(&state);
    let req = json!({
        "next_action": "action_getting_location",
        "tracker": {
            "slots": {"product_name": "Teapot"},
            "latest_message": {"text": "where is the shop?"}
        }
    });
    let resp = create_router(state)
        .oneshot(post_json("/webhook", req))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let text = body["responses"][0]["text"].as_str().unwrap();
    assert!(text.contains("9 Harbour Road"), "got: {}", text);
}

#[tokio::test]
async fn test_webhook_feedback_then_summary() {
    let state = make_state();
    seed_catalog(&state);
    let app = create_router(state);

    for text in ["I love this teapot, excellent", "great teapot", "it broke, awful"] {
        let resp = app
            .clone()
            .oneshot(post_json(
                "/webhook",
                action("action_store_feedback", text, Some("teapot")),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(
            body["responses"][0]["text"],
            "Thank you! Your feedback for 'teapot' has been recorded."
        );
    }

    let resp = app
        .oneshot(post_json(
            "/webhook",
            action("action_query_feedback_summary", "what do people think", Some("teapot")),
        ))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(
        body["responses"][0]["text"],
        "Most customers are satisfied with 'Teapot'."
    );
}

#[tokio::test]
async fn test_webhook_unknown_product() {
    let resp = make_app()
        .oneshot(post_json(
            "/webhook",
            action("action_getting_brand", "who makes the zzz", Some("zzz")),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["responses"][0]["text"], "Sorry, we don't have a product named 'zzz'.");
    assert_eq!(body["events"][0]["value"], Value::Null);
}

#[tokio::test]
async fn test_webhook_unknown_action_returns_404() {
    let resp = make_app()
        .oneshot(post_json("/webhook", action("action_fly", "", None)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert_eq!(body["error"], "action_not_found");
    assert_eq!(body["action_name"], "action_fly");
}

#[tokio::test]
async fn test_webhook_missing_action_returns_400() {
    let resp = make_app()
        .oneshot(post_json("/webhook", json!({"tracker": {}})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Chat relay
// =============================================================================

#[tokio::test]
async fn test_chat_falls_back_when_dialogue_server_down() {
    let resp = make_app()
        .oneshot(post_json("/chat", json!({"message": "hello"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["response"], UNAVAILABLE);
}

#[tokio::test]
async fn test_chat_empty_message_returns_400() {
    let resp = make_app()
        .oneshot(post_json("/chat", json!({"message": "   "})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Accounts
// =============================================================================

#[tokio::test]
async fn test_signup_and_login() {
    let app = make_app();
    signup(&app, "dave").await;

    let resp = app
        .clone()
        .oneshot(post_json(
            "/login",
            json!({"username": "dave", "password": "hunter22"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["username"], "dave");
    assert_eq!(body["role"], "user");
    assert_eq!(body["token"].as_str().unwrap().len(), 32);
}

#[tokio::test]
async fn test_signup_duplicate_username_returns_409() {
    let app = make_app();
    signup(&app, "dave").await;
    let resp = app
        .oneshot(post_json("/signup", signup_body("dave")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_signup_missing_field_returns_400() {
    let mut body = signup_body("erin");
    body["contact_email"] = json!("");
    let resp = make_app().oneshot(post_json("/signup", body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["message"], "Contact email is required.");
}

#[tokio::test]
async fn test_login_wrong_password_returns_401() {
    let app = make_app();
    signup(&app, "dave").await;
    for (user, pass) in [("dave", "wrong"), ("nobody", "hunter22")] {
        let resp = app
            .clone()
            .oneshot(post_json("/login", json!({"username": user, "password": pass})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let app = make_app();
    for (method, path) in [
        ("GET", "/dashboard"),
        ("POST", "/products"),
        ("GET", "/products/1"),
        ("DELETE", "/products/1"),
        ("GET", "/admin"),
        ("POST", "/logout"),
    ] {
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(path)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{} {}", method, path);
    }

    let resp = app
        .oneshot(authed("GET", "/dashboard", "not-a-token", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = make_app();
    let token = signup(&app, "dave").await;

    let resp = app
        .clone()
        .oneshot(authed("POST", "/logout", &token, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app
        .oneshot(authed("GET", "/dashboard", &token, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Catalog and dashboard
// =============================================================================

#[tokio::test]
async fn test_product_crud_and_dashboard() {
    let app = make_app();
    let token = signup(&app, "dave").await;

    let resp = app
        .clone()
        .oneshot(authed(
            "POST",
            "/products",
            &token,
            Some(json!({"name": " Mug ", "brand": "Acme", "size": "M", "price": 4.5, "description": "stoneware mug"})),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let product = body_json(resp).await;
    assert_eq!(product["name"], "Mug");
    let id = product["id"].as_i64().unwrap();

    let resp = app
        .clone()
        .oneshot(authed(
            "PUT",
            &format!("/products/{}", id),
            &token,
            Some(json!({"name": "Mug", "brand": "Acme", "size": "L", "price": 5.0, "description": "stoneware mug"})),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["size"], "L");

    let resp = app
        .clone()
        .oneshot(authed("GET", "/dashboard", &token, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let dash = body_json(resp).await;
    assert_eq!(dash["username"], "dave");
    assert_eq!(dash["profile"]["shop_name"], "dave store");
    assert_eq!(dash["products"].as_array().unwrap().len(), 1);

    let resp = app
        .clone()
        .oneshot(authed("DELETE", &format!("/products/{}", id), &token, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app
        .oneshot(authed("GET", &format!("/products/{}", id), &token, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_validation() {
    let app = make_app();
    let token = signup(&app, "dave").await;
    for body in [
        json!({"name": "", "price": 1.0}),
        json!({"name": "Mug", "price": -2.0}),
    ] {
        let resp = app
            .clone()
            .oneshot(authed("POST", "/products", &token, Some(body)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_cannot_touch_other_shops_products() {
    let state = make_state();
    seed_catalog(&state);
    let app = create_router(state);
    let token = signup(&app, "dave").await;

    // product 1 belongs to carol
    for method in ["GET", "DELETE"] {
        let resp = app
            .clone()
            .oneshot(authed(method, "/products/1", &token, None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_dashboard_shows_feedback_for_own_products() {
    let app = make_app();
    let token = signup(&app, "dave").await;
    app.clone()
        .oneshot(authed(
            "POST",
            "/products",
            &token,
            Some(json!({"name": "Lantern", "price": 12.0})),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(post_json(
            "/webhook",
            action("action_store_feedback", "the lantern is wonderful", Some("lantern")),
        ))
        .await
        .unwrap();

    let resp = app
        .oneshot(authed("GET", "/dashboard", &token, None))
        .await
        .unwrap();
    let dash = body_json(resp).await;
    let feedback = dash["feedback"].as_array().unwrap();
    assert_eq!(feedback.len(), 1);
    assert_eq!(feedback[0]["product_name"], "Lantern");
    assert_eq!(feedback[0]["feedback_text"], "the lantern is wonderful");
}

// =============================================================================
// Admin
// =============================================================================

#[tokio::test]
async fn test_admin_panel() {
    let state = make_state();
    seed_catalog(&state);
    let app = create_router(state.clone());
    let admin = admin_token(&state, &app).await;

    let resp = app
        .clone()
        .oneshot(authed("GET", "/admin", &admin, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["users"].as_array().unwrap().len(), 2);
    assert_eq!(body["products"][0]["name"], "Teapot");

    let resp = app
        .oneshot(authed("GET", "/dashboard", &admin, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_panel_forbidden_for_shops() {
    let app = make_app();
    let token = signup(&app, "dave").await;
    let resp = app
        .oneshot(authed("GET", "/admin", &token, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
