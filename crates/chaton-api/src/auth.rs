//! Storefront authentication: password hashing, login sessions and the
//! bearer-token middleware guarding shop routes.
//!
//! Passwords are stored as `pbkdf2:sha256:{iterations}${salt}${hex}`, the
//! format shop accounts already carry, so existing hashes keep verifying.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rand::distr::Alphanumeric;
use rand::Rng;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use chaton_core::error::ChatonError;
use chaton_core::types::{Role, User};

use crate::state::AppState;

const HASH_METHOD: &str = "pbkdf2:sha256";
const SALT_CHARS: usize = 16;
/// Iterations assumed when a stored hash does not name its own.
const LEGACY_ITERATIONS: u32 = 600_000;

// =============================================================================
// Password hashing
// =============================================================================

/// PBKDF2-HMAC-SHA256 with a 32-byte derived key.
fn pbkdf2_sha256(password: &[u8], salt: &[u8], iterations: u32) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut key);
    key
}

fn generate_salt() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_CHARS)
        .map(char::from)
        .collect()
}

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str, iterations: u32) -> Result<String, ChatonError> {
    let iterations = iterations.max(1);
    let salt = generate_salt();
    let key = pbkdf2_sha256(password.as_bytes(), salt.as_bytes(), iterations);
    Ok(format!(
        "{}:{}${}${}",
        HASH_METHOD,
        iterations,
        salt,
        hex::encode(key)
    ))
}

/// Check `password` against a stored hash. Malformed hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(method), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    let iterations = match method.strip_prefix(HASH_METHOD) {
        Some("") => LEGACY_ITERATIONS,
        Some(rest) => match rest.strip_prefix(':').and_then(|n| n.parse::<u32>().ok()) {
            Some(n) if n > 0 => n,
            _ => return false,
        },
        None => return false,
    };

    let key = pbkdf2_sha256(password.as_bytes(), salt.as_bytes(), iterations);
    hex::encode(key).as_bytes().ct_eq(expected.as_bytes()).into()
}

// =============================================================================
// Sessions
// =============================================================================

/// Generate a random 32-character hex token.
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    hex::encode(bytes)
}

/// A logged-in storefront user.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    last_seen: Instant,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// In-memory login sessions keyed by bearer token.
#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Start a session for `user` and return its token.
    ///
    /// Idle sessions are swept on every login.
    pub fn create(&self, user: &User) -> String {
        let token = generate_token();
        let session = Session {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            last_seen: Instant::now(),
        };
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, s| s.last_seen.elapsed() <= self.idle_timeout);
        if sessions.len() < before {
            tracing::debug!(expired = before - sessions.len(), "Swept idle sessions");
        }
        sessions.insert(token.clone(), session);
        token
    }

    /// Look up a live session, refreshing its idle timer. Expired sessions
    /// are dropped.
    pub fn get(&self, token: &str) -> Option<Session> {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let expired = match sessions.get_mut(token) {
            Some(session) if session.last_seen.elapsed() <= self.idle_timeout => {
                session.last_seen = Instant::now();
                return Some(session.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            sessions.remove(token);
        }
        None
    }

    /// End a session. Returns false if the token was unknown.
    pub fn remove(&self, token: &str) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The raw bearer token of a request, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "unauthorized",
            "message": message
        })),
    )
        .into_response()
}

/// Middleware that requires a live login session.
///
/// Extracts the token from `Authorization: Bearer <token>` and makes the
/// matching [`Session`] available to handlers as a request extension.
/// Returns 401 if the header is missing or the session unknown or expired.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(req.headers()) else {
        return unauthorized("Missing bearer token");
    };

    match state.sessions.get(token) {
        Some(session) => {
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        None => unauthorized("Invalid or expired session"),
    }
}
