#![cfg(feature = "web")]

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use axum::{
    Form, Json, async_trait,
    extract::{FromRequestParts, State},
    http::{StatusCode, request::Parts},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use lazy_static::lazy_static;
use log::{error, info, warn};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::fs::{self, File, create_dir_all};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

use crate::app::AppState;

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE: &str = "session";

const USERS_FILE: &str = "users.json";

/// User data structure representing a registered application user
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    /// Username (unique identifier for the user, also the profile key)
    pub username: String,

    /// Email address
    pub email: String,

    /// Argon2 hash of the user's password
    pub password_hash: String,
}

/// Credential data for sign-in and sign-up
///
/// Used to receive the sign-in and sign-up form data from the client.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserCredentials {
    /// Username for sign-in/sign-up
    pub username: String,

    /// Email address (optional for sign-in, required for sign-up)
    #[serde(default)]
    pub email: String,

    /// Password in plaintext (only transmitted, never stored)
    pub password: String,
}

/// User session data
///
/// Represents an authenticated user session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Username of the authenticated user
    pub user_id: String,

    /// Time when the session expires
    pub expires_at: SystemTime,
}

/// Global sessions storage
///
/// Stores all active user sessions in a thread-safe map.
lazy_static! {
    static ref SESSIONS: RwLock<HashMap<String, Session>> = RwLock::new(HashMap::new());
}

/// Registered accounts, persisted as `users.json` inside the database directory
pub struct Accounts {
    users_file: PathBuf,
    lock: Mutex<()>,
}

impl Accounts {
    /// Initialize the account store
    ///
    /// Creates the database directory and users file if they don't exist.
    ///
    /// # Arguments
    /// * `dir` - Database directory
    ///
    /// # Returns
    /// * `std::io::Result<Accounts>` - The store or an IO error
    pub fn open(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref();
        if !dir.exists() {
            create_dir_all(dir)?;
        }

        let users_file = dir.join(USERS_FILE);
        if !users_file.exists() {
            let mut file = File::create(&users_file)?;
            file.write_all(b"{}")?;
        }

        Ok(Self {
            users_file,
            lock: Mutex::new(()),
        })
    }

    /// Get all registered users
    ///
    /// # Returns
    /// * `Result<HashMap<String, User>, String>` - Map of usernames to user objects, or an error
    pub fn get_users(&self) -> Result<HashMap<String, User>, String> {
        let mut file = match File::open(&self.users_file) {
            Ok(file) => file,
            Err(_) => return Err("Failed to open users file".to_string()),
        };

        let mut contents = String::new();
        if file.read_to_string(&mut contents).is_err() {
            return Err("Failed to read users file".to_string());
        }

        serde_json::from_str(&contents).map_err(|_| "Failed to parse users data".to_string())
    }

    fn save_users(&self, users: &HashMap<String, User>) -> Result<(), String> {
        let json = serde_json::to_string_pretty(users)
            .map_err(|_| "Failed to serialize users data".to_string())?;
        fs::write(&self.users_file, json).map_err(|_| "Failed to write users data".to_string())
    }

    /// Register a new user
    ///
    /// Creates a new account with the provided username, email, and password.
    /// The password is hashed before storage.
    ///
    /// # Errors
    /// * Returns an error if the username or email is already in use
    /// * Returns an error if any required fields are empty
    pub fn register_user(&self, username: &str, email: &str, password: &str) -> Result<(), String> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() || password.is_empty() || email.is_empty() {
            return Err("Username, email and password cannot be empty".to_string());
        }

        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut users = self.get_users()?;
        if users.contains_key(username) {
            return Err("Username already exists".to_string());
        }
        if users.values().any(|user| user.email.eq_ignore_ascii_case(email)) {
            return Err("Email address is already registered".to_string());
        }

        let user = User {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password)?,
        };
        users.insert(username.to_string(), user);
        self.save_users(&users)?;
        info!("registered user {}", username);

        Ok(())
    }

    /// Verify user credentials
    ///
    /// # Returns
    /// * `Result<bool, String>` - True if credentials are valid, false if invalid, or an error
    pub fn verify_user(&self, username: &str, password: &str) -> Result<bool, String> {
        let users = self.get_users()?;

        match users.get(username.trim()) {
            Some(user) => verify_password(password, &user.password_hash),
            None => Ok(false),
        }
    }
}

/// Hash a password using Argon2
///
/// Creates a cryptographically secure hash of a password using Argon2id.
fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| "Password hashing failed".to_string())
}

/// Verify a password against a stored hash
///
/// # Errors
/// * Returns an error if the hash is in an invalid format
fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| "Invalid password hash format".to_string())?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Create a new user session
///
/// # Arguments
/// * `username` - The username to create a session for
/// * `lifetime` - How long the session stays valid
///
/// # Returns
/// * `String` - A unique session ID
pub fn create_session(username: &str, lifetime: Duration) -> String {
    let session_id = Uuid::new_v4().to_string();
    let session = Session {
        user_id: username.to_string(),
        expires_at: SystemTime::now() + lifetime,
    };

    let mut sessions = SESSIONS.write().unwrap_or_else(PoisonError::into_inner);
    sessions.retain(|_, s| s.expires_at > SystemTime::now());
    sessions.insert(session_id.clone(), session);

    session_id
}

/// Validate a session
///
/// # Returns
/// * `Option<String>` - The username for the session if valid, None otherwise
pub fn validate_session(session_id: &str) -> Option<String> {
    let sessions = SESSIONS.read().unwrap_or_else(PoisonError::into_inner);

    sessions
        .get(session_id)
        .filter(|session| session.expires_at > SystemTime::now())
        .map(|session| session.user_id.clone())
}

/// Forget a session; unknown ids are ignored
pub fn end_session(session_id: &str) {
    let mut sessions = SESSIONS.write().unwrap_or_else(PoisonError::into_inner);
    sessions.remove(session_id);
}

/// User id of the session carried by the cookie jar, if it is still valid
pub fn current_user(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| validate_session(cookie.value()))
}

/// The signed-in user
///
/// Extracting it from a request without a valid session rejects with
/// `401 {"error": "Unauthorized"}`.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthUser(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        current_user(&jar).map(AuthUser).ok_or_else(|| {
            warn!("rejected unauthenticated request to {}", parts.uri.path());
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Unauthorized" })),
            )
                .into_response()
        })
    }
}

/// Page guard
///
/// Lets requests with a valid session through and sends everyone else to
/// the sign-in page.
pub async fn require_auth(
    jar: CookieJar,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    if current_user(&jar).is_some() {
        return next.run(request).await;
    }
    Redirect::to("/sign-in").into_response()
}

fn session_cookie(value: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie
}

/// Serve the sign-in page HTML
pub async fn serve_sign_in_page() -> Html<&'static str> {
    Html(include_str!("./static/sign_in.html"))
}

/// Serve the sign-up page HTML
pub async fn serve_sign_up_page() -> Html<&'static str> {
    Html(include_str!("./static/sign_up.html"))
}

/// Serve the sign-out page HTML
pub async fn serve_close_page() -> Html<&'static str> {
    Html(include_str!("./static/close.html"))
}

/// Handle sign-in requests
///
/// Validates credentials and, if valid, creates a session and redirects to
/// the dashboard.
pub async fn handle_sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(credentials): Form<UserCredentials>,
) -> Response {
    match state
        .accounts
        .verify_user(&credentials.username, &credentials.password)
    {
        Ok(true) => {
            let session_id = create_session(
                credentials.username.trim(),
                state.config.session_lifetime,
            );
            info!("user {} signed in", credentials.username.trim());
            (jar.add(session_cookie(session_id)), Redirect::to("/dashboard")).into_response()
        }
        Ok(false) => {
            warn!("failed sign-in for {}", credentials.username.trim());
            Redirect::to("/sign-in?error=Invalid+username+or+password").into_response()
        }
        Err(e) => {
            error!("sign-in failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Authentication error").into_response()
        }
    }
}

/// Handle user registration
///
/// Creates a new account and redirects to the sign-in page, or back to the
/// sign-up page with the error message.
pub async fn handle_sign_up(
    State(state): State<Arc<AppState>>,
    Form(credentials): Form<UserCredentials>,
) -> Redirect {
    match state.accounts.register_user(
        &credentials.username,
        &credentials.email,
        &credentials.password,
    ) {
        Ok(_) => Redirect::to("/sign-in?registered=true"),
        Err(e) => Redirect::to(&format!("/sign-up?error={}", urlencoding::encode(&e))),
    }
}

/// Handle sign-out
///
/// Ends the session, clears the cookie and returns to the landing page.
pub async fn handle_sign_out(jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        end_session(cookie.value());
    }

    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Redirect::to("/"),
    )
}
