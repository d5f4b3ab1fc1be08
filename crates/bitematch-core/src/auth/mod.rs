//! Shared Firebase auth client logic.

mod session_store;

use std::fmt;
use std::future::Future;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::UserProfile;
use crate::remote::UserContext;
use crate::util::{is_http_url, normalize_text_option, unix_timestamp_now};

pub use session_store::MemorySessionStore;

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";
const EXPIRY_SKEW_SECONDS: i64 = 60;
const MIN_PASSWORD_CHARS: usize = 6;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Invalid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl AuthUser {
    /// Name shown on the profile screen
    #[must_use]
    pub fn display_label(&self) -> &str {
        if self.is_anonymous {
            return "Guest";
        }
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("BiteMatch user")
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub id_token: String,
    pub refresh_token: String,
    /// Unix seconds
    pub expires_at: i64,
    pub user: AuthUser,
}

impl AuthSession {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= unix_timestamp_now() + EXPIRY_SKEW_SECONDS
    }

    /// Credentials for remote store calls
    #[must_use]
    pub fn user_context(&self) -> UserContext {
        UserContext::new(self.user.id.clone(), self.id_token.clone())
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("id_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// How an email sign-up was completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The guest account was upgraded in place; its history is kept
    Linked(AuthSession),
    /// A new account was created
    Created(AuthSession),
}

impl SignUpOutcome {
    #[must_use]
    pub const fn session(&self) -> &AuthSession {
        match self {
            Self::Linked(session) | Self::Created(session) => session,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Firebase auth is not configured for this build.")]
    NotConfigured,
    #[error("Invalid auth configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("{0}")]
    InvalidInput(String),
    #[error("Not signed in")]
    NotSignedIn,
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Auth API error: {0}")]
    Api(String),
    #[error("Secure storage error: {0}")]
    SecureStorage(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

pub trait SessionPersistence: Clone + Send + Sync + 'static {
    fn load_session(&self) -> AuthResult<Option<AuthSession>>;
    fn save_session(&self, session: &AuthSession) -> AuthResult<()>;
    fn clear_session(&self) -> AuthResult<()>;
}

/// Account operations the app flows depend on
pub trait AuthBackend: Send + Sync {
    /// The stored session, without refreshing it
    fn current_session(&self) -> AuthResult<Option<AuthSession>>;

    /// The stored session, refreshed when expired
    fn restore_session(&self) -> impl Future<Output = AuthResult<Option<AuthSession>>> + Send;

    fn sign_in_anonymously(&self) -> impl Future<Output = AuthResult<AuthSession>> + Send;

    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = AuthResult<SignUpOutcome>> + Send;

    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = AuthResult<AuthSession>> + Send;

    fn send_password_reset(&self, email: &str) -> impl Future<Output = AuthResult<()>> + Send;

    fn update_profile(
        &self,
        profile: &UserProfile,
    ) -> impl Future<Output = AuthResult<AuthSession>> + Send;

    fn delete_account(&self) -> impl Future<Output = AuthResult<()>> + Send;

    /// Forget the local session
    fn sign_out(&self) -> AuthResult<()>;
}

#[derive(Clone)]
pub struct FirebaseAuthClient<S: SessionPersistence> {
    identity_url: String,
    token_url: String,
    api_key: String,
    client: Client,
    store: S,
}

impl<S: SessionPersistence> FirebaseAuthClient<S> {
    pub fn new(api_key: impl Into<String>, store: S) -> AuthResult<Self> {
        Self::with_endpoints(IDENTITY_TOOLKIT_URL, SECURE_TOKEN_URL, api_key, store)
    }

    /// Point the client at other endpoints, e.g. the auth emulator
    pub fn with_endpoints(
        identity_url: impl AsRef<str>,
        token_url: impl AsRef<str>,
        api_key: impl Into<String>,
        store: S,
    ) -> AuthResult<Self> {
        let identity_url = normalize_endpoint(identity_url.as_ref())?;
        let token_url = normalize_endpoint(token_url.as_ref())?;
        let api_key = normalize_text_option(Some(api_key.into()))
            .ok_or(AuthError::InvalidConfiguration("Firebase API key must not be empty"))?;

        Ok(Self {
            identity_url,
            token_url,
            api_key,
            client: Client::builder().build()?,
            store,
        })
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub async fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        let Some(stored_session) = self.store.load_session()? else {
            return Ok(None);
        };

        if !stored_session.is_expired() {
            return Ok(Some(stored_session));
        }

        match self.refresh_session(&stored_session).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(error) if revokes_session(&error) => {
                tracing::warn!("Refresh token rejected; clearing session: {}", error);
                self.store.clear_session()?;
                Ok(None)
            }
            Err(error) => {
                // Keep the stored session so the next run can retry
                tracing::warn!("Failed to refresh persisted session: {}", error);
                Err(error)
            }
        }
    }

    pub async fn sign_in_anonymously(&self) -> AuthResult<AuthSession> {
        let payload = serde_json::json!({ "returnSecureToken": true });
        let response = self
            .send_identity_request(self.identity_request("accounts:signUp").json(&payload))
            .await?;

        let session = response.into_session(true)?;
        self.store.save_session(&session)?;
        tracing::debug!("Started guest session {}", session.user.id);
        Ok(session)
    }

    /// Create an email account, upgrading the current guest account when there is one
    pub async fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpOutcome> {
        validate_credentials(email, password)?;
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AuthError::InvalidInput(format!(
                "Password should be at least {MIN_PASSWORD_CHARS} characters"
            )));
        }

        let guest = match self.restore_session().await? {
            Some(session) if session.user.is_anonymous => Some(session),
            _ => None,
        };

        if let Some(guest) = guest {
            let payload = serde_json::json!({
                "idToken": guest.id_token,
                "email": email.trim(),
                "password": password,
                "returnSecureToken": true,
            });
            let response = self
                .send_identity_request(self.identity_request("accounts:update").json(&payload))
                .await?;
            let mut session = response.into_session(false)?;
            if session.user.id.is_empty() {
                session.user.id = guest.user.id;
            }
            self.store.save_session(&session)?;
            return Ok(SignUpOutcome::Linked(session));
        }

        let payload = serde_json::json!({
            "email": email.trim(),
            "password": password,
            "returnSecureToken": true,
        });
        let response = self
            .send_identity_request(self.identity_request("accounts:signUp").json(&payload))
            .await?;
        let session = response.into_session(false)?;
        self.store.save_session(&session)?;
        Ok(SignUpOutcome::Created(session))
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        validate_credentials(email, password)?;

        let payload = serde_json::json!({
            "email": email.trim(),
            "password": password,
            "returnSecureToken": true,
        });
        let response = self
            .send_identity_request(
                self.identity_request("accounts:signInWithPassword")
                    .json(&payload),
            )
            .await?;

        let session = response.into_session(false)?;
        self.store.save_session(&session)?;
        Ok(session)
    }

    /// Exchange the refresh token for a new id token, keeping the user details
    pub async fn refresh_session(&self, session: &AuthSession) -> AuthResult<AuthSession> {
        if session.refresh_token.trim().is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "Refresh token must not be empty",
            ));
        }

        let request = self
            .client
            .post(format!("{}/token", self.token_url))
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", session.refresh_token.as_str()),
            ]);

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_api_error(status, &body)));
        }

        let payload = response.json::<SecureTokenResponse>().await?;
        let refreshed = payload.into_session(&session.user)?;
        self.store.save_session(&refreshed)?;
        Ok(refreshed)
    }

    pub async fn send_password_reset(&self, email: &str) -> AuthResult<()> {
        let email = normalize_text_option(Some(email.to_string()))
            .ok_or_else(|| AuthError::InvalidInput("Email is required".to_string()))?;
        validate_email(&email)?;

        let payload = serde_json::json!({
            "requestType": "PASSWORD_RESET",
            "email": email,
        });
        self.send_identity_request(self.identity_request("accounts:sendOobCode").json(&payload))
            .await?;
        Ok(())
    }

    /// Set display name and photo URL; `None` leaves a field unchanged
    pub async fn update_profile(&self, profile: &UserProfile) -> AuthResult<AuthSession> {
        let mut session = self.require_session().await?;
        if let Some(url) = &profile.photo_url {
            if !is_http_url(url) {
                return Err(AuthError::InvalidInput(
                    "Photo URL must include http:// or https://".to_string(),
                ));
            }
        }

        let mut payload = serde_json::json!({
            "idToken": session.id_token,
            "returnSecureToken": false,
        });
        if let Some(name) = &profile.display_name {
            payload["displayName"] = serde_json::Value::String(name.clone());
        }
        if let Some(url) = &profile.photo_url {
            payload["photoUrl"] = serde_json::Value::String(url.clone());
        }

        let response = self
            .send_identity_request(self.identity_request("accounts:update").json(&payload))
            .await?;

        session.user.display_name = response
            .display_name
            .or_else(|| profile.display_name.clone());
        session.user.photo_url = response.photo_url.or_else(|| profile.photo_url.clone());
        self.store.save_session(&session)?;
        Ok(session)
    }

    /// Delete the signed-in user and forget the session
    pub async fn delete_account(&self) -> AuthResult<()> {
        let session = self.require_session().await?;
        let payload = serde_json::json!({ "idToken": session.id_token });
        self.send_identity_request(self.identity_request("accounts:delete").json(&payload))
            .await?;
        self.store.clear_session()?;
        tracing::info!("Deleted account {}", session.user.id);
        Ok(())
    }

    pub fn sign_out(&self) -> AuthResult<()> {
        self.store.clear_session()
    }

    async fn require_session(&self) -> AuthResult<AuthSession> {
        self.restore_session().await?.ok_or(AuthError::NotSignedIn)
    }

    fn identity_request(&self, method: &str) -> RequestBuilder {
        self.client
            .post(format!("{}/{method}", self.identity_url))
            .query(&[("key", self.api_key.as_str())])
    }

    async fn send_identity_request(&self, request: RequestBuilder) -> AuthResult<IdentityResponse> {
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_api_error(status, &body)));
        }
        Ok(response.json::<IdentityResponse>().await?)
    }
}

impl<S: SessionPersistence> AuthBackend for FirebaseAuthClient<S> {
    fn current_session(&self) -> AuthResult<Option<AuthSession>> {
        self.store.load_session()
    }

    async fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        Self::restore_session(self).await
    }

    async fn sign_in_anonymously(&self) -> AuthResult<AuthSession> {
        Self::sign_in_anonymously(self).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpOutcome> {
        Self::sign_up(self, email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        Self::sign_in(self, email, password).await
    }

    async fn send_password_reset(&self, email: &str) -> AuthResult<()> {
        Self::send_password_reset(self, email).await
    }

    async fn update_profile(&self, profile: &UserProfile) -> AuthResult<AuthSession> {
        Self::update_profile(self, profile).await
    }

    async fn delete_account(&self) -> AuthResult<()> {
        Self::delete_account(self).await
    }

    fn sign_out(&self) -> AuthResult<()> {
        Self::sign_out(self)
    }
}

fn normalize_endpoint(url: &str) -> AuthResult<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(AuthError::InvalidConfiguration(
            "Auth endpoint must not be empty",
        ));
    }
    if !is_http_url(trimmed) {
        return Err(AuthError::InvalidConfiguration(
            "Auth endpoint must include http:// or https://",
        ));
    }
    Ok(trimmed.to_string())
}

/// Errors after which a stored session can never be refreshed
const fn revokes_session(error: &AuthError) -> bool {
    matches!(error, AuthError::Api(_) | AuthError::InvalidConfiguration(_))
}

fn validate_credentials(email: &str, password: &str) -> AuthResult<()> {
    if email.trim().is_empty() {
        return Err(AuthError::InvalidInput("Email is required".to_string()));
    }
    validate_email(email.trim())?;
    if password.is_empty() {
        return Err(AuthError::InvalidInput("Password is required".to_string()));
    }
    Ok(())
}

fn validate_email(email: &str) -> AuthResult<()> {
    if EMAIL_PATTERN.is_match(email) {
        Ok(())
    } else {
        Err(AuthError::InvalidInput(
            "The email address is badly formatted.".to_string(),
        ))
    }
}

fn parse_expires_in(raw: Option<&str>) -> AuthResult<i64> {
    let seconds = raw
        .and_then(|value| value.trim().parse::<i64>().ok())
        .ok_or_else(|| AuthError::Api("Auth response did not include expiresIn".to_string()))?;
    Ok(unix_timestamp_now().saturating_add(seconds))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityResponse {
    local_id: Option<String>,
    email: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
    id_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<String>,
}

impl IdentityResponse {
    fn into_session(self, is_anonymous: bool) -> AuthResult<AuthSession> {
        let expires_at = parse_expires_in(self.expires_in.as_deref())?;
        match (self.id_token, self.refresh_token) {
            (Some(id_token), Some(refresh_token)) => Ok(AuthSession {
                id_token,
                refresh_token,
                expires_at,
                user: AuthUser {
                    id: self.local_id.unwrap_or_default(),
                    email: normalize_text_option(self.email),
                    is_anonymous,
                    display_name: normalize_text_option(self.display_name),
                    photo_url: normalize_text_option(self.photo_url),
                },
            }),
            _ => Err(AuthError::Api(
                "Auth response did not include enough session fields".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SecureTokenResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    user_id: Option<String>,
}

impl SecureTokenResponse {
    fn into_session(self, user: &AuthUser) -> AuthResult<AuthSession> {
        let mut user = user.clone();
        if let Some(id) = normalize_text_option(self.user_id) {
            user.id = id;
        }
        Ok(AuthSession {
            id_token: self.id_token,
            refresh_token: self.refresh_token,
            expires_at: parse_expires_in(Some(&self.expires_in))?,
            user,
        })
    }
}

#[derive(Debug, Deserialize)]
struct FirebaseErrorResponse {
    error: Option<FirebaseErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FirebaseErrorBody {
    Detailed { message: Option<String> },
    Code(String),
}

/// Translate Identity Toolkit error codes into user-facing text
fn describe_error_code(code: &str) -> Option<&'static str> {
    let description = match code {
        "EMAIL_EXISTS" | "CREDENTIAL_ALREADY_IN_USE" => {
            "The email address is already in use by another account."
        }
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            "Invalid email or password."
        }
        "INVALID_EMAIL" => "The email address is badly formatted.",
        "WEAK_PASSWORD" => "Password should be at least 6 characters.",
        "USER_DISABLED" => "This account has been disabled.",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "Too many attempts. Try again later.",
        "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => "Please sign in again before deleting your account.",
        "TOKEN_EXPIRED" | "INVALID_ID_TOKEN" | "INVALID_REFRESH_TOKEN" | "USER_NOT_FOUND" => {
            "Your session has expired. Please sign in again."
        }
        "ADMIN_ONLY_OPERATION" | "OPERATION_NOT_ALLOWED" => {
            "This sign-in method is not enabled for the project."
        }
        _ => return None,
    };
    Some(description)
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(FirebaseErrorResponse { error: Some(error) }) =
        serde_json::from_str::<FirebaseErrorResponse>(body)
    {
        let message = match error {
            FirebaseErrorBody::Detailed { message } => message,
            FirebaseErrorBody::Code(code) => Some(code),
        };
        if let Some(message) = message {
            // Codes may carry detail: "WEAK_PASSWORD : Password should be ..."
            let code = message.split(" : ").next().unwrap_or_default().trim();
            let text = describe_error_code(code).map_or_else(|| message.trim().to_string(), str::to_string);
            return format!("{text} ({})", status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}
