//! Supabase Auth client for the Trade Pilot marketplace
//!
//! Covers the GoTrue endpoints the marketplace uses: email/password sign-up
//! with user metadata, password sign-in, sign-out, fetching the current user
//! and resending the sign-up confirmation mail. The current session is kept
//! in memory and every change is broadcast to subscribers.

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use url::Url;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("API error: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Missing session")]
    MissingSession,
}

impl AuthError {
    /// Human-readable message as GoTrue reported it.
    pub fn message(&self) -> String {
        match self {
            AuthError::ApiError { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// GoTrue error bodies differ between endpoints and versions.
#[derive(Deserialize, Debug, Default)]
struct ApiErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl ApiErrorBody {
    fn into_message(self) -> Option<String> {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub app_metadata: Value,
    #[serde(default)]
    pub user_metadata: Value,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl User {
    /// String field from `user_metadata`, if set and non-empty.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.user_metadata
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

/// Sign-up either signs the user in straight away or, when email
/// confirmation is enabled on the project, only returns the new user.
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpResponse {
    Session(Session),
    PendingConfirmation(User),
}

impl SignUpResponse {
    pub fn user(&self) -> &User {
        match self {
            SignUpResponse::Session(session) => &session.user,
            SignUpResponse::PendingConfirmation(user) => user,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignUpOptions {
    /// Where the confirmation link sends the user back to.
    pub email_redirect_to: Option<String>,
    /// Stored as the user's `user_metadata`.
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthChangeEvent {
    SignedIn(Session),
    SignedOut,
    UserUpdated(User),
}

#[derive(Debug, Clone)]
pub struct AuthOptions {
    pub persist_session: bool,
    pub event_capacity: usize,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            persist_session: true,
            event_capacity: 16,
        }
    }
}

pub struct Auth {
    url: String,
    key: String,
    http_client: Client,
    options: AuthOptions,
    current_session: Arc<RwLock<Option<Session>>>,
    events: broadcast::Sender<AuthChangeEvent>,
}

impl Auth {
    pub fn new(url: &str, key: &str, http_client: Client, options: AuthOptions) -> Self {
        let (events, _) = broadcast::channel(options.event_capacity.max(1));
        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            http_client,
            options,
            current_session: Arc::new(RwLock::new(None)),
            events,
        }
    }

    /// Receives every sign-in and sign-out from this point on.
    pub fn on_auth_state_change(&self) -> broadcast::Receiver<AuthChangeEvent> {
        self.events.subscribe()
    }

    pub async fn get_session(&self) -> Option<Session> {
        self.current_session.read().await.clone()
    }

    /// Installs a previously persisted session.
    pub async fn set_session(&self, session: Session) {
        self.store(Some(session.clone())).await;
        self.emit(AuthChangeEvent::SignedIn(session));
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        options: SignUpOptions,
    ) -> Result<SignUpResponse, AuthError> {
        let mut url = self.endpoint("signup")?;
        if let Some(redirect) = &options.email_redirect_to {
            url.query_pairs_mut().append_pair("redirect_to", redirect);
        }

        let mut payload = serde_json::json!({
            "email": email,
            "password": password,
        });
        if let Some(data) = options.data {
            payload["data"] = data;
        }

        tracing::debug!(%email, "auth sign-up");
        let response = self.post(url, &payload, None).await?;
        let body: Value = response.json().await?;

        if body.get("access_token").is_some() {
            let session: Session = serde_json::from_value(body)?;
            if self.options.persist_session {
                self.store(Some(session.clone())).await;
            }
            self.emit(AuthChangeEvent::SignedIn(session.clone()));
            Ok(SignUpResponse::Session(session))
        } else {
            // Some GoTrue versions wrap the pending user as `{ "user": {...} }`.
            let user_value = body.get("user").cloned().unwrap_or(body);
            let user: User = serde_json::from_value(user_value)?;
            Ok(SignUpResponse::PendingConfirmation(user))
        }
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let mut url = self.endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });

        tracing::debug!(%email, "auth sign-in");
        let response = self.post(url, &payload, None).await?;
        let session: Session = response.json().await?;

        if self.options.persist_session {
            self.store(Some(session.clone())).await;
        }
        self.emit(AuthChangeEvent::SignedIn(session.clone()));
        Ok(session)
    }

    /// Fetches the signed-in user and refreshes the stored session with it.
    pub async fn get_user(&self) -> Result<User, AuthError> {
        let session = self.get_session().await.ok_or(AuthError::MissingSession)?;
        let url = self.endpoint("user")?;

        let response = self
            .http_client
            .get(url)
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", session.access_token))
            .send()
            .await?;
        let response = Self::check(response).await?;
        let user: User = response.json().await?;

        {
            let mut guard = self.current_session.write().await;
            if let Some(current) = guard.as_mut() {
                current.user = user.clone();
            }
        }
        self.emit(AuthChangeEvent::UserUpdated(user.clone()));
        Ok(user)
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let session = self.get_session().await.ok_or(AuthError::MissingSession)?;
        let url = self.endpoint("logout")?;

        self.post(url, &Value::Null, Some(&session.access_token))
            .await?;

        self.store(None).await;
        self.emit(AuthChangeEvent::SignedOut);
        Ok(())
    }

    /// Sends the sign-up confirmation mail again.
    pub async fn resend_signup(
        &self,
        email: &str,
        email_redirect_to: Option<&str>,
    ) -> Result<(), AuthError> {
        let mut url = self.endpoint("resend")?;
        if let Some(redirect) = email_redirect_to {
            url.query_pairs_mut().append_pair("redirect_to", redirect);
        }

        let payload = serde_json::json!({
            "type": "signup",
            "email": email,
        });
        self.post(url, &payload, None).await?;
        Ok(())
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
        Ok(Url::parse(&format!("{}/auth/v1/{}", self.url, path))?)
    }

    async fn post(
        &self,
        url: Url,
        payload: &Value,
        bearer: Option<&str>,
    ) -> Result<Response, AuthError> {
        let mut request = self
            .http_client
            .post(url)
            .header("apikey", &self.key)
            .header("Content-Type", "application/json");
        if let Some(token) = bearer {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        if !payload.is_null() {
            request = request.json(payload);
        }

        let response = request.send().await?;
        Self::check(response).await
    }

    async fn check(response: Response) -> Result<Response, AuthError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .ok()
            .and_then(ApiErrorBody::into_message)
            .unwrap_or(text);
        tracing::warn!(status = status.as_u16(), %message, "auth request failed");

        Err(AuthError::ApiError {
            status: status.as_u16(),
            message,
        })
    }

    async fn store(&self, session: Option<Session>) {
        let mut guard = self.current_session.write().await;
        *guard = session;
    }

    fn emit(&self, event: AuthChangeEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
