//! Signed-in user state
//!
//! [`SessionManager`] tracks the auth session and the matching profile row.
//! The first time a user signs in without a profile one is created from
//! the names and role they registered with, read from the account's
//! metadata. Sign-up, sign-in and sign-out each report a toast.

use serde_json::json;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tradepilot_auth::{Auth, AuthChangeEvent, Session, SignUpOptions, SignUpResponse, User};

use crate::api::ProfileApi;
use crate::error::{Error, Result};
use crate::models::{NewProfile, Profile, ProfileUpdate, Role};
use crate::notify::Notifier;

/// Names and role captured by the registration forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpProfile {
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl SignUpProfile {
    /// Metadata stored on the auth account and read back on first sign-in.
    pub fn metadata(&self) -> serde_json::Value {
        json!({
            "firstName": self.first_name,
            "lastName": self.last_name,
            "role": self.role,
        })
    }

    /// Reads what [`SignUpProfile::metadata`] stored. Accounts created
    /// without a role are customers.
    pub fn from_user(user: &User) -> Self {
        let role = user
            .metadata_str("role")
            .and_then(|r| r.parse().ok())
            .unwrap_or_default();
        Self {
            first_name: user.metadata_str("firstName").unwrap_or_default().to_string(),
            last_name: user.metadata_str("lastName").unwrap_or_default().to_string(),
            role,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub session: Option<Session>,
    pub profile: Option<Profile>,
    pub loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            session: None,
            profile: None,
            loading: true,
        }
    }
}

pub struct SessionManager {
    auth: Arc<Auth>,
    profiles: Arc<dyn ProfileApi>,
    notifier: Notifier,
    email_redirect_to: Option<String>,
    state: Arc<RwLock<SessionState>>,
    // Held across fetch-or-create so one account never gets two profile rows.
    profile_gate: Mutex<()>,
}

impl SessionManager {
    pub fn new(auth: Arc<Auth>, profiles: Arc<dyn ProfileApi>, notifier: Notifier) -> Self {
        Self {
            auth,
            profiles,
            notifier,
            email_redirect_to: None,
            state: Arc::new(RwLock::new(SessionState::default())),
            profile_gate: Mutex::new(()),
        }
    }

    /// Where confirmation emails send new users back to.
    pub fn with_email_redirect(mut self, url: &str) -> Self {
        self.email_redirect_to = Some(url.to_string());
        self
    }

    pub fn auth(&self) -> &Arc<Auth> {
        &self.auth
    }

    /// Picks up an existing session and its profile, then stops loading.
    pub async fn initialize(&self) {
        let session = self.auth.get_session().await;
        let _gate = self.profile_gate.lock().await;
        let profile = match &session {
            Some(session) => self.load_profile(&session.user).await,
            None => None,
        };

        let mut state = self.state.write().await;
        state.session = session;
        state.profile = profile;
        state.loading = false;
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthChangeEvent> {
        self.auth.on_auth_state_change()
    }

    pub async fn handle_auth_change(&self, event: AuthChangeEvent) {
        match event {
            AuthChangeEvent::SignedIn(session) => {
                // The listener and the direct caller may both apply this event.
                let _gate = self.profile_gate.lock().await;
                let known = self
                    .state
                    .read()
                    .await
                    .profile
                    .as_ref()
                    .filter(|p| p.user_id == session.user.id)
                    .cloned();
                let profile = match known {
                    Some(profile) => Some(profile),
                    None => self.load_profile(&session.user).await,
                };

                let mut state = self.state.write().await;
                state.session = Some(session);
                state.profile = profile;
                state.loading = false;
            }
            AuthChangeEvent::SignedOut => {
                let mut state = self.state.write().await;
                state.session = None;
                state.profile = None;
                state.loading = false;
            }
            AuthChangeEvent::UserUpdated(user) => {
                let _gate = self.profile_gate.lock().await;
                let profile = self.load_profile(&user).await;
                let mut state = self.state.write().await;
                if let Some(session) = state.session.as_mut() {
                    session.user = user;
                }
                state.profile = profile;
                state.loading = false;
            }
        }
    }

    /// Re-reads the signed-in user from the auth service and reloads the
    /// profile for it.
    pub async fn refresh_user(&self) -> Result<User> {
        let user = self.auth.get_user().await?;
        self.handle_auth_change(AuthChangeEvent::UserUpdated(user.clone()))
            .await;
        Ok(user)
    }

    /// Applies auth changes in the background until the auth client is dropped.
    pub fn spawn_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.subscribe();
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => manager.handle_auth_change(event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "auth listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Returns the user's profile, creating it on first use.
    pub async fn fetch_or_create_profile(&self, user: &User) -> Result<Profile> {
        if let Some(profile) = self.profiles.fetch_profile(user.id).await? {
            return Ok(profile);
        }

        let registered = SignUpProfile::from_user(user);
        tracing::info!(user_id = %user.id, role = %registered.role, "creating missing profile");
        let new_profile = NewProfile {
            user_id: user.id,
            email: user.email.clone(),
            first_name: registered.first_name,
            last_name: registered.last_name,
            role: registered.role,
        };
        self.profiles.create_profile(&new_profile).await
    }

    // Profile problems never block the session itself.
    async fn load_profile(&self, user: &User) -> Option<Profile> {
        match self.fetch_or_create_profile(user).await {
            Ok(profile) => Some(profile),
            Err(err) => {
                tracing::error!(user_id = %user.id, error = %err, "error fetching/creating profile");
                None
            }
        }
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        profile: SignUpProfile,
    ) -> Result<SignUpResponse> {
        self.set_loading(true).await;
        let options = SignUpOptions {
            email_redirect_to: self.email_redirect_to.clone(),
            data: Some(profile.metadata()),
        };
        let result = self.auth.sign_up(email, password, options).await;

        let outcome = match result {
            Ok(response) => {
                if let SignUpResponse::Session(session) = &response {
                    self.handle_auth_change(AuthChangeEvent::SignedIn(session.clone()))
                        .await;
                }
                self.notifier.success(
                    "Account created successfully",
                    Some("Please check your email to verify your account."),
                );
                Ok(response)
            }
            Err(err) => {
                self.notifier.error("Sign up failed", Some(&err.message()));
                Err(Error::from(err))
            }
        };
        self.set_loading(false).await;
        outcome
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        self.set_loading(true).await;
        let outcome = match self.auth.sign_in_with_password(email, password).await {
            Ok(session) => {
                self.handle_auth_change(AuthChangeEvent::SignedIn(session.clone()))
                    .await;
                self.notifier
                    .success("Signed in successfully", Some("Welcome back!"));
                Ok(session)
            }
            Err(err) => {
                self.notifier.error("Sign in failed", Some(&err.message()));
                Err(Error::from(err))
            }
        };
        self.set_loading(false).await;
        outcome
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.set_loading(true).await;
        let outcome = match self.auth.sign_out().await {
            Ok(()) => {
                self.handle_auth_change(AuthChangeEvent::SignedOut).await;
                self.notifier
                    .success("Signed out successfully", Some("See you next time!"));
                Ok(())
            }
            Err(err) => {
                self.notifier.error("Sign out failed", Some(&err.message()));
                Err(Error::from(err))
            }
        };
        self.set_loading(false).await;
        outcome
    }

    /// Saves the settings form and keeps the cached profile in step.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile> {
        let user = self.user().await.ok_or(Error::NotSignedIn)?;
        self.profiles.update_profile(user.id, update).await?;

        let refreshed = self
            .profiles
            .fetch_profile(user.id)
            .await?
            .ok_or_else(|| Error::backend("Profile not found"))?;
        self.state.write().await.profile = Some(refreshed.clone());
        Ok(refreshed)
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn user(&self) -> Option<User> {
        self.state
            .read()
            .await
            .session
            .as_ref()
            .map(|s| s.user.clone())
    }

    pub async fn profile(&self) -> Option<Profile> {
        self.state.read().await.profile.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.session.is_some()
    }

    pub async fn is_customer(&self) -> bool {
        self.role().await == Some(Role::Customer)
    }

    pub async fn is_trade(&self) -> bool {
        self.role().await == Some(Role::Trade)
    }

    pub async fn role(&self) -> Option<Role> {
        self.state.read().await.profile.as_ref().map(|p| p.role)
    }

    async fn set_loading(&self, loading: bool) {
        self.state.write().await.loading = loading;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Api;
    use crate::config::AppConfig;
    use reqwest::Client;
    use tradepilot_auth::AuthOptions;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const USER_ID: &str = "5f0c8a7e-2b6d-4e8f-9a1b-3c4d5e6f7a8b";
    const PROFILE_ID: &str = "9b2e4c6a-1d3f-4a5b-8c7d-6e5f4a3b2c1d";

    fn manager(server: &MockServer, notifier: Notifier) -> SessionManager {
        let config = AppConfig::new(&server.uri(), "anon-key").unwrap();
        let http = Client::new();
        let auth = Arc::new(Auth::new(
            config.base_url(),
            &config.anon_key,
            http.clone(),
            AuthOptions::default(),
        ));
        let api = Arc::new(Api::new(&config, http, Arc::clone(&auth)));
        SessionManager::new(auth, api, notifier)
    }

    fn token_body(metadata: serde_json::Value) -> serde_json::Value {
        json!({
            "access_token": "jwt-token",
            "refresh_token": "refresh",
            "expires_in": 3600,
            "token_type": "bearer",
            "user": {
                "id": USER_ID,
                "email": "pat@example.com",
                "user_metadata": metadata
            }
        })
    }

    fn profile_row(role: &str) -> serde_json::Value {
        json!({
            "id": PROFILE_ID,
            "user_id": USER_ID,
            "email": "pat@example.com",
            "first_name": "Pat",
            "last_name": "Pipes",
            "role": role
        })
    }

    #[tokio::test]
    async fn starts_loading_and_initialize_without_session_clears_it() {
        let server = MockServer::start().await;
        let manager = manager(&server, Notifier::new());
        assert!(manager.is_loading().await);

        manager.initialize().await;
        assert!(!manager.is_loading().await);
        assert!(!manager.is_authenticated().await);
        assert!(!manager.is_customer().await);
    }

    #[tokio::test]
    async fn first_sign_in_creates_profile_with_registered_role() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body(json!({
                "firstName": "Pat",
                "lastName": "Pipes",
                "role": "trade"
            }))))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/profiles"))
            .and(body_json(json!({
                "user_id": USER_ID,
                "email": "pat@example.com",
                "first_name": "Pat",
                "last_name": "Pipes",
                "role": "trade"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([profile_row("trade")])))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = Notifier::new();
        let manager = manager(&server, notifier.clone());
        manager.sign_in("pat@example.com", "secret").await.unwrap();

        assert!(manager.is_authenticated().await);
        assert!(manager.is_trade().await);
        assert!(!manager.is_loading().await);
        let toast = notifier.last().unwrap();
        assert_eq!(toast.title, "Signed in successfully");
        assert_eq!(toast.description.as_deref(), Some("Welcome back!"));
    }

    #[test]
    fn missing_role_defaults_to_customer() {
        let user: User = serde_json::from_value(json!({
            "id": USER_ID,
            "email": "pat@example.com",
            "user_metadata": {}
        }))
        .unwrap();
        let registered = SignUpProfile::from_user(&user);
        assert_eq!(registered.role, Role::Customer);
        assert_eq!(registered.first_name, "");
    }

    #[tokio::test]
    async fn failed_sign_in_reports_backend_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let notifier = Notifier::new();
        let manager = manager(&server, notifier.clone());
        let err = manager.sign_in("pat@example.com", "wrong").await.unwrap_err();

        assert_eq!(err.message(), "Invalid login credentials");
        let toast = notifier.last().unwrap();
        assert_eq!(toast.title, "Sign in failed");
        assert!(toast.is_error());
        assert!(!manager.is_authenticated().await);
        assert!(!manager.is_loading().await);
    }

    #[tokio::test]
    async fn sign_up_sends_role_in_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .and(body_json(json!({
                "email": "new@example.com",
                "password": "hunter22",
                "data": { "firstName": "Ann", "lastName": "Other", "role": "trade" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": USER_ID,
                "email": "new@example.com",
                "user_metadata": { "firstName": "Ann", "lastName": "Other", "role": "trade" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = Notifier::new();
        let manager = manager(&server, notifier.clone());
        let response = manager
            .sign_up(
                "new@example.com",
                "hunter22",
                SignUpProfile {
                    first_name: "Ann".to_string(),
                    last_name: "Other".to_string(),
                    role: Role::Trade,
                },
            )
            .await
            .unwrap();

        assert!(matches!(response, SignUpResponse::PendingConfirmation(_)));
        assert!(!manager.is_authenticated().await);
        assert_eq!(notifier.last().unwrap().title, "Account created successfully");
    }

    #[tokio::test]
    async fn sign_out_clears_profile() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body(json!({}))))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([profile_row("customer")])),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let notifier = Notifier::new();
        let manager = manager(&server, notifier.clone());
        manager.sign_in("pat@example.com", "secret").await.unwrap();
        assert!(manager.is_customer().await);

        manager.sign_out().await.unwrap();
        assert!(!manager.is_authenticated().await);
        assert!(manager.profile().await.is_none());
        assert_eq!(notifier.last().unwrap().title, "Signed out successfully");
    }

    #[tokio::test]
    async fn refresh_user_updates_session_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body(json!({}))))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([profile_row("trade")])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": USER_ID,
                "email": "pat.pipes@example.com"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager(&server, Notifier::new());
        manager.sign_in("pat@example.com", "secret").await.unwrap();

        let user = manager.refresh_user().await.unwrap();
        assert_eq!(user.email.as_deref(), Some("pat.pipes@example.com"));
        assert_eq!(
            manager.user().await.and_then(|u| u.email),
            Some("pat.pipes@example.com".to_string())
        );
        assert!(manager.is_trade().await);
    }

    #[tokio::test]
    async fn concurrent_sign_in_events_create_one_profile() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(std::time::Duration::from_millis(50)),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/profiles"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([profile_row("trade")])))
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager(&server, Notifier::new());
        let session: Session = serde_json::from_value(token_body(json!({ "role": "trade" }))).unwrap();
        tokio::join!(
            manager.handle_auth_change(AuthChangeEvent::SignedIn(session.clone())),
            manager.handle_auth_change(AuthChangeEvent::SignedIn(session)),
        );

        assert!(manager.is_trade().await);
        server.verify().await;
    }
}
