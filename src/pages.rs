//! Login and email verification pages

use crate::error::Result;
use crate::notify::Notifier;
use crate::routes::{post_login_redirect, LoginType, Route};
use crate::session::SessionManager;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginPage {
    pub login_type: LoginType,
    pub email: String,
    pub password: String,
}

impl LoginPage {
    pub fn new(login_type: LoginType) -> Self {
        Self {
            login_type,
            ..Self::default()
        }
    }

    /// Builds the page for a `/login?type=...` location.
    pub fn for_route(route: &Route) -> Self {
        match route {
            Route::Login { login_type } => Self::new(*login_type),
            _ => Self::default(),
        }
    }

    pub fn title(&self) -> &'static str {
        match self.login_type {
            LoginType::Trade => "Trade Login",
            LoginType::Customer => "Customer Login",
        }
    }

    pub fn subtitle(&self) -> &'static str {
        match self.login_type {
            LoginType::Trade => "Access your trade dashboard",
            LoginType::Customer => "Find trusted tradespeople",
        }
    }

    /// The "Sign up" link under the form.
    pub fn sign_up_route(&self) -> Route {
        match self.login_type {
            LoginType::Trade => Route::TradeJoin,
            LoginType::Customer => Route::CustomerJoin,
        }
    }

    /// Signs in and returns where to go once the profile is loaded. Blank
    /// credentials do nothing.
    pub async fn submit(&self, session: &SessionManager) -> Result<Option<Route>> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Ok(None);
        }
        session.sign_in(self.email.trim(), &self.password).await?;
        Ok(session
            .profile()
            .await
            .map(|profile| post_login_redirect(Some(profile.role))))
    }
}

/// "Verify your email" page shown after customer sign-up.
#[derive(Debug, Clone)]
pub struct VerifyEmailPage {
    email: String,
    notifier: Notifier,
}

impl VerifyEmailPage {
    /// Opening the page with an address reminds the user to check spam.
    pub fn open(email: Option<&str>, notifier: Notifier) -> Self {
        let email = email.unwrap_or_default().trim().to_string();
        if !email.is_empty() {
            notifier.success(
                "Check your inbox",
                Some(&format!(
                    "We've sent a verification link to {}. Check spam/junk if you don't see it.",
                    email
                )),
            );
        }
        Self { email, notifier }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub async fn resend(&self, session: &SessionManager, redirect_to: &str) -> Result<()> {
        match session
            .auth()
            .resend_signup(&self.email, Some(redirect_to))
            .await
        {
            Ok(()) => {
                self.notifier
                    .success("Email sent", Some("Verification link resent."));
                Ok(())
            }
            Err(err) => {
                self.notifier
                    .error("Could not resend", Some(&err.message()));
                Err(err.into())
            }
        }
    }
}
