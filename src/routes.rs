//! Route table and access guards

use std::fmt;
use url::form_urlencoded;

use crate::models::Role;
use crate::session::SessionState;

/// Which audience the login page is addressed to (`/login?type=trade`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginType {
    #[default]
    Customer,
    Trade,
}

impl LoginType {
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("trade") => LoginType::Trade,
            _ => LoginType::Customer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Dashboard,
    Plumbers,
    Electricians,
    Builders,
    Roofers,
    FindTradespeople,
    TradesCrm,
    ReviewsReputation,
    Support,
    Trades,
    TradeJoin,
    CustomerJoin,
    Login { login_type: LoginType },
    Profile,
    VerifyEmail { email: Option<String> },
    Blog,
    BlogPost { id: String },
    NotFound(String),
}

impl Route {
    /// Resolves a path with optional query string. Unknown paths map to
    /// [`Route::NotFound`].
    pub fn parse(location: &str) -> Route {
        let (path, query) = match location.split_once('?') {
            Some((path, query)) => (path, query),
            None => (location, ""),
        };
        let param = |name: &str| {
            form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
        };

        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Route::Home,
            "/dashboard" => Route::Dashboard,
            "/plumbers" => Route::Plumbers,
            "/electricians" => Route::Electricians,
            "/builders" => Route::Builders,
            "/roofers" => Route::Roofers,
            "/find-tradespeople" => Route::FindTradespeople,
            "/trades-crm" => Route::TradesCrm,
            "/reviews-reputation" => Route::ReviewsReputation,
            "/support" => Route::Support,
            "/trades" => Route::Trades,
            "/trades/join" => Route::TradeJoin,
            "/join" => Route::CustomerJoin,
            "/login" => Route::Login {
                login_type: LoginType::from_query(param("type").as_deref()),
            },
            "/profile" => Route::Profile,
            "/verify-email" => Route::VerifyEmail {
                email: param("email").filter(|e| !e.is_empty()),
            },
            "/blog" => Route::Blog,
            other => match other.strip_prefix("/blog/") {
                Some(id) if !id.is_empty() && !id.contains('/') => Route::BlogPost { id: id.to_string() },
                _ => Route::NotFound(path.to_string()),
            },
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::Plumbers => "/plumbers".to_string(),
            Route::Electricians => "/electricians".to_string(),
            Route::Builders => "/builders".to_string(),
            Route::Roofers => "/roofers".to_string(),
            Route::FindTradespeople => "/find-tradespeople".to_string(),
            Route::TradesCrm => "/trades-crm".to_string(),
            Route::ReviewsReputation => "/reviews-reputation".to_string(),
            Route::Support => "/support".to_string(),
            Route::Trades => "/trades".to_string(),
            Route::TradeJoin => "/trades/join".to_string(),
            Route::CustomerJoin => "/join".to_string(),
            Route::Login { login_type } => match login_type {
                LoginType::Customer => "/login".to_string(),
                LoginType::Trade => "/login?type=trade".to_string(),
            },
            Route::Profile => "/profile".to_string(),
            Route::VerifyEmail { email: None } => "/verify-email".to_string(),
            Route::VerifyEmail { email: Some(email) } => {
                let query: String = form_urlencoded::Serializer::new(String::new())
                    .append_pair("email", email)
                    .finish();
                format!("/verify-email?{}", query)
            }
            Route::Blog => "/blog".to_string(),
            Route::BlogPost { id } => format!("/blog/{}", id),
            Route::NotFound(path) => path.clone(),
        }
    }

    pub fn login() -> Route {
        Route::Login {
            login_type: LoginType::Customer,
        }
    }

    pub fn requires_session(&self) -> bool {
        matches!(self, Route::Dashboard | Route::TradesCrm | Route::Profile)
    }

    pub fn required_role(&self) -> Option<Role> {
        match self {
            Route::TradesCrm => Some(Role::Trade),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Result of checking a route against the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Session state is still being restored.
    Loading,
    Allowed,
    Redirect(Route),
}

/// Who is asking; built from the session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewer {
    pub loading: bool,
    pub authenticated: bool,
    pub role: Option<Role>,
}

impl From<&SessionState> for Viewer {
    fn from(state: &SessionState) -> Self {
        Self {
            loading: state.loading,
            authenticated: state.session.is_some(),
            role: state.profile.as_ref().map(|p| p.role),
        }
    }
}

/// Signed-out users are sent to the login page; the trade CRM sends
/// everyone who is not a trade to the customer dashboard.
pub fn check_access(route: &Route, viewer: Viewer) -> Access {
    if !route.requires_session() {
        return Access::Allowed;
    }
    if viewer.loading {
        return Access::Loading;
    }
    if !viewer.authenticated {
        return Access::Redirect(Route::login());
    }
    match route.required_role() {
        Some(role) if viewer.role != Some(role) => Access::Redirect(Route::Dashboard),
        _ => Access::Allowed,
    }
}

/// Where a fresh sign-in lands.
pub fn post_login_redirect(role: Option<Role>) -> Route {
    match role {
        Some(Role::Trade) => Route::TradesCrm,
        _ => Route::FindTradespeople,
    }
}
