//! Configuration for the Trade Pilot client
//!
//! Values come from the environment. The `VITE_`-prefixed names used by the
//! web build are honoured first, then the plain `SUPABASE_` names; when both
//! are missing the placeholder project is used so the client still starts.

use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

pub const PLACEHOLDER_URL: &str = "https://placeholder.supabase.co";
pub const PLACEHOLDER_ANON_KEY: &str = "placeholder-key";
pub const DEFAULT_FEEDBACK_TOKEN: &str = "A-toB4qf6TlycGzt55mrEgeMRHe";
pub const DEFAULT_SITE_ORIGIN: &str = "http://localhost:8080";
/// Cards shown per board column before "Load more".
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// The Supabase project URL
    pub supabase_url: Url,

    /// The public anon key
    pub anon_key: String,

    /// Per-request timeout
    pub request_timeout: Option<Duration>,

    /// Token for the embedded feedback widget
    pub feedback_token: String,

    /// Origin that confirmation emails redirect back to
    pub site_origin: String,

    /// Board column page size
    pub page_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: Url::parse(PLACEHOLDER_URL).expect("placeholder URL is valid"),
            anon_key: PLACEHOLDER_ANON_KEY.to_string(),
            request_timeout: Some(Duration::from_secs(30)),
            feedback_token: DEFAULT_FEEDBACK_TOKEN.to_string(),
            site_origin: DEFAULT_SITE_ORIGIN.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl AppConfig {
    /// Creates a configuration, validating the URL and key.
    pub fn new(url_str: &str, anon_key: &str) -> Result<Self> {
        let supabase_url = Url::parse(url_str)?;
        if anon_key.is_empty() {
            return Err(Error::Config("anon_key cannot be empty".to_string()));
        }
        Ok(Self {
            supabase_url,
            anon_key: anon_key.to_string(),
            ..Self::default()
        })
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`AppConfig::from_env`] but over any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| lookup(*name))
                .find(|value| !value.trim().is_empty())
        };

        let url = first(&["VITE_SUPABASE_URL", "SUPABASE_URL"])
            .unwrap_or_else(|| PLACEHOLDER_URL.to_string());
        let key = first(&["VITE_SUPABASE_ANON_KEY", "SUPABASE_ANON_KEY"])
            .unwrap_or_else(|| PLACEHOLDER_ANON_KEY.to_string());

        let mut config = Self::new(&url, &key)?;
        if let Some(token) = first(&["FEEDBACK_WIDGET_TOKEN"]) {
            config.feedback_token = token;
        }
        if let Some(origin) = first(&["SITE_ORIGIN"]) {
            config.site_origin = origin.trim_end_matches('/').to_string();
        }
        if let Some(secs) = first(&["REQUEST_TIMEOUT_SECS"]) {
            let secs: u64 = secs
                .parse()
                .map_err(|_| Error::Config(format!("REQUEST_TIMEOUT_SECS is not a number: {}", secs)))?;
            config.request_timeout = Some(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// True when no real project was configured.
    pub fn is_placeholder(&self) -> bool {
        self.supabase_url.as_str().trim_end_matches('/') == PLACEHOLDER_URL
            || self.anon_key == PLACEHOLDER_ANON_KEY
    }

    /// Base URL without the trailing slash `Url` adds.
    pub fn base_url(&self) -> &str {
        self.supabase_url.as_str().trim_end_matches('/')
    }

    /// Where confirmation emails send the user back to.
    pub fn email_redirect_url(&self) -> String {
        format!("{}/", self.site_origin.trim_end_matches('/'))
    }

    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    pub fn with_feedback_token(mut self, value: &str) -> Self {
        self.feedback_token = value.to_string();
        self
    }

    pub fn with_site_origin(mut self, value: &str) -> Self {
        self.site_origin = value.trim_end_matches('/').to_string();
        self
    }

    pub fn with_page_size(mut self, value: usize) -> Self {
        self.page_size = value.max(1);
        self
    }
}
