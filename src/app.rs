//! Application bootstrap
//!
//! [`TradePilot`] wires one HTTP client, the auth client, the data API and
//! the session manager together and hands out the screen controllers.

use reqwest::Client;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tradepilot_auth::{Auth, AuthOptions};

use crate::api::Api;
use crate::board::JobBoard;
use crate::config::AppConfig;
use crate::dashboard::{CustomerDashboard, TradeCrm};
use crate::error::Result;
use crate::forms::LeadForm;
use crate::leads::TradeLeads;
use crate::notify::Notifier;
use crate::pages::VerifyEmailPage;
use crate::session::SessionManager;

/// The embedded user-feedback widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackWidget {
    token: String,
}

impl FeedbackWidget {
    pub fn init(token: &str) -> Self {
        tracing::debug!("feedback widget initialised");
        Self {
            token: token.to_string(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

pub struct TradePilot {
    pub config: AppConfig,
    pub http_client: Client,
    pub auth: Arc<Auth>,
    pub api: Arc<Api>,
    pub session: Arc<SessionManager>,
    pub notifier: Notifier,
    pub feedback: FeedbackWidget,
}

impl TradePilot {
    pub fn new(config: AppConfig) -> Result<Self> {
        if config.is_placeholder() {
            tracing::warn!(
                url = %config.base_url(),
                "no Supabase project configured, using placeholder credentials"
            );
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let auth = Arc::new(Auth::new(
            config.base_url(),
            &config.anon_key,
            http_client.clone(),
            AuthOptions::default(),
        ));
        let api = Arc::new(Api::new(&config, http_client.clone(), Arc::clone(&auth)));
        let notifier = Notifier::new();
        let session = Arc::new(
            SessionManager::new(Arc::clone(&auth), api.clone(), notifier.clone())
                .with_email_redirect(&config.email_redirect_url()),
        );
        let feedback = FeedbackWidget::init(&config.feedback_token);

        Ok(Self {
            config,
            http_client,
            auth,
            api,
            session,
            notifier,
            feedback,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(AppConfig::from_env()?)
    }

    /// Restores any session and starts following auth changes.
    pub async fn start(&self) -> JoinHandle<()> {
        self.session.initialize().await;
        self.session.spawn_listener()
    }

    pub fn job_board(&self) -> JobBoard {
        JobBoard::new(self.api.clone(), self.notifier.clone(), self.config.page_size)
    }

    pub fn trade_leads(&self) -> TradeLeads {
        TradeLeads::new(self.api.clone(), self.notifier.clone())
    }

    pub fn customer_dashboard(&self) -> CustomerDashboard {
        CustomerDashboard::new(self.api.clone(), self.notifier.clone())
    }

    pub fn trade_crm(&self) -> TradeCrm {
        TradeCrm::new(self.api.clone())
    }

    pub async fn lead_form(&self) -> LeadForm {
        LeadForm::for_profile(self.session.profile().await.as_ref())
    }

    pub fn verify_email_page(&self, email: Option<&str>) -> VerifyEmailPage {
        VerifyEmailPage::open(email, self.notifier.clone())
    }
}
