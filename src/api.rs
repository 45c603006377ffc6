//! Data access for the marketplace tables
//!
//! One function per query or mutation, each a single round-trip to
//! PostgREST. Failures carry the backend's message and are never retried.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tradepilot_auth::Auth;
use tradepilot_postgrest::PostgrestClient;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::models::{
    Bid, BidUpdate, Job, JobStatusUpdate, Lead, LeadUpdate, NewBid, NewJob, NewLead, NewProfile,
    Profile, ProfileUpdate,
};

pub const JOBS_TABLE: &str = "jobs";
pub const LEADS_TABLE: &str = "leads";
pub const BIDS_TABLE: &str = "bids";
pub const PROFILES_TABLE: &str = "profiles";

/// Leads are listed with their bids and each bid's author.
pub const LEADS_SELECT: &str = "*, bids(*, bidder:bid_by(*))";

#[async_trait]
pub trait MarketplaceApi: Send + Sync {
    async fn fetch_jobs(&self) -> Result<Vec<Job>>;

    /// Returns the inserted rows; empty when the backend sends none back.
    async fn post_jobs(&self, job: &NewJob) -> Result<Vec<Job>>;

    async fn update_job_status(&self, update: JobStatusUpdate) -> Result<()>;

    async fn fetch_leads(&self) -> Result<Vec<Lead>>;

    async fn post_leads(&self, lead: &NewLead) -> Result<Vec<Lead>>;

    async fn modify_leads(&self, update: &LeadUpdate) -> Result<()>;

    async fn add_bids(&self, bid: &NewBid) -> Result<Vec<Bid>>;

    async fn modify_bids(&self, update: &BidUpdate) -> Result<()>;
}

#[async_trait]
pub trait ProfileApi: Send + Sync {
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<Profile>>;

    async fn create_profile(&self, profile: &NewProfile) -> Result<Profile>;

    async fn update_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> Result<()>;
}

/// PostgREST-backed implementation of both traits.
#[derive(Clone)]
pub struct Api {
    base_url: String,
    anon_key: String,
    http_client: Client,
    auth: Arc<Auth>,
}

impl Api {
    pub fn new(config: &AppConfig, http_client: Client, auth: Arc<Auth>) -> Self {
        Self {
            base_url: config.base_url().to_string(),
            anon_key: config.anon_key.clone(),
            http_client,
            auth,
        }
    }

    /// A query builder for `table`, authorised as the signed-in user or,
    /// without a session, as the anonymous role.
    pub async fn from(&self, table: &str) -> Result<PostgrestClient> {
        let token = match self.auth.get_session().await {
            Some(session) => session.access_token,
            None => self.anon_key.clone(),
        };
        let client = PostgrestClient::new(
            &self.base_url,
            &self.anon_key,
            table,
            self.http_client.clone(),
        )?
        .with_auth(&token)?;
        Ok(client)
    }

    fn rows<T: DeserializeOwned>(value: Value) -> Result<Vec<T>> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Array(_) => Ok(serde_json::from_value(value)?),
            single => Ok(vec![serde_json::from_value(single)?]),
        }
    }
}

#[async_trait]
impl MarketplaceApi for Api {
    async fn fetch_jobs(&self) -> Result<Vec<Job>> {
        let jobs = self.from(JOBS_TABLE).await?.select("*").execute().await?;
        Ok(jobs)
    }

    async fn post_jobs(&self, job: &NewJob) -> Result<Vec<Job>> {
        let created = self.from(JOBS_TABLE).await?.insert(job).await?;
        tracing::info!(trade = %job.trade, status = %job.status, "job created");
        Self::rows(created)
    }

    async fn update_job_status(&self, update: JobStatusUpdate) -> Result<()> {
        self.from(JOBS_TABLE)
            .await?
            .eq("id", &update.job_id.to_string())
            .update(json!({ "status": update.status }))
            .await?;
        tracing::info!(job_id = update.job_id, status = %update.status, "job status updated");
        Ok(())
    }

    async fn fetch_leads(&self) -> Result<Vec<Lead>> {
        let leads = self
            .from(LEADS_TABLE)
            .await?
            .select(LEADS_SELECT)
            .execute()
            .await?;
        Ok(leads)
    }

    async fn post_leads(&self, lead: &NewLead) -> Result<Vec<Lead>> {
        let created = self.from(LEADS_TABLE).await?.insert([lead]).await?;
        tracing::info!(service = %lead.service, "lead created");
        Self::rows(created)
    }

    async fn modify_leads(&self, update: &LeadUpdate) -> Result<()> {
        self.from(LEADS_TABLE)
            .await?
            .eq("id", &update.id.to_string())
            .update(update)
            .await?;
        tracing::info!(lead_id = update.id, "lead updated");
        Ok(())
    }

    async fn add_bids(&self, bid: &NewBid) -> Result<Vec<Bid>> {
        let created = self.from(BIDS_TABLE).await?.insert(bid).await?;
        tracing::info!(lead_id = bid.leads_id, bid_by = %bid.bid_by, "bid placed");
        Self::rows(created)
    }

    async fn modify_bids(&self, update: &BidUpdate) -> Result<()> {
        self.from(BIDS_TABLE)
            .await?
            .eq("id", &update.id.to_string())
            .update(update)
            .await?;
        tracing::info!(bid_id = update.id, status = %update.status, "bid updated");
        Ok(())
    }
}

#[async_trait]
impl ProfileApi for Api {
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        let profile = self
            .from(PROFILES_TABLE)
            .await?
            .select("*")
            .eq("user_id", &user_id.to_string())
            .maybe_single()
            .await?;
        Ok(profile)
    }

    async fn create_profile(&self, profile: &NewProfile) -> Result<Profile> {
        let created = self.from(PROFILES_TABLE).await?.insert(profile).await?;
        tracing::info!(user_id = %profile.user_id, role = %profile.role, "profile created");
        Self::rows::<Profile>(created)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::backend("The new profile was not returned"))
    }

    async fn update_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> Result<()> {
        self.from(PROFILES_TABLE)
            .await?
            .eq("user_id", &user_id.to_string())
            .update(update)
            .await?;
        tracing::info!(%user_id, "profile updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BidStatus, JobStatus, Priority};
    use tradepilot_auth::AuthOptions;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn api_for(server: &MockServer) -> Api {
        let config = AppConfig::new(&server.uri(), "anon-key").unwrap();
        let http = Client::new();
        let auth = Arc::new(Auth::new(
            config.base_url(),
            &config.anon_key,
            http.clone(),
            AuthOptions::default(),
        ));
        Api::new(&config, http, auth)
    }

    #[tokio::test]
    async fn fetch_leads_embeds_bids_and_uses_anon_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/leads"))
            .and(query_param("select", "*,bids(*,bidder:bid_by(*))"))
            .and(header("apikey", "anon-key"))
            .and(header("Authorization", "Bearer anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 1, "name": "Sam", "priority": "low", "isApproved": false, "bids": [] }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let leads = api_for(&server).await.fetch_leads().await.unwrap();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].name, "Sam");
    }

    #[tokio::test]
    async fn update_job_status_patches_one_row() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/jobs"))
            .and(query_param("id", "eq.7"))
            .and(body_json(json!({ "status": "in-progress" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        api_for(&server)
            .await
            .update_job_status(JobStatusUpdate {
                job_id: 7,
                status: JobStatus::InProgress,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn modify_bids_sends_status_only() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/bids"))
            .and(query_param("id", "eq.3"))
            .and(body_json(json!({ "status": "approved" })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        api_for(&server)
            .await
            .modify_bids(&BidUpdate {
                id: 3,
                status: BidStatus::Approved,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn post_leads_wraps_row_in_array() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/leads"))
            .and(header("Prefer", "return=representation"))
            .and(body_json(json!([{
                "name": "Sam Smith",
                "service": "Roofer",
                "location": "York",
                "value": "1200",
                "phone": "",
                "email": "sam@example.com",
                "priority": "medium"
            }])))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([
                { "id": 9, "name": "Sam Smith", "value": "1200", "priority": "medium" }
            ])))
            .mount(&server)
            .await;

        let created = api_for(&server)
            .await
            .post_leads(&NewLead {
                name: "Sam Smith".to_string(),
                service: "Roofer".to_string(),
                location: "York".to_string(),
                value: "1200".to_string(),
                phone: String::new(),
                email: "sam@example.com".to_string(),
                priority: Priority::Medium,
            })
            .await
            .unwrap();
        assert_eq!(created[0].id, 9);
        assert_eq!(created[0].value, Some(1200.0));
    }

    #[tokio::test]
    async fn backend_message_is_preserved() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/bids"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "code": "42501",
                "message": "new row violates row-level security policy for table \"bids\"",
                "details": null,
                "hint": null
            })))
            .mount(&server)
            .await;

        let err = api_for(&server)
            .await
            .add_bids(&NewBid {
                leads_id: 1,
                proposed_value: 100.0,
                bid_by: Uuid::new_v4(),
                available: Default::default(),
            })
            .await
            .unwrap_err();
        assert_eq!(
            err.message(),
            "new row violates row-level security policy for table \"bids\""
        );
    }

    #[tokio::test]
    async fn fetch_profile_by_user_id() {
        let server = MockServer::start().await;
        let user_id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .and(query_param("user_id", format!("eq.{}", user_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let profile = api_for(&server).await.fetch_profile(user_id).await.unwrap();
        assert!(profile.is_none());
    }
}
