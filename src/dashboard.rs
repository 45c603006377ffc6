//! Customer dashboard and trade CRM overview
//!
//! Accepting a bid touches three rows: the lead is marked approved, the bid
//! is marked approved and a job is created for the trade. The steps run in
//! that order; when one fails the ones already done are undone in reverse
//! so a lead is never left approved without its job.

use std::sync::Arc;

use crate::api::MarketplaceApi;
use crate::error::{Error, Result};
use crate::models::{
    Bid, BidStatus, BidUpdate, Job, JobStatus, Lead, LeadUpdate, NewJob, Priority, RowId,
};
use crate::notify::Notifier;

pub const STEP_APPROVE_LEAD: &str = "approve lead";
pub const STEP_APPROVE_BID: &str = "approve bid";
pub const STEP_CREATE_JOB: &str = "create job";

/// The job a trade gets when their bid is accepted.
pub fn job_for_accepted_bid(lead: &Lead, bid: &Bid) -> NewJob {
    NewJob {
        trade: lead.service.clone().unwrap_or_default(),
        location: lead.location.clone().unwrap_or_default(),
        rate: bid.proposed_value.unwrap_or_default(),
        tags: None,
        availability: None,
        status: JobStatus::Todo,
        priority: Priority::Medium,
        leads_id: Some(lead.id),
        trader_id: bid.bid_by,
    }
}

/// Accepts `bid` on `lead`, returning the created job rows.
pub async fn accept_bid(api: &dyn MarketplaceApi, lead: &Lead, bid: &Bid) -> Result<Vec<Job>> {
    if bid.leads_id != lead.id {
        return Err(Error::validation("That proposal belongs to another lead"));
    }
    if lead.is_approved {
        return Err(Error::validation("A proposal has already been accepted for this lead"));
    }
    if bid.status.is_settled() {
        return Err(Error::validation(format!(
            "This proposal is already {}",
            bid.status.label().to_lowercase()
        )));
    }

    if let Err(err) = api.modify_leads(&LeadUpdate::approved(lead.id, true)).await {
        return Err(saga_error(STEP_APPROVE_LEAD, err, true));
    }

    let approve = BidUpdate {
        id: bid.id,
        status: BidStatus::Approved,
    };
    if let Err(err) = api.modify_bids(&approve).await {
        let compensated = unapprove_lead(api, lead.id).await;
        return Err(saga_error(STEP_APPROVE_BID, err, compensated));
    }

    match api.post_jobs(&job_for_accepted_bid(lead, bid)).await {
        Ok(jobs) => {
            tracing::info!(lead_id = lead.id, bid_id = bid.id, "proposal accepted");
            Ok(jobs)
        }
        Err(err) => {
            let reset = BidUpdate {
                id: bid.id,
                status: BidStatus::Pending,
            };
            let bid_reset = match api.modify_bids(&reset).await {
                Ok(()) => true,
                Err(undo) => {
                    tracing::warn!(bid_id = bid.id, error = %undo, "could not reset bid");
                    false
                }
            };
            let lead_reset = unapprove_lead(api, lead.id).await;
            Err(saga_error(STEP_CREATE_JOB, err, bid_reset && lead_reset))
        }
    }
}

async fn unapprove_lead(api: &dyn MarketplaceApi, lead_id: RowId) -> bool {
    match api.modify_leads(&LeadUpdate::approved(lead_id, false)).await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(lead_id, error = %err, "could not reset lead approval");
            false
        }
    }
}

fn saga_error(step: &'static str, err: Error, compensated: bool) -> Error {
    tracing::warn!(step, compensated, error = %err, "accepting proposal failed");
    Error::Saga {
        step,
        message: err.message(),
        compensated,
    }
}

/// Accept button state for a bid on the customer's lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidAction {
    pub label: &'static str,
    pub enabled: bool,
}

impl BidAction {
    /// `None` once the lead is approved and this was not the accepted bid.
    pub fn for_bid(lead: &Lead, bid: &Bid) -> Option<Self> {
        match (lead.is_approved, bid.status) {
            (true, BidStatus::Approved) => Some(Self {
                label: "Proposal Accepted",
                enabled: false,
            }),
            (true, _) => None,
            (false, BidStatus::Approved) => Some(Self {
                label: "Accepted",
                enabled: false,
            }),
            (false, status) => Some(Self {
                label: "Accept Proposal",
                enabled: !status.is_settled(),
            }),
        }
    }
}

pub struct CustomerDashboard {
    api: Arc<dyn MarketplaceApi>,
    notifier: Notifier,
    leads: Vec<Lead>,
}

impl CustomerDashboard {
    pub fn new(api: Arc<dyn MarketplaceApi>, notifier: Notifier) -> Self {
        Self {
            api,
            notifier,
            leads: Vec::new(),
        }
    }

    pub async fn refresh(&mut self) -> Result<&[Lead]> {
        self.leads = self.api.fetch_leads().await?;
        Ok(&self.leads)
    }

    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    fn find(&self, lead_id: RowId, bid_id: RowId) -> Result<(Lead, Bid)> {
        let lead = self
            .leads
            .iter()
            .find(|l| l.id == lead_id)
            .ok_or_else(|| Error::validation(format!("Lead {} not found", lead_id)))?;
        let bid = lead
            .bid(bid_id)
            .ok_or_else(|| Error::validation(format!("Proposal {} not found", bid_id)))?;
        Ok((lead.clone(), bid.clone()))
    }

    pub async fn accept(&mut self, lead_id: RowId, bid_id: RowId) -> Result<Vec<Job>> {
        let (lead, bid) = self.find(lead_id, bid_id)?;
        match accept_bid(self.api.as_ref(), &lead, &bid).await {
            Ok(jobs) => {
                self.notifier.success("Proposal accepted successfully", None);
                self.refresh().await?;
                Ok(jobs)
            }
            Err(err) => {
                let title = match &err {
                    Error::Saga { step, .. } if *step == STEP_APPROVE_LEAD => "Failed to accept",
                    Error::Saga { step, .. } if *step == STEP_APPROVE_BID => "Failed to modify bid",
                    Error::Saga { .. } => "Error! Try again",
                    _ => {
                        self.notifier.error(&err.message(), None);
                        return Err(err);
                    }
                };
                self.notifier.error(title, Some(&err.message()));
                // Compensation may have run; show what the backend now holds.
                if let Err(refresh) = self.refresh().await {
                    tracing::warn!(error = %refresh, "refresh after failed accept");
                }
                Err(err)
            }
        }
    }

    pub async fn reject(&mut self, lead_id: RowId, bid_id: RowId) -> Result<()> {
        let (_, bid) = self.find(lead_id, bid_id)?;
        if bid.status.is_settled() {
            return Err(Error::validation(format!(
                "This proposal is already {}",
                bid.status.label().to_lowercase()
            )));
        }
        let update = BidUpdate {
            id: bid_id,
            status: BidStatus::Rejected,
        };
        if let Err(err) = self.api.modify_bids(&update).await {
            self.notifier.error("Failed to modify bid", Some(&err.message()));
            return Err(err);
        }
        self.refresh().await?;
        Ok(())
    }
}

/// Headline numbers on the trade CRM dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CrmStats {
    pub active_leads: usize,
    pub jobs: usize,
    /// Whole-number percentage of jobs marked complete.
    pub completion_rate: u32,
}

impl CrmStats {
    pub fn compute(leads: &[Lead], jobs: &[Job]) -> Self {
        let complete = jobs
            .iter()
            .filter(|job| job.status == JobStatus::Complete)
            .count();
        let completion_rate = if jobs.is_empty() {
            0
        } else {
            (complete as f64 / jobs.len() as f64 * 100.0).round() as u32
        };
        Self {
            active_leads: leads.len(),
            jobs: jobs.len(),
            completion_rate,
        }
    }
}

/// The trade's CRM overview.
pub struct TradeCrm {
    api: Arc<dyn MarketplaceApi>,
    leads: Vec<Lead>,
    jobs: Vec<Job>,
}

impl TradeCrm {
    pub const RECENT_LEADS: usize = 3;

    pub fn new(api: Arc<dyn MarketplaceApi>) -> Self {
        Self {
            api,
            leads: Vec::new(),
            jobs: Vec::new(),
        }
    }

    pub async fn refresh(&mut self) -> Result<()> {
        let (leads, jobs) = tokio::try_join!(self.api.fetch_leads(), self.api.fetch_jobs())?;
        self.leads = leads;
        self.jobs = jobs;
        Ok(())
    }

    pub fn stats(&self) -> CrmStats {
        CrmStats::compute(&self.leads, &self.jobs)
    }

    pub fn recent_leads(&self) -> &[Lead] {
        &self.leads[..self.leads.len().min(Self::RECENT_LEADS)]
    }
}
