//! In-memory [`MarketplaceApi`] for controller tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::api::MarketplaceApi;
use crate::error::{Error, Result};
use crate::models::{
    Bid, BidStatus, BidUpdate, Job, JobStatusUpdate, Lead, LeadUpdate, NewBid, NewJob, NewLead,
    RowId,
};
use crate::forms::parse_amount;

#[derive(Default)]
struct State {
    jobs: Vec<Job>,
    leads: Vec<Lead>,
    next_id: RowId,
    calls: Vec<&'static str>,
    status_updates: Vec<JobStatusUpdate>,
    lead_updates: Vec<LeadUpdate>,
    bid_updates: Vec<BidUpdate>,
    fail_next: Option<String>,
    // Operation -> (calls still allowed to succeed, failure message).
    failures: HashMap<&'static str, (usize, String)>,
}

#[derive(Default)]
pub struct FakeMarketplace {
    state: Mutex<State>,
}

impl FakeMarketplace {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn set_jobs(&self, jobs: Vec<Job>) {
        self.lock().jobs = jobs;
    }

    pub fn set_leads(&self, leads: Vec<Lead>) {
        self.lock().leads = leads;
    }

    pub fn jobs(&self) -> Vec<Job> {
        self.lock().jobs.clone()
    }

    pub fn leads(&self) -> Vec<Lead> {
        self.lock().leads.clone()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    pub fn status_updates(&self) -> Vec<JobStatusUpdate> {
        self.lock().status_updates.clone()
    }

    pub fn lead_updates(&self) -> Vec<LeadUpdate> {
        self.lock().lead_updates.clone()
    }

    pub fn bid_updates(&self) -> Vec<BidUpdate> {
        self.lock().bid_updates.clone()
    }

    /// The next call of any kind fails with `message`.
    pub fn fail_next(&self, message: &str) {
        self.lock().fail_next = Some(message.to_string());
    }

    /// Every call to `operation` fails with `message`.
    pub fn fail_on(&self, operation: &'static str, message: &str) {
        self.fail_after(operation, 0, message);
    }

    /// `operation` succeeds `successes` more times, then fails with `message`.
    pub fn fail_after(&self, operation: &'static str, successes: usize, message: &str) {
        self.lock()
            .failures
            .insert(operation, (successes, message.to_string()));
    }

    fn enter(&self, operation: &'static str) -> Result<MutexGuard<'_, State>> {
        let mut state = self.lock();
        state.calls.push(operation);
        if let Some(message) = state.fail_next.take() {
            return Err(Error::backend(message));
        }
        if let Some((successes, message)) = state.failures.get_mut(operation) {
            if *successes == 0 {
                return Err(Error::backend(message.as_str()));
            }
            *successes -= 1;
        }
        Ok(state)
    }
}

impl State {
    fn id(&mut self) -> RowId {
        self.next_id += 1;
        self.next_id + 100
    }
}

#[async_trait]
impl MarketplaceApi for FakeMarketplace {
    async fn fetch_jobs(&self) -> Result<Vec<Job>> {
        Ok(self.enter("fetch_jobs")?.jobs.clone())
    }

    async fn post_jobs(&self, job: &NewJob) -> Result<Vec<Job>> {
        let mut state = self.enter("post_jobs")?;
        let row = Job {
            id: state.id(),
            trade: Some(job.trade.clone()),
            location: Some(job.location.clone()),
            rate: Some(job.rate),
            tags: job.tags.clone(),
            availability: job.availability.clone(),
            status: job.status,
            priority: Some(job.priority),
            created_at: None,
            leads_id: job.leads_id,
            trader_id: job.trader_id,
        };
        state.jobs.push(row.clone());
        Ok(vec![row])
    }

    async fn update_job_status(&self, update: JobStatusUpdate) -> Result<()> {
        let mut state = self.enter("update_job_status")?;
        state.status_updates.push(update);
        if let Some(job) = state.jobs.iter_mut().find(|j| j.id == update.job_id) {
            job.status = update.status;
        }
        Ok(())
    }

    async fn fetch_leads(&self) -> Result<Vec<Lead>> {
        Ok(self.enter("fetch_leads")?.leads.clone())
    }

    async fn post_leads(&self, lead: &NewLead) -> Result<Vec<Lead>> {
        let mut state = self.enter("post_leads")?;
        let row = Lead {
            id: state.id(),
            name: lead.name.clone(),
            service: Some(lead.service.clone()),
            location: Some(lead.location.clone()),
            value: parse_amount(&lead.value),
            phone: Some(lead.phone.clone()),
            email: Some(lead.email.clone()),
            priority: lead.priority,
            is_approved: false,
            created_at: None,
            bids: Vec::new(),
        };
        state.leads.push(row.clone());
        Ok(vec![row])
    }

    async fn modify_leads(&self, update: &LeadUpdate) -> Result<()> {
        let mut state = self.enter("modify_leads")?;
        state.lead_updates.push(update.clone());
        if let Some(lead) = state.leads.iter_mut().find(|l| l.id == update.id) {
            if let Some(approved) = update.is_approved {
                lead.is_approved = approved;
            }
            if let Some(priority) = update.priority {
                lead.priority = priority;
            }
        }
        Ok(())
    }

    async fn add_bids(&self, bid: &NewBid) -> Result<Vec<Bid>> {
        let mut state = self.enter("add_bids")?;
        let row = Bid {
            id: state.id(),
            leads_id: bid.leads_id,
            bid_by: Some(bid.bid_by),
            proposed_value: Some(bid.proposed_value),
            available: bid.available,
            status: BidStatus::Pending,
            bidder: None,
        };
        if let Some(lead) = state.leads.iter_mut().find(|l| l.id == bid.leads_id) {
            lead.bids.push(row.clone());
        }
        Ok(vec![row])
    }

    async fn modify_bids(&self, update: &BidUpdate) -> Result<()> {
        let mut state = self.enter("modify_bids")?;
        state.bid_updates.push(update.clone());
        for bid in state.leads.iter_mut().flat_map(|l| l.bids.iter_mut()) {
            if bid.id == update.id {
                bid.status = update.status;
            }
        }
        Ok(())
    }
}
