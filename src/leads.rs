//! Trade lead list and quoting

use std::sync::Arc;

use crate::api::MarketplaceApi;
use crate::error::{Error, Result};
use crate::forms::QuoteForm;
use crate::models::{Bid, Lead, Profile, RowId};
use crate::notify::Notifier;

/// One lead as a particular trade sees it.
#[derive(Debug, Clone, Copy)]
pub struct LeadCard<'a> {
    pub lead: &'a Lead,
    pub own_bid: Option<&'a Bid>,
}

impl<'a> LeadCard<'a> {
    pub fn new(lead: &'a Lead, profile: &Profile) -> Self {
        Self {
            lead,
            own_bid: lead.bid_by(profile.id),
        }
    }

    pub fn quote_label(&self) -> &'static str {
        if self.own_bid.is_some() {
            "Quoted"
        } else {
            "Quote"
        }
    }

    pub fn can_quote(&self) -> bool {
        self.own_bid.is_none()
    }

    /// "£<amount>" of the trade's own quote, "£0" without one.
    pub fn proposed_quote(&self) -> String {
        match self.own_bid.and_then(|b| b.proposed_value) {
            Some(value) => format!("£{}", value),
            None => "£0".to_string(),
        }
    }
}

pub struct TradeLeads {
    api: Arc<dyn MarketplaceApi>,
    notifier: Notifier,
    leads: Vec<Lead>,
    pub quote: QuoteForm,
}

impl TradeLeads {
    pub fn new(api: Arc<dyn MarketplaceApi>, notifier: Notifier) -> Self {
        Self {
            api,
            notifier,
            leads: Vec::new(),
            quote: QuoteForm::default(),
        }
    }

    pub async fn refresh(&mut self) -> Result<&[Lead]> {
        self.leads = self.api.fetch_leads().await?;
        Ok(&self.leads)
    }

    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    pub fn cards<'a>(&'a self, profile: &Profile) -> Vec<LeadCard<'a>> {
        self.leads
            .iter()
            .map(|lead| LeadCard::new(lead, profile))
            .collect()
    }

    pub fn lead(&self, lead_id: RowId) -> Option<&Lead> {
        self.leads.iter().find(|l| l.id == lead_id)
    }

    /// Opens the quote dialog unless this trade already quoted.
    pub fn open_quote(&mut self, lead_id: RowId, profile: &Profile) -> Result<()> {
        let lead = self
            .lead(lead_id)
            .ok_or_else(|| Error::validation(format!("Lead {} not found", lead_id)))?;
        if lead.bid_by(profile.id).is_some() {
            return Err(already_quoted());
        }
        self.quote = QuoteForm::for_lead(lead_id);
        Ok(())
    }

    /// Places the trade's bid and refreshes the list.
    pub async fn submit_quote(&mut self, profile: &Profile) -> Result<()> {
        let bid = match self.quote.to_new_bid(profile.id) {
            Ok(bid) => bid,
            Err(err) => {
                self.notifier.error(&err.message(), None);
                return Err(err);
            }
        };
        // One quote per trade per lead; checked against the last fetched list.
        if self
            .lead(bid.leads_id)
            .and_then(|lead| lead.bid_by(profile.id))
            .is_some()
        {
            let err = already_quoted();
            self.notifier.error(&err.message(), None);
            return Err(err);
        }

        if let Err(err) = self.api.add_bids(&bid).await {
            tracing::warn!(lead_id = bid.leads_id, error = %err, "quote failed");
            self.notifier.error("Failed to submit quote", None);
            return Err(err);
        }
        self.notifier.success("Quote submitted successfully", None);
        self.quote.close();
        self.refresh().await?;
        Ok(())
    }
}

fn already_quoted() -> Error {
    Error::validation("You have already quoted for this lead")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Availability, BidStatus, Priority, Role};
    use crate::testing::FakeMarketplace;
    use uuid::Uuid;

    fn trade() -> Profile {
        Profile {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            email: Some("pipes@example.com".to_string()),
            first_name: Some("Pat".to_string()),
            last_name: Some("Pipes".to_string()),
            role: Role::Trade,
            phone: None,
            address_line_1: None,
            address_line_2: None,
            city: None,
            county: None,
            postal_code: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn lead(id: RowId, bids: Vec<Bid>) -> Lead {
        Lead {
            id,
            name: "Jo Bloggs".to_string(),
            service: Some("Plumber".to_string()),
            location: Some("Leeds".to_string()),
            value: Some(500.0),
            phone: None,
            email: Some("jo@example.com".to_string()),
            priority: Priority::Medium,
            is_approved: false,
            created_at: None,
            bids,
        }
    }

    fn bid(id: RowId, leads_id: RowId, bid_by: Uuid) -> Bid {
        Bid {
            id,
            leads_id,
            bid_by: Some(bid_by),
            proposed_value: Some(450.0),
            available: Availability::Week,
            status: BidStatus::Pending,
            bidder: None,
        }
    }

    #[tokio::test]
    async fn trade_with_bid_sees_quoted() {
        let me = trade();
        let fake = Arc::new(FakeMarketplace::default());
        fake.set_leads(vec![
            lead(1, vec![bid(10, 1, me.id)]),
            lead(2, vec![bid(11, 2, Uuid::new_v4())]),
        ]);
        let mut screen = TradeLeads::new(fake, Notifier::new());
        screen.refresh().await.unwrap();

        let cards = screen.cards(&me);
        assert_eq!(cards[0].quote_label(), "Quoted");
        assert!(!cards[0].can_quote());
        assert_eq!(cards[0].proposed_quote(), "£450");
        assert_eq!(cards[1].quote_label(), "Quote");
        assert!(cards[1].can_quote());
        assert!(screen.open_quote(1, &me).is_err());
    }

    #[tokio::test]
    async fn submit_quote_posts_and_refreshes() {
        let me = trade();
        let fake = Arc::new(FakeMarketplace::default());
        fake.set_leads(vec![lead(1, Vec::new())]);
        let notifier = Notifier::new();
        let mut screen = TradeLeads::new(fake.clone(), notifier.clone());
        screen.refresh().await.unwrap();

        screen.open_quote(1, &me).unwrap();
        screen.quote.proposed_value = "abc".to_string();
        assert!(screen.submit_quote(&me).await.is_err());
        assert_eq!(notifier.last().unwrap().title, "Please enter a valid number");
        assert!(!fake.calls().contains(&"add_bids"));

        screen.quote.proposed_value = "375".to_string();
        screen.submit_quote(&me).await.unwrap();
        assert_eq!(notifier.last().unwrap().title, "Quote submitted successfully");
        assert!(!screen.quote.is_open());
        assert_eq!(screen.cards(&me)[0].quote_label(), "Quoted");

        screen.quote = QuoteForm::for_lead(1);
        screen.quote.proposed_value = "300".to_string();
        assert!(screen.submit_quote(&me).await.unwrap_err().is_validation());
        assert_eq!(fake.leads()[0].bids.len(), 1);
    }

    #[tokio::test]
    async fn failed_insert_reports_error() {
        let me = trade();
        let fake = Arc::new(FakeMarketplace::default());
        fake.set_leads(vec![lead(1, Vec::new())]);
        fake.fail_on("add_bids", "permission denied");
        let notifier = Notifier::new();
        let mut screen = TradeLeads::new(fake, notifier.clone());
        screen.refresh().await.unwrap();

        screen.open_quote(1, &me).unwrap();
        screen.quote.proposed_value = "200".to_string();
        assert!(screen.submit_quote(&me).await.is_err());
        assert_eq!(notifier.last().unwrap().title, "Failed to submit quote");
        assert!(screen.quote.is_open());
    }
}
