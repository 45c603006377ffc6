use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Availability, NewBid, RowId};

use super::parse_amount;

/// The "Submit Quote" dialog opened from a lead card.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteForm {
    pub lead_id: Option<RowId>,
    pub proposed_value: String,
    pub available: Availability,
}

impl QuoteForm {
    pub fn for_lead(lead_id: RowId) -> Self {
        Self {
            lead_id: Some(lead_id),
            ..Self::default()
        }
    }

    pub fn is_open(&self) -> bool {
        self.lead_id.is_some()
    }

    pub fn close(&mut self) {
        *self = Self::default();
    }

    pub fn to_new_bid(&self, bid_by: Uuid) -> Result<NewBid> {
        let leads_id = self
            .lead_id
            .ok_or_else(|| Error::validation("Select a lead to quote for"))?;
        let proposed_value = parse_amount(&self.proposed_value)
            .ok_or_else(|| Error::validation("Please enter a valid number"))?;
        Ok(NewBid {
            leads_id,
            proposed_value,
            bid_by,
            available: self.available,
        })
    }
}
