use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::{Profile, RowId};

/// When the trade can start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    #[default]
    Today,
    Tomorrow,
    Week,
}

impl Availability {
    /// "From today", "From tomorrow", "From this week".
    pub fn describe(&self) -> &'static str {
        match self {
            Availability::Today => "From today",
            Availability::Tomorrow => "From tomorrow",
            Availability::Week => "From this week",
        }
    }
}

impl std::str::FromStr for Availability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(Availability::Today),
            "tomorrow" => Ok(Availability::Tomorrow),
            "week" | "this week" => Ok(Availability::Week),
            other => Err(format!("unknown availability: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BidStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl BidStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BidStatus::Pending => "Pending",
            BidStatus::Approved => "Approved",
            BidStatus::Rejected => "Rejected",
        }
    }

    /// Approved and rejected bids can no longer be accepted.
    pub fn is_settled(&self) -> bool {
        !matches!(self, BidStatus::Pending)
    }
}

impl fmt::Display for BidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A trade's quote against a lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub id: RowId,
    pub leads_id: RowId,
    #[serde(default)]
    pub bid_by: Option<Uuid>,
    #[serde(rename = "proposedValue", default, deserialize_with = "super::de::opt_amount")]
    pub proposed_value: Option<f64>,
    #[serde(rename = "Available", default)]
    pub available: Availability,
    #[serde(default)]
    pub status: BidStatus,
    /// Embedded by `bidder:bid_by(*)` when listed through leads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bidder: Option<Profile>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBid {
    pub leads_id: RowId,
    #[serde(rename = "proposedValue")]
    pub proposed_value: f64,
    pub bid_by: Uuid,
    #[serde(rename = "Available")]
    pub available: Availability,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BidUpdate {
    #[serde(skip_serializing)]
    pub id: RowId,
    pub status: BidStatus,
}
