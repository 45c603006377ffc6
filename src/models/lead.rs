use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::{Bid, RowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    #[serde(alias = "Low")]
    Low,
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "High")]
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        })
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

/// A homeowner's job request, listed with the bids placed against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: RowId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "super::de::opt_amount")]
    pub value: Option<f64>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(rename = "isApproved", default)]
    pub is_approved: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub bids: Vec<Bid>,
}

impl Lead {
    /// The bid `profile_id` placed on this lead, if any.
    pub fn bid_by(&self, profile_id: Uuid) -> Option<&Bid> {
        self.bids.iter().find(|bid| bid.bid_by == Some(profile_id))
    }

    pub fn bid(&self, bid_id: RowId) -> Option<&Bid> {
        self.bids.iter().find(|bid| bid.id == bid_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewLead {
    pub name: String,
    pub service: String,
    pub location: String,
    pub value: String,
    pub phone: String,
    pub email: String,
    pub priority: Priority,
}

/// Partial update of a lead; only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LeadUpdate {
    #[serde(skip_serializing)]
    pub id: RowId,
    #[serde(rename = "isApproved", skip_serializing_if = "Option::is_none")]
    pub is_approved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl LeadUpdate {
    pub fn approved(id: RowId, approved: bool) -> Self {
        Self {
            id,
            is_approved: Some(approved),
            ..Self::default()
        }
    }
}
