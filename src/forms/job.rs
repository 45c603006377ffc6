use crate::error::Result;
use crate::models::{JobStatus, NewJob, Priority};

use super::{parse_amount, require};

/// Choices offered by the "Add Job" dialog.
pub const JOB_AVAILABILITY: &[&str] = &["Available today", "Available this week", "Available next week"];

/// The trade's "Add Job" dialog on the job board.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobForm {
    pub trade: String,
    pub availability: String,
    pub location: String,
    pub rate: String,
    pub tags: String,
    pub priority: Priority,
}

impl JobForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// New jobs always start in the To Do column.
    pub fn to_new_job(&self) -> Result<NewJob> {
        require(&[
            ("Trade", self.trade.as_str()),
            ("Availability", self.availability.as_str()),
            ("Location", self.location.as_str()),
        ])?;
        let tags = self.tags.trim();
        Ok(NewJob {
            trade: self.trade.clone(),
            location: self.location.trim().to_string(),
            rate: parse_amount(&self.rate).unwrap_or(0.0),
            tags: (!tags.is_empty()).then(|| tags.to_string()),
            availability: Some(self.availability.clone()),
            status: JobStatus::Todo,
            priority: self.priority,
            leads_id: None,
            trader_id: None,
        })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
