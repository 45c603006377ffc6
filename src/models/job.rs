use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::{Priority, RowId};

/// Board column a job sits in. There is no fourth state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum JobStatus {
    #[default]
    #[serde(rename = "todo")]
    Todo,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "complete")]
    Complete,
}

impl JobStatus {
    pub const ALL: [JobStatus; 3] = [JobStatus::Todo, JobStatus::InProgress, JobStatus::Complete];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Todo => "todo",
            JobStatus::InProgress => "in-progress",
            JobStatus::Complete => "complete",
        }
    }

    /// Column heading.
    pub fn column_name(&self) -> &'static str {
        match self {
            JobStatus::Todo => "To Do",
            JobStatus::InProgress => "In Progress",
            JobStatus::Complete => "Completed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        JobStatus::ALL
            .into_iter()
            .find(|status| {
                status.as_str() == normalized
                    || status.column_name().to_ascii_lowercase() == normalized
            })
            .ok_or_else(|| format!("unknown job status: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: RowId,
    #[serde(default)]
    pub trade: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "super::de::opt_amount")]
    pub rate: Option<f64>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub availability: Option<String>,
    pub status: JobStatus,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub leads_id: Option<RowId>,
    #[serde(default)]
    pub trader_id: Option<Uuid>,
}

impl Job {
    /// Comma-separated tags, trimmed, blanks dropped.
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewJob {
    pub trade: String,
    pub location: String,
    pub rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    pub status: JobStatus,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leads_id: Option<RowId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trader_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobStatusUpdate {
    pub job_id: RowId,
    pub status: JobStatus,
}
