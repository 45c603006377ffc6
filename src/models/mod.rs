//! Rows of the `profiles`, `leads`, `bids` and `jobs` tables and the
//! payloads used to insert and update them.

mod bid;
mod job;
mod lead;
mod profile;

pub use bid::{Availability, Bid, BidStatus, BidUpdate, NewBid};
pub use job::{JobStatus, Job, JobStatusUpdate, NewJob};
pub use lead::{Lead, LeadUpdate, NewLead, Priority};
pub use profile::{NewProfile, Profile, ProfileUpdate, Role};

/// Identifier of a lead, bid or job row.
pub type RowId = i64;

/// Trades offered in the lead and job forms.
pub const SERVICES: &[&str] = &[
    "Electrician",
    "Plumber",
    "Carpenter",
    "Painter",
    "Roofer",
    "Heating Engineer",
    "Kitchen Fitter",
    "Bathroom Fitter",
    "Tiler",
    "Plasterer",
    "Builder",
    "Gardener",
];

pub(crate) mod de {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    /// Money columns arrive as numbers or numeric strings depending on how
    /// the row was written; blanks and junk read as absent.
    pub fn opt_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<NumberOrString>::deserialize(deserializer)?;
        Ok(match raw {
            Some(NumberOrString::Number(n)) => Some(n),
            Some(NumberOrString::Text(s)) => s.trim().replace([',', '£'], "").parse().ok(),
            None => None,
        })
    }
}
