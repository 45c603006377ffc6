//! Form state for the marketplace dialogs and registration wizards
//!
//! Forms hold raw user input. Validation runs before anything is sent and
//! a form that fails it never issues a request.

mod job;
mod lead;
mod profile;
mod quote;
mod registration;

pub use job::{JobForm, JOB_AVAILABILITY};
pub use lead::LeadForm;
pub use profile::ProfileForm;
pub use quote::QuoteForm;
pub use registration::{
    CustomerRegistration, CustomerStep, RegistrationCredentials, TradeDetails, TradeRegistration,
    TradeStep, BUSINESS_TYPES, TRADE_OPTIONS,
};

use crate::error::{Error, Result};

pub(crate) fn is_filled(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Fails with "<label> is required" for the first blank field.
pub(crate) fn require(fields: &[(&str, &str)]) -> Result<()> {
    match fields.iter().find(|(_, value)| !is_filled(value)) {
        Some((label, _)) => Err(Error::validation(format!("{} is required", label))),
        None => Ok(()),
    }
}

/// Parses a money amount typed by a user ("1,250", "£80", "99.5").
pub(crate) fn parse_amount(value: &str) -> Option<f64> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '£')
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite() && *amount >= 0.0)
}
