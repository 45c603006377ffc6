use crate::error::{Error, Result};
use crate::models::Role;
use crate::routes::Route;
use crate::session::{SessionManager, SignUpProfile};

use super::require;

/// Trades selectable as a primary specialty.
pub const TRADE_OPTIONS: &[&str] = &[
    "Plumber",
    "Electrician",
    "Builder",
    "Roofer",
    "Painter/Decorator",
    "Kitchen Installer",
    "Gas Engineer",
    "Carpenter/Joiner",
    "Tiler",
    "Plasterer",
];

pub const BUSINESS_TYPES: &[&str] = &["sole-trader", "limited-company", "partnership"];

/// Account fields shared by both registration wizards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationCredentials {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub agreed_to_terms: bool,
}

impl RegistrationCredentials {
    pub fn validate(&self) -> Result<()> {
        require(&[
            ("First name", self.first_name.as_str()),
            ("Last name", self.last_name.as_str()),
            ("Email", self.email.as_str()),
            ("Password", self.password.as_str()),
            ("Confirm password", self.confirm_password.as_str()),
        ])?;
        if !self.agreed_to_terms {
            return Err(Error::validation("You must agree to the terms and conditions"));
        }
        if self.password != self.confirm_password {
            return Err(Error::validation("Passwords do not match"));
        }
        Ok(())
    }

    fn profile(&self, role: Role) -> SignUpProfile {
        SignUpProfile {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CustomerStep {
    #[default]
    Details,
    Complete,
}

impl CustomerStep {
    pub fn number(&self) -> u8 {
        match self {
            CustomerStep::Details => 1,
            CustomerStep::Complete => 2,
        }
    }
}

/// Two-step homeowner sign-up.
#[derive(Debug, Clone, Default)]
pub struct CustomerRegistration {
    pub credentials: RegistrationCredentials,
    step: CustomerStep,
}

impl CustomerRegistration {
    pub const TOTAL_STEPS: u8 = 2;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> CustomerStep {
        self.step
    }

    /// Signs the customer up from the first step and returns where to go
    /// next: the verify-email page for the address just registered.
    pub async fn next(&mut self, session: &SessionManager) -> Result<Option<Route>> {
        match self.step {
            CustomerStep::Details => {
                self.credentials.validate()?;
                let email = self.credentials.email.trim().to_string();
                session
                    .sign_up(
                        &email,
                        &self.credentials.password,
                        self.credentials.profile(Role::Customer),
                    )
                    .await?;
                Ok(Some(Route::VerifyEmail { email: Some(email) }))
            }
            CustomerStep::Complete => Ok(None),
        }
    }

    pub fn prev(&mut self) {
        self.step = CustomerStep::Details;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TradeStep {
    #[default]
    Personal,
    Business,
    Verification,
    Complete,
}

impl TradeStep {
    pub fn number(&self) -> u8 {
        match self {
            TradeStep::Personal => 1,
            TradeStep::Business => 2,
            TradeStep::Verification => 3,
            TradeStep::Complete => 4,
        }
    }
}

/// Business details collected by the trade wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradeDetails {
    pub phone: String,
    pub business_name: String,
    pub business_type: String,
    pub years_experience: String,
    pub trade_specialty: String,
    pub service_areas: Vec<String>,
    pub has_insurance: bool,
    pub has_license: bool,
    pub profile_description: String,
}

impl TradeDetails {
    /// Checks the business step before the wizard moves on.
    pub fn validate_business(&self) -> Result<()> {
        require(&[
            ("Business name", self.business_name.as_str()),
            ("Business type", self.business_type.as_str()),
            ("Trade specialty", self.trade_specialty.as_str()),
        ])?;
        if !BUSINESS_TYPES.contains(&self.business_type.as_str()) {
            return Err(Error::validation(format!(
                "Unknown business type: {}",
                self.business_type
            )));
        }
        if !TRADE_OPTIONS.contains(&self.trade_specialty.as_str()) {
            return Err(Error::validation(format!(
                "Unknown trade: {}",
                self.trade_specialty
            )));
        }
        Ok(())
    }

    /// Accepts a comma-separated list of areas.
    pub fn set_service_areas(&mut self, areas: &str) {
        self.service_areas = areas
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect();
    }
}

/// Four-step tradesperson sign-up; the account is created when leaving
/// the verification step.
#[derive(Debug, Clone, Default)]
pub struct TradeRegistration {
    pub credentials: RegistrationCredentials,
    pub details: TradeDetails,
    step: TradeStep,
}

impl TradeRegistration {
    pub const TOTAL_STEPS: u8 = 4;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> TradeStep {
        self.step
    }

    pub async fn next(&mut self, session: &SessionManager) -> Result<TradeStep> {
        self.step = match self.step {
            TradeStep::Personal => TradeStep::Business,
            TradeStep::Business => {
                self.details.validate_business()?;
                TradeStep::Verification
            }
            TradeStep::Verification => {
                self.credentials.validate()?;
                session
                    .sign_up(
                        self.credentials.email.trim(),
                        &self.credentials.password,
                        self.credentials.profile(Role::Trade),
                    )
                    .await?;
                TradeStep::Complete
            }
            TradeStep::Complete => TradeStep::Complete,
        };
        Ok(self.step)
    }

    pub fn prev(&mut self) {
        self.step = match self.step {
            TradeStep::Personal | TradeStep::Business => TradeStep::Personal,
            TradeStep::Verification => TradeStep::Business,
            TradeStep::Complete => TradeStep::Verification,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> RegistrationCredentials {
        RegistrationCredentials {
            first_name: "Ann".to_string(),
            last_name: "Other".to_string(),
            email: "ann@example.com".to_string(),
            password: "hunter22".to_string(),
            confirm_password: "hunter22".to_string(),
            agreed_to_terms: true,
        }
    }

    #[test]
    fn mismatched_passwords_fail_validation() {
        let mut creds = filled();
        creds.confirm_password = "hunter23".to_string();
        assert_eq!(creds.validate().unwrap_err().message(), "Passwords do not match");
    }

    #[test]
    fn terms_must_be_accepted() {
        let mut creds = filled();
        creds.agreed_to_terms = false;
        assert!(creds.validate().unwrap_err().is_validation());
        assert!(filled().validate().is_ok());
    }

    #[test]
    fn service_areas_from_text() {
        let mut details = TradeDetails::default();
        details.set_service_areas("Leeds, York,, Hull ");
        assert_eq!(details.service_areas, vec!["Leeds", "York", "Hull"]);
    }

    #[test]
    fn business_step_checks_known_options() {
        let mut details = TradeDetails {
            business_name: "Hart Plumbing".to_string(),
            business_type: "sole-trader".to_string(),
            trade_specialty: "Plumber".to_string(),
            ..TradeDetails::default()
        };
        assert!(details.validate_business().is_ok());

        details.business_type = "co-op".to_string();
        assert_eq!(
            details.validate_business().unwrap_err().message(),
            "Unknown business type: co-op"
        );

        details.business_type = "limited-company".to_string();
        details.trade_specialty = "Juggler".to_string();
        assert_eq!(
            details.validate_business().unwrap_err().message(),
            "Unknown trade: Juggler"
        );

        details.business_name.clear();
        assert_eq!(
            details.validate_business().unwrap_err().message(),
            "Business name is required"
        );
    }

    #[test]
    fn steps_are_numbered() {
        assert_eq!(TradeStep::Verification.number(), 3);
        assert_eq!(CustomerStep::Complete.number(), CustomerRegistration::TOTAL_STEPS);
    }
}
