use crate::api::MarketplaceApi;
use crate::error::{Error, Result};
use crate::models::{Lead, NewLead, Priority, Profile, Role, SERVICES};
use crate::notify::Notifier;

use super::{is_filled, require};

/// The "Add New Lead" dialog. Customers see it as "Add New Job" with
/// their own contact details filled in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadForm {
    pub name: String,
    pub service: String,
    pub location: String,
    pub value: String,
    pub phone: String,
    pub email: String,
    pub priority: Priority,
    open: bool,
    customer: bool,
}

impl LeadForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Form for the signed-in user; customers get their name, email and
    /// phone prefilled.
    pub fn for_profile(profile: Option<&Profile>) -> Self {
        let mut form = Self::new();
        if let Some(profile) = profile.filter(|p| p.role == Role::Customer) {
            form.customer = true;
            form.prefill(profile);
        }
        form
    }

    fn prefill(&mut self, profile: &Profile) {
        self.name = format!(
            "{} {}",
            profile.first_name.as_deref().unwrap_or_default(),
            profile.last_name.as_deref().unwrap_or_default()
        );
        self.email = profile.email.clone().unwrap_or_default();
        self.phone = profile.phone.clone().unwrap_or_default();
    }

    pub fn title(&self) -> &'static str {
        if self.customer {
            "Add New Job"
        } else {
            "Add New Lead"
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    /// Closes the dialog. Non-customer forms start empty next time.
    pub fn close(&mut self) {
        self.open = false;
        if !self.customer {
            *self = Self::default();
        }
    }

    /// Submit is enabled only with every required field filled.
    pub fn can_submit(&self) -> bool {
        [&self.name, &self.service, &self.location, &self.value, &self.email]
            .iter()
            .all(|v| is_filled(v))
    }

    pub fn to_new_lead(&self) -> Result<NewLead> {
        require(&[
            ("Name", self.name.as_str()),
            ("Service", self.service.as_str()),
            ("Location", self.location.as_str()),
            ("Value", self.value.as_str()),
            ("Email", self.email.as_str()),
        ])?;
        if !SERVICES.contains(&self.service.as_str()) {
            return Err(Error::validation("Please choose a service from the list"));
        }
        Ok(NewLead {
            name: self.name.trim().to_string(),
            service: self.service.clone(),
            location: self.location.trim().to_string(),
            value: self.value.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_string(),
            priority: self.priority,
        })
    }

    /// Creates the lead and returns the refreshed lead list. On failure
    /// the dialog stays open with its input intact. Once the insert has
    /// gone through the dialog closes even if the refetch fails; the
    /// created rows are returned in that case.
    pub async fn submit(
        &mut self,
        api: &dyn MarketplaceApi,
        notifier: &Notifier,
    ) -> Result<Vec<Lead>> {
        let lead = self.to_new_lead()?;
        let created = match api.post_leads(&lead).await {
            Ok(created) => created,
            Err(err) => {
                tracing::warn!(error = %err, "lead insert failed");
                notifier.error("Error! Try again", None);
                return Err(err);
            }
        };
        notifier.success("Lead created successfully!", None);
        self.close();

        match api.fetch_leads().await {
            Ok(leads) => Ok(leads),
            Err(err) => {
                tracing::warn!(error = %err, "lead refetch after insert failed");
                Ok(created)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeMarketplace;

    fn filled() -> LeadForm {
        let mut form = LeadForm::new();
        form.name = "Jo Bloggs".to_string();
        form.service = "Plumber".to_string();
        form.location = "Leeds".to_string();
        form.value = "1,200".to_string();
        form.email = "jo@example.com".to_string();
        form.open();
        form
    }

    #[test]
    fn submit_needs_every_required_field() {
        assert!(filled().can_submit());
        assert!(!LeadForm::new().can_submit());

        let blanks: [fn(&mut LeadForm); 5] = [
            |f| f.name.clear(),
            |f| f.service.clear(),
            |f| f.location = "   ".to_string(),
            |f| f.value.clear(),
            |f| f.email.clear(),
        ];
        for blank in blanks {
            let mut form = filled();
            blank(&mut form);
            assert!(!form.can_submit(), "{:?}", form);
            assert!(form.to_new_lead().unwrap_err().is_validation());
        }

        let mut form = filled();
        form.phone.clear();
        assert!(form.can_submit());
    }

    #[test]
    fn service_must_be_offered() {
        let mut form = filled();
        form.service = "Astronaut".to_string();
        assert_eq!(
            form.to_new_lead().unwrap_err().message(),
            "Please choose a service from the list"
        );
        form.service = "Heating Engineer".to_string();
        assert_eq!(form.to_new_lead().unwrap().service, "Heating Engineer");
    }

    #[test]
    fn customers_get_their_details_prefilled() {
        let profile: Profile = serde_json::from_value(serde_json::json!({
            "id": "9b2e4c6a-1d3f-4a5b-8c7d-6e5f4a3b2c1d",
            "user_id": "5f0c8a7e-2b6d-4e8f-9a1b-3c4d5e6f7a8b",
            "email": "jo@example.com",
            "first_name": "Jo",
            "last_name": "Bloggs",
            "phone": "07700 900123",
            "role": "customer"
        }))
        .unwrap();
        let form = LeadForm::for_profile(Some(&profile));
        assert_eq!(form.title(), "Add New Job");
        assert_eq!(form.name, "Jo Bloggs");
        assert_eq!(form.phone, "07700 900123");
        assert_eq!(LeadForm::for_profile(None).title(), "Add New Lead");
    }

    #[tokio::test]
    async fn successful_submit_refetches_and_closes() {
        let api = FakeMarketplace::default();
        let notifier = Notifier::new();
        let mut form = filled();

        let leads = form.submit(&api, &notifier).await.unwrap();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].value, Some(1200.0));
        assert_eq!(api.calls(), vec!["post_leads", "fetch_leads"]);
        assert!(!form.is_open());
        assert_eq!(form, LeadForm::new());
        assert_eq!(notifier.last().unwrap().title, "Lead created successfully!");
    }

    #[tokio::test]
    async fn failed_insert_keeps_dialog_and_input() {
        let api = FakeMarketplace::default();
        api.fail_on("post_leads", "new row violates row-level security policy");
        let notifier = Notifier::new();
        let mut form = filled();

        assert!(form.submit(&api, &notifier).await.is_err());
        assert!(form.is_open());
        assert_eq!(form.name, "Jo Bloggs");
        assert_eq!(form.value, "1,200");
        let toast = notifier.last().unwrap();
        assert_eq!(toast.title, "Error! Try again");
        assert!(toast.is_error());
        assert_eq!(api.calls(), vec!["post_leads"]);
    }

    #[tokio::test]
    async fn failed_refetch_still_reports_the_created_lead() {
        let api = FakeMarketplace::default();
        api.fail_on("fetch_leads", "upstream timeout");
        let notifier = Notifier::new();
        let mut form = filled();

        let leads = form.submit(&api, &notifier).await.unwrap();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].name, "Jo Bloggs");
        assert!(!form.is_open());
        let toasts = notifier.drain();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].title, "Lead created successfully!");
        assert_eq!(api.leads().len(), 1);
    }
}
