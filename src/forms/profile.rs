use chrono::Utc;

use crate::error::Result;
use crate::models::{Profile, ProfileUpdate};
use crate::notify::Notifier;
use crate::session::SessionManager;

/// Account settings page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address_line_1: String,
    pub address_line_2: String,
    pub city: String,
    pub county: String,
    pub postal_code: String,
}

impl ProfileForm {
    pub fn from_profile(profile: &Profile) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            first_name: text(&profile.first_name),
            last_name: text(&profile.last_name),
            phone: text(&profile.phone),
            address_line_1: text(&profile.address_line_1),
            address_line_2: text(&profile.address_line_2),
            city: text(&profile.city),
            county: text(&profile.county),
            postal_code: text(&profile.postal_code),
        }
    }

    pub fn to_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            address_line_1: self.address_line_1.trim().to_string(),
            address_line_2: self.address_line_2.trim().to_string(),
            city: self.city.trim().to_string(),
            county: self.county.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            updated_at: Some(Utc::now()),
        }
    }

    pub async fn save(&self, session: &SessionManager, notifier: &Notifier) -> Result<Profile> {
        match session.update_profile(&self.to_update()).await {
            Ok(profile) => {
                notifier.success(
                    "Profile updated",
                    Some("Your profile has been updated successfully."),
                );
                Ok(profile)
            }
            Err(err) => {
                tracing::warn!(error = %err, "profile update failed");
                notifier.error(
                    "Update failed",
                    Some("Failed to update profile. Please try again."),
                );
                Err(err)
            }
        }
    }
}
