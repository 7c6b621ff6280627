//! Profile editing.
//!
//! Keeps an editable copy of the delivery address next to the last values
//! known to be stored, so cancelling an edit is local and instant.

use printquote_core::{Profile, ProfileUpdate};

use super::auth::{AuthError, SessionManager, ValidationError};

/// Country preselected for new and empty profiles.
pub const DEFAULT_COUNTRY: &str = "UK";

/// Editable profile fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    FullName,
    AddressLine1,
    AddressLine2,
    City,
    PostalCode,
    Country,
}

/// Form values. Missing stored values show as empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileForm {
    pub full_name: String,
    pub address_line_1: String,
    pub address_line_2: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl Default for ProfileForm {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            address_line_1: String::new(),
            address_line_2: String::new(),
            city: String::new(),
            postal_code: String::new(),
            country: DEFAULT_COUNTRY.to_string(),
        }
    }
}

impl ProfileForm {
    #[must_use]
    pub fn from_profile(profile: &Profile) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            full_name: text(&profile.full_name),
            address_line_1: text(&profile.address_line_1),
            address_line_2: text(&profile.address_line_2),
            city: text(&profile.city),
            postal_code: text(&profile.postal_code),
            country: profile
                .country
                .clone()
                .filter(|country| !country.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
        }
    }

    #[must_use]
    pub fn get(&self, field: ProfileField) -> &str {
        match field {
            ProfileField::FullName => &self.full_name,
            ProfileField::AddressLine1 => &self.address_line_1,
            ProfileField::AddressLine2 => &self.address_line_2,
            ProfileField::City => &self.city,
            ProfileField::PostalCode => &self.postal_code,
            ProfileField::Country => &self.country,
        }
    }

    pub fn set(&mut self, field: ProfileField, value: impl Into<String>) {
        let slot = match field {
            ProfileField::FullName => &mut self.full_name,
            ProfileField::AddressLine1 => &mut self.address_line_1,
            ProfileField::AddressLine2 => &mut self.address_line_2,
            ProfileField::City => &mut self.city,
            ProfileField::PostalCode => &mut self.postal_code,
            ProfileField::Country => &mut self.country,
        };
        *slot = value.into();
    }

    /// The form with surrounding whitespace removed from every field.
    #[must_use]
    pub fn trimmed(&self) -> Self {
        let text = |value: &str| value.trim().to_string();
        Self {
            full_name: text(&self.full_name),
            address_line_1: text(&self.address_line_1),
            address_line_2: text(&self.address_line_2),
            city: text(&self.city),
            postal_code: text(&self.postal_code),
            country: text(&self.country),
        }
    }

    /// Every editable field, trimmed. Blank fields are stored as empty
    /// strings so the update fully replaces what was there.
    #[must_use]
    pub fn to_update(&self) -> ProfileUpdate {
        let form = self.trimmed();
        ProfileUpdate {
            full_name: Some(form.full_name),
            avatar_url: None,
            address_line_1: Some(form.address_line_1),
            address_line_2: Some(form.address_line_2),
            city: Some(form.city),
            postal_code: Some(form.postal_code),
            country: Some(form.country),
        }
    }
}

/// Feedback shown under the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileMessage {
    Success(String),
    Error(String),
}

/// Profile page state.
#[derive(Debug, Clone, Default)]
pub struct ProfileEditor {
    form: ProfileForm,
    saved: ProfileForm,
    editing: bool,
    message: Option<ProfileMessage>,
}

impl ProfileEditor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate from the stored profile, dropping any unsaved edits.
    pub fn load(&mut self, profile: &Profile) {
        self.saved = ProfileForm::from_profile(profile);
        self.form = self.saved.clone();
        self.editing = false;
    }

    #[must_use]
    pub const fn form(&self) -> &ProfileForm {
        &self.form
    }

    #[must_use]
    pub const fn is_editing(&self) -> bool {
        self.editing
    }

    #[must_use]
    pub const fn message(&self) -> Option<&ProfileMessage> {
        self.message.as_ref()
    }

    /// Whether the form differs from the stored values.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.form != self.saved
    }

    pub fn begin_edit(&mut self) {
        self.editing = true;
        self.message = None;
    }

    pub fn set_field(&mut self, field: ProfileField, value: impl Into<String>) {
        self.form.set(field, value);
        self.message = None;
    }

    /// Discard edits and leave edit mode.
    pub fn cancel(&mut self) {
        self.form = self.saved.clone();
        self.editing = false;
        self.message = None;
    }

    /// Save the form through `sessions`.
    ///
    /// On success the saved values are updated and edit mode ends; on
    /// failure the form keeps the user's edits.
    ///
    /// # Errors
    ///
    /// [`ValidationError::FullNameRequired`] for a blank name (no request is
    /// made), [`AuthError::NotAuthenticated`] without a signed-in user,
    /// otherwise the provider's error. The failure is also set as the form
    /// message.
    pub async fn submit(&mut self, sessions: &SessionManager) -> Result<(), AuthError> {
        if self.form.full_name.trim().is_empty() {
            let err = AuthError::from(ValidationError::FullNameRequired);
            self.message = Some(ProfileMessage::Error(err.user_message()));
            return Err(err);
        }

        let form = self.form.trimmed();
        match sessions.update_profile(&form.to_update()).await {
            Ok(()) => {
                // Keep exactly what was stored so a later cancel matches it.
                self.form = form.clone();
                self.saved = form;
                self.editing = false;
                self.message = Some(ProfileMessage::Success(
                    "Profile updated successfully!".to_string(),
                ));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Profile update failed");
                self.message = Some(ProfileMessage::Error(e.user_message()));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use printquote_core::Email;

    use super::*;

    fn profile() -> Profile {
        Profile {
            id: "4b6f1a52-3f5e-4c1e-9d3a-0f6c2b1e7a90".parse().unwrap(),
            email: Email::parse("maker@example.com").unwrap(),
            full_name: Some("Ada Lovelace".to_string()),
            avatar_url: None,
            address_line_1: Some("1 Mill Lane".to_string()),
            address_line_2: None,
            city: Some("York".to_string()),
            postal_code: Some("YO1 7HH".to_string()),
            country: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_form_defaults() {
        assert_eq!(ProfileForm::default().country, "UK");
        let form = ProfileForm::from_profile(&profile());
        assert_eq!(form.address_line_2, "");
        assert_eq!(form.country, "UK");
        assert_eq!(form.get(ProfileField::City), "York");
    }

    #[test]
    fn test_cancel_restores_saved_values() {
        let mut editor = ProfileEditor::new();
        editor.load(&profile());
        editor.begin_edit();
        editor.set_field(ProfileField::City, "Leeds");
        assert!(editor.is_dirty());

        editor.cancel();
        assert!(!editor.is_editing());
        assert!(!editor.is_dirty());
        assert_eq!(editor.form().city, "York");
    }

    #[test]
    fn test_trimmed_form() {
        let mut form = ProfileForm::from_profile(&profile());
        form.set(ProfileField::City, "  Leeds ");
        form.set(ProfileField::AddressLine2, "   ");

        let trimmed = form.trimmed();
        assert_eq!(trimmed.city, "Leeds");
        assert_eq!(trimmed.address_line_2, "");
        assert_eq!(trimmed.full_name, "Ada Lovelace");
        assert_eq!(trimmed.to_update(), form.to_update());
    }

    #[test]
    fn test_update_replaces_every_field() {
        let mut form = ProfileForm::from_profile(&profile());
        form.set(ProfileField::AddressLine2, "  Flat 2 ");
        let update = form.to_update();
        assert_eq!(update.address_line_2.as_deref(), Some("Flat 2"));
        assert_eq!(update.country.as_deref(), Some("UK"));
        assert!(update.avatar_url.is_none());
    }

    #[test]
    fn test_editing_clears_message() {
        let mut editor = ProfileEditor {
            message: Some(ProfileMessage::Error("nope".to_string())),
            ..ProfileEditor::default()
        };
        editor.set_field(ProfileField::FullName, "Ada");
        assert!(editor.message().is_none());
    }
}
