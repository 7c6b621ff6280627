//! Delivery-address profiles stored by the identity provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::UserId;

/// A user's stored identity and delivery address.
///
/// One row per user, keyed by the provider's user ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub email: Email,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub address_line_1: Option<String>,
    #[serde(default)]
    pub address_line_2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Whether enough of the address is present to ship an order.
    #[must_use]
    pub fn has_delivery_address(&self) -> bool {
        [&self.address_line_1, &self.city, &self.postal_code, &self.country]
            .iter()
            .all(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }
}

/// Address captured at sign-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressData {
    pub address_line_1: String,
    #[serde(default)]
    pub address_line_2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// A partial profile update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line_1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line_2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl ProfileUpdate {
    /// Whether the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<AddressData> for ProfileUpdate {
    fn from(address: AddressData) -> Self {
        Self {
            address_line_1: Some(address.address_line_1),
            address_line_2: address.address_line_2,
            city: Some(address.city),
            postal_code: Some(address.postal_code),
            country: Some(address.country),
            ..Self::default()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_tolerates_missing_optional_columns() {
        let json = r#"{
            "id": "4b6f1a52-3f5e-4c1e-9d3a-0f6c2b1e7a90",
            "email": "maker@example.com",
            "created_at": "2026-01-02T03:04:05Z",
            "updated_at": "2026-01-02T03:04:05Z"
        }"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert!(profile.full_name.is_none());
        assert!(!profile.has_delivery_address());
    }

    #[test]
    fn test_update_skips_untouched_fields() {
        let update = ProfileUpdate {
            city: Some("Leeds".to_owned()),
            ..ProfileUpdate::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({"city": "Leeds"})
        );
        assert!(ProfileUpdate::default().is_empty());
        assert!(!update.is_empty());
    }

    #[test]
    fn test_address_converts_to_update() {
        let update = ProfileUpdate::from(AddressData {
            address_line_1: "1 Mill Lane".to_owned(),
            address_line_2: None,
            city: "York".to_owned(),
            postal_code: "YO1 7HH".to_owned(),
            country: "UK".to_owned(),
        });
        assert_eq!(update.city.as_deref(), Some("York"));
        assert!(update.full_name.is_none());
    }
}
