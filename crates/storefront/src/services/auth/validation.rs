//! Sign-in and sign-up form validation.

use printquote_core::{AddressData, Email};
use secrecy::{ExposeSecret, SecretString};

use super::error::ValidationError;
use crate::supabase::Credentials;

/// Minimum password length accepted at sign-up.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Sign-up form contents.
#[derive(Clone)]
pub struct SignUpRequest {
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
    pub full_name: String,
    /// Delivery address, optional at sign-up.
    pub address: Option<AddressData>,
}

impl std::fmt::Debug for SignUpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("confirm_password", &"[REDACTED]")
            .field("full_name", &self.full_name)
            .field("address", &self.address)
            .finish()
    }
}

/// A sign-up that passed validation.
#[derive(Debug, Clone)]
pub struct ValidSignUp {
    pub credentials: Credentials,
    pub full_name: String,
    pub address: Option<AddressData>,
}

impl SignUpRequest {
    /// Check the form, reporting the first problem found.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] in form order.
    pub fn validate(&self) -> Result<ValidSignUp, ValidationError> {
        let email = required_credentials(&self.email, &self.password)?;

        let full_name = self.full_name.trim();
        if full_name.is_empty() {
            return Err(ValidationError::FullNameRequired);
        }

        if self.password.expose_secret() != self.confirm_password.expose_secret() {
            return Err(ValidationError::PasswordMismatch);
        }

        if self.password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ValidationError::PasswordTooShort {
                min: MIN_PASSWORD_LENGTH,
            });
        }

        let address = self.address.as_ref().map(validate_address).transpose()?;

        Ok(ValidSignUp {
            credentials: Credentials {
                email,
                password: self.password.clone(),
            },
            full_name: full_name.to_string(),
            address,
        })
    }
}

/// Validate sign-in input.
///
/// # Errors
///
/// Returns [`ValidationError::MissingCredentials`] for blank fields and
/// [`ValidationError::InvalidEmail`] for malformed addresses.
pub fn validate_sign_in(email: &str, password: SecretString) -> Result<Credentials, ValidationError> {
    let email = required_credentials(email, &password)?;
    Ok(Credentials { email, password })
}

fn required_credentials(email: &str, password: &SecretString) -> Result<Email, ValidationError> {
    if email.trim().is_empty() || password.expose_secret().is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    Ok(Email::parse(email)?)
}

/// A supplied address must carry enough to ship an order.
fn validate_address(address: &AddressData) -> Result<AddressData, ValidationError> {
    if [&address.address_line_1, &address.city, &address.postal_code]
        .iter()
        .any(|field| field.trim().is_empty())
    {
        return Err(ValidationError::AddressRequired);
    }
    Ok(normalize_address(address))
}

fn normalize_address(address: &AddressData) -> AddressData {
    AddressData {
        address_line_1: address.address_line_1.trim().to_string(),
        address_line_2: address
            .address_line_2
            .as_deref()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string),
        city: address.city.trim().to_string(),
        postal_code: address.postal_code.trim().to_string(),
        country: address.country.trim().to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request() -> SignUpRequest {
        SignUpRequest {
            email: "maker@example.com".to_string(),
            password: SecretString::from("hunter22"),
            confirm_password: SecretString::from("hunter22"),
            full_name: " Ada Lovelace ".to_string(),
            address: Some(AddressData {
                address_line_1: "1 Mill Lane".to_string(),
                address_line_2: Some("  ".to_string()),
                city: "York".to_string(),
                postal_code: "YO1 7HH".to_string(),
                country: "UK".to_string(),
            }),
        }
    }

    #[test]
    fn test_valid_sign_up() {
        let valid = request().validate().unwrap();
        assert_eq!(valid.full_name, "Ada Lovelace");
        assert_eq!(valid.credentials.email.as_str(), "maker@example.com");
        assert!(valid.address.unwrap().address_line_2.is_none());
    }

    #[test]
    fn test_sign_up_without_address() {
        let mut req = request();
        req.address = None;
        let valid = req.validate().unwrap();
        assert!(valid.address.is_none());
        assert_eq!(valid.full_name, "Ada Lovelace");
    }

    #[test]
    fn test_missing_credentials() {
        let mut req = request();
        req.email = "   ".to_string();
        assert_eq!(req.validate().unwrap_err(), ValidationError::MissingCredentials);

        assert_eq!(
            validate_sign_in("maker@example.com", SecretString::from("")).unwrap_err(),
            ValidationError::MissingCredentials
        );
    }

    #[test]
    fn test_malformed_email() {
        assert!(matches!(
            validate_sign_in("not-an-email", SecretString::from("secret")),
            Err(ValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_password_rules() {
        let mut req = request();
        req.confirm_password = SecretString::from("hunter23");
        assert_eq!(req.validate().unwrap_err(), ValidationError::PasswordMismatch);

        let mut req = request();
        req.password = SecretString::from("abc12");
        req.confirm_password = SecretString::from("abc12");
        assert_eq!(
            req.validate().unwrap_err(),
            ValidationError::PasswordTooShort { min: 6 }
        );
    }

    #[test]
    fn test_full_name_and_address_required() {
        let mut req = request();
        req.full_name = String::new();
        assert_eq!(req.validate().unwrap_err(), ValidationError::FullNameRequired);

        let mut req = request();
        req.address.as_mut().unwrap().postal_code = " ".to_string();
        assert_eq!(req.validate().unwrap_err(), ValidationError::AddressRequired);
    }

    #[test]
    fn test_debug_redacts_passwords() {
        let debug = format!("{:?}", request());
        assert!(!debug.contains("hunter22"));
    }

    #[test]
    fn test_sign_in_does_not_check_length() {
        assert!(validate_sign_in("maker@example.com", SecretString::from("abc")).is_ok());
    }
}
