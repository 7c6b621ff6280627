//! OAuth sign-in with PKCE.
//!
//! The provider redirects back to the storefront's callback path with either
//! `?code=...` or `?error=...&error_description=...`. Some providers put the
//! error in the fragment instead, so both are checked.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use rand::distr::Alphanumeric;
use sha2::{Digest, Sha256};
use url::Url;

use super::IdentityError;

/// Third-party identity providers offered at sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OAuthProvider {
    Google,
    Github,
    Apple,
}

impl OAuthProvider {
    pub const ALL: [Self; 3] = [Self::Google, Self::Github, Self::Apple];

    /// Provider name as the identity service expects it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Github => "github",
            Self::Apple => "apple",
        }
    }
}

impl std::fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OAuthProvider {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|provider| provider.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| IdentityError::OAuth(format!("unknown provider: {s}")))
    }
}

/// PKCE verifier and its S256 challenge.
#[derive(Clone)]
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

impl Pkce {
    /// Verifier length; RFC 7636 allows 43 to 128.
    const VERIFIER_LEN: usize = 64;

    /// Generate a fresh verifier.
    #[must_use]
    pub fn generate() -> Self {
        Self::from_verifier(generate_random_string(Self::VERIFIER_LEN))
    }

    #[must_use]
    pub fn from_verifier(verifier: String) -> Self {
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        Self {
            verifier,
            challenge,
        }
    }
}

/// Generate a cryptographically secure alphanumeric string.
fn generate_random_string(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Extract the authorization code from an OAuth redirect.
///
/// # Errors
///
/// Returns [`IdentityError::OAuth`] carrying the provider's description when
/// the redirect reports an error, or when it has no code at all.
pub fn authorization_code(callback: &Url) -> Result<String, IdentityError> {
    let mut params: Vec<(String, String)> = callback.query_pairs().into_owned().collect();
    if let Some(fragment) = callback.fragment() {
        params.extend(url::form_urlencoded::parse(fragment.as_bytes()).into_owned());
    }

    let param = |name: &str| {
        params
            .iter()
            .find(|(key, value)| key == name && !value.is_empty())
            .map(|(_, value)| value.clone())
    };

    if let Some(error) = param("error") {
        let description = param("error_description").unwrap_or(error);
        return Err(IdentityError::OAuth(description));
    }

    param("code").ok_or_else(|| IdentityError::OAuth("No authorization code in callback".to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_names() {
        assert_eq!(OAuthProvider::Github.to_string(), "github");
        assert_eq!("Google".parse::<OAuthProvider>().unwrap(), OAuthProvider::Google);
        assert!("myspace".parse::<OAuthProvider>().is_err());
    }

    #[test]
    fn test_pkce_challenge_matches_rfc_example() {
        // RFC 7636 appendix B
        let pkce = Pkce::from_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".to_string());
        assert_eq!(pkce.challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    #[test]
    fn test_generated_verifier_is_alphanumeric() {
        let pkce = Pkce::generate();
        assert_eq!(pkce.verifier.len(), 64);
        assert!(pkce.verifier.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(pkce.verifier, Pkce::generate().verifier);
    }

    #[test]
    fn test_callback_with_code() {
        let url = Url::parse("https://shop.example.com/auth/callback?code=abc123").unwrap();
        assert_eq!(authorization_code(&url).unwrap(), "abc123");
    }

    #[test]
    fn test_callback_with_error_description() {
        let url = Url::parse(
            "https://shop.example.com/auth/callback?error=access_denied&error_description=User+cancelled",
        )
        .unwrap();
        let err = authorization_code(&url).unwrap_err();
        assert_eq!(err.to_string(), "OAuth error: User cancelled");
    }

    #[test]
    fn test_callback_error_in_fragment() {
        let url =
            Url::parse("https://shop.example.com/auth/callback#error=server_error").unwrap();
        assert!(matches!(authorization_code(&url), Err(IdentityError::OAuth(msg)) if msg == "server_error"));
    }

    #[test]
    fn test_callback_without_code() {
        let url = Url::parse("https://shop.example.com/auth/callback").unwrap();
        assert!(authorization_code(&url).is_err());
    }
}
