//! Validated primitive types shared across the Sentinel PH workspace.
//!
//! Each type here can only be constructed through a checking constructor, so holding one is
//! proof that the value passed validation.

/// Errors that can occur when creating validated text types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    /// The input was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,

    /// The input is not a plausible email address
    #[error("invalid email address")]
    InvalidEmail,

    /// The input is not a 10-digit local subscriber number
    #[error("contact number must be exactly 10 digits")]
    InvalidContactNumber,
}

/// An email address with a plausible `local@domain.tld` shape.
///
/// Deliverability is the identity provider's concern. This only rejects input that can never
/// be an address (missing `@`, whitespace, no dot in the domain).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parses and trims an email address.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(TextError::InvalidEmail);
        }

        let (local, domain) = trimmed.split_once('@').ok_or(TextError::InvalidEmail)?;
        if local.is_empty() || domain.contains('@') {
            return Err(TextError::InvalidEmail);
        }
        let domain_ok = domain
            .split('.')
            .all(|label| !label.is_empty())
            && domain.contains('.');
        if !domain_ok {
            return Err(TextError::InvalidEmail);
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A local mobile subscriber number: exactly 10 ASCII digits, no trunk `0`, no country code.
///
/// The hosted user directory stores numbers in trunk form (`0` followed by the 10 digits), and
/// usernames use the international form (`+63` followed by the 10 digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContactNumber(String);

impl ContactNumber {
    /// Number of subscriber digits after the trunk prefix is removed.
    pub const DIGITS: usize = 10;

    /// Parses a subscriber number. The input must already be exactly 10 digits.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let input = input.as_ref();
        if input.len() != Self::DIGITS || !input.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TextError::InvalidContactNumber);
        }
        Ok(Self(input.to_owned()))
    }

    /// Parses the stored trunk form (`0XXXXXXXXXX`).
    pub fn from_trunk(input: impl AsRef<str>) -> Result<Self, TextError> {
        let digits = input
            .as_ref()
            .strip_prefix('0')
            .ok_or(TextError::InvalidContactNumber)?;
        Self::parse(digits)
    }

    /// The bare 10 subscriber digits.
    pub fn digits(&self) -> &str {
        &self.0
    }

    /// The form persisted in and queried against the user directory.
    pub fn trunk_form(&self) -> String {
        format!("0{}", self.0)
    }

    /// The form used for usernames, e.g. `+639171234567`.
    pub fn international_form(&self, calling_code: &str) -> String {
        format!("{}{}", calling_code, self.0)
    }
}

impl std::fmt::Display for ContactNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
