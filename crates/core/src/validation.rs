//! Field validators.
//!
//! Stateless predicates, one per constraint class. None of them fail or log; they return a
//! `bool` or, for passwords, a per-rule breakdown the UI renders as a live checklist.

use crate::constants::{PASSWORD_MIN_LENGTH, PASSWORD_SPECIAL_CHARS};
use sentinel_types::{ContactNumber, EmailAddress};

/// Fails if the trimmed value has zero length.
pub fn required_non_empty(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Exactly 10 numeric digits: the subscriber part of a local mobile number.
pub fn phone_local_10_digit(value: &str) -> bool {
    ContactNumber::parse(value).is_ok()
}

/// Plausible `local@domain.tld` shape.
pub fn valid_email(value: &str) -> bool {
    EmailAddress::parse(value).is_ok()
}

/// Applies the contact-number input widget's filtering to raw keyboard input.
///
/// Non-digits are dropped. A leading trunk `0` is stripped and the remainder kept. Otherwise
/// the cleaned input is accepted only while it is at most 10 digits long; `None` means the
/// keystroke is rejected and the previous value should stay.
pub fn normalise_contact_input(text: &str) -> Option<String> {
    let cleaned: String = text.chars().filter(char::is_ascii_digit).collect();
    if let Some(rest) = cleaned.strip_prefix('0') {
        Some(rest.to_string())
    } else if cleaned.len() <= ContactNumber::DIGITS {
        Some(cleaned)
    } else {
        None
    }
}

/// Per-rule password strength breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PasswordStrength {
    pub has_min_length: bool,
    pub has_upper: bool,
    pub has_lower: bool,
    pub has_digit: bool,
    pub has_special_char: bool,
}

impl PasswordStrength {
    /// All five rules satisfied.
    pub fn is_strong(&self) -> bool {
        self.has_min_length && self.has_upper && self.has_lower && self.has_digit && self.has_special_char
    }

    /// Checklist rows in display order.
    pub fn checklist(&self) -> [(&'static str, bool); 5] {
        [
            ("At least 8 characters", self.has_min_length),
            ("One uppercase letter", self.has_upper),
            ("One lowercase letter", self.has_lower),
            ("One number", self.has_digit),
            ("One special character", self.has_special_char),
        ]
    }
}

pub fn password_strength(value: &str) -> PasswordStrength {
    PasswordStrength {
        has_min_length: value.chars().count() >= PASSWORD_MIN_LENGTH,
        has_upper: value.chars().any(|c| c.is_ascii_uppercase()),
        has_lower: value.chars().any(|c| c.is_ascii_lowercase()),
        has_digit: value.chars().any(|c| c.is_ascii_digit()),
        has_special_char: value.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)),
    }
}

/// Exact string equality, both non-empty.
pub fn passwords_match(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && a == b
}

/// Required only when `predicate(draft)` holds; passes unconditionally otherwise.
pub fn conditional_required<D>(value: &str, draft: &D, predicate: impl Fn(&D) -> bool) -> bool {
    !predicate(draft) || required_non_empty(value)
}
