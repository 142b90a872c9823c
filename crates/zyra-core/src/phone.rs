//! Phone number canonicalization.
//!
//! Every phone number entering the system — webhook senders, command
//! arguments, registration input — is normalized to a single
//! `+<countrycode><digits>` wire shape before it is used as a lookup key.
//! Kenya (`254`) is the default trunk.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default country code applied to local and bare numbers.
const COUNTRY_CODE: &str = "254";

/// A phone number in canonical `+<countrycode><digits>` form.
///
/// Construct via [`CanonicalPhone::normalize`]; the inner string is
/// otherwise opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalPhone(String);

impl CanonicalPhone {
    /// Normalize a raw phone number.
    ///
    /// Rules, applied to the digits remaining after stripping every
    /// non-digit character:
    ///
    /// 1. starts with `254` → prefix `+`
    /// 2. starts with `0` → replace the leading `0` with `+254`
    /// 3. otherwise → prefix `+254`
    ///
    /// Total and pure: any input normalizes, nothing is rejected, and no
    /// digit-count validation happens here. Idempotent for inputs already
    /// in canonical form.
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

        let canonical = if digits.starts_with(COUNTRY_CODE) {
            format!("+{digits}")
        } else if let Some(rest) = digits.strip_prefix('0') {
            format!("+{COUNTRY_CODE}{rest}")
        } else {
            format!("+{COUNTRY_CODE}{digits}")
        };

        Self(canonical)
    }

    /// The canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalPhone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalPhone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
