//! Taxpayer identifier attached to an account holder.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::AccountError;

/// 11 ASCII digits, optionally written as `ddd.ddd.ddd-dd`.
///
/// `\d` would also match other Unicode digits.
static TAX_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{3}\.?[0-9]{3}\.?[0-9]{3}-?[0-9]{2}$").expect("tax id pattern is valid")
});

/// A validated tax identifier, kept as entered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaxId(String);

impl TaxId {
    /// Validates and wraps a tax identifier.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidTaxId` if the value does not match the format.
    pub fn parse(value: impl Into<String>) -> Result<Self, AccountError> {
        let value = value.into();
        if TAX_ID_PATTERN.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(AccountError::InvalidTaxId(value))
        }
    }

    /// Returns true if `value` is a well-formed tax identifier.
    #[must_use]
    pub fn is_valid(value: &str) -> bool {
        TAX_ID_PATTERN.is_match(value)
    }

    /// Returns the identifier as entered.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TaxId {
    type Error = AccountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<TaxId> for String {
    fn from(tax_id: TaxId) -> Self {
        tax_id.0
    }
}

impl std::fmt::Display for TaxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
