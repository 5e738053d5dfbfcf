//! Account aggregate.

use bankwire_shared::types::{AccountId, Money};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::AccountError;
use super::tax_id::TaxId;

/// Longest holder name accepted, in characters.
pub const MAX_NAME_LEN: usize = 255;

/// A ledger account holding a non-negative balance.
///
/// The balance only changes through [`Account::debit`] and [`Account::credit`];
/// persisting the result is the caller's responsibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Holder name.
    pub name: String,
    /// Holder tax identifier.
    pub tax_id: TaxId,
    balance: Money,
    /// When the account was opened.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Opens a new account with a fresh identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or longer than [`MAX_NAME_LEN`]
    /// characters, if the tax id is malformed, or if the initial balance is
    /// negative.
    pub fn open(
        name: impl Into<String>,
        tax_id: impl Into<String>,
        initial_balance: Money,
    ) -> Result<Self, AccountError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(AccountError::EmptyName);
        }
        let len = name.chars().count();
        if len > MAX_NAME_LEN {
            return Err(AccountError::NameTooLong {
                len,
                max: MAX_NAME_LEN,
            });
        }

        let tax_id = TaxId::parse(tax_id)?;

        if initial_balance.is_negative() {
            return Err(AccountError::NegativeBalance(initial_balance));
        }

        Ok(Self {
            id: AccountId::new(),
            name,
            tax_id,
            balance: initial_balance,
            created_at: Utc::now(),
        })
    }

    /// Rebuilds an account loaded from a store.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::NegativeBalance` if the stored balance breaks the invariant.
    pub fn restore(
        id: AccountId,
        name: String,
        tax_id: TaxId,
        balance: Money,
        created_at: DateTime<Utc>,
    ) -> Result<Self, AccountError> {
        if balance.is_negative() {
            return Err(AccountError::NegativeBalance(balance));
        }

        Ok(Self {
            id,
            name,
            tax_id,
            balance,
            created_at,
        })
    }

    /// Current balance.
    #[must_use]
    pub const fn balance(&self) -> Money {
        self.balance
    }

    /// Subtracts `amount` from the balance.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientBalance` if `amount` exceeds the balance; the
    /// account is left unchanged.
    pub fn debit(&mut self, amount: Money) -> Result<(), AccountError> {
        if !amount.is_positive() {
            return Err(AccountError::NonPositiveAmount(amount));
        }

        match self.balance.checked_sub(amount) {
            Some(remaining) if !remaining.is_negative() => {
                self.balance = remaining;
                Ok(())
            }
            _ => Err(AccountError::InsufficientBalance {
                available: self.balance,
                requested: amount,
            }),
        }
    }

    /// Adds `amount` to the balance.
    ///
    /// # Errors
    ///
    /// Returns `BalanceOverflow` if the sum does not fit in minor units.
    pub fn credit(&mut self, amount: Money) -> Result<(), AccountError> {
        if !amount.is_positive() {
            return Err(AccountError::NonPositiveAmount(amount));
        }

        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(AccountError::BalanceOverflow(amount))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(balance: i64) -> Account {
        Account::open("Ana", "123.456.789-00", Money::from_minor(balance)).unwrap()
    }

    #[test]
    fn test_open_trims_name() {
        let account = Account::open("  Ana Lima ", "12345678900", Money::ZERO).unwrap();
        assert_eq!(account.name, "Ana Lima");
        assert_eq!(account.balance(), Money::ZERO);
    }

    #[test]
    fn test_open_rejects_blank_name() {
        assert_eq!(
            Account::open("   ", "12345678900", Money::ZERO),
            Err(AccountError::EmptyName)
        );
    }

    #[test]
    fn test_open_name_length_limit() {
        let longest = "é".repeat(MAX_NAME_LEN);
        let account = Account::open(format!(" {longest} "), "12345678900", Money::ZERO).unwrap();
        assert_eq!(account.name, longest);

        assert_eq!(
            Account::open("a".repeat(MAX_NAME_LEN + 1), "12345678900", Money::ZERO),
            Err(AccountError::NameTooLong {
                len: MAX_NAME_LEN + 1,
                max: MAX_NAME_LEN,
            })
        );
    }

    #[test]
    fn test_open_rejects_bad_tax_id() {
        assert!(matches!(
            Account::open("Ana", "123", Money::ZERO),
            Err(AccountError::InvalidTaxId(_))
        ));
    }

    #[test]
    fn test_open_rejects_negative_balance() {
        assert_eq!(
            Account::open("Ana", "12345678900", Money::from_minor(-1)),
            Err(AccountError::NegativeBalance(Money::from_minor(-1)))
        );
    }

    #[test]
    fn test_debit_subtracts() {
        let mut account = account(1000);
        account.debit(Money::from_minor(300)).unwrap();
        assert_eq!(account.balance(), Money::from_minor(700));
    }

    #[test]
    fn test_debit_whole_balance() {
        let mut account = account(1000);
        account.debit(Money::from_minor(1000)).unwrap();
        assert_eq!(account.balance(), Money::ZERO);
    }

    #[test]
    fn test_debit_insufficient_leaves_balance() {
        let mut account = account(100);
        let err = account.debit(Money::from_minor(150)).unwrap_err();
        assert_eq!(
            err,
            AccountError::InsufficientBalance {
                available: Money::from_minor(100),
                requested: Money::from_minor(150),
            }
        );
        assert_eq!(account.balance(), Money::from_minor(100));
    }

    #[test]
    fn test_credit_adds() {
        let mut account = account(200);
        account.credit(Money::from_minor(300)).unwrap();
        assert_eq!(account.balance(), Money::from_minor(500));
    }

    #[test]
    fn test_credit_overflow() {
        let mut account = account(i64::MAX);
        assert_eq!(
            account.credit(Money::from_minor(1)),
            Err(AccountError::BalanceOverflow(Money::from_minor(1)))
        );
        assert_eq!(account.balance(), Money::from_minor(i64::MAX));
    }

    #[test]
    fn test_non_positive_amounts_rejected() {
        let mut account = account(100);
        assert!(account.debit(Money::ZERO).is_err());
        assert!(account.credit(Money::from_minor(-5)).is_err());
        assert_eq!(account.balance(), Money::from_minor(100));
    }

    #[test]
    fn test_restore_rejects_negative_balance() {
        let tax_id = TaxId::parse("12345678900").unwrap();
        assert!(
            Account::restore(
                AccountId::new(),
                "Ana".into(),
                tax_id,
                Money::from_minor(-10),
                Utc::now()
            )
            .is_err()
        );
    }
}
