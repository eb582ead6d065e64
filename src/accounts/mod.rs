use crate::error::{Error, Result};
use crate::types::balance::Balance;
use crate::types::ids::UserId;
use crate::types::timestamp::Timestamp;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    /// Opaque password credential. Hashing and verification belong to the
    /// outer identity layer; the store only keeps what it is handed.
    pub credential: String,
    pub balance: Balance,
    pub is_admin: bool,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Account {
    fn new(name: &str, email: &str, credential: &str, starting_balance: Balance) -> Self {
        let now = Timestamp::now();
        Account {
            user_id: UserId::new(),
            name: name.to_string(),
            email: email.to_string(),
            credential: credential.to_string(),
            balance: starting_balance,
            is_admin: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Holds every user's cash balance. Balances are mutated only through
/// `adjust_balance`, which fuses the non-negative check with the mutation so
/// no caller can observe or interleave between the two.
pub struct AccountStore {
    accounts: DashMap<UserId, Account>,
    email_index: DashMap<String, UserId>,
    starting_balance: Balance,
}

impl AccountStore {
    pub fn new(starting_balance: Balance) -> Self {
        AccountStore {
            accounts: DashMap::new(),
            email_index: DashMap::new(),
            starting_balance,
        }
    }

    pub fn register(&self, name: &str, email: &str, credential: &str) -> Result<Account> {
        let key = email.to_lowercase();

        // Claim the email first so two concurrent registrations cannot both
        // create an account.
        let account = match self.email_index.entry(key) {
            Entry::Occupied(_) => return Err(Error::DuplicateEmail(email.to_string())),
            Entry::Vacant(vacant) => {
                let account = Account::new(name, email, credential, self.starting_balance);
                vacant.insert(account.user_id);
                account
            }
        };

        self.accounts.insert(account.user_id, account.clone());
        Ok(account)
    }

    pub fn get(&self, user_id: UserId) -> Result<Account> {
        self.accounts
            .get(&user_id)
            .map(|entry| entry.clone())
            .ok_or(Error::AccountNotFound(user_id))
    }

    pub fn balance_of(&self, user_id: UserId) -> Result<Balance> {
        Ok(self.get(user_id)?.balance)
    }

    /// Fails with `AccountInactive` when the account has been deactivated.
    /// Trade paths call this during validation; profile reads do not.
    pub fn require_active(&self, user_id: UserId) -> Result<Account> {
        let account = self.get(user_id)?;
        if !account.is_active {
            return Err(Error::AccountInactive(user_id));
        }
        Ok(account)
    }

    /// Atomic check-and-mutate: applies `delta` unless the result would be
    /// negative, in which case nothing changes and `InsufficientFunds` is
    /// returned. Returns the new balance.
    pub fn adjust_balance(&self, user_id: UserId, delta: Balance) -> Result<Balance> {
        let mut entry = self
            .accounts
            .get_mut(&user_id)
            .ok_or(Error::AccountNotFound(user_id))?;

        let new_balance = entry.balance + delta;
        if new_balance.is_negative() {
            return Err(Error::InsufficientFunds {
                required: delta.abs(),
                available: entry.balance,
            });
        }

        entry.balance = new_balance;
        entry.updated_at = Timestamp::now();

        Ok(new_balance)
    }

    /// Accounts are never deleted, only deactivated.
    pub fn deactivate(&self, user_id: UserId) -> Result<()> {
        let mut entry = self
            .accounts
            .get_mut(&user_id)
            .ok_or(Error::AccountNotFound(user_id))?;
        entry.is_active = false;
        entry.updated_at = Timestamp::now();
        Ok(())
    }

    pub fn set_admin(&self, user_id: UserId, is_admin: bool) -> Result<()> {
        let mut entry = self
            .accounts
            .get_mut(&user_id)
            .ok_or(Error::AccountNotFound(user_id))?;
        entry.is_admin = is_admin;
        entry.updated_at = Timestamp::now();
        Ok(())
    }

    pub fn starting_balance(&self) -> Balance {
        self.starting_balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn store() -> AccountStore {
        AccountStore::new(Balance::new(Decimal::from(1000)))
    }

    #[test]
    fn register_seeds_starting_balance() {
        let store = store();
        let account = store.register("Alice", "alice@example.com", "hash").unwrap();
        assert_eq!(account.balance, Balance::new(Decimal::from(1000)));
        assert!(account.is_active);
        assert!(!account.is_admin);
    }

    #[test]
    fn duplicate_email_is_rejected_case_insensitively() {
        let store = store();
        store.register("Alice", "alice@example.com", "hash").unwrap();
        let result = store.register("Mallory", "Alice@Example.com", "hash");
        assert!(matches!(result, Err(Error::DuplicateEmail(_))));
    }

    #[test]
    fn adjust_balance_rejects_overdraft_without_mutation() {
        let store = store();
        let account = store.register("Bob", "bob@example.com", "hash").unwrap();

        let result = store.adjust_balance(account.user_id, -Balance::new(Decimal::from(1001)));
        assert!(matches!(result, Err(Error::InsufficientFunds { .. })));
        assert_eq!(
            store.balance_of(account.user_id).unwrap(),
            Balance::new(Decimal::from(1000))
        );
    }

    #[test]
    fn deactivated_account_fails_active_check_but_still_reads() {
        let store = store();
        let account = store.register("Carol", "carol@example.com", "hash").unwrap();
        store.deactivate(account.user_id).unwrap();

        assert!(matches!(
            store.require_active(account.user_id),
            Err(Error::AccountInactive(_))
        ));
        assert!(store.get(account.user_id).is_ok());
    }
}
