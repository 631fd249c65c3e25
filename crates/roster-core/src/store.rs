//! Account storage backends.

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::account::{Account, NewAccount, DEFAULT_PROFILE_PIC};
use crate::error::Result;

/// Trait for account storage backends.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Returns every account in insertion order.
    async fn list(&self) -> Result<Vec<Account>>;

    /// Appends a new account and returns it.
    ///
    /// Uses the store's placeholder picture when `profile_pic` is `None`.
    async fn create(&self, fields: NewAccount, profile_pic: Option<String>) -> Result<Account>;

    /// Finds an account by id.
    async fn find(&self, id: &str) -> Result<Option<Account>>;

    /// Replaces an account's content. Returns `false` if no account matched.
    async fn update_content(&self, id: &str, content: String) -> Result<bool>;

    /// Deletes accounts by id. Returns the number removed.
    async fn delete(&self, id: &str) -> Result<usize>;

    /// Returns the number of accounts.
    async fn count(&self) -> Result<usize>;
}

/// In-memory account store. Contents are lost on restart.
pub struct InMemoryStore {
    accounts: RwLock<Vec<Account>>,
    placeholder: String,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(Vec::new()),
            placeholder: DEFAULT_PROFILE_PIC.to_string(),
        }
    }

    /// Creates a store holding the sample accounts.
    #[must_use]
    pub fn seeded() -> Self {
        Self {
            accounts: RwLock::new(Account::seed()),
            placeholder: DEFAULT_PROFILE_PIC.to_string(),
        }
    }

    /// Sets the picture URL given to accounts created without an upload.
    #[must_use]
    pub fn with_placeholder(mut self, url: impl Into<String>) -> Self {
        self.placeholder = url.into();
        self
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn list(&self) -> Result<Vec<Account>> {
        Ok(self.accounts.read().clone())
    }

    async fn create(&self, fields: NewAccount, profile_pic: Option<String>) -> Result<Account> {
        let profile_pic = profile_pic.unwrap_or_else(|| self.placeholder.clone());
        let account = Account::new(fields, profile_pic);
        self.accounts.write().push(account.clone());
        tracing::debug!(id = %account.id, username = %account.username, "Account stored");
        Ok(account)
    }

    async fn find(&self, id: &str) -> Result<Option<Account>> {
        Ok(self.accounts.read().iter().find(|a| a.id == id).cloned())
    }

    async fn update_content(&self, id: &str, content: String) -> Result<bool> {
        let mut accounts = self.accounts.write();
        match accounts.iter_mut().find(|a| a.id == id) {
            Some(account) => {
                account.content = content;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> Result<usize> {
        let mut accounts = self.accounts.write();
        let before = accounts.len();
        accounts.retain(|a| a.id != id);
        Ok(before - accounts.len())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.accounts.read().len())
    }
}
