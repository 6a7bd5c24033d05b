//! Login gateway service

use relay_common::PasswordService;
use relay_core::{Account, AccountRepository};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::LoginError;

/// Result of a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Existing account, password matched
    Authenticated(Account),
    /// Unknown username, account created (auto-register only)
    Registered(Account),
}

impl LoginOutcome {
    /// Get the account
    pub fn account(&self) -> &Account {
        match self {
            Self::Authenticated(account) | Self::Registered(account) => account,
        }
    }
}

/// Validates and creates accounts
pub struct LoginGateway {
    accounts: Arc<dyn AccountRepository>,
    passwords: PasswordService,
    auto_register: bool,
}

impl LoginGateway {
    /// Create a new login gateway
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self {
            accounts,
            passwords: PasswordService::new(),
            auto_register: false,
        }
    }

    /// Register unknown usernames on login instead of rejecting them
    pub fn with_auto_register(mut self, auto_register: bool) -> Self {
        self.auto_register = auto_register;
        self
    }

    /// Check if unknown usernames are registered on login
    pub fn auto_register(&self) -> bool {
        self.auto_register
    }

    /// Check a username and password against the store
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Account, LoginError> {
        let account = self.accounts.find_by_username(username).await?.ok_or_else(|| {
            warn!("Login failed: unknown account");
            LoginError::InvalidCredentials
        })?;

        self.verify(account, password).await
    }

    /// Create a new account
    ///
    /// Fails with `LoginError::UsernameTaken` if the username exists.
    #[instrument(skip(self, password))]
    pub async fn register(&self, username: &str, password: &str) -> Result<Account, LoginError> {
        let password_hash = self.passwords.hash(password)?;
        let account = self.accounts.create(username, &password_hash).await?;

        info!(account_id = account.id, "Account created");
        Ok(account)
    }

    /// Log in, registering the account first when auto-register is on
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, LoginError> {
        match self.accounts.find_by_username(username).await? {
            Some(account) => {
                let account = self.verify(account, password).await?;
                Ok(LoginOutcome::Authenticated(account))
            }
            None if self.auto_register => {
                let account = self.register(username, password).await?;
                Ok(LoginOutcome::Registered(account))
            }
            None => {
                warn!("Login failed: unknown account");
                Err(LoginError::InvalidCredentials)
            }
        }
    }

    async fn verify(&self, account: Account, password: &str) -> Result<Account, LoginError> {
        let password_hash = self
            .accounts
            .get_password_hash(account.id)
            .await?
            .ok_or_else(|| {
                warn!(account_id = account.id, "Login failed: no password hash");
                LoginError::InvalidCredentials
            })?;

        if !self.passwords.verify(password, &password_hash)? {
            warn!(account_id = account.id, "Login failed: invalid password");
            return Err(LoginError::InvalidCredentials);
        }

        info!(account_id = account.id, "Login successful");
        Ok(account)
    }
}

impl std::fmt::Debug for LoginGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginGateway")
            .field("auto_register", &self.auto_register)
            .finish_non_exhaustive()
    }
}
