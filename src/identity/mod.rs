//! Sign-in / sign-up contract of the hosted identity provider, plus an
//! in-process implementation used by the CLI and tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use crate::config::IdentityConfig;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Email already in use")]
    EmailInUse,
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Password should be at least 6 characters")]
    WeakPassword,
    #[error("Identity provider unavailable")]
    Unavailable,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<User, IdentityError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<User, IdentityError>;

    async fn sign_out(&self);

    fn current_user(&self) -> Option<User>;

    /// Fires whenever the signed-in user changes.
    fn subscribe(&self) -> watch::Receiver<Option<User>>;
}

struct Account {
    user: User,
    password: String,
}

pub struct MemoryIdentityProvider {
    accounts: Mutex<HashMap<String, Account>>,
    current: watch::Sender<Option<User>>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            current,
        }
    }

    /// Seeds accounts from config. User ids derive from the email so history
    /// survives restarts.
    pub fn from_config(config: &IdentityConfig) -> Self {
        let provider = Self::new();
        if let Ok(mut accounts) = provider.accounts.lock() {
            for account in &config.accounts {
                let email = normalize(&account.email);
                accounts.insert(
                    email.clone(),
                    Account {
                        user: User {
                            id: stable_id(&email),
                            email: email.clone(),
                        },
                        password: account.password.clone(),
                    },
                );
            }
        }
        provider
    }

    fn set_current(&self, user: Option<User>) {
        self.current.send_replace(user);
    }
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

fn stable_id(email: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, email.as_bytes()).to_string()
}

fn valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<User, IdentityError> {
        let email = normalize(email);
        let user = {
            let accounts = self.accounts.lock().map_err(|_| IdentityError::Unavailable)?;
            match accounts.get(&email) {
                Some(account) if account.password == password => account.user.clone(),
                _ => return Err(IdentityError::InvalidCredentials),
            }
        };

        info!(user = %user.id, "signed in");
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<User, IdentityError> {
        let email = normalize(email);
        if !valid_email(&email) {
            return Err(IdentityError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(IdentityError::WeakPassword);
        }

        let user = {
            let mut accounts = self.accounts.lock().map_err(|_| IdentityError::Unavailable)?;
            if accounts.contains_key(&email) {
                return Err(IdentityError::EmailInUse);
            }
            let user = User {
                id: stable_id(&email),
                email: email.clone(),
            };
            accounts.insert(
                email,
                Account {
                    user: user.clone(),
                    password: password.to_string(),
                },
            );
            user
        };

        info!(user = %user.id, "account created");
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) {
        self.set_current(None);
    }

    fn current_user(&self) -> Option<User> {
        self.current.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.current.subscribe()
    }
}
