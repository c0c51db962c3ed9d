//! Account registration and credential checks.
//!
//! Accounts are looked up by **username** when authenticating. Uniqueness of
//! usernames and emails is left entirely to the table's `UNIQUE` constraints,
//! so two racing registrations resolve inside a single `INSERT`.

use diesel::insert_into;
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::db::{self, get_connection, DbPool};
use crate::error::AccountError;
use crate::models::{Account, NewAccount};
use crate::password::PasswordHasher;
use crate::schema::accounts::dsl::{self, accounts};

use diesel::prelude::*;

#[derive(Clone)]
pub struct AccountStore {
    pool: DbPool,
    hasher: PasswordHasher,
}

impl AccountStore {
    pub fn new(pool: DbPool, hasher: PasswordHasher) -> Self {
        Self { pool, hasher }
    }

    /// Open the database named by `config`, running migrations first.
    pub fn open(config: &Config) -> Result<Self, AccountError> {
        let pool = db::establish(config)?;
        let hasher = match &config.password_secret {
            Some(secret) => PasswordHasher::with_secret(secret.as_bytes()),
            None => PasswordHasher::new(),
        };
        Ok(Self::new(pool, hasher))
    }

    /// Create an account. Fails with [`AccountError::DuplicateAccount`] when
    /// the username or email is taken.
    #[instrument(skip(self, email, password))]
    pub fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Account, AccountError> {
        require("username", username)?;
        require("email", email)?;
        require("password", password)?;

        let password_hash = self.hasher.hash(password)?;
        let mut conn = get_connection(&self.pool)?;

        let account = insert_into(accounts)
            .values(&NewAccount {
                username,
                email,
                password_hash: &password_hash,
            })
            .returning(Account::as_returning())
            .get_result(&mut conn)?;

        info!(id = account.id, "account created");
        Ok(account)
    }

    /// Check a username and password pair.
    ///
    /// An unknown username and a wrong password both produce
    /// [`AccountError::InvalidCredentials`].
    #[instrument(skip(self, password))]
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Account, AccountError> {
        let found = self.find_by_username(username)?;

        match found {
            Some(account) if self.hasher.verify(password, &account.password_hash) => {
                info!(id = account.id, "login succeeded");
                Ok(account)
            }
            Some(_) => {
                debug!("password mismatch");
                Err(AccountError::InvalidCredentials)
            }
            None => {
                // Spend the same hashing work as a real check.
                let _ = self.hasher.hash(password);
                debug!("no such user");
                Err(AccountError::InvalidCredentials)
            }
        }
    }

    pub fn find_by_username(&self, username: &str) -> Result<Option<Account>, AccountError> {
        let mut conn = get_connection(&self.pool)?;
        let account = accounts
            .filter(dsl::username.eq(username))
            .select(Account::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(account)
    }

    pub fn count(&self) -> Result<i64, AccountError> {
        let mut conn = get_connection(&self.pool)?;
        Ok(accounts.count().get_result(&mut conn)?)
    }
}

fn require(field: &'static str, value: &str) -> Result<(), AccountError> {
    if value.is_empty() {
        return Err(AccountError::InvalidInput { field });
    }
    Ok(())
}
