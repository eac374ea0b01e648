//! In-memory backends for tests and local runs without a Supabase project.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ProviderError;
use crate::identity::IdentityProvider;
use crate::roles::RoleStore;
use crate::types::{Account, NewAccount, RoleAssignment, UserUpdateFields};

/// Backend call, recorded in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateAccount(String),
    UpdateAccount(String),
    DeleteAccount(String),
    InsertRole(String),
    DeleteRoles(String),
}

/// Call log shared by the in-memory backends so ordering across them is visible.
#[derive(Debug, Default)]
pub struct CallLog(Mutex<Vec<Call>>);

impl CallLog {
    fn push(&self, call: Call) {
        lock(&self.0).push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.0).clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        lock(&self.0).iter().filter(|c| *c == call).count()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Operations that can be told to fail.
#[derive(Debug, Default, Clone)]
pub struct Failures {
    pub create: Option<String>,
    pub update: Option<String>,
    pub delete: Option<String>,
    pub insert_role: Option<String>,
    pub delete_roles: Option<String>,
}

fn fail(message: &Option<String>) -> Result<(), ProviderError> {
    match message {
        Some(message) => Err(ProviderError::rejected(400, message.clone())),
        None => Ok(()),
    }
}

/// Identity provider and role table held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    accounts: Mutex<HashMap<String, Account>>,
    roles: Mutex<Vec<RoleAssignment>>,
    failures: Mutex<Failures>,
    log: CallLog,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failures(failures: Failures) -> Self {
        let backend = Self::default();
        *lock(&backend.failures) = failures;
        backend
    }

    pub fn set_failures(&self, failures: Failures) {
        *lock(&self.failures) = failures;
    }

    /// Seed an account and its role, bypassing the call log.
    pub fn seed(&self, account: Account, role: Option<crate::types::Role>) {
        if let Some(role) = role {
            lock(&self.roles).push(RoleAssignment {
                user_id: account.id.clone(),
                role,
            });
        }
        lock(&self.accounts).insert(account.id.clone(), account);
    }

    pub fn account(&self, user_id: &str) -> Option<Account> {
        lock(&self.accounts).get(user_id).cloned()
    }

    pub fn accounts(&self) -> Vec<Account> {
        lock(&self.accounts).values().cloned().collect()
    }

    pub fn roles_for(&self, user_id: &str) -> Vec<RoleAssignment> {
        lock(&self.roles)
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn log(&self) -> &CallLog {
        &self.log
    }
}

#[async_trait]
impl IdentityProvider for InMemoryBackend {
    async fn create_account(&self, account: &NewAccount) -> Result<Account, ProviderError> {
        self.log.push(Call::CreateAccount(account.email.clone()));
        fail(&lock(&self.failures).create)?;

        let mut accounts = lock(&self.accounts);
        if accounts
            .values()
            .any(|a| a.email.as_deref() == Some(account.email.as_str()))
        {
            return Err(ProviderError::rejected(
                422,
                "A user with this email address has already been registered",
            ));
        }

        let created = Account {
            id: Uuid::new_v4().to_string(),
            email: Some(account.email.clone()),
            confirmed: true,
        };
        accounts.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn update_account(
        &self,
        user_id: &str,
        fields: &UserUpdateFields,
    ) -> Result<Account, ProviderError> {
        self.log.push(Call::UpdateAccount(user_id.to_string()));
        fail(&lock(&self.failures).update)?;

        let mut accounts = lock(&self.accounts);
        let account = accounts
            .get_mut(user_id)
            .ok_or_else(|| ProviderError::rejected(404, "User not found"))?;
        if let Some(email) = &fields.email {
            account.email = Some(email.clone());
        }
        Ok(account.clone())
    }

    async fn delete_account(&self, user_id: &str) -> Result<(), ProviderError> {
        self.log.push(Call::DeleteAccount(user_id.to_string()));
        fail(&lock(&self.failures).delete)?;

        if lock(&self.accounts).remove(user_id).is_none() {
            return Err(ProviderError::rejected(404, "User not found"));
        }
        // mirrors the ON DELETE CASCADE on the role table
        lock(&self.roles).retain(|r| r.user_id != user_id);
        Ok(())
    }
}

#[async_trait]
impl RoleStore for InMemoryBackend {
    async fn insert(&self, assignment: &RoleAssignment) -> Result<(), ProviderError> {
        self.log.push(Call::InsertRole(assignment.user_id.clone()));
        fail(&lock(&self.failures).insert_role)?;

        lock(&self.roles).push(assignment.clone());
        Ok(())
    }

    async fn delete_by_user(&self, user_id: &str) -> Result<(), ProviderError> {
        self.log.push(Call::DeleteRoles(user_id.to_string()));
        fail(&lock(&self.failures).delete_roles)?;

        lock(&self.roles).retain(|r| r.user_id != user_id);
        Ok(())
    }
}
