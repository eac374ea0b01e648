use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::supabase::SupabaseClient;
use crate::types::{Account, NewAccount, UserUpdateFields};

/// Admin operations on the external identity store.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account that is already email-confirmed.
    async fn create_account(&self, account: &NewAccount) -> Result<Account, ProviderError>;
    async fn update_account(
        &self,
        user_id: &str,
        fields: &UserUpdateFields,
    ) -> Result<Account, ProviderError>;
    async fn delete_account(&self, user_id: &str) -> Result<(), ProviderError>;
}

/// Supabase GoTrue admin API (`/auth/v1/admin/users`).
#[derive(Clone)]
pub struct GoTrueAdmin {
    client: SupabaseClient,
}

#[derive(Serialize)]
struct CreateUserBody<'a> {
    email: &'a str,
    password: &'a str,
    email_confirm: bool,
}

#[derive(Deserialize)]
struct GoTrueUser {
    id: String,
    email: Option<String>,
    email_confirmed_at: Option<DateTime<Utc>>,
}

impl From<GoTrueUser> for Account {
    fn from(user: GoTrueUser) -> Self {
        Account {
            id: user.id,
            email: user.email.filter(|e| !e.is_empty()),
            confirmed: user.email_confirmed_at.is_some(),
        }
    }
}

impl GoTrueAdmin {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    fn users_url(&self, user_id: Option<&str>) -> Result<url::Url, ProviderError> {
        match user_id {
            Some(id) => self.client.endpoint(&["auth", "v1", "admin", "users", id]),
            None => self.client.endpoint(&["auth", "v1", "admin", "users"]),
        }
    }

    async fn read_user(response: reqwest::Response) -> Result<Account, ProviderError> {
        let response = SupabaseClient::check(response).await?;
        let user: GoTrueUser = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        Ok(user.into())
    }
}

#[async_trait]
impl IdentityProvider for GoTrueAdmin {
    async fn create_account(&self, account: &NewAccount) -> Result<Account, ProviderError> {
        let url = self.users_url(None)?;
        tracing::debug!("Creating account for {}", account.email);

        let response = self
            .client
            .post(url)
            .json(&CreateUserBody {
                email: &account.email,
                password: account.password.expose(),
                email_confirm: true,
            })
            .send()
            .await?;

        Self::read_user(response).await
    }

    async fn update_account(
        &self,
        user_id: &str,
        fields: &UserUpdateFields,
    ) -> Result<Account, ProviderError> {
        let url = self.users_url(Some(user_id))?;
        tracing::debug!("Updating account {}", user_id);

        let response = self.client.put(url).json(fields).send().await?;

        Self::read_user(response).await
    }

    async fn delete_account(&self, user_id: &str) -> Result<(), ProviderError> {
        let url = self.users_url(Some(user_id))?;
        tracing::debug!("Deleting account {}", user_id);

        let response = self.client.delete(url).send().await?;
        SupabaseClient::check(response).await?;
        Ok(())
    }
}
