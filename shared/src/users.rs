use std::sync::Arc;

use lambda_http::http::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::auth::verify_api_key;
use crate::config::SecretString;
use crate::error::{ProviderError, ProvisioningError};
use crate::identity::IdentityProvider;
use crate::roles::RoleStore;
use crate::types::{
    AccountChangedResponse, AccountMutation, AccountMutationRequest, CreateAccountResponse,
    CreatedUser, ErrorResponse, NewAccount, Role, RoleAssignment, UserUpdateFields,
};

/// Status and JSON body returned to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult {
    pub status: StatusCode,
    pub body: Value,
}

impl OperationResult {
    fn ok<T: Serialize>(payload: &T) -> Self {
        match serde_json::to_value(payload) {
            Ok(body) => Self {
                status: StatusCode::OK,
                body,
            },
            Err(e) => ProvisioningError::Internal(e.to_string()).into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl From<ProvisioningError> for OperationResult {
    fn from(err: ProvisioningError) -> Self {
        let body = serde_json::to_value(ErrorResponse {
            error: err.to_string(),
        })
        .unwrap_or(Value::Null);
        Self {
            status: err.status_code(),
            body,
        }
    }
}

/// Creates, updates and deletes dashboard accounts while keeping their role row in step.
#[derive(Clone)]
pub struct AccountProvisioner {
    identity: Arc<dyn IdentityProvider>,
    roles: Arc<dyn RoleStore>,
    api_secret: SecretString,
}

impl AccountProvisioner {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        roles: Arc<dyn RoleStore>,
        api_secret: SecretString,
    ) -> Self {
        Self {
            identity,
            roles,
            api_secret,
        }
    }

    /// Check the caller's shared secret.
    pub fn authorize(&self, api_key: Option<&str>) -> Result<(), ProvisioningError> {
        if verify_api_key(api_key, &self.api_secret) {
            Ok(())
        } else {
            tracing::warn!("Unauthorized: invalid or missing API key");
            Err(ProvisioningError::Unauthorized)
        }
    }

    /// Authorize, parse and run one mutation request.
    pub async fn handle(&self, body: &[u8], api_key: Option<&str>) -> OperationResult {
        if let Err(e) = self.authorize(api_key) {
            return e.into();
        }

        let request: AccountMutationRequest = match serde_json::from_slice(body) {
            Ok(req) => req,
            Err(e) => {
                tracing::error!("Failed to parse request body: {}", e);
                return ProvisioningError::Internal(e.to_string()).into();
            }
        };

        let mutation = match AccountMutation::try_from(request) {
            Ok(mutation) => mutation,
            Err(e) => {
                tracing::warn!("Rejected request: {}", e);
                return e.into();
            }
        };

        tracing::info!("Processing action: {}", mutation.action());
        self.execute(mutation).await
    }

    /// Run an already validated mutation.
    pub async fn execute(&self, mutation: AccountMutation) -> OperationResult {
        let result = match mutation {
            AccountMutation::Create {
                email,
                password,
                role,
            } => self
                .create_account(NewAccount { email, password }, role)
                .await
                .map(|created| OperationResult::ok(&created)),
            AccountMutation::Update {
                user_id,
                fields,
                role,
            } => self
                .update_account(&user_id, fields.as_ref(), role)
                .await
                .map(|changed| OperationResult::ok(&changed)),
            AccountMutation::Delete { user_id } => self
                .delete_account(&user_id)
                .await
                .map(|changed| OperationResult::ok(&changed)),
        };

        result.unwrap_or_else(OperationResult::from)
    }

    pub async fn create_account(
        &self,
        new_account: NewAccount,
        role: Role,
    ) -> Result<CreateAccountResponse, ProvisioningError> {
        let account = self
            .identity
            .create_account(&new_account)
            .await
            .map_err(|e| {
                tracing::error!("Error creating user: {}", e);
                ProvisioningError::from(e)
            })?;

        let assignment = RoleAssignment {
            user_id: account.id.clone(),
            role,
        };
        if let Err(e) = self.roles.insert(&assignment).await {
            tracing::error!("Error assigning role: {}", e);
            self.compensate_failed_create(&account.id).await;
            return Err(ProvisioningError::BadRequest(format!(
                "Failed to assign role: {}",
                e
            )));
        }

        tracing::info!("User created successfully: {}", account.id);
        Ok(CreateAccountResponse {
            success: true,
            user: CreatedUser {
                id: account.id,
                email: account.email.unwrap_or(new_account.email),
                role,
            },
        })
    }

    /// Best-effort removal of an account whose role could not be stored.
    /// Returns whether the account is gone; a failure here is only logged.
    pub async fn compensate_failed_create(&self, user_id: &str) -> bool {
        match self.identity.delete_account(user_id).await {
            Ok(()) => {
                tracing::info!("Rolled back account {}", user_id);
                true
            }
            Err(e) => {
                tracing::error!("Failed to roll back account {}: {}", user_id, e);
                false
            }
        }
    }

    pub async fn update_account(
        &self,
        user_id: &str,
        fields: Option<&UserUpdateFields>,
        role: Option<Role>,
    ) -> Result<AccountChangedResponse, ProvisioningError> {
        if let Some(fields) = fields {
            self.identity
                .update_account(user_id, fields)
                .await
                .map_err(|e| {
                    tracing::error!("Error updating user: {}", e);
                    ProvisioningError::from(e)
                })?;
        }

        if let Some(role) = role {
            self.replace_role(user_id, role).await?;
        }

        tracing::info!("User updated successfully: {}", user_id);
        Ok(AccountChangedResponse {
            success: true,
            user_id: user_id.to_string(),
        })
    }

    // delete-then-insert keeps a single row per user
    async fn replace_role(&self, user_id: &str, role: Role) -> Result<(), ProvisioningError> {
        if let Err(e) = self.roles.delete_by_user(user_id).await {
            tracing::error!("Error deleting old roles: {}", e);
        }

        let assignment = RoleAssignment {
            user_id: user_id.to_string(),
            role,
        };
        self.roles
            .insert(&assignment)
            .await
            .map_err(|e: ProviderError| {
                tracing::error!("Error updating role: {}", e);
                ProvisioningError::BadRequest(format!("Failed to update role: {}", e))
            })
    }

    pub async fn delete_account(
        &self,
        user_id: &str,
    ) -> Result<AccountChangedResponse, ProvisioningError> {
        self.identity.delete_account(user_id).await.map_err(|e| {
            tracing::error!("Error deleting user: {}", e);
            ProvisioningError::from(e)
        })?;

        tracing::info!("User deleted successfully: {}", user_id);
        Ok(AccountChangedResponse {
            success: true,
            user_id: user_id.to_string(),
        })
    }
}
