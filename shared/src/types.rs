use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::SecretString;
use crate::error::ProvisioningError;

// ========== ROLE ==========
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Super,
    Standard,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Super => "super",
            Role::Standard => "standard",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ProvisioningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super" => Ok(Role::Super),
            "standard" => Ok(Role::Standard),
            other => Err(ProvisioningError::BadRequest(format!(
                "Invalid role '{}'. Must be super or standard",
                other
            ))),
        }
    }
}

/// Row in the role table. One per account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub user_id: String,
    pub role: Role,
}

// ========== ACCOUNT ==========
/// Identity record owned by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: String,
    pub email: Option<String>,
    pub confirmed: bool,
}

/// Credentials used to create an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: SecretString,
}

/// Fields patched on an existing account. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdateFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

// ========== REQUEST ==========
/// Request body as posted by the dashboard.
/// Kept loose so that an unknown action or role is a 400 rather than a parse failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMutationRequest {
    pub action: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub user_id: Option<String>,
    #[serde(alias = "userData")]
    pub user_update_fields: Option<UserUpdateFields>,
}

/// Validated mutation, one variant per action.
#[derive(Debug, Clone)]
pub enum AccountMutation {
    Create {
        email: String,
        password: SecretString,
        role: Role,
    },
    Update {
        user_id: String,
        fields: Option<UserUpdateFields>,
        role: Option<Role>,
    },
    Delete {
        user_id: String,
    },
}

impl AccountMutation {
    pub fn action(&self) -> &'static str {
        match self {
            AccountMutation::Create { .. } => "create",
            AccountMutation::Update { .. } => "update",
            AccountMutation::Delete { .. } => "delete",
        }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl TryFrom<AccountMutationRequest> for AccountMutation {
    type Error = ProvisioningError;

    fn try_from(req: AccountMutationRequest) -> Result<Self, Self::Error> {
        match req.action.as_deref() {
            Some("create") => {
                match (present(req.email), present(req.password), present(req.role)) {
                    (Some(email), Some(password), Some(role)) => Ok(AccountMutation::Create {
                        email,
                        password: SecretString::new(password),
                        role: role.parse()?,
                    }),
                    _ => Err(ProvisioningError::BadRequest(
                        "Email, password, and role are required".to_string(),
                    )),
                }
            }
            Some("update") => {
                let user_id = present(req.user_id).ok_or_else(user_id_required)?;
                let role: Option<Role> = present(req.role).map(|r| r.parse()).transpose()?;
                Ok(AccountMutation::Update {
                    user_id,
                    fields: req.user_update_fields,
                    role,
                })
            }
            Some("delete") => {
                let user_id = present(req.user_id).ok_or_else(user_id_required)?;
                Ok(AccountMutation::Delete { user_id })
            }
            _ => Err(ProvisioningError::BadRequest(
                "Invalid action. Must be create, update, or delete".to_string(),
            )),
        }
    }
}

fn user_id_required() -> ProvisioningError {
    ProvisioningError::BadRequest("userId is required".to_string())
}

// ========== RESPONSES ==========
#[derive(Debug, Serialize)]
pub struct CreatedUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct CreateAccountResponse {
    pub success: bool,
    pub user: CreatedUser,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountChangedResponse {
    pub success: bool,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
