pub mod auth;
pub mod config;
pub mod error;
pub mod identity;
pub mod memory;
pub mod response;
pub mod roles;
pub mod supabase;
pub mod types;
pub mod users;

use std::sync::Arc;

use config::Config;
use identity::{GoTrueAdmin, IdentityProvider};
use roles::{PostgrestRoleStore, RoleStore};
use supabase::SupabaseClient;
use users::AccountProvisioner;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub provisioner: AccountProvisioner,
}

impl AppState {
    /// Wire the Supabase backends described by `config`.
    pub fn new(config: Config, http: reqwest::Client) -> Arc<Self> {
        let client = SupabaseClient::from_config(http, &config);
        let identity = Arc::new(GoTrueAdmin::new(client.clone()));
        let roles = Arc::new(PostgrestRoleStore::new(client, config.role_table.clone()));
        Self::with_backends(config, identity, roles)
    }

    pub fn with_backends(
        config: Config,
        identity: Arc<dyn IdentityProvider>,
        roles: Arc<dyn RoleStore>,
    ) -> Arc<Self> {
        let provisioner = AccountProvisioner::new(identity, roles, config.api_secret.clone());
        Arc::new(Self {
            config,
            provisioner,
        })
    }
}
