use async_trait::async_trait;

use crate::error::ProviderError;
use crate::supabase::SupabaseClient;
use crate::types::RoleAssignment;

/// Writes to the role table.
#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn insert(&self, assignment: &RoleAssignment) -> Result<(), ProviderError>;
    /// Remove every row for the user. Removing nothing is not an error.
    async fn delete_by_user(&self, user_id: &str) -> Result<(), ProviderError>;
}

/// Role table exposed through PostgREST (`/rest/v1/{table}`).
#[derive(Clone)]
pub struct PostgrestRoleStore {
    client: SupabaseClient,
    table: String,
}

impl PostgrestRoleStore {
    pub fn new(client: SupabaseClient, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    fn table_url(&self) -> Result<url::Url, ProviderError> {
        self.client.endpoint(&["rest", "v1", &self.table])
    }
}

#[async_trait]
impl RoleStore for PostgrestRoleStore {
    async fn insert(&self, assignment: &RoleAssignment) -> Result<(), ProviderError> {
        let url = self.table_url()?;

        let response = self
            .client
            .post(url)
            .header("Prefer", "return=minimal")
            .json(assignment)
            .send()
            .await?;
        SupabaseClient::check(response).await?;

        tracing::debug!("Role {} stored for {}", assignment.role, assignment.user_id);
        Ok(())
    }

    async fn delete_by_user(&self, user_id: &str) -> Result<(), ProviderError> {
        let mut url = self.table_url()?;
        url.query_pairs_mut()
            .append_pair("user_id", &format!("eq.{}", user_id));

        let response = self.client.delete(url).send().await?;
        SupabaseClient::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecretString;
    use crate::types::Role;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store(server: &MockServer) -> PostgrestRoleStore {
        let base = url::Url::parse(&format!("{}/", server.uri())).unwrap();
        let client = SupabaseClient::new(
            reqwest::Client::new(),
            base,
            SecretString::new("service-key"),
        );
        PostgrestRoleStore::new(client, "user_roles")
    }

    #[tokio::test]
    async fn test_insert_posts_row() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/user_roles"))
            .and(header("apikey", "service-key"))
            .and(header("prefer", "return=minimal"))
            .and(body_json(json!({"user_id": "user-1", "role": "super"})))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        store(&server)
            .insert(&RoleAssignment {
                user_id: "user-1".into(),
                role: Role::Super,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_insert_surfaces_postgrest_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/user_roles"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "23505",
                "details": "Key (user_id)=(user-1) already exists.",
                "hint": null,
                "message": "duplicate key value violates unique constraint \"user_roles_user_id_key\""
            })))
            .mount(&server)
            .await;

        let err = store(&server)
            .insert(&RoleAssignment {
                user_id: "user-1".into(),
                role: Role::Standard,
            })
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("duplicate key value"));
    }

    #[tokio::test]
    async fn test_delete_by_user_filters_on_user_id() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/user_roles"))
            .and(query_param("user_id", "eq.user-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        store(&server).delete_by_user("user-1").await.unwrap();
    }
}
