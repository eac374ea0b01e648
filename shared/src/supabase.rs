use reqwest::{RequestBuilder, Response};
use url::Url;

use crate::config::{Config, SecretString};
use crate::error::{provider_message, ProviderError};

/// Authenticated HTTP access to a Supabase project, shared by the auth admin
/// and table adapters.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: Url,
    service_role_key: SecretString,
}

impl SupabaseClient {
    pub fn new(http: reqwest::Client, base_url: Url, service_role_key: SecretString) -> Self {
        Self {
            http,
            base_url,
            service_role_key,
        }
    }

    pub fn from_config(http: reqwest::Client, config: &Config) -> Self {
        Self::new(
            http,
            config.supabase_url.clone(),
            config.service_role_key.clone(),
        )
    }

    pub fn post(&self, url: Url) -> RequestBuilder {
        self.authorize(self.http.post(url))
    }

    pub fn put(&self, url: Url) -> RequestBuilder {
        self.authorize(self.http.put(url))
    }

    pub fn delete(&self, url: Url) -> RequestBuilder {
        self.authorize(self.http.delete(url))
    }

    /// Join path segments onto the project URL, percent-encoding each one.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Attach the service role key the way supabase-js does.
    pub fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        let key = self.service_role_key.expose();
        req.header("apikey", key)
            .header("Authorization", format!("Bearer {}", key))
    }

    /// Turn a non-success response into a `ProviderError::Rejected`.
    pub async fn check(response: Response) -> Result<Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ProviderError::rejected(
            status.as_u16(),
            provider_message(status, &body),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> SupabaseClient {
        SupabaseClient::new(
            reqwest::Client::new(),
            Url::parse(base).unwrap(),
            SecretString::new("service-key"),
        )
    }

    #[test]
    fn test_endpoint_appends_segments() {
        let url = client("https://abc.supabase.co/")
            .endpoint(&["auth", "v1", "admin", "users"])
            .unwrap();
        assert_eq!(url.as_str(), "https://abc.supabase.co/auth/v1/admin/users");
    }

    #[test]
    fn test_endpoint_encodes_user_id() {
        let url = client("http://localhost:54321/")
            .endpoint(&["auth", "v1", "admin", "users", "../etc"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:54321/auth/v1/admin/users/..%2Fetc"
        );
    }
}
