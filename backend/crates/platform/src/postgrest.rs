//! PostgREST table client
//!
//! Minimal select/upsert access to the identity provider's hosted tables.
//! Requests authenticate with the service-role key, so this client must only
//! ever run server-side.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error)]
pub enum PostgrestError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("PostgREST returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid header value for API key")]
    InvalidKey,
}

impl PostgrestError {
    /// Worth retrying: transport failures, 429 and 5xx
    pub fn is_transient(&self) -> bool {
        match self {
            PostgrestError::Transport(e) => e.is_timeout() || e.is_connect(),
            PostgrestError::Status { status, .. } => crate::http::is_transient_status(*status),
            PostgrestError::InvalidKey => false,
        }
    }
}

/// Conflict handling for upserts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnConflict {
    /// Overwrite the existing row with the supplied columns
    Merge,
    /// Leave the existing row untouched
    Ignore,
}

impl OnConflict {
    fn prefer(&self) -> &'static str {
        match self {
            OnConflict::Merge => "resolution=merge-duplicates,return=representation",
            OnConflict::Ignore => "resolution=ignore-duplicates,return=representation",
        }
    }
}

#[derive(Clone)]
pub struct PostgrestClient {
    http: reqwest::Client,
    rest_url: String,
    api_key: SecretString,
}

impl PostgrestClient {
    /// `project_url` is the provider base URL, e.g. `https://abc.supabase.co`
    pub fn new(http: reqwest::Client, project_url: &str, api_key: SecretString) -> Self {
        Self {
            http,
            rest_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            api_key,
        }
    }

    fn auth_headers(&self) -> Result<HeaderMap, PostgrestError> {
        let key = self.api_key.expose_secret();
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(key).map_err(|_| PostgrestError::InvalidKey)?,
        );
        headers.insert(
            reqwest::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|_| PostgrestError::InvalidKey)?,
        );
        Ok(headers)
    }

    /// First row where every `column = value` holds
    pub async fn select_one<T>(
        &self,
        table: &str,
        filters: &[(&str, &str)],
    ) -> Result<Option<T>, PostgrestError>
    where
        T: DeserializeOwned,
    {
        let mut query: Vec<(String, String)> = vec![
            ("select".to_string(), "*".to_string()),
            ("limit".to_string(), "1".to_string()),
        ];
        query.extend(
            filters
                .iter()
                .map(|(column, value)| (column.to_string(), format!("eq.{}", value))),
        );

        let response = self
            .http
            .get(format!("{}/{}", self.rest_url, table))
            .headers(self.auth_headers()?)
            .query(&query)
            .send()
            .await?;

        let mut rows: Vec<T> = Self::read_json(response).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    /// Insert-or-update keyed by `conflict_column`. Returns the stored row, or
    /// `None` when `OnConflict::Ignore` skipped an existing row.
    pub async fn upsert<B, T>(
        &self,
        table: &str,
        conflict_column: &str,
        on_conflict: OnConflict,
        row: &B,
    ) -> Result<Option<T>, PostgrestError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(format!("{}/{}", self.rest_url, table))
            .headers(self.auth_headers()?)
            .header("Prefer", on_conflict.prefer())
            .query(&[("on_conflict", conflict_column)])
            .json(row)
            .send()
            .await?;

        let mut rows: Vec<T> = Self::read_json(response).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, PostgrestError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), %message, "PostgREST request failed");
            return Err(PostgrestError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}

impl std::fmt::Debug for PostgrestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgrestClient")
            .field("rest_url", &self.rest_url)
            .finish_non_exhaustive()
    }
}
