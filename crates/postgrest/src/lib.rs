//! PostgREST table client for the Trade Pilot marketplace
//!
//! A small request builder over the Supabase REST endpoint (`/rest/v1`).
//! It covers what the marketplace screens use:
//!
//! - `select` with embedded relations (`bids(*, bidder:bid_by(*))`)
//! - equality filters
//! - `insert` and `update` returning the affected rows
//! - `maybe_single` for one-row lookups such as a user's profile

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Error body returned by PostgREST on failure.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct PostgrestApiErrorDetails {
    pub code: Option<String>,
    pub message: Option<String>,
    pub details: Option<String>,
    pub hint: Option<String>,
}

impl fmt::Display for PostgrestApiErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(code) = &self.code {
            parts.push(format!("Code: {}", code));
        }
        if let Some(message) = &self.message {
            parts.push(format!("Message: {}", message));
        }
        if let Some(details) = &self.details {
            parts.push(format!("Details: {}", details));
        }
        if let Some(hint) = &self.hint {
            parts.push(format!("Hint: {}", hint));
        }
        write!(f, "{}", parts.join(", "))
    }
}

#[derive(Error, Debug)]
pub enum PostgrestError {
    #[error("API error: {details} (Status: {status})")]
    ApiError {
        details: PostgrestApiErrorDetails,
        status: reqwest::StatusCode,
    },

    #[error("API error (unparsed): {message} (Status: {status})")]
    UnparsedApiError {
        message: String,
        status: reqwest::StatusCode,
    },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Expected at most one row, got {0}")]
    MultipleRows(usize),
}

impl PostgrestError {
    /// The message the backend attached to the failure, if it sent one.
    pub fn backend_message(&self) -> String {
        match self {
            PostgrestError::ApiError { details, .. } => details
                .message
                .clone()
                .unwrap_or_else(|| details.to_string()),
            PostgrestError::UnparsedApiError { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Request builder for a single table.
#[derive(Debug, Clone)]
pub struct PostgrestClient {
    base_url: String,
    table: String,
    http_client: Client,
    headers: HeaderMap,
    // Kept in insertion order so two filters on one column both survive.
    query_params: Vec<(String, String)>,
}

impl PostgrestClient {
    /// Creates a client for `table` under `{base_url}/rest/v1`.
    pub fn new(
        base_url: &str,
        api_key: &str,
        table: &str,
        http_client: Client,
    ) -> Result<Self, PostgrestError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key).map_err(|_| {
            PostgrestError::InvalidParameters("API key is not a valid header value".to_string())
        })?;
        headers.insert("apikey", key);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            table: table.to_string(),
            http_client,
            headers,
            query_params: Vec::new(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Result<Self, PostgrestError> {
        let header_value = HeaderValue::from_str(value).map_err(|_| {
            PostgrestError::InvalidParameters(format!("Invalid header value: {}", value))
        })?;
        let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
            PostgrestError::InvalidParameters(format!("Invalid header name: {}", key))
        })?;

        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Sends `token` as the bearer credential (session JWT or anon key).
    pub fn with_auth(self, token: &str) -> Result<Self, PostgrestError> {
        self.with_header("Authorization", &format!("Bearer {}", token))
    }

    /// Columns to return. Embedded relations use PostgREST syntax, e.g.
    /// `*,bids(*,bidder:bid_by(*))`; whitespace is stripped.
    pub fn select(mut self, columns: &str) -> Self {
        let compact: String = columns.chars().filter(|c| !c.is_whitespace()).collect();
        self.set_param("select", compact);
        self
    }

    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.query_params
            .push((column.to_string(), format!("eq.{}", value)));
        self
    }

    /// Runs the query and deserializes every returned row.
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<Vec<T>, PostgrestError> {
        let response = self.send(Method::GET, None).await?;
        let response = Self::check(response).await?;

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| PostgrestError::DeserializationError(e.to_string()))
    }

    /// Runs the query expecting zero or one row.
    pub async fn maybe_single<T: DeserializeOwned>(&self) -> Result<Option<T>, PostgrestError> {
        let mut rows = self.execute::<T>().await?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            n => Err(PostgrestError::MultipleRows(n)),
        }
    }

    /// Inserts one row or an array of rows and returns the created rows.
    pub async fn insert<T: Serialize>(&self, values: T) -> Result<Value, PostgrestError> {
        let body = serde_json::to_value(values)?;
        let response = self.send(Method::POST, Some(body)).await?;
        Self::representation(Self::check(response).await?).await
    }

    /// Applies `values` to every row matching the filters and returns them.
    pub async fn update<T: Serialize>(&self, values: T) -> Result<Value, PostgrestError> {
        if !self.query_params.iter().any(|(k, _)| Self::is_filter(k)) {
            return Err(PostgrestError::InvalidParameters(format!(
                "refusing unfiltered update on {}",
                self.table
            )));
        }
        let body = serde_json::to_value(values)?;
        let response = self.send(Method::PATCH, Some(body)).await?;
        Self::representation(Self::check(response).await?).await
    }

    fn is_filter(key: &str) -> bool {
        key != "select"
    }

    fn set_param(&mut self, key: &str, value: String) {
        if let Some(slot) = self.query_params.iter_mut().find(|(k, _)| k == key) {
            slot.1 = value;
        } else {
            self.query_params.push((key.to_string(), value));
        }
    }

    async fn send(&self, method: Method, body: Option<Value>) -> Result<Response, PostgrestError> {
        let url = self.build_url()?;
        tracing::debug!(%method, table = %self.table, "postgrest request");

        let mut headers = self.headers.clone();
        if method != Method::GET {
            headers.insert(
                HeaderName::from_static("prefer"),
                HeaderValue::from_static("return=representation"),
            );
        }

        let mut request = self.http_client.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.json(&body);
        }
        request.send().await.map_err(PostgrestError::NetworkError)
    }

    async fn check(response: Response) -> Result<Response, PostgrestError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error response".to_string());
        tracing::warn!(%status, "postgrest request failed");

        match serde_json::from_str::<PostgrestApiErrorDetails>(&error_text) {
            Ok(details) => Err(PostgrestError::ApiError { details, status }),
            Err(_) => Err(PostgrestError::UnparsedApiError {
                message: error_text,
                status,
            }),
        }
    }

    async fn representation(response: Response) -> Result<Value, PostgrestError> {
        let body_text = response.text().await.map_err(|e| {
            PostgrestError::DeserializationError(format!("Failed to read response body: {}", e))
        })?;

        // 201/204 without a body when the server ignores the Prefer header.
        if body_text.trim().is_empty() {
            return Ok(Value::Array(Vec::new()));
        }
        serde_json::from_str::<Value>(&body_text)
            .map_err(|e| PostgrestError::DeserializationError(e.to_string()))
    }

    fn build_url(&self) -> Result<Url, PostgrestError> {
        let mut url = Url::parse(&format!("{}/rest/v1/{}", self.base_url, self.table))?;
        if !self.query_params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query_params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}
