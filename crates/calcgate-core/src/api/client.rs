//! API client for communicating with the calculator gateway.
//!
//! This module provides the `ApiClient` struct for account registration,
//! sign-in and the authenticated calculator operations.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use tracing::{debug, warn};

use super::{ApiError, CalculatorService};
use crate::auth::SessionRecord;
use crate::calculator::OperationRequest;
use crate::validation::Credentials;

// ============================================================================
// Response types
// ============================================================================

#[serde_as]
#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    #[serde(rename = "userId")]
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    user_id: i64,
}

/// API client for the calculator gateway.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(), // Cheap clone, shares connection pool
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let token = self.token.as_deref().ok_or(ApiError::MissingToken)?;
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", token))
                .context("Token is not a valid header value")?,
        );
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Render an evaluation result the way the keypad display shows it
    fn display_value(value: Value) -> String {
        match value {
            Value::String(s) => s,
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => i.to_string(),
                (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => {
                    format!("{}", f as i64)
                }
                _ => n.to_string(),
            },
            other => other.to_string(),
        }
    }

    fn parse_balance(value: Value) -> Result<f64> {
        match value {
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| ApiError::InvalidResponse(format!("balance {}", n)).into()),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| ApiError::InvalidResponse(format!("balance {:?}", s)).into()),
            other => Err(ApiError::InvalidResponse(format!("balance {}", other)).into()),
        }
    }
}

#[async_trait]
impl CalculatorService for ApiClient {
    /// Create an account
    async fn register(&self, credentials: &Credentials) -> Result<()> {
        let url = self.url("/auth/register");

        let response = self
            .client
            .post(&url)
            .json(credentials)
            .send()
            .await
            .context("Failed to send registration request")?;

        let response = Self::check_response(response).await?;

        // Body content is not used, but it must be JSON
        let _: Value = response
            .json()
            .await
            .context("Failed to parse registration response")?;

        debug!(user = %credentials.user_name, "Account created");
        Ok(())
    }

    /// Sign in and return the session to persist
    async fn login(&self, credentials: &Credentials) -> Result<SessionRecord> {
        let url = self.url("/auth/login");

        let response = self
            .client
            .post(&url)
            .json(credentials)
            .send()
            .await
            .context("Failed to send login request")?;

        // Only 200 and 201 count as a successful login
        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Login rejected");
            return Err(ApiError::from_status(status, &body).into());
        }

        let login: LoginResponse = response
            .json()
            .await
            .context("Failed to parse login response")?;

        Ok(SessionRecord {
            token: login.token,
            user_id: login.user_id,
        })
    }

    async fn execute_operation(&self, request: &OperationRequest) -> Result<String> {
        let url = self.url("/operations/execute");

        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .json(request)
            .send()
            .await
            .context("Failed to send operation request")?;

        let response = Self::check_response(response).await?;

        let value: Value = response
            .json()
            .await
            .context("Failed to parse operation result")?;

        Ok(Self::display_value(value))
    }

    async fn random_string(&self, user_id: i64) -> Result<String> {
        let url = self.url(&format!("/operations/random-string?userId={}", user_id));

        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .header(header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .context("Failed to send random string request")?;

        let response = Self::check_response(response).await?;

        response
            .text()
            .await
            .context("Failed to read random string response body")
    }

    async fn balance(&self, user_id: i64) -> Result<f64> {
        let url = self.url(&format!("/users/balance?userId={}", user_id));

        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await
            .context("Failed to fetch balance")?;

        let response = Self::check_response(response).await?;

        let value: Value = response
            .json()
            .await
            .context("Failed to parse balance response")?;

        Self::parse_balance(value)
    }
}
