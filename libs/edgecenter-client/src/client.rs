// This file is part of the terraform-provider-edgecenter project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Debug;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};

/// Default endpoint of the cloud API
pub const DEFAULT_CLOUD_API: &str = "https://api.edgecenter.ru/cloud";
/// Default endpoint of the platform (IAM) API
pub const DEFAULT_PLATFORM_API: &str = "https://api.edgecenter.ru/iam";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;

/// Credentials used to authenticate against the API
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Permanent API token, sent as `APIKey <token>`
    ApiToken(String),
    /// User name and password, exchanged for a JWT access token
    Password { user_name: String, password: String },
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::ApiToken(_) => f.write_str("ApiToken(***)"),
            Credentials::Password { user_name, .. } => f
                .debug_struct("Password")
                .field("user_name", user_name)
                .finish_non_exhaustive(),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub cloud_api: String,
    pub platform_api: String,
    pub credentials: Credentials,
    /// Delay between two polls of a task
    pub poll_interval: Duration,
    /// Timeout of a single HTTP request
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl ClientConfig {
    /// Configuration with default endpoints and timings
    pub fn new(credentials: Credentials) -> Self {
        Self {
            cloud_api: DEFAULT_CLOUD_API.to_owned(),
            platform_api: DEFAULT_PLATFORM_API.to_owned(),
            credentials,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: concat!("edgecenter-client/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

/// Project and region a regional object lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub project_id: i64,
    pub region_id: i64,
}

impl Location {
    pub fn new(project_id: i64, region_id: i64) -> Self {
        Self {
            project_id,
            region_id,
        }
    }

    /// Collection path of `kind` in this location, eg: `v1/networks/1/2`
    pub fn path(&self, kind: &str) -> String {
        format!("v1/{kind}/{}/{}", self.project_id, self.region_id)
    }

    /// Path of the object `id` of `kind` in this location
    pub fn item(&self, kind: &str, id: &str) -> String {
        format!("{}/{id}", self.path(kind))
    }
}

/// Paginated list as returned by the API
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListResponse<T> {
    #[serde(default)]
    #[allow(dead_code)]
    pub count: usize,
    pub results: Vec<T>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access: String,
}

/// EdgeCenter cloud API client
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    cloud_api: Url,
    pub(crate) poll_interval: Duration,
}

/// Parse an endpoint so that relative paths are joined below it
fn parse_base(endpoint: &str) -> Result<Url> {
    if endpoint.ends_with('/') {
        Ok(Url::parse(endpoint)?)
    } else {
        Ok(Url::parse(&format!("{endpoint}/"))?)
    }
}

impl Client {
    /// Build a client, logging in first when the credentials are a user name and a password
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let authorization = match &config.credentials {
            Credentials::ApiToken(token) => {
                if token.is_empty() {
                    return Err(Error::Config("API token is empty".to_owned()));
                }
                format!("APIKey {token}")
            }
            Credentials::Password {
                user_name,
                password,
            } => {
                let token = Self::login(&config, user_name, password).await?;
                format!("Bearer {token}")
            }
        };

        let mut headers = HeaderMap::new();
        let mut value = HeaderValue::from_str(&authorization)
            .map_err(|err| Error::Config(format!("invalid credentials: {err}")))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            cloud_api: parse_base(&config.cloud_api)?,
            poll_interval: config.poll_interval,
        })
    }

    async fn login(config: &ClientConfig, user_name: &str, password: &str) -> Result<String> {
        let url = parse_base(&config.platform_api)?.join("auth/jwt/login")?;
        debug!(url = %url, user_name, "Login");

        let response = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout)
            .build()?
            .post(url)
            .json(&LoginRequest {
                username: user_name,
                password,
            })
            .send()
            .await?;

        let login: LoginResponse = handle_response(response).await?;
        Ok(login.access)
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.cloud_api.join(path)?)
    }

    async fn send<B, T>(&self, method: Method, path: &str, query: &[(&str, String)], body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        debug!(method = %method, url = %url, "Request");

        let mut request = self.http.request(method, url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        handle_response(request.send().await?).await
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send::<(), T>(Method::GET, path, &[], None).await
    }

    /// Get all the results of a list endpoint
    pub(crate) async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let list: ListResponse<T> = self.send::<(), _>(Method::GET, path, query, None).await?;
        Ok(list.results)
    }

    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::POST, path, &[], Some(body)).await
    }

    pub(crate) async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::PATCH, path, &[], Some(body)).await
    }

    pub(crate) async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::PUT, path, &[], Some(body)).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send::<(), T>(Method::DELETE, path, &[], None).await
    }
}

/// Decode a successful response, or map the status into an [`Error`]
async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let text = response.text().await?;

    if status.is_success() {
        // Some endpoints answer with an empty body
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(text).map_err(|err| {
            warn!(error = %err, body = %text, "Failed to parse response");
            Error::Json(err)
        })
    } else if status == StatusCode::NOT_FOUND {
        Err(Error::NotFound(api_message(&text)))
    } else {
        Err(Error::Api {
            status: status.as_u16(),
            message: api_message(&text),
        })
    }
}

/// Extract the human readable message of an API error body
fn api_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ApiError {
        message: Option<String>,
        detail: Option<String>,
    }
    match serde_json::from_str::<ApiError>(body) {
        Ok(ApiError {
            message: Some(message),
            ..
        })
        | Ok(ApiError {
            detail: Some(message),
            ..
        }) => message,
        _ => body.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_paths() {
        let location = Location::new(1, 2);
        assert_eq!(location.path("networks"), "v1/networks/1/2");
        assert_eq!(location.item("networks", "abc"), "v1/networks/1/2/abc");
    }

    #[test]
    fn base_url_keeps_last_segment() {
        let base = parse_base("https://api.edgecenter.ru/cloud").unwrap();
        assert_eq!(
            base.join("v1/tasks/x").unwrap().as_str(),
            "https://api.edgecenter.ru/cloud/v1/tasks/x"
        );
        let base = parse_base("http://localhost:8080/").unwrap();
        assert_eq!(
            base.join("v1/tasks/x").unwrap().as_str(),
            "http://localhost:8080/v1/tasks/x"
        );
    }

    #[test]
    fn api_error_message() {
        assert_eq!(api_message(r#"{"message": "boom"}"#), "boom");
        assert_eq!(api_message(r#"{"detail": "nope"}"#), "nope");
        assert_eq!(api_message("plain text"), "plain text");
    }

    #[test]
    fn credentials_are_redacted() {
        let token = format!("{:?}", Credentials::ApiToken("secret".into()));
        assert!(!token.contains("secret"));
        let password = format!(
            "{:?}",
            Credentials::Password {
                user_name: "user".into(),
                password: "secret".into()
            }
        );
        assert!(password.contains("user"));
        assert!(!password.contains("secret"));
    }
}
