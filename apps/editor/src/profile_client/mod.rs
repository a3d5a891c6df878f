//! Profile client: the editor's only route to persisted profile data.
//!
//! Sessions depend on the `ProfileStore` trait; the HTTP implementation talks
//! to the profile service (`GET`/`POST {base}/profile`), the in-memory one
//! backs local runs and tests.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::models::profile::{FlatProfilePayload, ProfileSnapshot};

const PROFILE_PATH: &str = "/profile";
const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Profile service error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Profile service unavailable after {retries} retries")]
    Unavailable { retries: u32 },
}

/// Persistence collaborator for editor sessions.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self) -> Result<ProfileSnapshot, ProfileError>;

    async fn update_profile(
        &self,
        payload: &FlatProfilePayload,
    ) -> Result<ProfileSnapshot, ProfileError>;
}

/// The profile service nests the owner's name and email under `user`.
#[derive(Debug, Deserialize)]
struct RemoteProfile {
    #[serde(default)]
    user: Option<RemoteUser>,
    #[serde(flatten)]
    profile: ProfileSnapshot,
}

/// `GET` returns the populated user document; the `POST` update returns
/// only the user's id.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RemoteUser {
    Populated {
        #[serde(default)]
        name: String,
        #[serde(default)]
        email: String,
    },
    Id(#[allow(dead_code)] String),
}

impl RemoteProfile {
    fn into_snapshot(self) -> ProfileSnapshot {
        let mut profile = self.profile;
        if let Some(RemoteUser::Populated { name, email }) = self.user {
            if profile.name.is_empty() {
                profile.name = name;
            }
            if profile.email.is_empty() {
                profile.email = email;
            }
        }
        profile
    }
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(alias = "msg")]
    message: String,
}

/// HTTP client for the profile service with retry on 429 and 5xx.
#[derive(Clone)]
pub struct HttpProfileStore {
    client: Client,
    url: String,
    token: Option<String>,
}

impl HttpProfileStore {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, ProfileError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            url: profile_url(base_url),
            token,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends the request built by `build`, retrying with exponential
    /// backoff on transport errors, 429 and 5xx.
    async fn send_with_retry<F>(&self, build: F) -> Result<ProfileSnapshot, ProfileError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut last_error: Option<ProfileError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // 500ms, 1s
                let delay = Duration::from_millis(500 * (1 << (attempt - 1)));
                warn!(
                    "Profile call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self.authorized(build()).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(ProfileError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Profile service returned {}: {}", status, body);
                last_error = Some(ProfileError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            return read_profile(response).await;
        }

        Err(last_error.unwrap_or(ProfileError::Unavailable {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl ProfileStore for HttpProfileStore {
    async fn get_profile(&self) -> Result<ProfileSnapshot, ProfileError> {
        debug!("GET {}", self.url);
        self.send_with_retry(|| self.client.get(&self.url)).await
    }

    async fn update_profile(
        &self,
        payload: &FlatProfilePayload,
    ) -> Result<ProfileSnapshot, ProfileError> {
        debug!("POST {}", self.url);
        self.send_with_retry(|| self.client.post(&self.url).json(payload))
            .await
    }
}

async fn read_profile(response: Response) -> Result<ProfileSnapshot, ProfileError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ServiceError>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        return Err(ProfileError::Api {
            status: status.as_u16(),
            message,
        });
    }

    parse_profile(&body)
}

fn parse_profile(body: &str) -> Result<ProfileSnapshot, ProfileError> {
    let remote: RemoteProfile = serde_json::from_str(body)?;
    Ok(remote.into_snapshot())
}

fn profile_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), PROFILE_PATH)
}

/// Profile store kept in process memory. Updates merge like the profile
/// service does.
#[derive(Default)]
pub struct InMemoryProfileStore {
    profile: Mutex<ProfileSnapshot>,
}

impl InMemoryProfileStore {
    pub fn new(profile: ProfileSnapshot) -> Self {
        Self {
            profile: Mutex::new(profile),
        }
    }

    pub async fn snapshot(&self) -> ProfileSnapshot {
        self.profile.lock().await.clone()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_profile(&self) -> Result<ProfileSnapshot, ProfileError> {
        Ok(self.profile.lock().await.clone())
    }

    async fn update_profile(
        &self,
        payload: &FlatProfilePayload,
    ) -> Result<ProfileSnapshot, ProfileError> {
        let mut profile = self.profile.lock().await;
        profile.apply(payload);
        Ok(profile.clone())
    }
}
