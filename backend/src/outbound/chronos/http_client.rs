//! Reqwest-backed Chronos gateway.
//!
//! This adapter owns transport details only: endpoint layout, session key
//! handling, HTTP error mapping and JSON decoding into port types.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use super::dto::{
    LoginRequestDto, LoginResponseDto, decode_journals, decode_manuscript, decode_receipt,
};
use super::session::SessionToken;
use crate::domain::ids::PublicationId;
use crate::domain::manuscript::{SubmitManuscriptRequest, UpdateManuscriptRequest};
use crate::domain::ports::{
    ChronosGateway, ChronosGatewayError, JournalEntry, ManuscriptSnapshot, SubmissionReceipt,
};

const API_KEY_HEADER: &str = "api_key";
const AUTH_KEY_HEADER: &str = "auth_key";

const LOGIN_PATH: &str = "partners/login";
const JOURNALS_PATH: &str = "partners/journal/all";
const SUBMISSION_PATH: &str = "partners/submission";
const MANUSCRIPT_PATH: &str = "partners/manuscript";

/// Connection settings for the Chronos partner API.
#[derive(Clone)]
pub struct ChronosClientConfig {
    /// API root; endpoint paths are resolved against it.
    pub base_url: Url,
    /// Partner account name.
    pub username: String,
    /// Partner account password.
    pub password: String,
    /// Static partner key sent on every request.
    pub api_key: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Lifetime assumed for a freshly issued session key.
    pub session_ttl: Duration,
}

impl fmt::Debug for ChronosClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChronosClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("api_key", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .field("session_ttl", &self.session_ttl)
            .finish()
    }
}

/// Errors raised while constructing the client.
#[derive(Debug, thiserror::Error)]
pub enum ChronosClientBuildError {
    /// The base URL cannot have paths appended.
    #[error("chronos base url {url} cannot carry endpoint paths")]
    InvalidBaseUrl {
        /// Rejected URL.
        url: String,
    },
    /// The HTTP client could not be built.
    #[error("failed to build chronos http client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Chronos gateway performing authenticated HTTPS calls.
///
/// The first call logs in. The session key is reused until it expires or
/// Chronos answers `401`, in which case the client logs in again and retries
/// the call once. Logins are serialised so concurrent callers share one.
pub struct ChronosHttpClient {
    client: Client,
    base_url: Url,
    username: String,
    password: String,
    api_key: String,
    session_ttl: Duration,
    session: Mutex<Option<SessionToken>>,
    clock: Arc<dyn Clock>,
}

impl ChronosHttpClient {
    /// Build a client; no request is sent until the first call.
    ///
    /// # Errors
    ///
    /// Returns an error when the base URL cannot carry paths or the reqwest
    /// client cannot be constructed.
    pub fn new(
        config: ChronosClientConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ChronosClientBuildError> {
        let ChronosClientConfig {
            base_url,
            username,
            password,
            api_key,
            request_timeout,
            session_ttl,
        } = config;
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            client,
            base_url: normalise_base_url(base_url)?,
            username,
            password,
            api_key,
            session_ttl,
            session: Mutex::new(None),
            clock,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ChronosGatewayError> {
        self.base_url.join(path).map_err(|error| {
            ChronosGatewayError::transport(format!("invalid endpoint {path}: {error}"))
        })
    }

    fn manuscript_endpoint(
        &self,
        publication_id: &PublicationId,
    ) -> Result<Url, ChronosGatewayError> {
        let mut url = self.endpoint(MANUSCRIPT_PATH)?;
        let rendered = url.to_string();
        url.path_segments_mut()
            .map_err(|()| {
                ChronosGatewayError::transport(format!(
                    "endpoint {rendered} cannot carry a path segment"
                ))
            })?
            .push(publication_id.as_str());
        Ok(url)
    }

    /// Current session key, logging in when none is usable.
    async fn auth_key(&self) -> Result<String, ChronosGatewayError> {
        let mut session = self.session.lock().await;
        let now = self.clock.utc();
        if let Some(token) = session.as_ref().filter(|token| token.is_usable(now)) {
            return Ok(token.auth_key().to_owned());
        }

        let token = self.login().await?;
        let auth_key = token.auth_key().to_owned();
        *session = Some(token);
        Ok(auth_key)
    }

    /// Forget `rejected` unless another caller already replaced it.
    async fn invalidate(&self, rejected: &str) {
        let mut session = self.session.lock().await;
        if session
            .as_ref()
            .is_some_and(|token| token.auth_key() == rejected)
        {
            *session = None;
        }
    }

    async fn login(&self) -> Result<SessionToken, ChronosGatewayError> {
        debug!(username = %self.username, "logging in to chronos");
        let response = self
            .client
            .post(self.endpoint(LOGIN_PATH)?)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&LoginRequestDto {
                username: &self.username,
                password: &self.password,
            })
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(ChronosGatewayError::authentication(status_message(
                "login rejected with",
                status,
                body.as_ref(),
            )));
        }

        let decoded: LoginResponseDto = serde_json::from_slice(body.as_ref()).map_err(|error| {
            ChronosGatewayError::authentication(format!("login response unreadable: {error}"))
        })?;
        if decoded.auth_key.trim().is_empty() {
            return Err(ChronosGatewayError::authentication(
                "login returned an empty auth key",
            ));
        }
        Ok(SessionToken::issue(
            decoded.auth_key,
            self.clock.utc(),
            self.session_ttl,
        ))
    }

    /// Send an authorised request, re-logging in once on `401`.
    async fn send_authorised<F>(&self, build: F) -> Result<Value, ChronosGatewayError>
    where
        F: Fn(&str) -> RequestBuilder + Send + Sync,
    {
        let auth_key = self.auth_key().await?;
        let response = self.send(build(&auth_key)).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return read_json(response).await;
        }

        debug!("chronos rejected the session key; logging in again");
        self.invalidate(&auth_key).await;
        let auth_key = self.auth_key().await?;
        let response = self.send(build(&auth_key)).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            let body = response.bytes().await.map_err(map_transport_error)?;
            return Err(ChronosGatewayError::authentication(status_message(
                "session refused after re-login with",
                StatusCode::UNAUTHORIZED,
                body.as_ref(),
            )));
        }
        read_json(response).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ChronosGatewayError> {
        request.send().await.map_err(map_transport_error)
    }

    fn authorised(&self, request: RequestBuilder, auth_key: &str) -> RequestBuilder {
        request
            .header(API_KEY_HEADER, self.api_key.as_str())
            .header(AUTH_KEY_HEADER, auth_key)
            .header(reqwest::header::ACCEPT, "application/json")
    }
}

#[async_trait]
impl ChronosGateway for ChronosHttpClient {
    async fn fetch_journals(&self) -> Result<Vec<JournalEntry>, ChronosGatewayError> {
        let url = self.endpoint(JOURNALS_PATH)?;
        let body = self
            .send_authorised(|key| self.authorised(self.client.get(url.clone()), key))
            .await?;
        decode_journals(body).map_err(ChronosGatewayError::decode)
    }

    async fn journals_by_publisher(
        &self,
        _publisher: &str,
    ) -> Result<Vec<JournalEntry>, ChronosGatewayError> {
        Err(ChronosGatewayError::not_implemented("journals_by_publisher"))
    }

    async fn journals_by_issn(
        &self,
        _issn: &str,
    ) -> Result<Vec<JournalEntry>, ChronosGatewayError> {
        Err(ChronosGatewayError::not_implemented("journals_by_issn"))
    }

    async fn submit_manuscript(
        &self,
        request: &SubmitManuscriptRequest,
    ) -> Result<SubmissionReceipt, ChronosGatewayError> {
        let url = self.endpoint(SUBMISSION_PATH)?;
        let body = self
            .send_authorised(|key| {
                self.authorised(self.client.post(url.clone()), key)
                    .json(request)
            })
            .await?;
        decode_receipt(body).map_err(ChronosGatewayError::decode)
    }

    async fn update_manuscript(
        &self,
        request: &UpdateManuscriptRequest,
    ) -> Result<ManuscriptSnapshot, ChronosGatewayError> {
        let url = self.endpoint(MANUSCRIPT_PATH)?;
        let body = self
            .send_authorised(|key| {
                self.authorised(self.client.post(url.clone()), key)
                    .json(request)
            })
            .await?;
        decode_manuscript(body).map_err(ChronosGatewayError::decode)
    }

    async fn fetch_manuscript(
        &self,
        publication_id: &PublicationId,
    ) -> Result<ManuscriptSnapshot, ChronosGatewayError> {
        let url = self.manuscript_endpoint(publication_id)?;
        let body = self
            .send_authorised(|key| self.authorised(self.client.get(url.clone()), key))
            .await?;
        decode_manuscript(body).map_err(ChronosGatewayError::decode)
    }
}

fn normalise_base_url(mut base_url: Url) -> Result<Url, ChronosClientBuildError> {
    if base_url.cannot_be_a_base() {
        return Err(ChronosClientBuildError::InvalidBaseUrl {
            url: base_url.to_string(),
        });
    }
    if !base_url.path().ends_with('/') {
        let path = format!("{}/", base_url.path());
        base_url.set_path(&path);
    }
    Ok(base_url)
}

async fn read_json(response: Response) -> Result<Value, ChronosGatewayError> {
    let status = response.status();
    let body = response.bytes().await.map_err(map_transport_error)?;
    if !status.is_success() {
        return Err(map_status_error(status, body.as_ref()));
    }
    serde_json::from_slice(body.as_ref()).map_err(|error| {
        ChronosGatewayError::decode(format!("invalid Chronos JSON payload: {error}"))
    })
}

fn map_transport_error(error: reqwest::Error) -> ChronosGatewayError {
    if error.is_timeout() {
        ChronosGatewayError::timeout(error.to_string())
    } else {
        ChronosGatewayError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ChronosGatewayError {
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            ChronosGatewayError::timeout(status_message("chronos answered", status, body))
        }
        _ => ChronosGatewayError::status(status.as_u16(), body_preview(body)),
    }
}

fn status_message(prefix: &str, status: StatusCode, body: &[u8]) -> String {
    let preview = body_preview(body);
    if preview.is_empty() {
        format!("{prefix} status {}", status.as_u16())
    } else {
        format!("{prefix} status {}: {preview}", status.as_u16())
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
