//! Chronos integration settings loaded via OrthoConfig.
//!
//! Every value can come from a `CHRONOS_*` environment variable, a CLI flag
//! or a configuration file. Optional fields fall back to sandbox-friendly
//! defaults through their accessors.

use std::sync::Arc;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::manuscript::ManuscriptSerializer;
use crate::domain::submission_service::ChronosSubmissionConfig;
use crate::outbound::chronos::ChronosClientConfig;
use crate::outbound::file_urls::GuidDownloadUrlResolver;

const DEFAULT_BASE_URL: &str = "https://sandbox.api.chronos-oa.com/";
const DEFAULT_FAKE_FILE_URL: &str = "https://example.org/chronos/sandbox-manuscript.pdf";
const DEFAULT_FILE_DOWNLOAD_DOMAIN: &str = "https://osf.io/";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SESSION_TTL_SECS: u64 = 3_600;
const DEFAULT_STALE_AFTER_SECS: u64 = 300;
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;
const DEFAULT_REFRESH_BATCH_SIZE: usize = 50;

/// Problems with the loaded settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// A required value was not supplied.
    #[error("missing required setting {name}")]
    Missing {
        /// Environment variable naming the setting.
        name: &'static str,
    },
    /// A URL setting could not be parsed.
    #[error("setting {name} is not a valid URL: {message}")]
    InvalidUrl {
        /// Environment variable naming the setting.
        name: &'static str,
        /// Parser message.
        message: String,
    },
}

/// Partner account credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct ChronosCredentials {
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
    /// Static partner key.
    pub api_key: String,
}

impl std::fmt::Debug for ChronosCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChronosCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Configuration for the Chronos client, serializer and refresh worker.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CHRONOS")]
pub struct ChronosSettings {
    /// Partner API root.
    pub base_url: Option<String>,
    /// Partner account name.
    pub username: Option<String>,
    /// Partner account password.
    pub password: Option<String>,
    /// Static partner key.
    pub api_key: Option<String>,
    /// Send `fake_file_url` instead of real download links.
    #[ortho_config(default = false)]
    pub use_fake_file: bool,
    /// Link used when `use_fake_file` is set.
    pub fake_file_url: Option<String>,
    /// Host serving `{domain}/{file_id}/download` links.
    pub file_download_domain: Option<String>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Assumed session key lifetime in seconds.
    pub session_ttl_secs: Option<u64>,
    /// Age in seconds after which a submission is refreshed.
    pub stale_after_secs: Option<u64>,
    /// Seconds between stale-submission sweeps.
    pub refresh_interval_secs: Option<u64>,
    /// Submissions queued per sweep.
    pub refresh_batch_size: Option<usize>,
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
}

impl ChronosSettings {
    /// Partner API root, defaulting to the Chronos sandbox.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidUrl`] when the value does not parse.
    pub fn base_url(&self) -> Result<Url, SettingsError> {
        parse_url(
            "CHRONOS_BASE_URL",
            self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL),
        )
    }

    /// Partner credentials.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Missing`] naming the first absent value.
    pub fn credentials(&self) -> Result<ChronosCredentials, SettingsError> {
        Ok(ChronosCredentials {
            username: required("CHRONOS_USERNAME", self.username.as_deref())?,
            password: required("CHRONOS_PASSWORD", self.password.as_deref())?,
            api_key: required("CHRONOS_API_KEY", self.api_key.as_deref())?,
        })
    }

    /// Link substituted for manuscript files in sandbox mode.
    pub fn fake_file_url(&self) -> &str {
        self.fake_file_url.as_deref().unwrap_or(DEFAULT_FAKE_FILE_URL)
    }

    /// Host serving public file downloads.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidUrl`] when the value does not parse.
    pub fn file_download_domain(&self) -> Result<Url, SettingsError> {
        parse_url(
            "CHRONOS_FILE_DOWNLOAD_DOMAIN",
            self.file_download_domain
                .as_deref()
                .unwrap_or(DEFAULT_FILE_DOWNLOAD_DOMAIN),
        )
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Assumed session key lifetime; never zero.
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(
            self.session_ttl_secs
                .unwrap_or(DEFAULT_SESSION_TTL_SECS)
                .max(1),
        )
    }

    /// Staleness threshold for submissions.
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs.unwrap_or(DEFAULT_STALE_AFTER_SECS))
    }

    /// Interval between stale-submission sweeps; never zero.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(
            self.refresh_interval_secs
                .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS)
                .max(1),
        )
    }

    /// Submissions queued per sweep.
    pub fn refresh_batch_size(&self) -> usize {
        self.refresh_batch_size.unwrap_or(DEFAULT_REFRESH_BATCH_SIZE)
    }

    /// PostgreSQL connection string.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Missing`] when unset.
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        self.database_url
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .ok_or(SettingsError::Missing {
                name: "CHRONOS_DATABASE_URL",
            })
    }

    /// Settings for the partner API client.
    ///
    /// # Errors
    ///
    /// Fails when credentials are missing or the base URL is invalid.
    pub fn client_config(&self) -> Result<ChronosClientConfig, SettingsError> {
        let ChronosCredentials {
            username,
            password,
            api_key,
        } = self.credentials()?;
        Ok(ChronosClientConfig {
            base_url: self.base_url()?,
            username,
            password,
            api_key,
            request_timeout: self.request_timeout(),
            session_ttl: self.session_ttl(),
        })
    }

    /// Manuscript serializer honouring the fake-file switch.
    ///
    /// # Errors
    ///
    /// Fails when the download domain is not a valid URL.
    pub fn serializer(&self) -> Result<ManuscriptSerializer, SettingsError> {
        let resolver = GuidDownloadUrlResolver::new(self.file_download_domain()?);
        let serializer = ManuscriptSerializer::new(Arc::new(resolver));
        Ok(if self.use_fake_file {
            serializer.with_fake_file_url(self.fake_file_url())
        } else {
            serializer
        })
    }

    /// Orchestrator tuning.
    pub fn service_config(&self) -> ChronosSubmissionConfig {
        ChronosSubmissionConfig {
            stale_after: self.stale_after(),
        }
    }
}

fn required(name: &'static str, value: Option<&str>) -> Result<String, SettingsError> {
    value
        .filter(|value| !value.trim().is_empty())
        .map(str::to_owned)
        .ok_or(SettingsError::Missing { name })
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, SettingsError> {
    Url::parse(raw).map_err(|err| SettingsError::InvalidUrl {
        name,
        message: err.to_string(),
    })
}
