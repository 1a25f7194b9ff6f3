//! Driven port for the Chronos partner API.
//!
//! The domain owns the request bodies (see [`crate::domain::manuscript`]) and
//! the decoded response contract; adapters own transport, authentication and
//! JSON decoding.

use async_trait::async_trait;
use serde_json::Value;

use super::define_port_error;
use crate::domain::ids::{ChronosUserId, JournalId, PublicationId};
use crate::domain::manuscript::{SubmitManuscriptRequest, UpdateManuscriptRequest};
use crate::domain::submission::SubmissionStatus;

/// One entry of the Chronos journal catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    /// Chronos journal key.
    pub journal_id: JournalId,
    /// Journal title.
    pub title: String,
    /// Publisher name.
    pub publisher_name: String,
    /// Entry as received.
    pub raw: Value,
}

/// Decoded response of a manuscript submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    /// Chronos publication id.
    pub publication_id: PublicationId,
    /// Status assigned by Chronos.
    pub status: SubmissionStatus,
    /// Chronos submission page, when present and non-empty.
    pub submission_url: Option<String>,
    /// Chronos id of the submitting user.
    pub submitter_chronos_id: Option<ChronosUserId>,
    /// Chronos ids of the authors, in the order Chronos returned them.
    pub author_chronos_ids: Vec<Option<ChronosUserId>>,
    /// Response as received.
    pub raw: Value,
}

/// Decoded manuscript state.
#[derive(Debug, Clone, PartialEq)]
pub struct ManuscriptSnapshot {
    /// Current status.
    pub status: SubmissionStatus,
    /// Chronos submission page, when present and non-empty.
    pub submission_url: Option<String>,
    /// Response as received.
    pub raw: Value,
}

define_port_error! {
    /// Errors surfaced while calling Chronos.
    pub enum ChronosGatewayError {
        /// Network transport failed before receiving a response.
        Transport { message: String } =>
            "chronos transport failed: {message}",
        /// The call exceeded the client timeout.
        Timeout { message: String } =>
            "chronos request timed out: {message}",
        /// Login failed or the session was refused after re-login.
        Authentication { message: String } =>
            "chronos authentication failed: {message}",
        /// Chronos answered with a non-success status.
        Status { status: u16, message: String } =>
            "chronos returned status {status}: {message}",
        /// The response body could not be decoded.
        Decode { message: String } =>
            "chronos response decode failed: {message}",
        /// The operation is declared but not supported.
        NotImplemented { operation: String } =>
            "chronos operation not implemented: {operation}",
    }
}

/// Port for the Chronos partner API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChronosGateway: Send + Sync {
    /// Fetch the complete journal catalogue.
    async fn fetch_journals(&self) -> Result<Vec<JournalEntry>, ChronosGatewayError>;

    /// Fetch journals for one publisher. Not supported by the partner API.
    async fn journals_by_publisher(
        &self,
        publisher: &str,
    ) -> Result<Vec<JournalEntry>, ChronosGatewayError>;

    /// Fetch journals by ISSN. Not supported by the partner API.
    async fn journals_by_issn(&self, issn: &str)
    -> Result<Vec<JournalEntry>, ChronosGatewayError>;

    /// Submit a new manuscript.
    async fn submit_manuscript(
        &self,
        request: &SubmitManuscriptRequest,
    ) -> Result<SubmissionReceipt, ChronosGatewayError>;

    /// Update an existing manuscript.
    async fn update_manuscript(
        &self,
        request: &UpdateManuscriptRequest,
    ) -> Result<ManuscriptSnapshot, ChronosGatewayError>;

    /// Fetch the current state of a manuscript.
    async fn fetch_manuscript(
        &self,
        publication_id: &PublicationId,
    ) -> Result<ManuscriptSnapshot, ChronosGatewayError>;
}
