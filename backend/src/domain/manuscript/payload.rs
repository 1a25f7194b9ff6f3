//! Wire shapes of the Chronos manuscript API.
//!
//! Field names follow Chronos's upper snake case JSON keys. These types are
//! built by [`super::ManuscriptSerializer`] and sent verbatim by the gateway.

use serde::Serialize;

use crate::domain::ids::{JournalId, PublicationId};
use crate::domain::submission::SubmissionStatus;

/// Fixed article type sent with every manuscript.
pub const ARTICLE_TYPE: &str = "Research Article";

/// Fixed category of the primary manuscript file.
pub const MANUSCRIPT_FILE_CATEGORY: &str = "Complete Manuscript";

/// A local user in Chronos's user schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct UserPayload {
    /// Chronos user id, when already known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chronos_user_id: Option<String>,
    /// E-mail address.
    pub email: String,
    /// Given name.
    pub given_name: String,
    /// ORCID iD.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orcid_id: Option<String>,
    /// Local user id.
    pub partner_user_id: String,
    /// Family name.
    pub surname: String,
}

/// Author role within a manuscript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Contribution {
    /// The first listed author.
    FirstAuthor,
    /// Every other listed author.
    SubmittingAuthor,
}

/// A user entry in the manuscript author list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AuthorPayload {
    /// Author identity.
    #[serde(flatten)]
    pub user: UserPayload,
    /// Author role.
    pub contribution: Contribution,
}

/// A manuscript file reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct FilePayload {
    /// Publicly resolvable download URL.
    pub file_download_url: String,
    /// File name.
    pub file_name: String,
    /// Always [`MANUSCRIPT_FILE_CATEGORY`].
    pub manuscript_file_category: String,
}

/// Manuscript body shared by submissions and updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ManuscriptPayload {
    /// Visible contributors in position order.
    pub authors: Vec<AuthorPayload>,
    /// Manuscript files; currently only the primary file.
    pub manuscript_files: Vec<FilePayload>,
    /// Requested or current status code.
    pub status_code: SubmissionStatus,
    /// Abstract.
    #[serde(rename = "ABSTRACT")]
    pub abstract_text: String,
    /// Always [`ARTICLE_TYPE`].
    pub article_type: String,
    /// Preprint DOI.
    pub doi: Option<String>,
    /// Public preprint page.
    pub manuscript_url: String,
    /// Target journal.
    pub journal_id: JournalId,
    /// Title.
    pub title: String,
}

/// Body of `POST partners/submission`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SubmitManuscriptRequest {
    /// Manuscript fields.
    #[serde(flatten)]
    pub manuscript: ManuscriptPayload,
    /// Submitting user.
    pub user: UserPayload,
}

/// Body of `POST partners/manuscript`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct UpdateManuscriptRequest {
    /// Manuscript fields.
    #[serde(flatten)]
    pub manuscript: ManuscriptPayload,
    /// Chronos publication being updated.
    pub publication_id: PublicationId,
}
