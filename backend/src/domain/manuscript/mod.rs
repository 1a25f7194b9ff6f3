//! Manuscript serialization for Chronos.
//!
//! Pure transformations from the preprint read model into the Chronos JSON
//! schema. Given the same inputs (and the same resolver) the output is always
//! identical; nothing here performs I/O.

use std::sync::Arc;

use crate::domain::ids::{FileId, JournalId, PreprintId, PublicationId};
use crate::domain::ports::{FileUrlError, FileUrlResolver};
use crate::domain::preprint::{Contributor, FileNode, LocalUser, Preprint};
use crate::domain::submission::SubmissionStatus;

mod payload;

pub use payload::{
    ARTICLE_TYPE, AuthorPayload, Contribution, FilePayload, MANUSCRIPT_FILE_CATEGORY,
    ManuscriptPayload, SubmitManuscriptRequest, UpdateManuscriptRequest, UserPayload,
};

/// Failures while building a manuscript body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManuscriptError {
    /// A folder (or other non-file node) was offered as a manuscript file.
    #[error("node {file_id} ({name}) is not a file")]
    NotAFile {
        /// Offending node.
        file_id: FileId,
        /// Node name.
        name: String,
    },
    /// The preprint has no primary file to send.
    #[error("preprint {preprint_id} has no primary file")]
    MissingPrimaryFile {
        /// Preprint without a file.
        preprint_id: PreprintId,
    },
    /// The download link could not be resolved.
    #[error(transparent)]
    FileUrl(#[from] FileUrlError),
}

/// Builds Chronos request bodies.
///
/// When a fake file URL is configured every manuscript file points at it
/// instead of the resolver's link, so sandbox deployments never expose real
/// downloads.
#[derive(Clone)]
pub struct ManuscriptSerializer {
    resolver: Arc<dyn FileUrlResolver>,
    fake_file_url: Option<String>,
}

impl ManuscriptSerializer {
    /// Serializer resolving real download links.
    pub fn new(resolver: Arc<dyn FileUrlResolver>) -> Self {
        Self {
            resolver,
            fake_file_url: None,
        }
    }

    /// Replace every file link with `url`.
    #[must_use]
    pub fn with_fake_file_url(mut self, url: impl Into<String>) -> Self {
        self.fake_file_url = Some(url.into());
        self
    }

    /// Serialize a preprint as a manuscript for `journal_id`.
    ///
    /// # Errors
    ///
    /// Fails when the preprint has no primary file, when that file is not a
    /// regular file, or when its download link cannot be resolved.
    pub fn serialize_manuscript(
        &self,
        journal_id: &JournalId,
        preprint: &Preprint,
        status: SubmissionStatus,
    ) -> Result<ManuscriptPayload, ManuscriptError> {
        let primary_file =
            preprint
                .primary_file
                .as_ref()
                .ok_or(ManuscriptError::MissingPrimaryFile {
                    preprint_id: preprint.id,
                })?;

        Ok(ManuscriptPayload {
            authors: serialize_authors(preprint),
            manuscript_files: vec![self.serialize_file(preprint, primary_file)?],
            status_code: status,
            abstract_text: preprint.description.clone(),
            article_type: ARTICLE_TYPE.to_owned(),
            doi: preprint.doi.clone(),
            manuscript_url: preprint.url.to_string(),
            journal_id: journal_id.clone(),
            title: preprint.title.clone(),
        })
    }

    /// Body for a first submission by `submitter`.
    ///
    /// # Errors
    ///
    /// See [`Self::serialize_manuscript`].
    pub fn submission_request(
        &self,
        journal_id: &JournalId,
        preprint: &Preprint,
        submitter: &LocalUser,
    ) -> Result<SubmitManuscriptRequest, ManuscriptError> {
        Ok(SubmitManuscriptRequest {
            manuscript: self.serialize_manuscript(journal_id, preprint, SubmissionStatus::Draft)?,
            user: serialize_user(submitter),
        })
    }

    /// Body for updating an existing publication.
    ///
    /// # Errors
    ///
    /// See [`Self::serialize_manuscript`].
    pub fn update_request(
        &self,
        journal_id: &JournalId,
        preprint: &Preprint,
        status: SubmissionStatus,
        publication_id: &PublicationId,
    ) -> Result<UpdateManuscriptRequest, ManuscriptError> {
        Ok(UpdateManuscriptRequest {
            manuscript: self.serialize_manuscript(journal_id, preprint, status)?,
            publication_id: publication_id.clone(),
        })
    }

    /// Serialize one manuscript file.
    ///
    /// # Errors
    ///
    /// Returns [`ManuscriptError::NotAFile`] for folders and propagates
    /// resolver failures.
    pub fn serialize_file(
        &self,
        preprint: &Preprint,
        file_node: &FileNode,
    ) -> Result<FilePayload, ManuscriptError> {
        if !file_node.is_file() {
            return Err(ManuscriptError::NotAFile {
                file_id: file_node.id,
                name: file_node.name.clone(),
            });
        }

        let file_download_url = match &self.fake_file_url {
            Some(url) => url.clone(),
            None => self.resolver.download_url(preprint, file_node)?.to_string(),
        };

        Ok(FilePayload {
            file_download_url,
            file_name: file_node.name.clone(),
            manuscript_file_category: MANUSCRIPT_FILE_CATEGORY.to_owned(),
        })
    }
}

/// Map a local user onto Chronos's user schema.
pub fn serialize_user(user: &LocalUser) -> UserPayload {
    UserPayload {
        chronos_user_id: user
            .chronos_user_id
            .as_ref()
            .map(|id| id.as_str().to_owned()),
        email: user.email.clone(),
        given_name: user.given_name.clone(),
        orcid_id: user.orcid.clone(),
        partner_user_id: user.id.to_string(),
        surname: user.family_name.clone(),
    }
}

/// Map a contributor at `index` of the visible author list.
pub fn serialize_author(contributor: &Contributor, index: usize) -> AuthorPayload {
    let contribution = if index == 0 {
        Contribution::FirstAuthor
    } else {
        Contribution::SubmittingAuthor
    };
    AuthorPayload {
        user: serialize_user(&contributor.user),
        contribution,
    }
}

fn serialize_authors(preprint: &Preprint) -> Vec<AuthorPayload> {
    preprint
        .visible_contributors()
        .into_iter()
        .enumerate()
        .map(|(index, contributor)| serialize_author(contributor, index))
        .collect()
}
