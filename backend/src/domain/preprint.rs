//! Read model of the host application's preprints.
//!
//! The host platform owns preprints, contributors, users and files. This crate
//! only reads them (through [`crate::domain::ports::PreprintSource`]) in order
//! to build manuscripts for Chronos.

use serde::{Deserialize, Serialize};
use url::Url;

use super::ids::{ChronosUserId, FileId, PreprintId, UserId};

/// Moderation workflow state of a preprint on the local platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationState {
    /// Not yet submitted for moderation.
    Initial,
    /// Waiting for a moderator decision.
    Pending,
    /// Passed the platform's own review gate.
    Accepted,
    /// Declined by moderators.
    Rejected,
    /// Withdrawn by its authors.
    Withdrawn,
}

impl ModerationState {
    /// Stable lowercase label used in logs and error details.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
        }
    }
}

/// A platform user as seen by the integration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalUser {
    /// Local user id, sent to Chronos as the partner user id.
    pub id: UserId,
    /// Login e-mail address.
    pub email: String,
    /// Given name.
    pub given_name: String,
    /// Family name.
    pub family_name: String,
    /// ORCID iD, when the user linked one.
    pub orcid: Option<String>,
    /// Chronos user id, once learned from a submission response.
    pub chronos_user_id: Option<ChronosUserId>,
}

/// A contributor entry on a preprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contributor {
    /// The contributing user.
    pub user: LocalUser,
    /// Zero-based position in the author list.
    pub position: u32,
    /// Whether the contributor is listed as a bibliographic author.
    pub visible: bool,
}

/// Kind of a storage node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileNodeKind {
    /// A regular file.
    File,
    /// A folder.
    Folder,
}

/// A storage node attached to a preprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    /// Node id, also the public download guid.
    pub id: FileId,
    /// Display name.
    pub name: String,
    /// File or folder.
    pub kind: FileNodeKind,
}

impl FileNode {
    /// True for regular files.
    pub fn is_file(&self) -> bool {
        self.kind == FileNodeKind::File
    }
}

/// A preprint and everything needed to describe it as a manuscript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preprint {
    /// Local id.
    pub id: PreprintId,
    /// Title.
    pub title: String,
    /// Abstract.
    pub description: String,
    /// Preprint DOI, once minted.
    pub doi: Option<String>,
    /// Public landing page.
    pub url: Url,
    /// Moderation workflow state.
    pub moderation_state: ModerationState,
    /// Primary manuscript file.
    pub primary_file: Option<FileNode>,
    /// All contributors, in no guaranteed order.
    pub contributors: Vec<Contributor>,
}

impl Preprint {
    /// Visible contributors ordered by position.
    ///
    /// Chronos correlates its author list with this ordering.
    pub fn visible_contributors(&self) -> Vec<&Contributor> {
        let mut visible: Vec<&Contributor> =
            self.contributors.iter().filter(|c| c.visible).collect();
        visible.sort_by_key(|c| c.position);
        visible
    }

    /// True once moderators accepted the preprint.
    pub fn is_accepted(&self) -> bool {
        self.moderation_state == ModerationState::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn user(name: &str) -> LocalUser {
        LocalUser {
            id: UserId::random(),
            email: format!("{name}@example.org"),
            given_name: name.to_owned(),
            family_name: "Tester".to_owned(),
            orcid: None,
            chronos_user_id: None,
        }
    }

    #[rstest]
    fn visible_contributors_are_sorted_and_filtered() {
        let preprint = Preprint {
            id: PreprintId::random(),
            title: "t".to_owned(),
            description: "d".to_owned(),
            doi: None,
            url: Url::parse("https://osf.io/abcde/").expect("url"),
            moderation_state: ModerationState::Accepted,
            primary_file: None,
            contributors: vec![
                Contributor { user: user("c"), position: 2, visible: true },
                Contributor { user: user("hidden"), position: 1, visible: false },
                Contributor { user: user("a"), position: 0, visible: true },
            ],
        };

        let names: Vec<&str> = preprint
            .visible_contributors()
            .iter()
            .map(|c| c.user.given_name.as_str())
            .collect();
        assert_eq!(names, ["a", "c"]);
    }
}
