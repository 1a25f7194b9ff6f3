//! Builders for preprints, users and journals used across tests.

use serde_json::json;
use url::Url;

use crate::domain::ids::{FileId, JournalId, PreprintId, UserId};
use crate::domain::journal::Journal;
use crate::domain::preprint::{
    Contributor, FileNode, FileNodeKind, LocalUser, ModerationState, Preprint,
};

/// A user named `given_name` with a deterministic e-mail address.
pub fn sample_user(given_name: &str) -> LocalUser {
    LocalUser {
        id: UserId::random(),
        email: format!("{}@example.org", given_name.to_lowercase()),
        given_name: given_name.to_owned(),
        family_name: "Fixture".to_owned(),
        orcid: None,
        chronos_user_id: None,
    }
}

/// A regular file node.
pub fn sample_file(name: &str) -> FileNode {
    FileNode {
        id: FileId::random(),
        name: name.to_owned(),
        kind: FileNodeKind::File,
    }
}

/// A folder node.
pub fn sample_folder(name: &str) -> FileNode {
    FileNode {
        id: FileId::random(),
        name: name.to_owned(),
        kind: FileNodeKind::Folder,
    }
}

/// An accepted preprint whose visible contributors are `authors` in order.
pub fn sample_preprint(authors: &[LocalUser]) -> Preprint {
    let contributors = authors
        .iter()
        .enumerate()
        .map(|(position, user)| Contributor {
            user: user.clone(),
            position: u32::try_from(position).unwrap_or(u32::MAX),
            visible: true,
        })
        .collect();

    Preprint {
        id: PreprintId::random(),
        title: "Tidal heating in compact binaries".to_owned(),
        description: "We measure tidal heating.".to_owned(),
        doi: Some("10.31219/osf.io/abcde".to_owned()),
        url: Url::parse("https://osf.io/preprints/abcde/")
            .unwrap_or_else(|error| panic!("fixture url: {error}")),
        moderation_state: ModerationState::Accepted,
        primary_file: Some(sample_file("manuscript.pdf")),
        contributors,
    }
}

/// A journal with a minimal upstream payload.
pub fn sample_journal(journal_id: &str, title: &str) -> Journal {
    Journal {
        journal_id: JournalId::new(journal_id)
            .unwrap_or_else(|error| panic!("fixture journal id: {error}")),
        title: title.to_owned(),
        publisher_name: "Fixture Press".to_owned(),
        raw_response: json!({
            "JOURNAL_ID": journal_id,
            "TITLE": title,
            "PUBLISHER_NAME": "Fixture Press",
        }),
    }
}
