//! DTOs for decoding Chronos partner API responses.
//!
//! Responses are decoded into these transport DTOs and mapped into port types
//! in one pass. The raw JSON is kept alongside so callers can persist it.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::ids::{ChronosUserId, JournalId, PublicationId};
use crate::domain::ports::{JournalEntry, ManuscriptSnapshot, SubmissionReceipt};
use crate::domain::submission::SubmissionStatus;

#[derive(Debug, Serialize)]
pub(super) struct LoginRequestDto<'a> {
    pub(super) username: &'a str,
    pub(super) password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginResponseDto {
    #[serde(alias = "AUTH_KEY")]
    pub(super) auth_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct JournalDto {
    #[serde(deserialize_with = "string_or_number")]
    journal_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    publisher_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct UserRefDto {
    #[serde(default, deserialize_with = "optional_string_or_number")]
    chronos_user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct SubmissionResponseDto {
    #[serde(deserialize_with = "string_or_number")]
    publication_id: String,
    status_code: i32,
    #[serde(default)]
    chronos_submission_url: Option<String>,
    #[serde(default)]
    user: Option<UserRefDto>,
    #[serde(default)]
    authors: Vec<UserRefDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct ManuscriptDto {
    status_code: i32,
    #[serde(default)]
    chronos_submission_url: Option<String>,
}

/// Decode the journal catalogue, keeping each entry's raw JSON.
pub(super) fn decode_journals(body: Value) -> Result<Vec<JournalEntry>, String> {
    let Value::Array(entries) = body else {
        return Err("journal catalogue must be a JSON array".to_owned());
    };
    entries
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            let dto = JournalDto::deserialize(&raw)
                .map_err(|error| format!("journal entry {index}: {error}"))?;
            let journal_id = JournalId::new(dto.journal_id)
                .map_err(|error| format!("journal entry {index}: {error}"))?;
            Ok(JournalEntry {
                journal_id,
                title: dto.title,
                publisher_name: dto.publisher_name,
                raw,
            })
        })
        .collect()
}

/// Decode a submission response.
pub(super) fn decode_receipt(body: Value) -> Result<SubmissionReceipt, String> {
    let dto = SubmissionResponseDto::deserialize(&body).map_err(|error| error.to_string())?;
    let publication_id = PublicationId::new(dto.publication_id).map_err(|e| e.to_string())?;
    Ok(SubmissionReceipt {
        publication_id,
        status: SubmissionStatus::from_code(dto.status_code),
        submission_url: non_empty(dto.chronos_submission_url),
        submitter_chronos_id: dto.user.and_then(UserRefDto::into_chronos_id),
        author_chronos_ids: dto
            .authors
            .into_iter()
            .map(UserRefDto::into_chronos_id)
            .collect(),
        raw: body,
    })
}

/// Decode a manuscript read or update response.
pub(super) fn decode_manuscript(body: Value) -> Result<ManuscriptSnapshot, String> {
    let dto = ManuscriptDto::deserialize(&body).map_err(|error| error.to_string())?;
    Ok(ManuscriptSnapshot {
        status: SubmissionStatus::from_code(dto.status_code),
        submission_url: non_empty(dto.chronos_submission_url),
        raw: body,
    })
}

impl UserRefDto {
    fn into_chronos_id(self) -> Option<ChronosUserId> {
        self.chronos_user_id
            .and_then(|id| ChronosUserId::new(id.trim()).ok())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|url| !url.trim().is_empty())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(value) => value,
            StringOrNumber::Number(value) => value.to_string(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    StringOrNumber::deserialize(deserializer).map(String::from)
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<StringOrNumber>::deserialize(deserializer).map(|value| value.map(String::from))
}
