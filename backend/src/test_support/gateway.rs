//! Scripted Chronos gateway double.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ids::PublicationId;
use crate::domain::manuscript::{SubmitManuscriptRequest, UpdateManuscriptRequest};
use crate::domain::ports::{
    ChronosGateway, ChronosGatewayError, JournalEntry, ManuscriptSnapshot, SubmissionReceipt,
};

type Script<T> = Mutex<VecDeque<Result<T, ChronosGatewayError>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("gateway script poisoned"),
    }
}

fn next<T>(script: &Script<T>, operation: &str) -> Result<T, ChronosGatewayError> {
    lock(script).pop_front().unwrap_or_else(|| {
        Err(ChronosGatewayError::transport(format!(
            "no scripted response left for {operation}"
        )))
    })
}

/// Gateway replaying queued responses and recording request bodies.
#[derive(Default)]
pub struct ScriptedChronosGateway {
    journals: Script<Vec<JournalEntry>>,
    receipts: Script<SubmissionReceipt>,
    updates: Script<ManuscriptSnapshot>,
    manuscripts: Script<ManuscriptSnapshot>,
    submitted: Mutex<Vec<SubmitManuscriptRequest>>,
    updated: Mutex<Vec<UpdateManuscriptRequest>>,
    fetched: Mutex<Vec<PublicationId>>,
}

impl ScriptedChronosGateway {
    /// Queue a catalogue response.
    pub fn push_journals(&self, response: Result<Vec<JournalEntry>, ChronosGatewayError>) {
        lock(&self.journals).push_back(response);
    }

    /// Queue a submission response.
    pub fn push_receipt(&self, response: Result<SubmissionReceipt, ChronosGatewayError>) {
        lock(&self.receipts).push_back(response);
    }

    /// Queue an update response.
    pub fn push_update(&self, response: Result<ManuscriptSnapshot, ChronosGatewayError>) {
        lock(&self.updates).push_back(response);
    }

    /// Queue a manuscript fetch response.
    pub fn push_manuscript(&self, response: Result<ManuscriptSnapshot, ChronosGatewayError>) {
        lock(&self.manuscripts).push_back(response);
    }

    /// Submission bodies received so far.
    pub fn submitted(&self) -> Vec<SubmitManuscriptRequest> {
        lock(&self.submitted).clone()
    }

    /// Update bodies received so far.
    pub fn updated(&self) -> Vec<UpdateManuscriptRequest> {
        lock(&self.updated).clone()
    }

    /// Publication ids fetched so far.
    pub fn fetched(&self) -> Vec<PublicationId> {
        lock(&self.fetched).clone()
    }
}

#[async_trait]
impl ChronosGateway for ScriptedChronosGateway {
    async fn fetch_journals(&self) -> Result<Vec<JournalEntry>, ChronosGatewayError> {
        next(&self.journals, "fetch_journals")
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
        lock(&self.submitted).push(request.clone());
        next(&self.receipts, "submit_manuscript")
    }

    async fn update_manuscript(
        &self,
        request: &UpdateManuscriptRequest,
    ) -> Result<ManuscriptSnapshot, ChronosGatewayError> {
        lock(&self.updated).push(request.clone());
        next(&self.updates, "update_manuscript")
    }

    async fn fetch_manuscript(
        &self,
        publication_id: &PublicationId,
    ) -> Result<ManuscriptSnapshot, ChronosGatewayError> {
        lock(&self.fetched).push(publication_id.clone());
        next(&self.manuscripts, "fetch_manuscript")
    }
}
