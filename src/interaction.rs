//! Interaction cycle
//!
//! Every user action runs one cycle against the current session:
//!
//! 1. resolve the session identifier and take its lock
//! 2. lazily load the session's persisted index if it is not registered
//! 3. load the transcript
//! 4. apply the action (index files, send a query, show, reset)
//! 5. save the transcript and return it for display
//!
//! A reset cycle skips the final save: the transcript it would write belongs
//! to the session that was just discarded.

use crate::error::{ChatterError, Result};
use crate::index::IndexRegistry;
use crate::providers::{Backends, DocumentRetriever, ResponseGenerator};
use crate::session::{reset_session, ResetReport, SessionIdentity};
use crate::storage::{StorageLayout, UploadedFile};
use crate::transcript::{Transcript, TranscriptStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A user action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// Store the files and rebuild the session's index over them
    IndexFiles(Vec<UploadedFile>),
    /// Ask a question against the session's index
    SendQuery(String),
    /// Only display the transcript
    ShowTranscript,
    /// Discard the session and start a new one
    Reset,
}

/// User-facing result of a cycle
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionOutcome {
    Indexed { document_count: usize },
    NoFilesUploaded,
    IndexFailed(String),
    Answered { answer: String },
    EmptyQuery,
    NoIndexLoaded,
    QueryFailed(String),
    Reset(ResetReport),
    Displayed,
}

impl InteractionOutcome {
    /// Message to show the user, if the outcome carries one
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Indexed { document_count } => Some(format!(
                "Indexed {} document(s) successfully.",
                document_count
            )),
            Self::NoFilesUploaded => Some("No files uploaded.".to_string()),
            Self::IndexFailed(msg) | Self::QueryFailed(msg) => Some(msg.clone()),
            Self::EmptyQuery => Some("Please enter a question.".to_string()),
            Self::NoIndexLoaded => Some("No RAG model loaded for the session.".to_string()),
            Self::Reset(report) => Some(format!(
                "Session reset. New session: {}",
                report.new_session_id
            )),
            Self::Answered { .. } | Self::Displayed => None,
        }
    }

    /// Whether the outcome is a warning or failure rather than a success
    pub fn is_problem(&self) -> bool {
        matches!(
            self,
            Self::NoFilesUploaded
                | Self::IndexFailed(_)
                | Self::EmptyQuery
                | Self::NoIndexLoaded
                | Self::QueryFailed(_)
        )
    }
}

/// Everything a front end needs to render after a cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Session the caller should use from now on
    pub session_id: String,
    pub outcome: InteractionOutcome,
    /// Full transcript of `session_id` after the cycle
    pub transcript: Transcript,
}

/// Runs interaction cycles for one client context
pub struct InteractionHandler {
    layout: StorageLayout,
    identity: Arc<SessionIdentity>,
    registry: Arc<IndexRegistry>,
    transcripts: TranscriptStore,
    retriever: Arc<dyn DocumentRetriever>,
    responder: Arc<dyn ResponseGenerator>,
    session_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl InteractionHandler {
    pub fn new(
        layout: StorageLayout,
        identity: Arc<SessionIdentity>,
        registry: Arc<IndexRegistry>,
        retriever: Arc<dyn DocumentRetriever>,
        responder: Arc<dyn ResponseGenerator>,
    ) -> Self {
        Self {
            transcripts: TranscriptStore::new(layout.clone()),
            layout,
            identity,
            registry,
            retriever,
            responder,
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Create a handler from configured backends
    pub fn from_backends(
        layout: StorageLayout,
        identity: Arc<SessionIdentity>,
        registry: Arc<IndexRegistry>,
        backends: &Backends,
    ) -> Self {
        Self::new(
            layout,
            identity,
            registry,
            backends.retriever.clone(),
            backends.responder.clone(),
        )
    }

    pub fn session_id(&self) -> String {
        self.identity.current_session_id()
    }

    pub fn registry(&self) -> &IndexRegistry {
        &self.registry
    }

    pub fn transcripts(&self) -> &TranscriptStore {
        &self.transcripts
    }

    fn session_lock(&self, session_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.session_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }

    fn forget_session_lock(&self, session_id: &str) {
        self.session_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(session_id);
    }

    #[cfg(test)]
    fn tracked_sessions(&self) -> Vec<String> {
        self.session_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    /// Run one interaction cycle
    ///
    /// # Errors
    ///
    /// Returns error on filesystem failures (unreadable or corrupt
    /// transcript, failed upload or transcript write, failed reset).
    /// Backend failures are reported through [`InteractionOutcome`].
    pub async fn handle(&self, interaction: Interaction) -> Result<CycleReport> {
        // A reset may rotate the identity while this cycle waits for the
        // lock; the cycle must then run on the new identifier.
        let (session_id, _guard) = loop {
            let session_id = self.identity.current_session_id();
            let lock = self.session_lock(&session_id);
            let guard = lock.lock_owned().await;
            if self.identity.current_session_id() == session_id {
                break (session_id, guard);
            }
            tracing::debug!("Session {} was reset while waiting, retrying", session_id);
        };

        self.registry.ensure_loaded(&session_id).await;
        let mut transcript = self.transcripts.load(&session_id)?;

        let outcome = match interaction {
            Interaction::IndexFiles(files) => self.index_files(&session_id, &files).await?,
            Interaction::SendQuery(query) => {
                self.send_query(&session_id, &query, &mut transcript).await
            }
            Interaction::ShowTranscript => InteractionOutcome::Displayed,
            Interaction::Reset => {
                let report =
                    reset_session(&self.layout, &self.transcripts, &self.identity, &session_id)?;
                self.forget_session_lock(&session_id);
                return Ok(CycleReport {
                    session_id: report.new_session_id.clone(),
                    outcome: InteractionOutcome::Reset(report),
                    transcript: Transcript::new(),
                });
            }
        };

        self.transcripts.save(&session_id, &transcript)?;

        Ok(CycleReport {
            session_id,
            outcome,
            transcript,
        })
    }

    async fn index_files(
        &self,
        session_id: &str,
        files: &[UploadedFile],
    ) -> Result<InteractionOutcome> {
        if files.is_empty() {
            tracing::warn!("Index requested without files for session {}", session_id);
            return Ok(InteractionOutcome::NoFilesUploaded);
        }

        for file in files {
            self.layout.store_upload(session_id, file)?;
        }

        let folder = self.layout.session_upload_dir(session_id);
        let outcome = match self.registry.build_index(session_id, &folder).await {
            Ok(handle) => InteractionOutcome::Indexed {
                document_count: handle.document_count,
            },
            Err(e) => {
                tracing::error!("Error indexing documents for session {}: {:#}", session_id, e);
                let detail = match e.downcast_ref::<ChatterError>() {
                    Some(ChatterError::IndexBuild(msg)) => msg.clone(),
                    _ => format!("{:#}", e),
                };
                InteractionOutcome::IndexFailed(format!("Error indexing documents: {}", detail))
            }
        };
        Ok(outcome)
    }

    async fn send_query(
        &self,
        session_id: &str,
        query: &str,
        transcript: &mut Transcript,
    ) -> InteractionOutcome {
        let query = query.trim();
        if query.is_empty() {
            return InteractionOutcome::EmptyQuery;
        }

        let Some(index) = self.registry.get(session_id) else {
            tracing::warn!("Query for session {} without a loaded index", session_id);
            return InteractionOutcome::NoIndexLoaded;
        };

        let result = async {
            let pages = self
                .retriever
                .retrieve_documents(&index, query, session_id)
                .await?;
            self.responder
                .generate_response(&pages, query, session_id)
                .await
        }
        .await;

        match result {
            Ok(response) => {
                transcript.push_turn(query, response.text.clone());
                InteractionOutcome::Answered {
                    answer: response.text,
                }
            }
            Err(e) => {
                tracing::error!("Error generating response for session {}: {:#}", session_id, e);
                InteractionOutcome::QueryFailed(format!("Error generating response: {:#}", e))
            }
        }
    }
}
