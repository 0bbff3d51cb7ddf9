//! Session identity and session reset
//!
//! A session identifier scopes uploads, the retrieval index and the chat
//! transcript to one conversational context. Identifiers live only in the
//! memory of the client context that minted them; artifacts left on disk by
//! earlier identifiers are rediscovered by directory name instead.

use crate::error::{ChatterError, Result};
use std::sync::Mutex;
use uuid::Uuid;

pub mod reset;
pub use reset::{reset_session, ResetReport};

/// Mint a fresh session identifier
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Check that an identifier can safely name files and directories
///
/// Identifiers are used verbatim as path components, so separators, `.`,
/// `..` and control characters are rejected. Uniqueness is not checked.
///
/// # Examples
///
/// ```
/// use pdf_chatter::session::validate_session_id;
///
/// assert!(validate_session_id("3f2b8c1e-7a4d-4e1b-9d3c-2a6f0e8b5c71").is_ok());
/// assert!(validate_session_id("../etc").is_err());
/// ```
pub fn validate_session_id(id: &str) -> Result<()> {
    let invalid = id.is_empty()
        || id == "."
        || id == ".."
        || id
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control());
    if invalid {
        return Err(ChatterError::Session(format!("Invalid session identifier: {:?}", id)).into());
    }
    Ok(())
}

/// Process-local holder of the current session identifier
///
/// One instance corresponds to one client context (a REPL, or a single CLI
/// invocation). The identifier is minted lazily on first use.
#[derive(Debug, Default)]
pub struct SessionIdentity {
    current: Mutex<Option<String>>,
}

impl SessionIdentity {
    /// Create a provider that mints its identifier on first use
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider that continues an existing session
    ///
    /// # Errors
    ///
    /// Returns error if `session_id` is not a valid identifier
    pub fn with_session(session_id: impl Into<String>) -> Result<Self> {
        let session_id = session_id.into();
        validate_session_id(&session_id)?;
        Ok(Self {
            current: Mutex::new(Some(session_id)),
        })
    }

    /// Return the current identifier, minting one if none exists yet
    pub fn current_session_id(&self) -> String {
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        current
            .get_or_insert_with(|| {
                let id = new_session_id();
                tracing::info!("Started new session {}", id);
                id
            })
            .clone()
    }

    /// Discard the current identifier and mint a replacement
    pub fn rotate(&self) -> String {
        let id = new_session_id();
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(old) = current.replace(id.clone()) {
            tracing::debug!("Session {} replaced by {}", old, id);
        }
        id
    }
}
