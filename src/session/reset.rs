//! Session reset
//!
//! Resetting discards a session's transcript and uploaded files and hands the
//! client a new identifier. The persisted index and its registry entry are
//! left in place: they stay on disk under the old identifier and are picked
//! up again by the next startup scan.

use super::{validate_session_id, SessionIdentity};
use crate::error::Result;
use crate::storage::StorageLayout;
use crate::transcript::TranscriptStore;
use anyhow::Context;
use std::fs;

/// What a reset removed and which identifier replaced the old one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetReport {
    pub old_session_id: String,
    pub new_session_id: String,
    pub transcript_removed: bool,
    pub uploads_removed: bool,
}

/// Reset `session_id` and rotate `identity` to a new identifier
///
/// # Errors
///
/// Returns error if the identifier is invalid or a deletion fails. The
/// identifier is only rotated once both deletions succeeded.
pub fn reset_session(
    layout: &StorageLayout,
    transcripts: &TranscriptStore,
    identity: &SessionIdentity,
    session_id: &str,
) -> Result<ResetReport> {
    validate_session_id(session_id)?;

    let transcript_removed = transcripts.remove(session_id)?;

    let upload_dir = layout.session_upload_dir(session_id);
    let uploads_removed = if upload_dir.exists() {
        fs::remove_dir_all(&upload_dir)
            .with_context(|| format!("Failed to remove uploads {}", upload_dir.display()))?;
        true
    } else {
        false
    };

    let new_session_id = identity.rotate();
    tracing::info!(
        "Reset session {} (transcript removed: {}, uploads removed: {}); new session {}",
        session_id,
        transcript_removed,
        uploads_removed,
        new_session_id
    );

    Ok(ResetReport {
        old_session_id: session_id.to_string(),
        new_session_id,
        transcript_removed,
        uploads_removed,
    })
}
