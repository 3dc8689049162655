//! Resume bookkeeping
//!
//! Tracks the identifiers the server hands out during a session so a
//! dropped connection can be resumed instead of re-identified. The
//! sequence number only moves forward; a late frame never rewinds it.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::protocol::ResumePayload;

/// Shared handle to the session bookkeeping
pub type SharedSession = Arc<RwLock<Session>>;

/// Resume state for one gateway session
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Session ID from the Ready event
    session_id: Option<String>,

    /// Highest sequence number seen on a Dispatch frame
    seq: Option<u64>,

    /// Preferred reconnect URL from the Ready event
    resume_url: Option<String>,
}

impl Session {
    /// Create an empty session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty session behind a shared lock
    #[must_use]
    pub fn new_shared() -> SharedSession {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Record the identifiers from a Ready event
    pub fn establish(&mut self, session_id: impl Into<String>, resume_url: Option<String>) {
        self.session_id = Some(session_id.into());
        self.resume_url = resume_url;
    }

    /// Record a Dispatch sequence number, keeping the highest seen
    pub fn record_seq(&mut self, seq: u64) {
        let highest = self.seq.map_or(seq, |current| current.max(seq));
        self.seq = Some(highest);
    }

    /// Last recorded sequence number
    #[must_use]
    pub fn seq(&self) -> Option<u64> {
        self.seq
    }

    /// Session ID, if a session was established
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Reconnect URL advertised by the server, if any
    #[must_use]
    pub fn resume_url(&self) -> Option<&str> {
        self.resume_url.as_deref()
    }

    /// Whether enough state exists to attempt a resume
    #[must_use]
    pub fn can_resume(&self) -> bool {
        self.session_id.is_some() && self.seq.is_some()
    }

    /// Build the Resume payload for the current session
    ///
    /// Returns `None` when no resumable session exists.
    #[must_use]
    pub fn resume_payload(&self, token: &str) -> Option<ResumePayload> {
        let session_id = self.session_id.as_deref()?;
        let seq = self.seq?;
        Some(ResumePayload::new(token, session_id, seq))
    }

    /// Forget the session; the next connection must identify afresh
    pub fn invalidate(&mut self) {
        self.session_id = None;
        self.seq = None;
        self.resume_url = None;
    }
}
