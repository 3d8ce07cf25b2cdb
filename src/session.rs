//! Per-user search sessions
//!
//! Each user has at most one session holding the candidates from their most
//! recent search. Sessions are never persisted and never expire; a new
//! search overwrites the previous one.

use crate::access::Identity;
use crate::lookup::CandidateMod;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Errors raised when navigating into a session
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// No session, or the session is not choosing a candidate
    #[error("search session is missing or stale")]
    StaleSession,
    /// Selected index is past the end of the candidate list
    #[error("candidate index {index} out of range ({len} candidates)")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of stored candidates
        len: usize,
    },
}

/// Interaction phase of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionPhase {
    /// No active candidate selection
    #[default]
    Idle,
    /// The user is picking from the last search results
    ChoosingCandidate,
}

/// Search state of a single user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchSession {
    /// Candidates from the last search, in provider order
    pub candidates: Vec<CandidateMod>,
    /// Current phase
    pub phase: SessionPhase,
}

impl SearchSession {
    /// Replace the candidates and start choosing among them
    pub fn store_results(&mut self, candidates: Vec<CandidateMod>) {
        self.candidates = candidates;
        self.phase = SessionPhase::ChoosingCandidate;
    }

    /// Drop the candidates and return to `Idle`
    pub fn invalidate(&mut self) {
        *self = Self::default();
    }

    /// Candidate at `index`
    ///
    /// # Errors
    ///
    /// `StaleSession` unless choosing a candidate, `IndexOutOfRange` if
    /// `index` is past the end.
    pub fn resolve(&self, index: usize) -> Result<&CandidateMod, SessionError> {
        if self.phase != SessionPhase::ChoosingCandidate {
            return Err(SessionError::StaleSession);
        }
        self.candidates
            .get(index)
            .ok_or(SessionError::IndexOutOfRange {
                index,
                len: self.candidates.len(),
            })
    }

    /// Candidates for re-rendering the result list, if still valid
    #[must_use]
    pub fn active_candidates(&self) -> Option<&[CandidateMod]> {
        (self.phase == SessionPhase::ChoosingCandidate && !self.candidates.is_empty())
            .then_some(self.candidates.as_slice())
    }
}

/// Session map keyed by user ID
///
/// The outer lock only guards the map; each session has its own lock so a
/// transition on one user's session never waits on another user.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<i64, Arc<Mutex<SearchSession>>>>,
}

impl SessionStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the identity's session, creating an idle one if needed
    ///
    /// Hold the guard for the whole read-modify-write of a transition.
    pub async fn lock(&self, identity: &Identity) -> OwnedMutexGuard<SearchSession> {
        let slot = {
            let mut sessions = self.sessions.lock().await;
            Arc::clone(sessions.entry(identity.id).or_default())
        };
        slot.lock_owned().await
    }

    /// Overwrite the identity's session with fresh search results
    pub async fn store_results(&self, identity: &Identity, candidates: Vec<CandidateMod>) {
        self.lock(identity).await.store_results(candidates);
    }

    /// Reset the identity's session to `Idle`
    pub async fn invalidate(&self, identity: &Identity) {
        let slot = self.sessions.lock().await.get(&identity.id).cloned();
        if let Some(slot) = slot {
            slot.lock().await.invalidate();
        }
    }

    /// Clone of the candidate at `index` in the identity's session
    ///
    /// # Errors
    ///
    /// `StaleSession` if the identity never searched or is not choosing a
    /// candidate, `IndexOutOfRange` for a bad index.
    pub async fn resolve_candidate(
        &self,
        identity: &Identity,
        index: usize,
    ) -> Result<CandidateMod, SessionError> {
        let slot = self.sessions.lock().await.get(&identity.id).cloned();
        let Some(slot) = slot else {
            return Err(SessionError::StaleSession);
        };
        let session = slot.lock().await;
        session.resolve(index).cloned()
    }

    /// Snapshot of the identity's active candidates, if any
    pub async fn active_candidates(&self, identity: &Identity) -> Option<Vec<CandidateMod>> {
        let slot = self.sessions.lock().await.get(&identity.id).cloned()?;
        let session = slot.lock().await;
        session.active_candidates().map(<[CandidateMod]>::to_vec)
    }

    /// Number of users with a session entry
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Whether no user has a session entry
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}
