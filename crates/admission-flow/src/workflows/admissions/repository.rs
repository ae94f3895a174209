use std::sync::{Arc, Mutex};

use super::session::{AdmissionSession, SessionId};

/// Shared, lockable handle to a live session.
pub type SessionHandle = Arc<Mutex<AdmissionSession>>;

/// Storage abstraction for live sessions so the service can be exercised in isolation.
pub trait SessionRepository: Send + Sync {
    fn insert(&self, session: AdmissionSession) -> Result<SessionHandle, RepositoryError>;
    fn fetch(&self, id: &SessionId) -> Result<Option<SessionHandle>, RepositoryError>;
    fn remove(&self, id: &SessionId) -> Result<(), RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("session already exists")]
    Conflict,
    #[error("session not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
