use admission_flow::workflows::admissions::{
    AdmissionSession, FieldKey, RecordObserver, RepositoryError, SessionHandle, SessionId,
    SessionRepository,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local session store; sessions live until closed or the process exits.
#[derive(Default, Clone)]
pub(crate) struct InMemorySessionRepository {
    sessions: Arc<Mutex<HashMap<SessionId, SessionHandle>>>,
}

impl InMemorySessionRepository {
    fn guard(&self) -> Result<MutexGuard<'_, HashMap<SessionId, SessionHandle>>, RepositoryError> {
        self.sessions
            .lock()
            .map_err(|_| RepositoryError::Unavailable("session store lock poisoned".to_string()))
    }
}

impl SessionRepository for InMemorySessionRepository {
    fn insert(&self, session: AdmissionSession) -> Result<SessionHandle, RepositoryError> {
        let mut guard = self.guard()?;
        if guard.contains_key(session.id()) {
            return Err(RepositoryError::Conflict);
        }
        let id = session.id().clone();
        let handle = Arc::new(Mutex::new(session));
        guard.insert(id, handle.clone());
        Ok(handle)
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<SessionHandle>, RepositoryError> {
        Ok(self.guard()?.get(id).cloned())
    }

    fn remove(&self, id: &SessionId) -> Result<(), RepositoryError> {
        self.guard()?
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

/// Logs every accepted merge so operators can trace how a record was assembled.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct AuditObserver;

impl RecordObserver for AuditObserver {
    fn record_changed(&self, version: u64, changed: &[FieldKey]) {
        let fields = changed
            .iter()
            .map(|key| key.as_str())
            .collect::<Vec<_>>()
            .join(",");
        tracing::info!(target: "admissions::audit", version, fields = %fields, "record updated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use admission_flow::workflows::admissions::{Category, FragmentAggregator, WizardStateMachine};

    fn session(id: &str) -> AdmissionSession {
        AdmissionSession::new(
            SessionId(id.to_string()),
            "2500117",
            FragmentAggregator::new(),
            WizardStateMachine::new(Category::School),
        )
    }

    #[test]
    fn duplicate_sessions_conflict() {
        let repository = InMemorySessionRepository::default();
        repository.insert(session("adm-1")).expect("first insert");

        assert!(matches!(
            repository.insert(session("adm-1")),
            Err(RepositoryError::Conflict)
        ));
    }

    #[test]
    fn removed_sessions_are_gone() {
        let repository = InMemorySessionRepository::default();
        let id = SessionId("adm-2".to_string());
        repository.insert(session("adm-2")).expect("insert");

        repository.remove(&id).expect("remove");
        assert!(repository.fetch(&id).expect("fetch").is_none());
        assert!(matches!(repository.remove(&id), Err(RepositoryError::NotFound)));
    }
}
