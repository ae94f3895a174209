use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::{json, Value};
use tokio::sync::Notify;

use crate::config::ValidationSettings;
use crate::workflows::admissions::aggregator::{FragmentAggregator, RecordObserver};
use crate::workflows::admissions::credentials::StaticCredentials;
use crate::workflows::admissions::domain::{FieldKey, Fragment, FragmentSource};
use crate::workflows::admissions::record::CanonicalRecord;
use crate::workflows::admissions::repository::{
    RepositoryError, SessionHandle, SessionRepository,
};
use crate::workflows::admissions::service::{AdmissionSessionService, OpenSession};
use crate::workflows::admissions::session::{AdmissionSession, SessionId};
use crate::workflows::admissions::submission::{
    Payload, SubmissionContext, SubmissionTransport, SubmissionVariant, TransportError,
    TransportResponse,
};

pub(super) const OPERATOR_ID: i64 = 4417;
pub(super) const TOKEN: &str = "token-abc";

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
}

pub(super) fn context() -> SubmissionContext {
    SubmissionContext {
        application_no: 2_500_117,
        operator_id: OPERATOR_ID,
        now: Utc
            .with_ymd_and_hms(2025, 6, 1, 9, 30, 0)
            .single()
            .expect("valid instant"),
    }
}

pub(super) fn fragment(source: FragmentSource, values: Value) -> Fragment {
    Fragment::from_json(source, values)
}

pub(super) fn personal_fragment() -> Fragment {
    fragment(
        FragmentSource::Personal,
        json!({
            "firstName": "Ravi",
            "surname": "Kumar",
            "gender": "1",
            "aaparNo": "AP-99812",
            "dateOfBirth": "2012-04-15",
            "aadharCardNo": "123456789012",
            "quota": "2",
            "admissionType": "1",
            "phoneNumber": "9876543210",
            "fatherName": "Suresh Kumar",
        }),
    )
}

pub(super) fn orientation_fragment() -> Fragment {
    fragment(
        FragmentSource::Orientation,
        json!({
            "academicYear": "2025-26",
            "branch": "Ameerpet Campus",
            "branchId": "14",
            "city": "Hyderabad",
            "studentTypeId": "2",
            "joiningClassId": "9",
            "orientationName": "IIT Foundation",
            "orientationId": "31",
        }),
    )
}

pub(super) fn address_fragment() -> Fragment {
    fragment(
        FragmentSource::Address,
        json!({
            "doorNo": "12-4/B",
            "streetName": "MG Road",
            "landmark": "Near Metro",
            "area": "Ameerpet",
            "pincode": "500016",
            "mandal": "Ameerpet",
            "mandalId": "3",
            "district": "Hyderabad",
            "districtId": "2",
            "state": "Telangana",
            "stateId": "1",
            "city": "Hyderabad",
            "cityId": "7",
        }),
    )
}

pub(super) fn payment_fragment() -> Fragment {
    fragment(
        FragmentSource::Payment,
        json!({
            "paymentModeId": "2",
            "paymentDate": "2025-06-01",
            "amount": "1500",
            "receiptNumber": "R-100",
            "remarks": "Paid at counter",
        }),
    )
}

pub(super) fn family_fragment() -> Fragment {
    fragment(
        FragmentSource::Family,
        json!({
            "fatherName": "Suresh Kumar",
            "fatherPhoneNumber": "9876500000",
            "fatherOccupation": "Engineer",
            "motherName": "Lakshmi",
            "motherPhoneNumber": "9876511111",
        }),
    )
}

pub(super) fn academic_fragment() -> Fragment {
    fragment(
        FragmentSource::Academic,
        json!({
            "scoreMarks": "450",
            "marks": "450",
            "bloodGroup": "O+",
            "bloodGroupId": "5",
            "caste": "OC",
            "religion": "Hindu",
            "foodType": "Veg",
            "foodTypeId": "1",
            "orientationBatch": "Batch A",
            "orientationBatchId": "3",
            "schoolState": "Telangana",
            "schoolStateId": "1",
            "schoolDistrict": "Hyderabad",
            "schoolDistrictId": "2",
            "schoolName": "Little Flower High School",
            "schoolType": "Private",
            "schoolTypeId": "4",
        }),
    )
}

pub(super) fn concession_fragment() -> Fragment {
    fragment(
        FragmentSource::Concession,
        json!({
            "givenBy": "Principal",
            "givenById": "11",
            "authorizedBy": "Director",
            "authorizedById": "12",
            "reason": "Merit",
            "reasonId": "13",
            "description": "Topper discount",
            "yearConcession1st": "2000",
            "yearConcession2nd": "1500",
            "concessionTypeIds": { "yearConcession1st": 21, "yearConcession2nd": 22 },
        }),
    )
}

pub(super) fn sale_fragments() -> Vec<Fragment> {
    vec![
        personal_fragment(),
        orientation_fragment(),
        address_fragment(),
        payment_fragment(),
    ]
}

pub(super) fn complete_fragments() -> Vec<Fragment> {
    let mut fragments = sale_fragments();
    fragments.extend([family_fragment(), academic_fragment(), concession_fragment()]);
    fragments
}

pub(super) fn record_from(fragments: Vec<Fragment>) -> CanonicalRecord {
    let mut aggregator = FragmentAggregator::new();
    for fragment in fragments {
        aggregator.merge(fragment);
    }
    aggregator.into_record()
}

pub(super) fn sale_record() -> CanonicalRecord {
    record_from(sale_fragments())
}

pub(super) fn complete_record() -> CanonicalRecord {
    record_from(complete_fragments())
}

/// Record with a single field overridden on top of the given fragments.
pub(super) fn record_with(fragments: Vec<Fragment>, key: FieldKey, value: Value) -> CanonicalRecord {
    let mut aggregator = FragmentAggregator::new();
    for fragment in fragments {
        aggregator.merge(fragment);
    }
    let mut values = serde_json::Map::new();
    values.insert(key.as_str().to_string(), value);
    aggregator.merge(Fragment::new(FragmentSource::Personal, values));
    aggregator.into_record()
}

pub(super) fn open_request(application_no: &str) -> OpenSession {
    OpenSession {
        application_no: application_no.to_string(),
        category: Some("COLLEGE".to_string()),
        ..OpenSession::default()
    }
}

pub(super) fn credentials() -> Arc<StaticCredentials> {
    Arc::new(StaticCredentials::new(Some(TOKEN.to_string()), OPERATOR_ID))
}

pub(super) fn build_service() -> (
    AdmissionSessionService<MemorySessionRepository, ScriptedTransport>,
    Arc<MemorySessionRepository>,
    Arc<ScriptedTransport>,
) {
    let repository = Arc::new(MemorySessionRepository::default());
    let transport = Arc::new(ScriptedTransport::default());
    let service = AdmissionSessionService::new(
        repository.clone(),
        transport.clone(),
        credentials(),
        ValidationSettings::default(),
    );
    (service, repository, transport)
}

/// Open a session and feed it every fragment; returns the session id.
pub(super) fn open_with<R, T>(
    service: &AdmissionSessionService<R, T>,
    fragments: Vec<Fragment>,
) -> SessionId
where
    R: SessionRepository + 'static,
    T: SubmissionTransport + 'static,
{
    let view = service
        .open(open_request("2500117"))
        .expect("session opens");
    for fragment in fragments {
        service
            .merge_fragment(&view.session_id, fragment)
            .expect("fragment merges");
    }
    view.session_id
}

#[derive(Default, Clone)]
pub(super) struct MemorySessionRepository {
    pub(super) sessions: Arc<Mutex<HashMap<SessionId, SessionHandle>>>,
}

impl MemorySessionRepository {
    pub(super) fn len(&self) -> usize {
        self.sessions
            .lock()
            .expect("repository mutex poisoned")
            .len()
    }
}

impl SessionRepository for MemorySessionRepository {
    fn insert(&self, session: AdmissionSession) -> Result<SessionHandle, RepositoryError> {
        let mut guard = self.sessions.lock().expect("repository mutex poisoned");
        if guard.contains_key(session.id()) {
            return Err(RepositoryError::Conflict);
        }
        let id = session.id().clone();
        let handle = Arc::new(Mutex::new(session));
        guard.insert(id, handle.clone());
        Ok(handle)
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<SessionHandle>, RepositoryError> {
        let guard = self.sessions.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn remove(&self, id: &SessionId) -> Result<(), RepositoryError> {
        let mut guard = self.sessions.lock().expect("repository mutex poisoned");
        guard
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

pub(super) struct UnavailableRepository;

impl SessionRepository for UnavailableRepository {
    fn insert(&self, _session: AdmissionSession) -> Result<SessionHandle, RepositoryError> {
        Err(RepositoryError::Unavailable("session store offline".to_string()))
    }

    fn fetch(&self, _id: &SessionId) -> Result<Option<SessionHandle>, RepositoryError> {
        Err(RepositoryError::Unavailable("session store offline".to_string()))
    }

    fn remove(&self, _id: &SessionId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("session store offline".to_string()))
    }
}

/// One outbound call as the backend saw it.
#[derive(Debug, Clone)]
pub(super) struct SentRequest {
    pub(super) variant: SubmissionVariant,
    pub(super) body: Value,
    pub(super) credential: Option<String>,
}

/// Replays queued responses in order; answers `200 {}` once the queue is empty.
#[derive(Default)]
pub(super) struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
    sent: Mutex<Vec<SentRequest>>,
}

impl ScriptedTransport {
    pub(super) fn respond(&self, status: u16, body: &str) {
        self.responses
            .lock()
            .expect("transport mutex poisoned")
            .push_back(Ok(TransportResponse {
                status,
                content_type: Some("application/json".to_string()),
                body: body.to_string(),
            }));
    }

    pub(super) fn fail(&self, message: &str) {
        self.responses
            .lock()
            .expect("transport mutex poisoned")
            .push_back(Err(TransportError::Http(message.to_string())));
    }

    pub(super) fn sent(&self) -> Vec<SentRequest> {
        self.sent.lock().expect("transport mutex poisoned").clone()
    }
}

#[async_trait]
impl SubmissionTransport for ScriptedTransport {
    async fn submit(
        &self,
        variant: SubmissionVariant,
        payload: &Payload,
        credential: Option<&str>,
    ) -> Result<TransportResponse, TransportError> {
        self.sent
            .lock()
            .expect("transport mutex poisoned")
            .push(SentRequest {
                variant,
                body: payload.to_json().expect("payload serializes"),
                credential: credential.map(str::to_string),
            });
        self.responses
            .lock()
            .expect("transport mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| {
                Ok(TransportResponse {
                    status: 200,
                    content_type: Some("application/json".to_string()),
                    body: "{}".to_string(),
                })
            })
    }
}

/// Holds every submission until released, so tests can act while one is in flight.
#[derive(Default)]
pub(super) struct GatedTransport {
    pub(super) entered: Notify,
    pub(super) release: Notify,
}

#[async_trait]
impl SubmissionTransport for GatedTransport {
    async fn submit(
        &self,
        _variant: SubmissionVariant,
        _payload: &Payload,
        _credential: Option<&str>,
    ) -> Result<TransportResponse, TransportError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(TransportResponse {
            status: 200,
            content_type: None,
            body: "{}".to_string(),
        })
    }
}

#[derive(Default)]
pub(super) struct RecordingObserver {
    events: Mutex<Vec<(u64, Vec<FieldKey>)>>,
}

impl RecordingObserver {
    pub(super) fn events(&self) -> Vec<(u64, Vec<FieldKey>)> {
        self.events.lock().expect("observer mutex poisoned").clone()
    }
}

impl RecordObserver for RecordingObserver {
    fn record_changed(&self, version: u64, changed: &[FieldKey]) {
        self.events
            .lock()
            .expect("observer mutex poisoned")
            .push((version, changed.to_vec()));
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
