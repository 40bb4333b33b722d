use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::response::Response;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::workflows::mcr::authorization::ApproverAllowList;
use crate::workflows::mcr::domain::{
    FormEnvelope, FormId, FormStatus, LandlordIdentity, McrForm, McrSubmission, McrType,
    NewMcrForm, ProgramType, RequestType, Submitter, UnitAddress, VerificationFlags,
    MCR_FORM_TYPE,
};
use crate::workflows::mcr::notification::{
    MailError, MailMessage, MailTransport, NotificationDispatcher,
};
use crate::workflows::mcr::repository::{FormRepository, RepositoryError};
use crate::workflows::mcr::service::McrFormService;

pub(super) const APPROVER: &str = "alicia.jones";
pub(super) const APPROVER_INBOX: &str = "mcr-review@housing.example.gov";
pub(super) const SUBMITTER_EMAIL: &str = "dana.reyes@housing.example.gov";

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn submission() -> McrSubmission {
    McrSubmission {
        submitter: Submitter {
            name: "Dana Reyes".to_string(),
            email: SUBMITTER_EMAIL.to_string(),
        },
        program_type: ProgramType::Hcv,
        last_four_ssn: "1234".to_string(),
        tenant_name: "Jordan Fields".to_string(),
        owner_account_number: "OA-5512".to_string(),
        address: UnitAddress {
            line1: "214 Sutter St".to_string(),
            line2: Some("Unit B".to_string()),
            city: "Vallejo".to_string(),
            state: "CA".to_string(),
            zip: "94590".to_string(),
        },
        landlord: LandlordIdentity {
            entity_name: None,
            first_name: Some("Maria".to_string()),
            last_name: Some("Santos".to_string()),
        },
        effective_date: date(2025, 7, 1),
        payment_start: date(2025, 7, 1),
        payment_end: date(2025, 7, 31),
        reason_comments: Some("Missed HAP cycle after port-in".to_string()),
        mcr_type: McrType::HapPortion,
        verifications: VerificationFlags {
            third_party_payments_verified: true,
            transaction_screen_verified: true,
            overlapping_hap: false,
        },
        request_type: RequestType::Underpayment,
        description: None,
        hap_amount: 930.0,
        date_intended_to_vacate: None,
        signature_data: None,
    }
}

pub(super) fn unidentified_landlord_submission() -> McrSubmission {
    let mut submission = submission();
    submission.landlord = LandlordIdentity {
        entity_name: Some("   ".to_string()),
        first_name: Some("Maria".to_string()),
        last_name: None,
    };
    submission
}

pub(super) fn undescribed_other_submission() -> McrSubmission {
    let mut submission = submission();
    submission.request_type = RequestType::Other;
    submission.description = Some("  ".to_string());
    submission
}

pub(super) fn allow_list() -> ApproverAllowList {
    ApproverAllowList::new([APPROVER, "justin.grier"])
}

pub(super) fn dispatcher<M: MailTransport + 'static>(
    transport: Arc<M>,
) -> NotificationDispatcher<M> {
    NotificationDispatcher::new(
        transport,
        APPROVER_INBOX.to_string(),
        Duration::from_millis(250),
    )
}

pub(super) fn build_service() -> (
    Arc<McrFormService<MemoryFormRepository, RecordingMailTransport>>,
    Arc<MemoryFormRepository>,
    Arc<RecordingMailTransport>,
) {
    let repository = Arc::new(MemoryFormRepository::default());
    let transport = Arc::new(RecordingMailTransport::default());
    let service = Arc::new(McrFormService::new(
        repository.clone(),
        dispatcher(transport.clone()),
        allow_list(),
    ));
    (service, repository, transport)
}

#[derive(Default)]
pub(super) struct MemoryFormRepository {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    next_form_id: i64,
    next_envelope_id: i64,
    forms: HashMap<i64, McrForm>,
    envelopes: HashMap<i64, FormEnvelope>,
}

impl MemoryFormRepository {
    pub(super) fn envelope_for(&self, form: &McrForm) -> Option<FormEnvelope> {
        let state = self.state.lock().expect("repository mutex poisoned");
        state.envelopes.get(&form.envelope_id.0).cloned()
    }

    pub(super) fn form_count(&self) -> usize {
        let state = self.state.lock().expect("repository mutex poisoned");
        state.forms.len()
    }
}

impl FormRepository for MemoryFormRepository {
    fn create(&self, form: NewMcrForm) -> Result<McrForm, RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");

        state.next_envelope_id += 1;
        let envelope_id = state.next_envelope_id;
        state.next_form_id += 1;
        let form_id = state.next_form_id;

        let envelope = FormEnvelope {
            id: crate::workflows::mcr::domain::EnvelopeId(envelope_id),
            form_type: MCR_FORM_TYPE.to_string(),
            status: FormStatus::Pending.label().to_string(),
            created_at: form.created_at,
            updated_at: None,
        };
        let record = McrForm {
            id: FormId(form_id),
            envelope_id: envelope.id,
            fields: form.fields,
            prorated_amount: form.prorated_amount,
            status: FormStatus::Pending,
            created_at: form.created_at,
            updated_at: None,
        };

        state.envelopes.insert(envelope_id, envelope);
        state.forms.insert(form_id, record.clone());
        Ok(record)
    }

    fn fetch(&self, id: FormId) -> Result<Option<McrForm>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state.forms.get(&id.0).cloned())
    }

    fn list(&self) -> Result<Vec<McrForm>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        let mut forms: Vec<McrForm> = state.forms.values().cloned().collect();
        forms.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.0.cmp(&a.id.0)));
        Ok(forms)
    }

    fn replace_fields(
        &self,
        id: FormId,
        fields: McrSubmission,
        prorated_amount: Option<f64>,
        updated_at: DateTime<Utc>,
    ) -> Result<McrForm, RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        let envelope_id = {
            let form = state.forms.get_mut(&id.0).ok_or(RepositoryError::NotFound)?;
            form.fields = fields;
            form.prorated_amount = prorated_amount;
            form.updated_at = Some(updated_at);
            form.envelope_id.0
        };
        if let Some(envelope) = state.envelopes.get_mut(&envelope_id) {
            envelope.updated_at = Some(updated_at);
        }
        Ok(state.forms[&id.0].clone())
    }

    fn decide(
        &self,
        id: FormId,
        expected: FormStatus,
        next: FormStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<McrForm, RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        let envelope_id = {
            let form = state.forms.get_mut(&id.0).ok_or(RepositoryError::NotFound)?;
            if form.status != expected {
                return Err(RepositoryError::StatusConflict {
                    current: form.status,
                });
            }
            form.status = next;
            form.updated_at = Some(updated_at);
            form.envelope_id.0
        };
        if let Some(envelope) = state.envelopes.get_mut(&envelope_id) {
            envelope.status = next.label().to_string();
            envelope.updated_at = Some(updated_at);
        }
        Ok(state.forms[&id.0].clone())
    }

    fn delete(&self, id: FormId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        let form = state.forms.remove(&id.0).ok_or(RepositoryError::NotFound)?;
        state.envelopes.remove(&form.envelope_id.0);
        Ok(())
    }
}

/// Wrapper that reports Pending on read but has already committed a decision
/// underneath, forcing the compare-and-swap to lose.
pub(super) struct RacingFormRepository {
    pub(super) inner: Arc<MemoryFormRepository>,
}

impl FormRepository for RacingFormRepository {
    fn create(&self, form: NewMcrForm) -> Result<McrForm, RepositoryError> {
        self.inner.create(form)
    }

    fn fetch(&self, id: FormId) -> Result<Option<McrForm>, RepositoryError> {
        let mut form = self.inner.fetch(id)?;
        if let Some(record) = form.as_mut() {
            record.status = FormStatus::Pending;
        }
        Ok(form)
    }

    fn list(&self) -> Result<Vec<McrForm>, RepositoryError> {
        self.inner.list()
    }

    fn replace_fields(
        &self,
        id: FormId,
        fields: McrSubmission,
        prorated_amount: Option<f64>,
        updated_at: DateTime<Utc>,
    ) -> Result<McrForm, RepositoryError> {
        self.inner.replace_fields(id, fields, prorated_amount, updated_at)
    }

    fn decide(
        &self,
        id: FormId,
        expected: FormStatus,
        next: FormStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<McrForm, RepositoryError> {
        self.inner.decide(id, expected, next, updated_at)
    }

    fn delete(&self, id: FormId) -> Result<(), RepositoryError> {
        self.inner.delete(id)
    }
}

pub(super) struct UnavailableRepository;

impl FormRepository for UnavailableRepository {
    fn create(&self, _form: NewMcrForm) -> Result<McrForm, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: FormId) -> Result<Option<McrForm>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<Vec<McrForm>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn replace_fields(
        &self,
        _id: FormId,
        _fields: McrSubmission,
        _prorated_amount: Option<f64>,
        _updated_at: DateTime<Utc>,
    ) -> Result<McrForm, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn decide(
        &self,
        _id: FormId,
        _expected: FormStatus,
        _next: FormStatus,
        _updated_at: DateTime<Utc>,
    ) -> Result<McrForm, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: FormId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct RecordingMailTransport {
    messages: Mutex<Vec<MailMessage>>,
}

impl RecordingMailTransport {
    pub(super) fn messages(&self) -> Vec<MailMessage> {
        self.messages.lock().expect("mail mutex poisoned").clone()
    }
}

impl MailTransport for RecordingMailTransport {
    fn deliver(&self, message: MailMessage) -> Result<(), MailError> {
        self.messages
            .lock()
            .expect("mail mutex poisoned")
            .push(message);
        Ok(())
    }
}

pub(super) struct FailingMailTransport;

impl MailTransport for FailingMailTransport {
    fn deliver(&self, _message: MailMessage) -> Result<(), MailError> {
        Err(MailError::Transport("smtp relay unreachable".to_string()))
    }
}

/// Blocks longer than any dispatcher timeout used in tests.
pub(super) struct SlowMailTransport;

impl MailTransport for SlowMailTransport {
    fn deliver(&self, _message: MailMessage) -> Result<(), MailError> {
        std::thread::sleep(Duration::from_secs(2));
        Ok(())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
