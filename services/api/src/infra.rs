use chrono::{DateTime, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

use housing_forms::workflows::mcr::{
    EnvelopeId, FormEnvelope, FormId, FormRepository, FormStatus, MailError, MailMessage,
    MailTransport, McrForm, McrSubmission, NewMcrForm, RepositoryError, MCR_FORM_TYPE,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Record store adapter backed by process memory. A single mutex guards both
/// tables so envelope-plus-form creation and the decide compare-and-swap are
/// atomic, matching the contract a transactional store would give.
#[derive(Default)]
pub(crate) struct InMemoryFormRepository {
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    next_form_id: i64,
    next_envelope_id: i64,
    forms: HashMap<i64, McrForm>,
    envelopes: HashMap<i64, FormEnvelope>,
}

impl FormRepository for InMemoryFormRepository {
    fn create(&self, form: NewMcrForm) -> Result<McrForm, RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");

        state.next_envelope_id += 1;
        let envelope_id = state.next_envelope_id;
        state.next_form_id += 1;
        let form_id = state.next_form_id;

        let envelope = FormEnvelope {
            id: EnvelopeId(envelope_id),
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

/// Mail adapter for deployments without an SMTP relay wired up: notifications
/// land in the service log instead of a mailbox.
#[derive(Default)]
pub(crate) struct LoggingMailTransport;

impl MailTransport for LoggingMailTransport {
    fn deliver(&self, message: MailMessage) -> Result<(), MailError> {
        info!(to = %message.to, subject = %message.subject, "outbound notification");
        Ok(())
    }
}

/// Mail adapter for demos and tests; keeps every message for inspection.
#[derive(Default, Clone)]
pub(crate) struct RecordingMailTransport {
    messages: Arc<Mutex<Vec<MailMessage>>>,
}

impl RecordingMailTransport {
    pub(crate) fn messages(&self) -> Vec<MailMessage> {
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

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
