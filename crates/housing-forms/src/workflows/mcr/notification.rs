use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::warn;

use super::domain::{FormStatus, McrForm};

/// Human-readable notification ready for an outbound transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Outbound mail seam. Implementations may block; the dispatcher runs them
/// on the blocking pool under a delivery timeout.
pub trait MailTransport: Send + Sync {
    fn deliver(&self, message: MailMessage) -> Result<(), MailError>;
}

/// Mail delivery error.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail transport unavailable: {0}")]
    Transport(String),
}

/// Best-effort notification side effects for lifecycle events.
///
/// Dispatch happens strictly after the transactional write and never feeds
/// back into the caller's result: failures and timeouts are logged with the
/// form id and event name, then dropped. One delivery attempt per event;
/// a retry policy would slot in here without touching the transition logic.
pub struct NotificationDispatcher<M> {
    transport: Arc<M>,
    approver_inbox: String,
    delivery_timeout: Duration,
}

impl<M> NotificationDispatcher<M>
where
    M: MailTransport + 'static,
{
    pub fn new(transport: Arc<M>, approver_inbox: String, delivery_timeout: Duration) -> Self {
        Self {
            transport,
            approver_inbox,
            delivery_timeout,
        }
    }

    /// Notify the approver distribution that a new form arrived.
    pub async fn form_created(&self, form: &McrForm) {
        let message = self.created_message(form);
        self.dispatch(form, "form_created", message).await;
    }

    /// Notify the original submitter that their form was decided.
    pub async fn form_decided(&self, form: &McrForm, status: FormStatus, comments: Option<&str>) {
        let message = self.decided_message(form, status, comments);
        self.dispatch(form, "form_decided", message).await;
    }

    pub fn created_message(&self, form: &McrForm) -> MailMessage {
        let body = format!(
            "A new Manual Check Request form has been submitted.\n\n\
             Form ID: {}\n\
             Tenant Name: {}\n\
             MCR Type: {}\n\
             Submitted By: {}\n\
             Payment Window: {} through {}\n\
             HAP Amount: {:.2}\n\n\
             Please review the submission in the housing management system.",
            form.id.0,
            form.fields.tenant_name,
            mcr_type_label(form),
            form.fields.submitter.name,
            form.fields.payment_start,
            form.fields.payment_end,
            form.fields.hap_amount,
        );

        MailMessage {
            to: self.approver_inbox.clone(),
            subject: format!(
                "New MCR Form Submission - {} (ID: {})",
                form.fields.tenant_name, form.id.0
            ),
            body,
        }
    }

    pub fn decided_message(
        &self,
        form: &McrForm,
        status: FormStatus,
        comments: Option<&str>,
    ) -> MailMessage {
        let mut body = format!(
            "The status of an MCR form has been updated.\n\n\
             New Status: {}\n\n\
             Form ID: {}\n\
             Tenant Name: {}\n\
             MCR Type: {}\n\
             Housing Specialist: {}\n\
             Updated: {}\n",
            status.label(),
            form.id.0,
            form.fields.tenant_name,
            mcr_type_label(form),
            form.fields.submitter.name,
            form.updated_at.unwrap_or_else(Utc::now).format("%m/%d/%Y %H:%M"),
        );
        if let Some(comments) = comments {
            if !comments.trim().is_empty() {
                body.push_str(&format!("Reviewer Comments: {}\n", comments.trim()));
            }
        }
        body.push_str("\nPlease log into the housing management system for more details.");

        MailMessage {
            to: form.fields.submitter.email.clone(),
            subject: format!(
                "MCR Form Status Updated - {} (ID: {})",
                form.fields.tenant_name, form.id.0
            ),
            body,
        }
    }

    async fn dispatch(&self, form: &McrForm, event: &'static str, message: MailMessage) {
        let transport = Arc::clone(&self.transport);
        let delivery = tokio::task::spawn_blocking(move || transport.deliver(message));

        match tokio::time::timeout(self.delivery_timeout, delivery).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(err))) => {
                warn!(form_id = form.id.0, event, error = %err, "notification delivery failed");
            }
            Ok(Err(join_err)) => {
                warn!(form_id = form.id.0, event, error = %join_err, "notification task failed");
            }
            Err(_) => {
                warn!(form_id = form.id.0, event, "notification delivery timed out");
            }
        }
    }
}

fn mcr_type_label(form: &McrForm) -> &'static str {
    match form.fields.mcr_type {
        super::domain::McrType::HapPortion => "HAP Portion",
        super::domain::McrType::TenantPortion => "Tenant Portion",
        super::domain::McrType::Both => "Both",
    }
}
