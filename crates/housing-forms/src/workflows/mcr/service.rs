use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::authorization::ApproverAllowList;
use super::domain::{FormId, FormStatus, McrForm, McrSubmission, NewMcrForm, RequestType};
use super::notification::{MailTransport, NotificationDispatcher};
use super::proration::prorated_amount;
use super::repository::{FormRepository, RepositoryError};

/// Service composing the record store, the approver allow-list, the proration
/// calculator, and the notification dispatcher. Owns both the submission path
/// and the status transition engine.
pub struct McrFormService<R, M> {
    repository: Arc<R>,
    notifications: NotificationDispatcher<M>,
    approvers: ApproverAllowList,
}

impl<R, M> McrFormService<R, M>
where
    R: FormRepository + 'static,
    M: MailTransport + 'static,
{
    pub fn new(
        repository: Arc<R>,
        notifications: NotificationDispatcher<M>,
        approvers: ApproverAllowList,
    ) -> Self {
        Self {
            repository,
            notifications,
            approvers,
        }
    }

    /// Validate and persist a new form. The prorated amount is derived
    /// server-side; any client-supplied value never reaches the store. The
    /// created notification is best-effort and cannot fail the submission.
    pub async fn submit(&self, submission: McrSubmission) -> Result<McrForm, FormServiceError> {
        validate_submission(&submission)?;

        let prorated = prorated_amount(
            Some(submission.hap_amount),
            submission.date_intended_to_vacate,
        );

        let form = self.repository.create(NewMcrForm {
            fields: submission,
            prorated_amount: prorated,
            created_at: Utc::now(),
        })?;
        info!(form_id = form.id.0, "MCR form created");

        self.notifications.form_created(&form).await;
        Ok(form)
    }

    /// Apply a requested status change to a Pending form.
    ///
    /// The write is a compare-and-swap conditioned on the form still being
    /// Pending; of two concurrent calls exactly one commits and the loser
    /// sees `Conflict`. The decided notification goes to the submitter after
    /// the commit and never reverses it.
    pub async fn decide(
        &self,
        id: FormId,
        requested: FormStatus,
        acting_identity: Option<&str>,
        comments: Option<&str>,
    ) -> Result<McrForm, FormServiceError> {
        if requested == FormStatus::Pending {
            return Err(FormServiceError::Validation {
                fields: vec!["status"],
            });
        }

        if !self.approvers.can_decide(acting_identity) {
            return Err(FormServiceError::Unauthorized);
        }

        let current = self
            .repository
            .fetch(id)?
            .ok_or(FormServiceError::NotFound)?;
        if current.status != FormStatus::Pending {
            return Err(FormServiceError::InvalidTransition {
                current: current.status,
            });
        }

        let updated = self
            .repository
            .decide(id, FormStatus::Pending, requested, Utc::now())?;
        info!(
            form_id = updated.id.0,
            status = requested.label(),
            "MCR form status updated"
        );

        self.notifications
            .form_decided(&updated, requested, comments)
            .await;
        Ok(updated)
    }

    pub fn get(&self, id: FormId) -> Result<McrForm, FormServiceError> {
        self.repository
            .fetch(id)?
            .ok_or(FormServiceError::NotFound)
    }

    pub fn list(&self) -> Result<Vec<McrForm>, FormServiceError> {
        Ok(self.repository.list()?)
    }

    /// Full field replacement of an existing form. Status is untouched:
    /// editing a Rejected form does not route it back to Pending. The
    /// prorated amount is re-derived from the replacement fields.
    pub async fn replace(
        &self,
        id: FormId,
        submission: McrSubmission,
    ) -> Result<McrForm, FormServiceError> {
        validate_submission(&submission)?;

        let prorated = prorated_amount(
            Some(submission.hap_amount),
            submission.date_intended_to_vacate,
        );

        let updated = self
            .repository
            .replace_fields(id, submission, prorated, Utc::now())?;
        Ok(updated)
    }

    /// Delete the form by removing its parent envelope.
    pub fn delete(&self, id: FormId) -> Result<(), FormServiceError> {
        self.repository.delete(id)?;
        info!(form_id = id.0, "MCR form deleted");
        Ok(())
    }
}

fn validate_submission(submission: &McrSubmission) -> Result<(), FormServiceError> {
    let mut fields = Vec::new();

    if !submission.landlord.is_identified() {
        fields.push("landlord");
    }

    if submission.request_type == RequestType::Other {
        let described = submission
            .description
            .as_deref()
            .map(|value| !value.trim().is_empty())
            .unwrap_or(false);
        if !described {
            fields.push("description");
        }
    }

    if submission.last_four_ssn.chars().count() != 4 {
        fields.push("lastFourSsn");
    }

    if !submission.hap_amount.is_finite() || submission.hap_amount < 0.0 {
        fields.push("hapAmount");
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(FormServiceError::Validation { fields })
    }
}

/// Error raised by the form service. Callers branch on kind; the HTTP layer
/// maps each variant to a status class.
#[derive(Debug, thiserror::Error)]
pub enum FormServiceError {
    #[error("validation failed for field(s): {}", fields.join(", "))]
    Validation { fields: Vec<&'static str> },
    #[error("form not found")]
    NotFound,
    #[error("acting identity is not authorized to decide forms")]
    Unauthorized,
    #[error("form has already left Pending (currently {})", current.label())]
    InvalidTransition { current: FormStatus },
    #[error("form status changed concurrently; re-fetch and retry")]
    Conflict,
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for FormServiceError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => FormServiceError::NotFound,
            RepositoryError::StatusConflict { .. } => FormServiceError::Conflict,
            other => FormServiceError::Repository(other),
        }
    }
}
