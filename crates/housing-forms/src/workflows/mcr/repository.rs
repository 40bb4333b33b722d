use chrono::{DateTime, Utc};

use super::domain::{FormId, FormStatus, McrForm, McrSubmission, NewMcrForm};

/// Storage abstraction over the form and envelope tables so the service and
/// transition engine can be exercised in isolation.
///
/// Implementations must honor two atomicity contracts: `create` writes the
/// parent envelope and the form in one transaction (both or neither), and
/// `decide` is a compare-and-swap that only commits when the stored status
/// still equals `expected`, mirroring the new status string onto the
/// envelope in the same write.
pub trait FormRepository: Send + Sync {
    fn create(&self, form: NewMcrForm) -> Result<McrForm, RepositoryError>;
    fn fetch(&self, id: FormId) -> Result<Option<McrForm>, RepositoryError>;
    /// All forms, newest first by creation timestamp.
    fn list(&self) -> Result<Vec<McrForm>, RepositoryError>;
    /// Full field replacement. Status is untouched; only the update
    /// timestamps move.
    fn replace_fields(
        &self,
        id: FormId,
        fields: McrSubmission,
        prorated_amount: Option<f64>,
        updated_at: DateTime<Utc>,
    ) -> Result<McrForm, RepositoryError>;
    fn decide(
        &self,
        id: FormId,
        expected: FormStatus,
        next: FormStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<McrForm, RepositoryError>;
    /// Deletes the form's envelope; the form record goes with it.
    fn delete(&self, id: FormId) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("status changed concurrently (currently {})", current.label())]
    StatusConflict { current: FormStatus },
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}
