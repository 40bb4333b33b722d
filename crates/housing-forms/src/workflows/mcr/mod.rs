//! Manual Check Request (MCR) form lifecycle.
//!
//! Covers the status state machine from creation through terminal
//! disposition, the allow-list gate on decide transitions, the prorated
//! payment derivation for vacate-date adjustments, and the best-effort
//! notification side effects fired by lifecycle events. Persistence and mail
//! delivery stay behind traits so the workflow can run against the in-memory
//! adapters used by the API service and the test suite.

pub mod authorization;
pub mod domain;
pub mod notification;
pub mod proration;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use authorization::ApproverAllowList;
pub use domain::{
    EnvelopeId, FormEnvelope, FormId, FormStatus, LandlordIdentity, McrForm, McrSubmission,
    McrType, NewMcrForm, ProgramType, RequestType, Submitter, UnitAddress, VerificationFlags,
    MCR_FORM_TYPE,
};
pub use notification::{MailError, MailMessage, MailTransport, NotificationDispatcher};
pub use proration::{days_in_month, prorated_amount};
pub use repository::{FormRepository, RepositoryError};
pub use router::{mcr_router, DecisionRequest, ACTING_IDENTITY_HEADER};
pub use service::{FormServiceError, McrFormService};
