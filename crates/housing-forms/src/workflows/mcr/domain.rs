use chrono::{DateTime, NaiveDate, Utc};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Store-assigned identifier for an MCR form. Immutable once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormId(pub i64);

/// Store-assigned identifier for the parent envelope record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnvelopeId(pub i64);

/// Lifecycle status of an MCR form.
///
/// The numeric codes are a wire-compatibility commitment: 0 Pending,
/// 1 Approved, 2 Rejected, 3 InReview. Consumers that persist the integer
/// form rely on this exact order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    InReview,
}

impl FormStatus {
    pub const fn code(self) -> u8 {
        match self {
            FormStatus::Pending => 0,
            FormStatus::Approved => 1,
            FormStatus::Rejected => 2,
            FormStatus::InReview => 3,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(FormStatus::Pending),
            1 => Some(FormStatus::Approved),
            2 => Some(FormStatus::Rejected),
            3 => Some(FormStatus::InReview),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            FormStatus::Pending => "Pending",
            FormStatus::Approved => "Approved",
            FormStatus::Rejected => "Rejected",
            FormStatus::InReview => "InReview",
        }
    }

    /// Parse a wire status string. Unrecognized or empty input falls back to
    /// Pending; that default-on-unknown behavior is load-bearing for old
    /// records carrying blank status columns.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Approved" => FormStatus::Approved,
            "Rejected" => FormStatus::Rejected,
            "InReview" => FormStatus::InReview,
            _ => FormStatus::Pending,
        }
    }

    /// Approved and Rejected are terminal; no in-scope route leads back to Pending.
    pub const fn is_terminal(self) -> bool {
        matches!(self, FormStatus::Approved | FormStatus::Rejected)
    }
}

impl Serialize for FormStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for FormStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(FormStatus::parse(&raw))
    }
}

/// Housing program the payment draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgramType {
    #[serde(rename = "VASH")]
    Vash,
    #[serde(rename = "PBV")]
    Pbv,
    #[serde(rename = "HCV")]
    Hcv,
}

/// Which portion of the payment the manual check covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum McrType {
    #[serde(rename = "HAP Portion")]
    HapPortion,
    #[serde(rename = "Tenant Portion")]
    TenantPortion,
    #[serde(rename = "Both")]
    Both,
}

/// Why the manual check is being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    Abatement,
    Move,
    /// Recoupment / overpayment correction.
    Recoupment,
    Underpayment,
    Other,
}

/// Street address of the assisted unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitAddress {
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// Landlord identification. A form is acceptable with either an entity name
/// or a first and last personal name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandlordIdentity {
    #[serde(default)]
    pub entity_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl LandlordIdentity {
    pub fn is_identified(&self) -> bool {
        let non_empty = |field: &Option<String>| {
            field
                .as_deref()
                .map(|value| !value.trim().is_empty())
                .unwrap_or(false)
        };
        non_empty(&self.entity_name)
            || (non_empty(&self.first_name) && non_empty(&self.last_name))
    }
}

/// Checkboxes the housing specialist confirms before submitting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationFlags {
    #[serde(default)]
    pub third_party_payments_verified: bool,
    #[serde(default)]
    pub transaction_screen_verified: bool,
    #[serde(default)]
    pub overlapping_hap: bool,
}

/// The housing specialist submitting the form; decision notifications go to
/// this email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submitter {
    pub name: String,
    pub email: String,
}

/// Client-supplied field set for an MCR form. Carries no identifier, no
/// status, and no prorated amount; all three are server-derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McrSubmission {
    pub submitter: Submitter,
    pub program_type: ProgramType,
    pub last_four_ssn: String,
    pub tenant_name: String,
    pub owner_account_number: String,
    pub address: UnitAddress,
    #[serde(default)]
    pub landlord: LandlordIdentity,
    pub effective_date: NaiveDate,
    pub payment_start: NaiveDate,
    pub payment_end: NaiveDate,
    #[serde(default)]
    pub reason_comments: Option<String>,
    pub mcr_type: McrType,
    #[serde(default)]
    pub verifications: VerificationFlags,
    pub request_type: RequestType,
    #[serde(default)]
    pub description: Option<String>,
    pub hap_amount: f64,
    #[serde(default)]
    pub date_intended_to_vacate: Option<NaiveDate>,
    #[serde(default)]
    pub signature_data: Option<String>,
}

/// Persisted snapshot of an MCR form together with its lifecycle metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McrForm {
    pub id: FormId,
    pub envelope_id: EnvelopeId,
    #[serde(flatten)]
    pub fields: McrSubmission,
    #[serde(default)]
    pub prorated_amount: Option<f64>,
    pub status: FormStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fully validated record handed to the repository for creation. The store
/// assigns both identifiers and writes the parent envelope in the same
/// transaction.
#[derive(Debug, Clone)]
pub struct NewMcrForm {
    pub fields: McrSubmission,
    pub prorated_amount: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Lightweight parent record denormalizing form type and status for
/// cross-form-type reporting. Deleting the envelope cascades to the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormEnvelope {
    pub id: EnvelopeId,
    pub form_type: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

pub const MCR_FORM_TYPE: &str = "MCR";
