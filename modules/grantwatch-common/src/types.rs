use serde::{Deserialize, Serialize};

/// What kind of organization a source harvests from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Government,
    Csr,
    Aggregator,
    Private,
    Ngo,
}

impl SourceKind {
    /// The provider_type column value for grants found via this source.
    /// Aggregators list privately funded schemes, so they store as private.
    pub fn provider_type(self) -> &'static str {
        match self {
            SourceKind::Government => "government",
            SourceKind::Csr => "csr",
            SourceKind::Aggregator | SourceKind::Private => "private",
            SourceKind::Ngo => "ngo",
        }
    }
}

/// Eligibility constraints attached to a grant. Everything is optional —
/// the extractor fills in whatever the page states and leaves the rest
/// at neutral defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Eligibility {
    #[serde(default)]
    pub min_age_months: Option<i32>,
    #[serde(default)]
    pub max_age_months: Option<i32>,
    #[serde(default)]
    pub incorporation_required: bool,
    #[serde(default)]
    pub dpiit_required: bool,
    #[serde(default)]
    pub women_led: bool,
    #[serde(default)]
    pub states: Vec<String>,
    #[serde(default)]
    pub entity_types: Vec<String>,
}

/// A validated grant flowing through the pipeline: extractor output plus
/// source provenance and the derived fingerprint.
///
/// Invariant: `name` and `provider` are non-empty strings — the validator
/// gate guarantees it before this type is ever constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantRecord {
    pub name: String,
    pub provider: String,
    pub amount_min: Option<f64>,
    pub amount_max: Option<f64>,
    /// ISO date string; None means the scheme is ongoing.
    pub deadline: Option<String>,
    pub description: String,
    pub sectors: Vec<String>,
    pub stages: Vec<String>,
    pub eligibility: Eligibility,
    pub application_url: Option<String>,
    pub contact_email: Option<String>,
    pub is_active: bool,
    pub source_url: String,
    pub source_name: String,
    pub source_kind: SourceKind,
    pub fingerprint: String,
}

impl GrantRecord {
    /// URL the liveness filter probes: the application link when the
    /// extraction found one, otherwise the page the grant was found on.
    pub fn effective_url(&self) -> Option<&str> {
        self.application_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .or_else(|| (!self.source_url.is_empty()).then_some(self.source_url.as_str()))
    }
}

/// A candidate dropped by the validator, with its position in the batch.
/// Reporting only — never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedGrant {
    pub index: usize,
    pub reason: String,
}

/// A grant excluded by the liveness filter because its link resolved to
/// 404. Reporting only — never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct DeadLink {
    pub name: String,
    pub provider: String,
    pub url: String,
    pub reason: String,
}
