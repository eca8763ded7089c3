use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use ai_client::util::truncate_to_char_boundary;
use grantwatch_common::{fingerprint, Eligibility, GrantRecord, RejectedGrant};

use crate::recovery;
use crate::sources::GrantSource;
use crate::validate;

/// Language-model seam: one prompt in, one text completion out. The
/// production implementation is `ai_client::Claude`; tests script it.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
impl CompletionModel for ai_client::Claude {
    async fn complete(&self, prompt: &str) -> Result<String> {
        ai_client::Claude::complete(self, prompt).await
    }
}

/// Content shorter than this is "no usable content" — an empty page shell
/// or an error banner, not worth a model call.
const MIN_CONTENT_LEN: usize = 100;
/// Content is truncated to this many bytes before the model call to bound
/// cost and latency.
const MAX_CONTENT_LEN: usize = 50_000;

/// What the model returns for each grant, deserialized leniently — every
/// field beyond name/provider is optional and defaulted.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedGrant {
    pub name: String,
    pub provider: String,
    #[serde(default)]
    pub amount_min: Option<f64>,
    #[serde(default)]
    pub amount_max: Option<f64>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sectors: Vec<String>,
    #[serde(default)]
    pub stages: Vec<String>,
    #[serde(default)]
    pub eligibility_criteria: Eligibility,
    #[serde(default)]
    pub application_url: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Outcome of extracting one source. Failures never escape this type:
/// a fetch error, thin content, or garbage model output all land here as
/// zero grants plus a diagnostic.
#[derive(Debug, Default)]
pub struct ExtractionResult {
    pub grants: Vec<GrantRecord>,
    pub rejected: Vec<RejectedGrant>,
    pub error: Option<String>,
}

impl ExtractionResult {
    fn failed(reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Default::default()
        }
    }
}

const EXTRACTION_PROMPT: &str = r#"Analyze this webpage content about Indian startup grants/funding schemes.
Extract ALL grants mentioned and return a JSON array of grant objects.

For each grant found, extract:
- name: Grant/scheme name (required)
- provider: Organization providing the grant (required)
- amount_min: Minimum funding amount in INR (number or null)
- amount_max: Maximum funding amount in INR (number or null)
- deadline: Application deadline as ISO date string (or null if ongoing)
- description: 2-3 sentence description
- sectors: Array of applicable sectors (e.g., ["healthtech", "fintech", "all"])
- stages: Array of applicable stages (e.g., ["ideation", "early", "growth"])
- eligibility_criteria: Object with:
  - min_age_months: Minimum company age in months (number or null)
  - max_age_months: Maximum company age in months (number or null)
  - incorporation_required: boolean
  - dpiit_required: boolean
  - women_led: boolean (true if women-led preference)
  - states: Array of eligible states (empty array if all states)
  - entity_types: Array of eligible entity types
- application_url: Direct application link (or null)
- contact_email: Email address for inquiries/POC (or null if not found). Look for email addresses mentioned in contact sections, helpdesk info, or application guidelines.
- is_active: boolean (true if currently accepting applications)

Return ONLY a valid JSON array. If no grants found, return empty array [].

Example output:
[
  {
    "name": "Startup India Seed Fund Scheme",
    "provider": "DPIIT",
    "amount_min": 2000000,
    "amount_max": 5000000,
    "deadline": null,
    "description": "Provides financial assistance to startups for proof of concept, prototype development, product trials, market entry, and commercialization.",
    "sectors": ["all"],
    "stages": ["ideation", "early"],
    "eligibility_criteria": {
      "min_age_months": null,
      "max_age_months": 24,
      "incorporation_required": true,
      "dpiit_required": true,
      "women_led": false,
      "states": [],
      "entity_types": ["private_limited", "llp", "partnership"]
    },
    "application_url": "https://seedfund.startupindia.gov.in/apply",
    "contact_email": "seedfund@startupindia.gov.in",
    "is_active": true
  }
]

Webpage content:
"#;

pub struct Extractor {
    model: Box<dyn CompletionModel>,
}

impl Extractor {
    pub fn new(model: Box<dyn CompletionModel>) -> Self {
        Self { model }
    }

    /// Turn one source's page content into validated, annotated grant
    /// records. Never returns Err — every failure mode degrades to an
    /// empty result with a diagnostic, so one broken source can't abort
    /// the run.
    pub async fn extract(&self, source: &GrantSource, content: &str) -> ExtractionResult {
        if content.trim().len() < MIN_CONTENT_LEN {
            info!(
                source = source.name,
                bytes = content.trim().len(),
                "No usable content, skipping extraction"
            );
            return ExtractionResult::default();
        }

        let content = truncate_to_char_boundary(content, MAX_CONTENT_LEN);
        let prompt = format!("{EXTRACTION_PROMPT}{content}");

        let response = match self.model.complete(&prompt).await {
            Ok(r) => r,
            Err(e) => {
                warn!(source = source.name, error = %e, "Model call failed");
                return ExtractionResult::failed(format!("model call failed: {e}"));
            }
        };

        let candidates = match recovery::extract_json_payload(&response) {
            Ok(c) => c,
            Err(reason) => {
                warn!(
                    source = source.name,
                    reason,
                    response_preview = recovery::strip_code_fences(&response)
                        .chars()
                        .take(200)
                        .collect::<String>()
                        .as_str(),
                    "Unparseable model output"
                );
                return ExtractionResult::failed(format!("unparseable model output: {reason}"));
            }
        };

        let mut result = ExtractionResult::default();
        for (index, candidate) in candidates.into_iter().enumerate() {
            if let Err(reason) = validate::validate(&candidate) {
                warn!(source = source.name, index, reason, "Candidate rejected");
                result.rejected.push(RejectedGrant { index, reason });
                continue;
            }

            // Validated: name and provider are present strings. A type
            // clash in any other field defaults that field rather than
            // dropping the grant.
            let extracted = match serde_json::from_value(candidate.clone()) {
                Ok(g) => g,
                Err(e) => match candidate {
                    serde_json::Value::Object(map) => {
                        warn!(
                            source = source.name,
                            index,
                            error = %e,
                            "Malformed optional fields, defaulting them"
                        );
                        lenient_grant(map)
                    }
                    // The validator admits only objects.
                    _ => {
                        let reason = format!("malformed fields: {e}");
                        result.rejected.push(RejectedGrant { index, reason });
                        continue;
                    }
                },
            };

            result.grants.push(annotate(extracted, source));
        }

        info!(
            source = source.name,
            grants = result.grants.len(),
            rejected = result.rejected.len(),
            "Extraction complete"
        );
        result
    }
}

/// Field-by-field fallback for candidates that pass validation but carry
/// a wrong-typed optional field. Each field deserializes independently;
/// the ones that fail land on their defaults.
fn lenient_grant(mut obj: serde_json::Map<String, serde_json::Value>) -> ExtractedGrant {
    fn take<T: serde::de::DeserializeOwned>(
        obj: &mut serde_json::Map<String, serde_json::Value>,
        key: &str,
    ) -> Option<T> {
        obj.remove(key)
            .and_then(|v| serde_json::from_value(v).ok())
    }

    ExtractedGrant {
        name: take(&mut obj, "name").unwrap_or_default(),
        provider: take(&mut obj, "provider").unwrap_or_default(),
        amount_min: take(&mut obj, "amount_min"),
        amount_max: take(&mut obj, "amount_max"),
        deadline: take(&mut obj, "deadline"),
        description: take(&mut obj, "description").unwrap_or_default(),
        sectors: take(&mut obj, "sectors").unwrap_or_default(),
        stages: take(&mut obj, "stages").unwrap_or_default(),
        eligibility_criteria: take(&mut obj, "eligibility_criteria").unwrap_or_default(),
        application_url: take(&mut obj, "application_url"),
        contact_email: take(&mut obj, "contact_email"),
        is_active: take(&mut obj, "is_active").unwrap_or(true),
    }
}

/// Attach source provenance and the derived fingerprint — the last step
/// before a record leaves the extractor.
fn annotate(extracted: ExtractedGrant, source: &GrantSource) -> GrantRecord {
    let fp = fingerprint(&extracted.name, &extracted.provider);
    GrantRecord {
        name: extracted.name,
        provider: extracted.provider,
        amount_min: extracted.amount_min,
        amount_max: extracted.amount_max,
        deadline: extracted.deadline,
        description: extracted.description,
        sectors: extracted.sectors,
        stages: extracted.stages,
        eligibility: extracted.eligibility_criteria,
        application_url: extracted.application_url,
        contact_email: extracted.contact_email,
        is_active: extracted.is_active,
        source_url: source.url.to_string(),
        source_name: source.name.to_string(),
        source_kind: source.kind,
        fingerprint: fp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;
    use grantwatch_common::SourceKind;

    fn test_source() -> GrantSource {
        GrantSource {
            name: "Test Portal",
            url: "https://portal.example.com/schemes",
            kind: SourceKind::Government,
            provider: "Test Agency",
        }
    }

    fn long_content() -> String {
        "Scheme details. ".repeat(50)
    }

    #[tokio::test]
    async fn sub_threshold_content_yields_empty_without_error() {
        let extractor = Extractor::new(Box::new(ScriptedModel::new(vec!["[]".into()])));
        let result = extractor.extract(&test_source(), "too short").await;
        assert!(result.grants.is_empty());
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn annotates_provenance_and_fingerprint() {
        let extractor = Extractor::new(Box::new(ScriptedModel::new(vec![
            r#"[{"name":"Seed Grant","provider":"Agency X","description":"d"}]"#.into(),
        ])));
        let result = extractor.extract(&test_source(), &long_content()).await;
        assert_eq!(result.grants.len(), 1);
        let g = &result.grants[0];
        assert_eq!(g.source_url, "https://portal.example.com/schemes");
        assert_eq!(g.source_name, "Test Portal");
        assert_eq!(g.fingerprint, fingerprint("Seed Grant", "Agency X"));
        assert!(g.is_active);
    }

    #[tokio::test]
    async fn invalid_candidates_rejected_with_reasons() {
        let extractor = Extractor::new(Box::new(ScriptedModel::new(vec![
            r#"[{"name":"Good","provider":"P"},{"provider":"No Name"},{"name":5,"provider":"P"}]"#
                .into(),
        ])));
        let result = extractor.extract(&test_source(), &long_content()).await;
        assert_eq!(result.grants.len(), 1);
        assert_eq!(result.rejected.len(), 2);
        assert_eq!(result.rejected[0].index, 1);
        assert_eq!(result.rejected[0].reason, "missing name");
        assert_eq!(result.rejected[1].index, 2);
        assert_eq!(result.rejected[1].reason, "name is not a string");
    }

    #[tokio::test]
    async fn wrong_typed_optional_fields_default_instead_of_rejecting() {
        let extractor = Extractor::new(Box::new(ScriptedModel::new(vec![
            r#"[{"name":"Seed Grant","provider":"Agency X","description":"d",
                 "amount_min":"20 lakh","sectors":"fintech","is_active":"yes"}]"#
                .into(),
        ])));
        let result = extractor.extract(&test_source(), &long_content()).await;

        assert!(result.rejected.is_empty());
        assert_eq!(result.grants.len(), 1);
        let g = &result.grants[0];
        assert_eq!(g.name, "Seed Grant");
        assert_eq!(g.provider, "Agency X");
        assert_eq!(g.description, "d");
        assert_eq!(g.amount_min, None);
        assert!(g.sectors.is_empty());
        assert!(g.is_active);
    }

    #[tokio::test]
    async fn garbage_response_is_nonfatal() {
        let extractor =
            Extractor::new(Box::new(ScriptedModel::new(vec!["Sorry, I can't help with that.".into()])));
        let result = extractor.extract(&test_source(), &long_content()).await;
        assert!(result.grants.is_empty());
        assert!(result.error.as_deref().unwrap().contains("unparseable"));
    }

    #[tokio::test]
    async fn model_failure_is_nonfatal() {
        let extractor = Extractor::new(Box::new(ScriptedModel::failing("rate limited")));
        let result = extractor.extract(&test_source(), &long_content()).await;
        assert!(result.grants.is_empty());
        assert!(result.error.as_deref().unwrap().contains("model call failed"));
    }
}
