//! Diagnosis boundary.
//!
//! The orchestrator hands the model a [`ClinicalSnapshot`], which has no
//! name or contact field, so patient identity cannot cross this boundary.
//! Any deterministic implementation of [`DiagnosisModel`] can be plugged in.

use crate::model::{Demographics, Diagnosis, Severity, Visit};

/// De-identified clinical input.
#[derive(Debug, Clone, PartialEq)]
pub struct ClinicalSnapshot {
    pub symptoms: String,
    pub age: u32,
    pub gender: String,
    pub height: f64,
    pub weight: f64,
}

impl ClinicalSnapshot {
    /// Builds the snapshot from a visit; missing demographics become 0 / "".
    #[must_use]
    pub fn from_visit(visit: &Visit) -> Self {
        let Demographics {
            age,
            gender,
            height,
            weight,
        } = &visit.demographics;
        Self {
            symptoms: visit.symptoms.clone(),
            age: age.unwrap_or(0),
            gender: gender.clone().unwrap_or_default(),
            height: height.unwrap_or(0.0),
            weight: weight.unwrap_or(0.0),
        }
    }
}

/// Symptoms + vitals → finding and severity.
///
/// Implementations must return the same result for identical input.
pub trait DiagnosisModel: Send + Sync + std::fmt::Debug {
    fn predict(&self, input: &ClinicalSnapshot) -> Diagnosis;
}

/// Keyword rule table, first match wins.
///
/// | Symptoms contain | Severity |
/// |------------------|----------|
/// | `fever` and `cough` | medium |
/// | `chest pain` or `breathless` | high |
/// | `headache` and `stress` | low |
/// | `stomach` or `abdomen` | medium |
/// | anything else | low |
///
/// ```
/// use ward_runtime::diagnosis::{ClinicalSnapshot, DiagnosisModel, RuleBasedDiagnosis};
/// use ward_runtime::model::Severity;
///
/// let input = ClinicalSnapshot {
///     symptoms: "Fever and cough".into(),
///     age: 30,
///     gender: "F".into(),
///     height: 160.0,
///     weight: 55.0,
/// };
/// let result = RuleBasedDiagnosis.predict(&input);
/// assert_eq!(result.severity, Severity::Medium);
/// assert!(result.finding.contains("viral infection"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedDiagnosis;

impl DiagnosisModel for RuleBasedDiagnosis {
    fn predict(&self, input: &ClinicalSnapshot) -> Diagnosis {
        let text = input.symptoms.to_lowercase();
        let has = |needle: &str| text.contains(needle);

        let (finding, severity) = if has("fever") && has("cough") {
            ("Possible viral infection (e.g., flu)", Severity::Medium)
        } else if has("chest pain") || has("breathless") {
            ("Possible cardiac/respiratory issue, urgent check", Severity::High)
        } else if has("headache") && has("stress") {
            ("Possible tension headache / stress-related issue", Severity::Low)
        } else if has("stomach") || has("abdomen") {
            ("Possible gastric/abdominal issue", Severity::Medium)
        } else {
            (
                "General check-up recommended, no clear pattern detected",
                Severity::Low,
            )
        };

        Diagnosis {
            finding: finding.to_string(),
            severity,
        }
    }
}
