//! Diagnosis-context analysis
//!
//! Extension point: derives structured clinical signals from the full turn
//! history. The shape is stable and serializable; the extraction itself is
//! not implemented yet and returns conservative defaults.

use crate::pipeline::context_window::Turn;
use serde::{Deserialize, Serialize};

/// Urgency classification attached to every chat response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationLevel {
    SelfCare,
    SeeDoctor,
    Emergency,
}

/// Structured clinical signals derived from a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisContext {
    /// Symptoms mentioned across the conversation
    pub symptoms_mentioned: Vec<String>,

    /// How long the symptoms have been present
    pub duration: String,

    /// Reported severity
    pub severity: String,

    /// Concerns worth flagging to a clinician
    pub key_concerns: Vec<String>,

    /// Suggested level of care
    pub recommendation_level: RecommendationLevel,
}

impl Default for DiagnosisContext {
    fn default() -> Self {
        Self {
            symptoms_mentioned: Vec::new(),
            duration: "unknown".to_string(),
            severity: "unknown".to_string(),
            key_concerns: Vec::new(),
            recommendation_level: RecommendationLevel::SeeDoctor,
        }
    }
}

/// Analyze the conversation for diagnosis context.
///
/// TODO: extract symptoms and duration from the history once the clinical
/// signal taxonomy is settled; until then every field is a default.
pub fn analyze(_history: &[Turn]) -> DiagnosisContext {
    DiagnosisContext::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::context_window::Turn;

    #[test]
    fn test_stable_default_shape() {
        let ctx = analyze(&[Turn::user("tôi bị ho")]);
        assert!(ctx.symptoms_mentioned.is_empty());
        assert_eq!(ctx.duration, "unknown");
        assert_eq!(ctx.severity, "unknown");
        assert_eq!(ctx.recommendation_level, RecommendationLevel::SeeDoctor);
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(DiagnosisContext::default()).unwrap();
        assert_eq!(json["recommendation_level"], "see_doctor");
        assert!(json["symptoms_mentioned"].as_array().unwrap().is_empty());
    }
}
