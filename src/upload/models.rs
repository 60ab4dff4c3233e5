// SPDX-License-Identifier: GPL-3.0-only

//! Response models for the skin-analysis backend API

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One skin-condition reading inside an analysis.
///
/// The backend reports detection-based conditions (acne spots, dark
/// circles, redness) with a `severity` and texture-based conditions
/// (oiliness, dryness, uneven tone) with a `score`; both carry a
/// low/medium/high `level`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConditionReading {
    #[serde(default)]
    pub severity: Option<f64>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
}

impl ConditionReading {
    /// The numeric value for display, whichever field the backend used
    pub fn value(&self) -> f64 {
        self.severity.or(self.score).unwrap_or(0.0)
    }

    /// The severity level, defaulting to "low"
    pub fn level(&self) -> &str {
        self.level.as_deref().unwrap_or("low")
    }
}

/// Skincare recommendations grouped the way the backend returns them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recommendations {
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default)]
    pub morning_routine: Vec<String>,
    #[serde(default)]
    pub night_routine: Vec<String>,
    #[serde(default)]
    pub diet_tips: Vec<String>,
    #[serde(default)]
    pub general_tips: Vec<String>,
}

/// Response of `POST /analyze`
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeResponse {
    pub report_id: String,
    pub skin_type: String,
    pub health_score: f64,
    /// Per-condition readings, keyed by condition name (acne_spots,
    /// dark_circles, redness, oiliness, dryness, uneven_tone)
    #[serde(default)]
    pub analysis: BTreeMap<String, ConditionReading>,
    #[serde(default)]
    pub recommendations: Recommendations,
}

/// One side of a before/after comparison
#[derive(Debug, Clone, Deserialize)]
pub struct ComparisonSide {
    pub score: f64,
}

/// Response of `POST /compare`
#[derive(Debug, Clone, Deserialize)]
pub struct CompareResponse {
    pub before: ComparisonSide,
    pub after: ComparisonSide,
    pub improvement: f64,
    pub improvement_percentage: f64,
}

/// One entry of `GET /history`
#[derive(Debug, Clone, Deserialize)]
pub struct ReportSummary {
    pub id: String,
    pub image_path: String,
    pub skin_type: String,
    pub health_score: f64,
    pub created_at: String,
}

/// Common envelope every JSON endpoint uses.
///
/// Success responses carry `success: true` plus the payload fields; error
/// responses carry `error` (with or without `success: false`).
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_response_parses_backend_shape() {
        let raw = r#"{
            "success": true,
            "report_id": "abc-123",
            "skin_type": "Oily",
            "health_score": 72.5,
            "analysis": {
                "acne_spots": {"severity": 3.2, "level": "medium", "count": 4},
                "oiliness": {"score": 61.0, "level": "high"}
            },
            "recommendations": {
                "products": ["Gel cleanser"],
                "morning_routine": ["Cleanse", "Moisturize"],
                "diet_tips": ["Drink water"]
            }
        }"#;

        let parsed: AnalyzeResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.report_id, "abc-123");
        assert_eq!(parsed.analysis["acne_spots"].value(), 3.2);
        assert_eq!(parsed.analysis["acne_spots"].level(), "medium");
        assert_eq!(parsed.analysis["oiliness"].value(), 61.0);
        assert_eq!(parsed.recommendations.morning_routine.len(), 2);
        assert!(parsed.recommendations.night_routine.is_empty());
    }

    #[test]
    fn test_compare_response_parses() {
        let raw = r#"{
            "success": true,
            "before": {"score": 60.0, "image_path": "a.jpg"},
            "after": {"score": 72.0, "image_path": "b.jpg"},
            "improvement": 12.0,
            "improvement_percentage": 20.0
        }"#;

        let parsed: CompareResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.before.score, 60.0);
        assert_eq!(parsed.improvement_percentage, 20.0);
    }

    #[test]
    fn test_error_envelope_without_success_field() {
        // Some endpoints answer {"error": ...} with no success flag
        let raw = r#"{"error": "No face detected in the image"}"#;
        let parsed: ApiEnvelope = serde_json::from_str(raw).unwrap();
        assert!(!parsed.success);
        assert_eq!(parsed.error.as_deref(), Some("No face detected in the image"));
    }
}
