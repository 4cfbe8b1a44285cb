use crate::error::RetrievalError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Field of a policy document holding the text the vector index embeds.
pub const DESCRIPTION_FIELD: &str = "description";
/// Field of a policy document holding its embedding.
pub const EMBEDDING_FIELD: &str = "descriptionEmbedding";

/// Policy guideline reference data. Missing keys in stored documents
/// deserialize to empty values, so a decoded record is always complete.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub policy_type: String,
    pub description: String,
    pub handler_actions: HandlerActions,
    pub approval_thresholds: BTreeMap<String, ApprovalTier>,
    pub decision_tree: Value,
    pub reserve_guidelines: Value,
    pub documentation_required: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerActions {
    pub immediate: Vec<String>,
    #[serde(rename = "within24Hours")]
    pub within_24_hours: Vec<String>,
    #[serde(rename = "within72Hours")]
    pub within_72_hours: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApprovalTier {
    pub max_amount: f64,
    pub conditions: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

impl PolicyRecord {
    /// Decode a stored policy document. Store bookkeeping (`_id`) and the
    /// embedding are ignored.
    pub fn from_document(document: Value) -> Result<Self, RetrievalError> {
        if !document.is_object() {
            return Err(RetrievalError::Decode("policy document is not an object".into()));
        }
        serde_json::from_value(document).map_err(|e| RetrievalError::Decode(e.to_string()))
    }

    /// Generic auto coverage, used whenever retrieval cannot produce a
    /// stored record.
    pub fn fallback() -> Self {
        let mut approval_thresholds = BTreeMap::new();
        approval_thresholds.insert(
            "adjuster".to_string(),
            ApprovalTier {
                max_amount: 5_000.0,
                conditions: strings(&[
                    "Liability is clear",
                    "No bodily injury reported",
                ]),
            },
        );
        approval_thresholds.insert(
            "supervisor".to_string(),
            ApprovalTier {
                max_amount: 25_000.0,
                conditions: strings(&["Damage documented with photos and repair estimate"]),
            },
        );
        approval_thresholds.insert(
            "claims_manager".to_string(),
            ApprovalTier {
                max_amount: 100_000.0,
                conditions: strings(&[
                    "Total loss or multiple vehicles involved",
                    "Injury or disputed liability",
                ]),
            },
        );

        Self {
            name: "General Auto Collision Coverage".into(),
            policy_type: "auto".into(),
            description: "Standard auto policy guidance covering collision damage to insured \
                          vehicles, applied when no more specific guideline matches the accident."
                .into(),
            handler_actions: HandlerActions {
                immediate: strings(&[
                    "Confirm all parties are safe and record any injuries",
                    "Collect photos of the scene and vehicle damage",
                    "Verify the policy is active and coverage applies",
                ]),
                within_24_hours: strings(&[
                    "Contact the policyholder and obtain a statement",
                    "Arrange a damage inspection or repair estimate",
                ]),
                within_72_hours: strings(&[
                    "Determine liability",
                    "Set the initial reserve and approve repairs within authority",
                ]),
            },
            approval_thresholds,
            decision_tree: json!({
                "injuries_reported": "escalate to claims_manager",
                "vehicle_drivable": "standard repair workflow",
                "vehicle_not_drivable": "arrange towing and assess total loss"
            }),
            reserve_guidelines: json!({
                "minor_damage": {"initial_reserve": 2_500, "maximum_reserve": 5_000},
                "moderate_damage": {"initial_reserve": 7_500, "maximum_reserve": 25_000},
                "severe_damage": {"initial_reserve": 25_000, "maximum_reserve": 100_000}
            }),
            documentation_required: strings(&[
                "Photos of damage",
                "Police report if filed",
                "Repair estimate",
                "Driver and vehicle information for all parties",
            ]),
        }
    }
}
