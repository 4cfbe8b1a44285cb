use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

pub const RECOMMENDATION_KEYS: [&str; 4] = [
    "immediate_actions",
    "short_term_actions",
    "approval_guidance",
    "reserve_recommendations",
];

/// The `recommendation` object of a recommendation document, in the shape
/// the HTTP facade guarantees.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Recommendation {
    pub immediate_actions: Vec<String>,
    pub short_term_actions: Vec<String>,
    /// threshold name → amount
    pub approval_guidance: Map<String, Value>,
    /// `initial_reserve` / `maximum_reserve`
    pub reserve_recommendations: Map<String, Value>,
}

impl Recommendation {
    pub fn immediate(actions: Vec<String>) -> Self {
        Self {
            immediate_actions: actions,
            ..Self::default()
        }
    }

    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(
            "immediate_actions".into(),
            Value::from(self.immediate_actions.clone()),
        );
        map.insert(
            "short_term_actions".into(),
            Value::from(self.short_term_actions.clone()),
        );
        map.insert(
            "approval_guidance".into(),
            Value::Object(self.approval_guidance.clone()),
        );
        map.insert(
            "reserve_recommendations".into(),
            Value::Object(self.reserve_recommendations.clone()),
        );
        Value::Object(map)
    }
}

/// Claim priority label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
    Standard,
}

impl Priority {
    /// Numeric level 1..=4 as the generator sometimes emits it.
    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            1 => Some(Self::Low),
            2 => Some(Self::Medium),
            3 => Some(Self::High),
            4 => Some(Self::Critical),
            _ => None,
        }
    }
}
