use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Nested profile record served by the external profile API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    #[serde(default)]
    pub profile: Option<UserProfile>,
    #[serde(default)]
    pub service_interests: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub business_profile: Option<serde_json::Value>,
    #[serde(default)]
    pub patterns: Option<serde_json::Value>,
    #[serde(default)]
    pub insights: Option<Insights>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Backend-computed insights. Every field may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    #[serde(default)]
    pub user_segment: Option<String>,
    #[serde(default)]
    pub engagement_stage: Option<String>,
    #[serde(default)]
    pub timeline_urgency: Option<String>,
    #[serde(default)]
    pub focus_areas: Option<Vec<FocusArea>>,
    #[serde(default)]
    pub next_steps: Option<NextSteps>,
    #[serde(default)]
    pub needs: Option<Needs>,
    #[serde(default)]
    pub needs_tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusArea {
    pub area: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub priority: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextSteps {
    #[serde(default)]
    pub immediate: Vec<ActionStep>,
    #[serde(default)]
    pub short_term: Vec<ActionStep>,
    #[serde(default)]
    pub long_term: Vec<ActionStep>,
}

impl NextSteps {
    pub fn flatten(&self) -> Vec<ActionStep> {
        self.immediate
            .iter()
            .chain(&self.short_term)
            .chain(&self.long_term)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Needs {
    #[serde(default)]
    pub immediate: Option<String>,
    #[serde(default)]
    pub upcoming: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// A suggested next action. Backend steps call the headline `action` and the
/// explanation `reason`; both spellings are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionStep {
    #[serde(alias = "action")]
    pub title: String,
    #[serde(default, alias = "reason")]
    pub description: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    #[serde(default)]
    pub category: Option<String>,
}

fn default_priority() -> Priority {
    Priority::Medium
}

/// One remembered interaction from the assistant's conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_profile() {
        let json = r#"{
            "profile": {"name": "Jane", "email": "jane@example.com", "tags": ["runner"]},
            "serviceInterests": {"sportsMassage": 7, "physio": 0},
            "insights": {
                "userSegment": "qualified_lead",
                "nextSteps": {"immediate": [{"action": "Book a session", "reason": "Immediate need", "priority": "high"}]}
            }
        }"#;
        let data: ProfileData = serde_json::from_str(json).unwrap();
        let profile = data.profile.unwrap();
        assert_eq!(profile.name.as_deref(), Some("Jane"));
        assert!(profile.phone.is_none());
        assert_eq!(data.service_interests.unwrap().len(), 2);

        let insights = data.insights.unwrap();
        assert_eq!(insights.user_segment.as_deref(), Some("qualified_lead"));
        let steps = insights.next_steps.unwrap().flatten();
        assert_eq!(steps[0].title, "Book a session");
        assert_eq!(steps[0].description.as_deref(), Some("Immediate need"));
        assert_eq!(steps[0].priority, Priority::High);
    }

    #[test]
    fn test_parse_empty_object() {
        let data: ProfileData = serde_json::from_str("{}").unwrap();
        assert!(data.profile.is_none());
        assert!(data.insights.is_none());
    }
}
