//! Dashboard insights. Backend values win whenever present; otherwise each
//! figure falls back to one local heuristic, shared by every view.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::{ActionStep, Insights, Memory, Priority, ProfileData};

const REGULATORY_KEYWORDS: [&str; 5] = ["regulatory", "compliance", "license", "permit", "approval"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    High,
    Medium,
    Low,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::High => "High",
            Urgency::Medium => "Medium",
            Urgency::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedInsights {
    pub engagement_score: u8,
    pub engagement_stage: String,
    pub segment: String,
    pub timeline_urgency: String,
    pub regulatory_interest: u8,
    pub next_steps: Vec<ActionStep>,
    pub recommended_steps: Vec<ActionStep>,
}

pub fn derive(profile: Option<&ProfileData>, memories: &[Memory], now: DateTime<Utc>) -> DerivedInsights {
    let insights = profile.and_then(|p| p.insights.as_ref());
    let score = engagement_score(profile, memories, now);

    DerivedInsights {
        engagement_score: score,
        engagement_stage: engagement_stage(insights, score),
        segment: segment(insights, score),
        timeline_urgency: timeline_urgency(insights, memories, now),
        regulatory_interest: regulatory_interest(insights, memories),
        next_steps: next_steps(profile, memories, now),
        recommended_steps: recommended_steps(profile, memories, now),
    }
}

pub fn engagement_score(profile: Option<&ProfileData>, memories: &[Memory], now: DateTime<Utc>) -> u8 {
    let segment = profile
        .and_then(|p| p.insights.as_ref())
        .and_then(|i| i.user_segment.as_deref())
        .filter(|s| !s.is_empty());
    if let Some(segment) = segment {
        return match segment {
            "active_client" => 100,
            "high_value_prospect" => 85,
            "qualified_lead" => 65,
            _ => 40,
        };
    }

    local_engagement_score(profile, memories, now)
}

fn local_engagement_score(profile: Option<&ProfileData>, memories: &[Memory], now: DateTime<Utc>) -> u8 {
    let mut score = 20.0;

    let user = profile.and_then(|p| p.profile.as_ref());
    let fields = [
        user.and_then(|u| u.name.as_deref()),
        user.and_then(|u| u.email.as_deref()),
        user.and_then(|u| u.phone.as_deref()),
        user.and_then(|u| u.first_name.as_deref()),
    ];
    let filled = fields
        .iter()
        .filter(|f| f.is_some_and(|v| !v.trim().is_empty()))
        .count();
    score += filled as f64 / fields.len() as f64 * 20.0;

    if let Some(interests) = profile.and_then(|p| p.service_interests.as_ref()) {
        let total = interests.len();
        let active = interests.values().filter(|v| **v > 0.0).count();
        let average = if total > 0 {
            interests.values().sum::<f64>() / total as f64
        } else {
            0.0
        };
        score += (active as f64 / total.max(1) as f64 * 15.0).min(15.0);
        score += average / 10.0 * 10.0;
    }

    if !memories.is_empty() {
        score += (memories.len() as f64 / 10.0 * 15.0).min(15.0);
        if count_since(memories, now - Duration::hours(24)) > 0 {
            score += 20.0;
        } else if count_since(memories, now - Duration::days(7)) > 0 {
            score += 10.0;
        }
    }

    score.round().clamp(0.0, 100.0) as u8
}

pub fn engagement_stage(insights: Option<&Insights>, score: u8) -> String {
    if let Some(stage) = insights
        .and_then(|i| i.engagement_stage.as_deref())
        .filter(|s| !s.is_empty())
    {
        return title_case(stage);
    }

    match score {
        80.. => "Active",
        60..=79 => "Engaged",
        40..=59 => "Exploring",
        _ => "Initial",
    }
    .to_string()
}

pub fn segment(insights: Option<&Insights>, score: u8) -> String {
    if let Some(segment) = insights
        .and_then(|i| i.user_segment.as_deref())
        .filter(|s| !s.is_empty())
    {
        return title_case(&segment.replace('_', " "));
    }

    match score {
        85.. => "High Value",
        65..=84 => "Qualified",
        40..=64 => "Prospect",
        _ => "New Lead",
    }
    .to_string()
}

pub fn timeline_urgency(insights: Option<&Insights>, memories: &[Memory], now: DateTime<Utc>) -> String {
    if let Some(urgency) = insights
        .and_then(|i| i.timeline_urgency.as_deref())
        .filter(|s| !s.is_empty())
    {
        return urgency.to_string();
    }

    let urgency = match insights.and_then(|i| i.engagement_stage.as_deref()) {
        Some("decision") => Urgency::High,
        Some("evaluation") => Urgency::Medium,
        _ => match count_since(memories, now - Duration::days(7)) {
            6.. => Urgency::High,
            3..=5 => Urgency::Medium,
            _ => Urgency::Low,
        },
    };
    urgency.as_str().to_string()
}

pub fn regulatory_interest(insights: Option<&Insights>, memories: &[Memory]) -> u8 {
    if let Some(areas) = insights.and_then(|i| i.focus_areas.as_ref()) {
        let score = areas
            .iter()
            .find(|a| a.area.to_lowercase().contains("regulatory"))
            .map_or(0.0, |a| a.score * 100.0);
        return score.round().clamp(0.0, 100.0) as u8;
    }

    let relevant = memories
        .iter()
        .filter(|m| {
            let content = m.content.to_lowercase();
            REGULATORY_KEYWORDS.iter().any(|k| content.contains(k))
        })
        .count();
    (relevant * 20).min(100) as u8
}

/// Backend next steps, else steps built from stated needs, else the generic
/// recommendations.
pub fn next_steps(profile: Option<&ProfileData>, memories: &[Memory], now: DateTime<Utc>) -> Vec<ActionStep> {
    let insights = profile.and_then(|p| p.insights.as_ref());
    if let Some(steps) = insights.and_then(|i| i.next_steps.as_ref()) {
        return steps.flatten();
    }

    let mut steps = Vec::new();
    if let Some(needs) = insights.and_then(|i| i.needs.as_ref()) {
        if let Some(immediate) = needs.immediate.as_deref().filter(|n| !n.is_empty()) {
            steps.push(ActionStep {
                title: immediate.to_string(),
                description: Some("Immediate need".to_string()),
                priority: Priority::High,
                category: Some("immediate".to_string()),
            });
        }
        if let Some(upcoming) = needs.upcoming.as_deref().filter(|n| !n.is_empty()) {
            steps.push(ActionStep {
                title: upcoming.to_string(),
                description: Some("Upcoming need".to_string()),
                priority: Priority::Medium,
                category: Some("upcoming".to_string()),
            });
        }
    }
    if !steps.is_empty() {
        return steps;
    }

    recommended_steps(profile, memories, now)
}

pub fn recommended_steps(profile: Option<&ProfileData>, memories: &[Memory], now: DateTime<Utc>) -> Vec<ActionStep> {
    if let Some(steps) = profile
        .and_then(|p| p.insights.as_ref())
        .and_then(|i| i.next_steps.as_ref())
    {
        return steps.flatten();
    }

    let mut steps = Vec::new();
    let user = profile.and_then(|p| p.profile.as_ref());
    let has = |v: Option<&String>| v.is_some_and(|s| !s.is_empty());
    if !has(user.and_then(|u| u.email.as_ref())) || !has(user.and_then(|u| u.phone.as_ref())) {
        steps.push(ActionStep {
            title: "Complete Your Profile".to_string(),
            description: Some("Add missing contact information to help us serve you better".to_string()),
            priority: Priority::High,
            category: None,
        });
    }

    let any_interest = profile
        .and_then(|p| p.service_interests.as_ref())
        .is_some_and(|i| i.values().any(|v| *v != 0.0));
    if !any_interest {
        steps.push(ActionStep {
            title: "Select Your Interests".to_string(),
            description: Some("Tell us what services you're interested in".to_string()),
            priority: Priority::Medium,
            category: None,
        });
    }

    if count_since(memories, now - Duration::days(7)) == 0 {
        steps.push(ActionStep {
            title: "Stay Engaged".to_string(),
            description: Some("Continue your conversation to get personalized recommendations".to_string()),
            priority: Priority::Low,
            category: None,
        });
    }

    steps
}

fn count_since(memories: &[Memory], since: DateTime<Utc>) -> usize {
    memories.iter().filter(|m| m.timestamp > since).count()
}

/// "decision stage" -> "Decision Stage".
pub fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
