use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Memory, ProfileData};
use crate::services::insights::{self, DerivedInsights};

const MAX_INTERESTS: usize = 8;

/// Dashboard tabs, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileView {
    Overview,
    Interests,
    BusinessProfile,
    Timeline,
    Insights,
    ProfileData,
}

impl ProfileView {
    pub const ALL: [ProfileView; 6] = [
        ProfileView::Overview,
        ProfileView::Interests,
        ProfileView::BusinessProfile,
        ProfileView::Timeline,
        ProfileView::Insights,
        ProfileView::ProfileData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileView::Overview => "overview",
            ProfileView::Interests => "interests",
            ProfileView::BusinessProfile => "personality",
            ProfileView::Timeline => "timeline",
            ProfileView::Insights => "insights",
            ProfileView::ProfileData => "profile",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProfileView::Overview => "Overview",
            ProfileView::Interests => "Interests",
            ProfileView::BusinessProfile => "Business Profile",
            ProfileView::Timeline => "Timeline",
            ProfileView::Insights => "Insights",
            ProfileView::ProfileData => "Profile Data",
        }
    }
}

impl FromStr for ProfileView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProfileView::ALL
            .into_iter()
            .find(|view| view.as_str() == s)
            .ok_or_else(|| format!("unknown profile view: {s}"))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Tab {
    pub id: &'static str,
    pub label: &'static str,
}

pub fn tabs() -> Vec<Tab> {
    ProfileView::ALL
        .iter()
        .map(|view| Tab {
            id: view.as_str(),
            label: view.label(),
        })
        .collect()
}

/// Everything the provider returned for one user.
#[derive(Debug, Clone, Default)]
pub struct ProfileSnapshot {
    pub data: Option<ProfileData>,
    pub memories: Vec<Memory>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterestScore {
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ViewPayload {
    #[serde(rename_all = "camelCase")]
    Overview {
        display_name: String,
        insights: DerivedInsights,
        top_interests: Vec<InterestScore>,
    },
    #[serde(rename_all = "camelCase")]
    Interests {
        interests: Vec<InterestScore>,
        needs_tags: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    BusinessProfile {
        interests: Vec<InterestScore>,
        business_profile: Option<serde_json::Value>,
    },
    #[serde(rename_all = "camelCase")]
    Timeline {
        memories: Vec<Memory>,
        timeline_urgency: String,
    },
    #[serde(rename_all = "camelCase")]
    Insights {
        insights: DerivedInsights,
        focus_areas: Vec<InterestScore>,
    },
    #[serde(rename_all = "camelCase")]
    ProfileData {
        fields: Vec<(String, String)>,
        tags: Vec<String>,
        patterns: Option<serde_json::Value>,
    },
    Empty {
        message: String,
    },
}

impl ViewPayload {
    fn empty(message: &str) -> Self {
        ViewPayload::Empty {
            message: message.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ViewPayload::Empty { .. })
    }
}

pub fn render(view: ProfileView, snapshot: &ProfileSnapshot, now: DateTime<Utc>) -> ViewPayload {
    let data = snapshot.data.as_ref();
    let memories = snapshot.memories.as_slice();
    if data.is_none() && memories.is_empty() {
        return ViewPayload::empty("No profile data available yet");
    }

    match view {
        ProfileView::Overview => ViewPayload::Overview {
            display_name: display_name(data),
            insights: insights::derive(data, memories, now),
            top_interests: ranked_interests(data, true).into_iter().take(3).collect(),
        },
        ProfileView::Interests => {
            let interests = ranked_interests(data, true);
            let needs_tags = data
                .and_then(|d| d.insights.as_ref())
                .map(|i| i.needs_tags.clone())
                .unwrap_or_default();
            if interests.is_empty() && needs_tags.is_empty() {
                return ViewPayload::empty("No insights yet");
            }
            ViewPayload::Interests {
                interests,
                needs_tags,
            }
        }
        ProfileView::BusinessProfile => {
            let interests = ranked_interests(data, false);
            let business_profile = data.and_then(|d| d.business_profile.clone());
            if interests.is_empty() && business_profile.is_none() {
                return ViewPayload::empty("No service interests captured yet");
            }
            ViewPayload::BusinessProfile {
                interests,
                business_profile,
            }
        }
        ProfileView::Timeline => {
            if memories.is_empty() {
                return ViewPayload::empty("No conversations yet");
            }
            let mut memories = memories.to_vec();
            memories.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            ViewPayload::Timeline {
                timeline_urgency: insights::timeline_urgency(
                    data.and_then(|d| d.insights.as_ref()),
                    &memories,
                    now,
                ),
                memories,
            }
        }
        ProfileView::Insights => {
            let focus_areas = data
                .and_then(|d| d.insights.as_ref())
                .and_then(|i| i.focus_areas.as_ref())
                .map(|areas| {
                    areas
                        .iter()
                        .map(|a| InterestScore {
                            name: a.area.clone(),
                            score: a.score,
                        })
                        .collect()
                })
                .unwrap_or_default();
            ViewPayload::Insights {
                insights: insights::derive(data, memories, now),
                focus_areas,
            }
        }
        ProfileView::ProfileData => {
            let Some(data) = data else {
                return ViewPayload::empty("No profile data available yet");
            };
            let profile = data.profile.clone().unwrap_or_default();
            let fields = [
                ("Full Name", profile.name),
                ("First Name", profile.first_name),
                ("Email", profile.email),
                ("Phone", profile.phone),
            ]
            .into_iter()
            .filter_map(|(label, value)| {
                value
                    .filter(|v| !v.is_empty())
                    .map(|v| (label.to_string(), v))
            })
            .collect();
            ViewPayload::ProfileData {
                fields,
                tags: profile.tags,
                patterns: data.patterns.clone(),
            }
        }
    }
}

fn display_name(data: Option<&ProfileData>) -> String {
    data.and_then(|d| d.profile.as_ref())
        .and_then(|p| p.first_name.clone().or_else(|| p.name.clone()))
        .unwrap_or_default()
}

fn ranked_interests(data: Option<&ProfileData>, positive_only: bool) -> Vec<InterestScore> {
    let Some(interests) = data.and_then(|d| d.service_interests.as_ref()) else {
        return Vec::new();
    };

    let mut ranked: Vec<InterestScore> = interests
        .iter()
        .filter(|(_, score)| !positive_only || **score > 0.0)
        .map(|(key, score)| InterestScore {
            name: humanize_key(key),
            score: *score,
        })
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(MAX_INTERESTS);
    ranked
}

/// "sportsMassage" -> "Sports Massage".
pub fn humanize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, c) in key.chars().enumerate() {
        if i == 0 {
            out.extend(c.to_uppercase());
        } else if c.is_uppercase() {
            out.push(' ');
            out.push(c);
        } else {
            out.push(c);
        }
    }
    out
}
