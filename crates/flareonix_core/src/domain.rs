//! crates/flareonix_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//! Field names serialize in camelCase, which is also the layout of the
//! persisted records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_FOUNDER_NAME: &str = "Founder";
pub const DEFAULT_FOUNDER_EMAIL: &str = "founder@flareonix.io";

/// The locally fabricated profile of the person using the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default)]
    pub is_existing_company: bool,
}

/// The form submitted by the login prompt. Every field may be blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub is_existing_company: bool,
}

impl UserProfile {
    /// Fabricates a new profile from a draft, filling placeholders for blank fields.
    pub fn from_draft(draft: ProfileDraft) -> Self {
        let id = Uuid::new_v4().simple().to_string()[..9].to_string();
        Self::with_id(id, draft)
    }

    /// Applies a draft on top of an existing identity.
    pub fn with_id(id: String, draft: ProfileDraft) -> Self {
        let name = non_blank(draft.name).unwrap_or_else(|| DEFAULT_FOUNDER_NAME.to_string());
        let email = non_blank(draft.email).unwrap_or_else(|| DEFAULT_FOUNDER_EMAIL.to_string());
        Self {
            id,
            name,
            email,
            company_name: draft.company_name.and_then(non_blank),
            industry: draft.industry.and_then(non_blank),
            is_existing_company: draft.is_existing_company,
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// A competitor surfaced by the research report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competitor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub success_rate: String,
    #[serde(default)]
    pub key_strategy: String,
}

/// A web citation returned by search grounding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub title: String,
    pub uri: String,
}

/// The structured outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub summary: String,
    pub problem_relevance: u8,
    pub market_demand: u8,
    pub success_probability: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub improved_probability: Option<u8>,
    #[serde(default)]
    pub competitors: Vec<Competitor>,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub strategies: Vec<String>,
    #[serde(rename = "flareonixRecommendation")]
    pub recommendation: String,
    #[serde(default)]
    pub grounding_sources: Vec<GroundingSource>,
}

/// One completed evaluation as kept in the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaEvaluation {
    pub id: String,
    pub user_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub idea_title: String,
    pub raw_input: String,
    pub analysis: EvaluationResult,
}

impl IdeaEvaluation {
    pub fn new(user_id: &str, raw_input: &str, analysis: EvaluationResult) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            user_id: user_id.to_string(),
            timestamp: Utc::now(),
            idea_title: idea_title(raw_input),
            raw_input: raw_input.to_string(),
            analysis,
        }
    }
}

/// Number of leading words kept in an evaluation title.
pub const TITLE_WORDS: usize = 5;

/// Derives the short history title from the raw idea text.
///
/// Words are split on single spaces, so runs of spaces are kept as stored titles have them.
pub fn idea_title(raw_input: &str) -> String {
    let words: Vec<&str> = raw_input.split(' ').take(TITLE_WORDS).collect();
    format!("{}...", words.join(" "))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A single message in the support chat panel. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub content: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}
