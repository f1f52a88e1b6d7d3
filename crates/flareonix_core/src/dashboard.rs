//! crates/flareonix_core/src/dashboard.rs
//!
//! Aggregates the evaluation history into the numbers shown on the dashboard.

use serde::Serialize;

use crate::domain::IdeaEvaluation;

const HIGHLIGHTED_RISKS: usize = 3;

/// Evaluations scoring strictly above this count as safe to launch.
pub const SAFE_TO_LAUNCH_ABOVE: u8 = 70;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_evaluations: usize,
    pub average_readiness: Option<u8>,
    pub best_readiness: Option<u8>,
    pub safe_to_launch: usize,
    /// Readiness scores, oldest first.
    pub readiness_trend: Vec<u8>,
    pub latest: Option<IdeaEvaluation>,
    pub latest_risks: Vec<String>,
}

impl DashboardSummary {
    /// `history` is expected newest first.
    pub fn from_history(history: &[IdeaEvaluation]) -> Self {
        let scores: Vec<u8> = history
            .iter()
            .rev()
            .map(|e| e.analysis.success_probability)
            .collect();

        let average_readiness = if scores.is_empty() {
            None
        } else {
            let total: u32 = scores.iter().map(|&s| s as u32).sum();
            Some(((total as f64) / (scores.len() as f64)).round() as u8)
        };

        let latest = history.first().cloned();
        let latest_risks = latest
            .as_ref()
            .map(|e| e.analysis.risks.iter().take(HIGHLIGHTED_RISKS).cloned().collect())
            .unwrap_or_default();

        Self {
            total_evaluations: history.len(),
            average_readiness,
            best_readiness: scores.iter().copied().max(),
            safe_to_launch: scores.iter().filter(|&&s| s > SAFE_TO_LAUNCH_ABOVE).count(),
            readiness_trend: scores,
            latest,
            latest_risks,
        }
    }
}
