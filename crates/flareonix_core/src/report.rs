//! crates/flareonix_core/src/report.rs
//!
//! Turns the free-text research report into an `EvaluationResult`.
//!
//! The model is asked to close its report with a fenced `json` block. When the
//! block is present it is authoritative and must validate; when it is missing the
//! readiness score is recovered from the prose and the remaining fields keep
//! fixed placeholder values.

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

use crate::domain::{Competitor, EvaluationResult, GroundingSource};

pub const DEFAULT_SUCCESS_PROBABILITY: u8 = 50;
pub const PLACEHOLDER_PROBLEM_RELEVANCE: u8 = 70;
pub const PLACEHOLDER_MARKET_DEMAND: u8 = 65;
pub const PLACEHOLDER_RECOMMENDATION: &str = "Highly recommended for MVP stage.";
pub const PLACEHOLDER_RISKS: [&str; 2] = ["Market saturation", "High customer acquisition cost"];
pub const PLACEHOLDER_STRATEGIES: [&str; 2] =
    ["Focus on niche differentiation", "Direct B2B outreach"];

const SUMMARY_CHARS: usize = 300;

static SUCCESS_PROBABILITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)success probability[:\s]*(\d+)").unwrap());

static JSON_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\s*(\{.*?\})\s*```").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    #[error("The structured report block could not be parsed: {0}")]
    MalformedReport(String),
}

/// Finds the first "success probability: NN" mention, clamped to 100.
pub fn extract_success_probability(text: &str) -> Option<u8> {
    let captures = SUCCESS_PROBABILITY.captures(text)?;
    let digits = captures.get(1)?.as_str();
    // Absurdly long digit runs still mean "more than 100".
    let value = digits.parse::<u64>().unwrap_or(u64::MAX);
    Some(value.min(100) as u8)
}

/// The first 300 characters of the report followed by an ellipsis.
pub fn summarize(text: &str) -> String {
    let head: String = text.chars().take(SUMMARY_CHARS).collect();
    format!("{head}...")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StructuredReport {
    problem_relevance: u32,
    market_demand: u32,
    success_probability: u32,
    #[serde(default)]
    improved_probability: Option<u32>,
    #[serde(default)]
    competitors: Vec<Competitor>,
    #[serde(default)]
    risks: Vec<String>,
    #[serde(default)]
    strategies: Vec<String>,
    #[serde(default)]
    recommendation: Option<String>,
}

fn score(field: &str, value: u32) -> Result<u8, ReportError> {
    if value > 100 {
        return Err(ReportError::MalformedReport(format!(
            "{field} must be between 0 and 100, got {value}"
        )));
    }
    Ok(value as u8)
}

/// Parses the trailing structured block, if the report carries one.
fn structured_block(text: &str) -> Option<Result<StructuredReport, ReportError>> {
    let captures = JSON_BLOCK.captures_iter(text).last()?;
    let body = captures.get(1)?.as_str();
    Some(
        serde_json::from_str::<StructuredReport>(body)
            .map_err(|e| ReportError::MalformedReport(e.to_string())),
    )
}

/// Builds the evaluation result for a completed report.
pub fn build_result(
    full_text: &str,
    sources: Vec<GroundingSource>,
) -> Result<EvaluationResult, ReportError> {
    let summary = summarize(full_text);

    match structured_block(full_text) {
        Some(parsed) => {
            let report = parsed?;
            Ok(EvaluationResult {
                summary,
                problem_relevance: score("problemRelevance", report.problem_relevance)?,
                market_demand: score("marketDemand", report.market_demand)?,
                success_probability: score("successProbability", report.success_probability)?,
                improved_probability: report
                    .improved_probability
                    .map(|v| score("improvedProbability", v))
                    .transpose()?,
                competitors: report.competitors,
                risks: report.risks,
                strategies: report.strategies,
                recommendation: report
                    .recommendation
                    .unwrap_or_else(|| PLACEHOLDER_RECOMMENDATION.to_string()),
                grounding_sources: sources,
            })
        }
        None => Ok(EvaluationResult {
            summary,
            problem_relevance: PLACEHOLDER_PROBLEM_RELEVANCE,
            market_demand: PLACEHOLDER_MARKET_DEMAND,
            success_probability: extract_success_probability(full_text)
                .unwrap_or(DEFAULT_SUCCESS_PROBABILITY),
            improved_probability: None,
            competitors: Vec::new(),
            risks: PLACEHOLDER_RISKS.iter().map(|r| r.to_string()).collect(),
            strategies: PLACEHOLDER_STRATEGIES.iter().map(|s| s.to_string()).collect(),
            recommendation: PLACEHOLDER_RECOMMENDATION.to_string(),
            grounding_sources: sources,
        }),
    }
}
