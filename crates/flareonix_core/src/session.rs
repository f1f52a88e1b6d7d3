//! crates/flareonix_core/src/session.rs
//!
//! The evaluation session state machine: Idle -> Streaming -> Completed | Failed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::{IdeaEvaluation, UserProfile};

/// An enum representing where the current evaluation stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Streaming,
    Completed,
    Failed,
}

/// Why a submission did not start a new evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitRejection {
    #[error("the idea text is empty")]
    EmptyIdea,
    #[error("no profile is signed in")]
    NotAuthenticated,
    #[error("an evaluation is already streaming")]
    AlreadyStreaming,
}

/// A serializable view of the session for the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub idea: Option<String>,
    pub transcript: String,
    pub evaluation: Option<IdeaEvaluation>,
    pub error: Option<String>,
}

pub struct EvaluationSession {
    phase: SessionPhase,
    idea: Option<String>,
    transcript: String,
    evaluation: Option<IdeaEvaluation>,
    error: Option<String>,
    /// A token to cancel the evaluation that is currently streaming.
    cancellation_token: CancellationToken,
}

impl Default for EvaluationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluationSession {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Idle,
            idea: None,
            transcript: String::new(),
            evaluation: None,
            error: None,
            cancellation_token: CancellationToken::new(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Starts a new evaluation and hands back the token that cancels it.
    ///
    /// Submissions while another evaluation streams are rejected and leave the
    /// session untouched.
    pub fn begin(
        &mut self,
        idea: &str,
        profile: Option<&UserProfile>,
    ) -> Result<CancellationToken, SubmitRejection> {
        if self.phase == SessionPhase::Streaming {
            return Err(SubmitRejection::AlreadyStreaming);
        }
        if idea.trim().is_empty() {
            return Err(SubmitRejection::EmptyIdea);
        }
        if profile.is_none() {
            return Err(SubmitRejection::NotAuthenticated);
        }

        self.phase = SessionPhase::Streaming;
        self.idea = Some(idea.to_string());
        self.transcript.clear();
        self.evaluation = None;
        self.error = None;
        self.cancellation_token = CancellationToken::new();
        info!("Evaluation session started.");
        Ok(self.cancellation_token.clone())
    }

    /// Appends a streamed fragment. Fragments arriving outside Streaming are dropped.
    pub fn append(&mut self, fragment: &str) {
        if self.phase == SessionPhase::Streaming {
            self.transcript.push_str(fragment);
        }
    }

    pub fn complete(&mut self, evaluation: IdeaEvaluation) {
        if self.phase != SessionPhase::Streaming {
            warn!("Ignoring completion for a session in phase {:?}.", self.phase);
            return;
        }
        info!("Evaluation session completed: {}", evaluation.id);
        self.phase = SessionPhase::Completed;
        self.evaluation = Some(evaluation);
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        if self.phase != SessionPhase::Streaming {
            warn!("Ignoring failure for a session in phase {:?}.", self.phase);
            return;
        }
        let message = message.into();
        warn!("Evaluation session failed: {}", message);
        self.phase = SessionPhase::Failed;
        self.error = Some(message);
    }

    /// Requests cancellation of the streaming evaluation. Returns whether one was running.
    pub fn cancel(&mut self) -> bool {
        if self.phase != SessionPhase::Streaming {
            return false;
        }
        info!("Cancelling the streaming evaluation.");
        self.cancellation_token.cancel();
        true
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            idea: self.idea.clone(),
            transcript: self.transcript.clone(),
            evaluation: self.evaluation.clone(),
            error: self.error.clone(),
        }
    }
}

/// The download name for an exported report.
pub fn report_file_name(at: DateTime<Utc>) -> String {
    format!("Flareonix_Report_{}.txt", at.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EvaluationResult, ProfileDraft};
    use chrono::TimeZone;

    fn profile() -> UserProfile {
        UserProfile::from_draft(ProfileDraft::default())
    }

    fn evaluation() -> IdeaEvaluation {
        IdeaEvaluation::new(
            "u",
            "idea",
            EvaluationResult {
                summary: String::new(),
                problem_relevance: 1,
                market_demand: 1,
                success_probability: 1,
                improved_probability: None,
                competitors: vec![],
                risks: vec![],
                strategies: vec![],
                recommendation: String::new(),
                grounding_sources: vec![],
            },
        )
    }

    #[test]
    fn submission_while_streaming_is_ignored() {
        let mut session = EvaluationSession::new();
        let profile = profile();

        session.begin("Idea one", Some(&profile)).unwrap();
        session.append("partial");

        assert_eq!(
            session.begin("Idea two", Some(&profile)),
            Err(SubmitRejection::AlreadyStreaming)
        );
        let snapshot = session.snapshot();
        assert_eq!(snapshot.phase, SessionPhase::Streaming);
        assert_eq!(snapshot.idea.as_deref(), Some("Idea one"));
        assert_eq!(snapshot.transcript, "partial");
    }

    #[test]
    fn invalid_submissions_leave_session_idle() {
        let mut session = EvaluationSession::new();
        assert_eq!(
            session.begin("   ", Some(&profile())),
            Err(SubmitRejection::EmptyIdea)
        );
        assert_eq!(session.begin("Idea", None), Err(SubmitRejection::NotAuthenticated));
        assert_eq!(session.phase(), SessionPhase::Idle);
    }

    #[test]
    fn terminal_states_accept_a_new_submission() {
        let mut session = EvaluationSession::new();
        let profile = profile();

        session.begin("first", Some(&profile)).unwrap();
        session.complete(evaluation());
        assert_eq!(session.phase(), SessionPhase::Completed);

        session.begin("second", Some(&profile)).unwrap();
        assert!(session.transcript().is_empty());
        assert!(session.snapshot().evaluation.is_none());
        session.fail("provider unavailable");
        assert_eq!(session.phase(), SessionPhase::Failed);
        assert_eq!(session.snapshot().error.as_deref(), Some("provider unavailable"));

        assert!(session.begin("third", Some(&profile)).is_ok());
    }

    #[test]
    fn cancel_triggers_the_current_token_only() {
        let mut session = EvaluationSession::new();
        let profile = profile();
        assert!(!session.cancel());

        let first = session.begin("first", Some(&profile)).unwrap();
        assert!(session.cancel());
        assert!(first.is_cancelled());
        session.fail("cancelled");

        let second = session.begin("second", Some(&profile)).unwrap();
        assert!(!second.is_cancelled());
    }

    #[test]
    fn report_name_uses_epoch_millis() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(report_file_name(at), "Flareonix_Report_1700000000123.txt");
    }
}
