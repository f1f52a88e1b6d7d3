//! services/dashboard/src/web/evaluation_task.rs
//!
//! This module contains the asynchronous "worker" function responsible for
//! driving a single evaluation session from submission to its terminal state.

use crate::web::{
    protocol::ServerMessage,
    state::{lock, AppState},
};
use flareonix_core::{
    domain::{IdeaEvaluation, UserProfile},
    gateway::{self, EvaluationOutput},
    ports::{EvaluationRequest, PortError},
    report,
    session::SubmitRejection,
    shell::ShellEvent,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub const CANCELLED_MESSAGE: &str = "The evaluation was cancelled.";

/// Represents the terminal state reached by `evaluation_process`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationOutcome {
    Completed(IdeaEvaluation),
    Failed(String),
    Cancelled,
}

/// A submission accepted by the session, ready to be run.
#[derive(Debug, Clone)]
pub struct AcceptedSubmission {
    pub idea: String,
    pub profile: UserProfile,
    pub token: CancellationToken,
}

/// Moves the session into Streaming for `idea`, using the signed-in profile.
pub fn start_evaluation(
    app_state: &AppState,
    idea: &str,
) -> Result<AcceptedSubmission, SubmitRejection> {
    let profile = lock(&app_state.shell).profile.clone();
    let token = lock(&app_state.session).begin(idea, profile.as_ref())?;
    Ok(AcceptedSubmission {
        idea: idea.to_string(),
        // `begin` refuses submissions without a profile.
        profile: profile.ok_or(SubmitRejection::NotAuthenticated)?,
        token,
    })
}

/// The main asynchronous task for one accepted submission.
///
/// Every fragment is appended to the session transcript and, when `events` is
/// given, forwarded to the client. The history is persisted before the session
/// is marked Completed; any failure or cancellation leaves the stored history
/// as it was.
pub async fn evaluation_process(
    app_state: Arc<AppState>,
    submission: AcceptedSubmission,
    events: Option<UnboundedSender<ServerMessage>>,
) -> EvaluationOutcome {
    let start_time = Instant::now();
    info!("Evaluation process started.");

    let AcceptedSubmission { idea, profile, token } = submission;
    let request = EvaluationRequest { idea, profile };

    let streamed = gateway::evaluate(
        app_state.evaluator.as_ref(),
        &request,
        &token,
        |fragment| {
            lock(&app_state.session).append(fragment);
            if let Some(events) = &events {
                let _ = events.send(ServerMessage::Chunk {
                    text: fragment.to_string(),
                });
            }
        },
    )
    .await;

    let outcome = match streamed {
        Ok(output) => record_evaluation(&app_state, &request, output, &token).await,
        Err(PortError::Cancelled) => EvaluationOutcome::Cancelled,
        Err(e) => {
            error!("Evaluation stream failed: {:?}", e);
            EvaluationOutcome::Failed(e.to_string())
        }
    };

    let message = match &outcome {
        // The session was completed together with the history update.
        EvaluationOutcome::Completed(evaluation) => ServerMessage::Completed {
            evaluation: evaluation.clone(),
        },
        EvaluationOutcome::Failed(message) => {
            lock(&app_state.session).fail(message.clone());
            ServerMessage::Failed {
                message: message.clone(),
            }
        }
        EvaluationOutcome::Cancelled => {
            lock(&app_state.session).fail(CANCELLED_MESSAGE);
            ServerMessage::Cancelled
        }
    };
    if let Some(events) = &events {
        let _ = events.send(message);
    }

    info!("⏱️ Evaluation took: {:?}", start_time.elapsed());
    outcome
}

/// Builds the evaluation, persists the grown history, then publishes it to the
/// shell and completes the session.
///
/// Runs under `history_writes`. A cancellation seen after the write restores
/// the previous history record.
async fn record_evaluation(
    app_state: &AppState,
    request: &EvaluationRequest,
    output: EvaluationOutput,
    token: &CancellationToken,
) -> EvaluationOutcome {
    let analysis = match report::build_result(&output.full_text, output.sources) {
        Ok(analysis) => analysis,
        Err(e) => {
            warn!("Rejecting evaluation report: {}", e);
            return EvaluationOutcome::Failed(e.to_string());
        }
    };
    let evaluation = IdeaEvaluation::new(&request.profile.id, &request.idea, analysis);

    let _writes = app_state.history_writes.lock().await;
    if token.is_cancelled() {
        return EvaluationOutcome::Cancelled;
    }

    let previous = lock(&app_state.shell).evaluations.clone();
    let mut history = previous.clone();
    history.insert(0, evaluation.clone());
    if let Err(e) = app_state.store.save_history(&history).await {
        error!("Failed to persist the evaluation history: {:?}", e);
        return EvaluationOutcome::Failed(e.to_string());
    }

    // Cancellation goes through the session lock, so this check and the commit are atomic.
    let committed = {
        let mut session = lock(&app_state.session);
        if token.is_cancelled() {
            false
        } else {
            lock(&app_state.shell).apply(ShellEvent::EvaluationRecorded(evaluation.clone()));
            session.complete(evaluation.clone());
            true
        }
    };

    if !committed {
        info!("Cancelled while saving; restoring the previous history.");
        if let Err(e) = app_state.store.save_history(&previous).await {
            error!("Failed to restore the evaluation history: {:?}", e);
            return EvaluationOutcome::Failed(e.to_string());
        }
        return EvaluationOutcome::Cancelled;
    }

    info!(
        "Recorded evaluation '{}' with success probability {}.",
        evaluation.idea_title, evaluation.analysis.success_probability
    );
    EvaluationOutcome::Completed(evaluation)
}
