mod common;

use axum::{extract::State, http::StatusCode, Json};
use common::{
    app_state, app_state_with_store, cited, failure, scored_report, sign_in, silent_chat, text,
    ScriptedEvaluator, SlowHistoryStore,
};
use dashboard_lib::{
    adapters::JsonFileStore,
    web::{
        auth::delete_account_handler,
        evaluation_task::{evaluation_process, start_evaluation, EvaluationOutcome},
        protocol::ServerMessage,
        rest::{navigate_handler, NavigateRequest},
    },
};
use flareonix_core::{
    ports::PersistenceStore,
    report::{PLACEHOLDER_MARKET_DEMAND, PLACEHOLDER_PROBLEM_RELEVANCE},
    session::{SessionPhase, SubmitRejection},
    shell::NavigationTab,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const MEAL_IDEA: &str = "I want to build a meal-subscription app for students";

#[tokio::test]
async fn meal_subscription_idea_is_scored_and_saved() {
    let dir = tempfile::tempdir().unwrap();
    let evaluator = Arc::new(ScriptedEvaluator::new(vec![
        text("## Market scan\nCampus meal plans are rigid. "),
        cited(
            "Based on that, the current success probability: 64 for this concept.",
            "https://example.com/campus-food",
        ),
    ]));
    let state = app_state(dir.path(), evaluator, silent_chat()).await;
    let profile = sign_in(&state, "Ada").await;

    let submission = start_evaluation(&state, MEAL_IDEA).unwrap();
    assert_eq!(
        start_evaluation(&state, "A second idea").unwrap_err(),
        SubmitRejection::AlreadyStreaming
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let outcome = evaluation_process(state.clone(), submission, Some(tx)).await;

    let EvaluationOutcome::Completed(evaluation) = outcome else {
        panic!("expected a completed evaluation, got {:?}", outcome);
    };
    assert_eq!(evaluation.analysis.success_probability, 64);
    assert_eq!(evaluation.idea_title, "I want to build a...");
    assert_eq!(evaluation.user_id, profile.id);
    assert_eq!(evaluation.analysis.problem_relevance, PLACEHOLDER_PROBLEM_RELEVANCE);
    assert_eq!(evaluation.analysis.market_demand, PLACEHOLDER_MARKET_DEMAND);
    assert_eq!(evaluation.analysis.grounding_sources.len(), 1);

    let mut chunks = 0;
    let mut completed = false;
    while let Ok(message) = rx.try_recv() {
        match message {
            ServerMessage::Chunk { .. } => chunks += 1,
            ServerMessage::Completed { evaluation: sent } => {
                assert_eq!(sent, evaluation);
                completed = true;
            }
            other => panic!("unexpected message {:?}", other),
        }
    }
    assert_eq!(chunks, 2);
    assert!(completed);

    let snapshot = state.session.lock().unwrap().snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Completed);
    assert!(snapshot.transcript.contains("success probability: 64"));

    let reloaded = JsonFileStore::new(dir.path()).load().await.unwrap();
    assert_eq!(reloaded.history, vec![evaluation]);
}

#[tokio::test]
async fn sequential_evaluations_are_kept_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let evaluator = Arc::new(ScriptedEvaluator::new(vec![text("Success Probability: 71")]));
    let state = app_state(dir.path(), evaluator, silent_chat()).await;
    sign_in(&state, "Grace").await;

    for n in 1..=3 {
        let submission = start_evaluation(&state, &format!("Idea number {}", n)).unwrap();
        let outcome = evaluation_process(state.clone(), submission, None).await;
        assert!(matches!(outcome, EvaluationOutcome::Completed(_)));
    }

    let reloaded = JsonFileStore::new(dir.path()).load().await.unwrap();
    let inputs: Vec<&str> = reloaded.history.iter().map(|e| e.raw_input.as_str()).collect();
    assert_eq!(inputs, vec!["Idea number 3", "Idea number 2", "Idea number 1"]);
    assert_eq!(state.shell.lock().unwrap().evaluations, reloaded.history);
}

#[tokio::test]
async fn leaving_the_evaluator_cancels_and_saves_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let evaluator = Arc::new(ScriptedEvaluator::stalling(vec![text("Researching competitors...")]));
    let state = app_state(dir.path(), evaluator, silent_chat()).await;
    sign_in(&state, "Linus").await;

    navigate_handler(
        State(state.clone()),
        Json(NavigateRequest { tab: NavigationTab::Evaluate }),
    )
    .await;

    let submission = start_evaluation(&state, "Drone deliveries for rural pharmacies").unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(evaluation_process(state.clone(), submission, Some(tx)));

    // Wait until the stream is live before walking away.
    assert!(matches!(rx.recv().await, Some(ServerMessage::Chunk { .. })));
    navigate_handler(
        State(state.clone()),
        Json(NavigateRequest { tab: NavigationTab::History }),
    )
    .await;

    assert_eq!(task.await.unwrap(), EvaluationOutcome::Cancelled);
    assert_eq!(rx.recv().await, Some(ServerMessage::Cancelled));
    assert_eq!(state.session.lock().unwrap().phase(), SessionPhase::Failed);
    assert!(state.shell.lock().unwrap().evaluations.is_empty());
    assert!(JsonFileStore::new(dir.path()).load().await.unwrap().history.is_empty());
}

#[tokio::test]
async fn provider_failure_fails_the_session_without_saving() {
    let dir = tempfile::tempdir().unwrap();
    let evaluator = Arc::new(ScriptedEvaluator::new(vec![
        text("Partial analysis"),
        failure("connection reset"),
    ]));
    let state = app_state(dir.path(), evaluator, silent_chat()).await;
    sign_in(&state, "Ada").await;

    let submission = start_evaluation(&state, "Vertical farms on rooftops").unwrap();
    let outcome = evaluation_process(state.clone(), submission, None).await;

    let EvaluationOutcome::Failed(message) = outcome else {
        panic!("expected a failure, got {:?}", outcome);
    };
    assert!(message.contains("connection reset"));
    let snapshot = state.session.lock().unwrap().snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Failed);
    assert_eq!(snapshot.error.as_deref(), Some(message.as_str()));
    assert!(JsonFileStore::new(dir.path()).load().await.unwrap().history.is_empty());

    // A failed session accepts the next submission.
    assert!(start_evaluation(&state, "Another idea").is_ok());
}

#[tokio::test]
async fn malformed_structured_report_is_a_distinct_failure() {
    let dir = tempfile::tempdir().unwrap();
    let evaluator = Arc::new(ScriptedEvaluator::new(vec![text(
        "Success Probability: 80\n```json\n{\"problemRelevance\": \"high\"}\n```",
    )]));
    let state = app_state(dir.path(), evaluator, silent_chat()).await;
    sign_in(&state, "Ada").await;

    let submission = start_evaluation(&state, "Smart luggage tags").unwrap();
    let outcome = evaluation_process(state.clone(), submission, None).await;

    assert!(matches!(outcome, EvaluationOutcome::Failed(ref m) if m.contains("report")));
    assert!(JsonFileStore::new(dir.path()).load().await.unwrap().history.is_empty());
}

#[tokio::test]
async fn submissions_require_a_profile_and_text() {
    let dir = tempfile::tempdir().unwrap();
    let evaluator = Arc::new(ScriptedEvaluator::new(vec![]));
    let state = app_state(dir.path(), evaluator, silent_chat()).await;

    assert_eq!(
        start_evaluation(&state, "An idea").unwrap_err(),
        SubmitRejection::NotAuthenticated
    );
    sign_in(&state, "Ada").await;
    assert_eq!(
        start_evaluation(&state, "   ").unwrap_err(),
        SubmitRejection::EmptyIdea
    );
    assert_eq!(state.session.lock().unwrap().phase(), SessionPhase::Idle);
}

#[tokio::test]
async fn deleting_the_account_while_saving_leaves_nothing_behind() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SlowHistoryStore::new(dir.path(), Duration::from_millis(100)));
    let evaluator = Arc::new(ScriptedEvaluator::new(scored_report(80)));
    let state = app_state_with_store(store, evaluator, silent_chat()).await;
    sign_in(&state, "Ada").await;

    let submission = start_evaluation(&state, MEAL_IDEA).unwrap();
    let task = tokio::spawn(evaluation_process(state.clone(), submission, None));
    // Land in the middle of the history write.
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(
        delete_account_handler(State(state.clone())).await.unwrap(),
        StatusCode::NO_CONTENT
    );
    assert_eq!(task.await.unwrap(), EvaluationOutcome::Cancelled);

    let stored = JsonFileStore::new(dir.path()).load().await.unwrap();
    assert!(stored.profile.is_none());
    assert!(stored.history.is_empty());
    let shell = state.shell.lock().unwrap();
    assert!(shell.evaluations.is_empty());
    assert!(shell.profile.is_none());
}
