//! Shared fixtures for the dashboard integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use dashboard_lib::{adapters::JsonFileStore, web::state::AppState};
use flareonix_core::{
    domain::{ChatMessage, GroundingSource, IdeaEvaluation, ProfileDraft, UserProfile},
    ports::{
        ChatService, EvaluationChunk, EvaluationRequest, EvaluationService, EvaluationStream,
        PersistenceStore, PortError, PortResult, StoredState,
    },
    shell::ShellEvent,
};
use futures::stream::{self, StreamExt};
use mockall::mock;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

mock! {
    pub Chat {}

    #[async_trait]
    impl ChatService for Chat {
        async fn reply(&self, message: &str, history: &[ChatMessage]) -> PortResult<String>;
    }
}

/// An evaluator that replays the same fragments for every request.
pub struct ScriptedEvaluator {
    chunks: Vec<PortResult<EvaluationChunk>>,
    hang_after_chunks: bool,
}

impl ScriptedEvaluator {
    pub fn new(chunks: Vec<PortResult<EvaluationChunk>>) -> Self {
        Self {
            chunks,
            hang_after_chunks: false,
        }
    }

    /// Emits the fragments and then never finishes, like a stalled provider.
    pub fn stalling(chunks: Vec<PortResult<EvaluationChunk>>) -> Self {
        Self {
            chunks,
            hang_after_chunks: true,
        }
    }
}

#[async_trait]
impl EvaluationService for ScriptedEvaluator {
    async fn stream_evaluation(&self, _request: &EvaluationRequest) -> PortResult<EvaluationStream> {
        let replay = stream::iter(self.chunks.clone());
        if self.hang_after_chunks {
            Ok(Box::pin(replay.chain(stream::pending())))
        } else {
            Ok(Box::pin(replay))
        }
    }
}

pub fn text(fragment: &str) -> PortResult<EvaluationChunk> {
    Ok(EvaluationChunk {
        text: fragment.to_string(),
        sources: None,
    })
}

pub fn cited(fragment: &str, uri: &str) -> PortResult<EvaluationChunk> {
    Ok(EvaluationChunk {
        text: fragment.to_string(),
        sources: Some(vec![GroundingSource {
            title: "Source".to_string(),
            uri: uri.to_string(),
        }]),
    })
}

pub fn failure(message: &str) -> PortResult<EvaluationChunk> {
    Err(PortError::Transport(message.to_string()))
}

/// Builds the application state over a file store rooted at `dir`.
pub async fn app_state(
    dir: &Path,
    evaluator: Arc<dyn EvaluationService>,
    chat: Arc<dyn ChatService>,
) -> Arc<AppState> {
    app_state_with_store(Arc::new(JsonFileStore::new(dir)), evaluator, chat).await
}

pub async fn app_state_with_store(
    store: Arc<dyn PersistenceStore>,
    evaluator: Arc<dyn EvaluationService>,
    chat: Arc<dyn ChatService>,
) -> Arc<AppState> {
    let stored = store.load().await.expect("load store");
    Arc::new(AppState::new(store, evaluator, chat, stored))
}

/// A file store whose history writes take `delay` to land.
pub struct SlowHistoryStore {
    inner: JsonFileStore,
    delay: Duration,
}

impl SlowHistoryStore {
    pub fn new(dir: &Path, delay: Duration) -> Self {
        Self {
            inner: JsonFileStore::new(dir),
            delay,
        }
    }
}

#[async_trait]
impl PersistenceStore for SlowHistoryStore {
    async fn load(&self) -> PortResult<StoredState> {
        self.inner.load().await
    }

    async fn save_profile(&self, profile: &UserProfile) -> PortResult<()> {
        self.inner.save_profile(profile).await
    }

    async fn remove_profile(&self) -> PortResult<()> {
        self.inner.remove_profile().await
    }

    async fn save_history(&self, history: &[IdeaEvaluation]) -> PortResult<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.save_history(history).await
    }

    async fn remove_history(&self) -> PortResult<()> {
        self.inner.remove_history().await
    }
}

/// A support assistant that never answers.
pub struct StalledChat;

#[async_trait]
impl ChatService for StalledChat {
    async fn reply(&self, _message: &str, _history: &[ChatMessage]) -> PortResult<String> {
        futures::future::pending().await
    }
}

/// The evaluator output used by tests that need a report which parses.
pub fn scored_report(probability: u8) -> Vec<PortResult<EvaluationChunk>> {
    vec![
        text("## Verdict\n"),
        text(&format!("Current success probability: {probability}.")),
    ]
}

/// Signs in a profile the same way the login endpoint does.
pub async fn sign_in(state: &AppState, name: &str) -> UserProfile {
    let profile = UserProfile::from_draft(ProfileDraft {
        name: name.to_string(),
        ..Default::default()
    });
    state.store.save_profile(&profile).await.expect("save profile");
    state
        .shell
        .lock()
        .expect("shell lock")
        .apply(ShellEvent::SignedIn(profile.clone()));
    profile
}

pub fn silent_chat() -> Arc<dyn ChatService> {
    Arc::new(MockChat::new())
}
