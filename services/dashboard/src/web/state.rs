//! services/dashboard/src/web/state.rs
//!
//! Defines the application's shared state: the port adapters plus the three
//! in-memory state machines (view shell, evaluation session, chat transcript).

use flareonix_core::{
    chat::ChatTranscript,
    ports::{ChatService, EvaluationService, PersistenceStore, StoredState},
    session::EvaluationSession,
    shell::ShellState,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// The std mutexes guard plain state machines and are never held across an `.await`.
/// `history_writes` is held across every store call that changes the history record.
pub struct AppState {
    pub store: Arc<dyn PersistenceStore>,
    pub evaluator: Arc<dyn EvaluationService>,
    pub chat_adapter: Arc<dyn ChatService>,
    pub shell: Mutex<ShellState>,
    pub session: Mutex<EvaluationSession>,
    pub transcript: Mutex<ChatTranscript>,
    pub history_writes: tokio::sync::Mutex<()>,
}

impl AppState {
    /// Builds the state from whatever the store returned at startup.
    pub fn new(
        store: Arc<dyn PersistenceStore>,
        evaluator: Arc<dyn EvaluationService>,
        chat_adapter: Arc<dyn ChatService>,
        stored: StoredState,
    ) -> Self {
        Self {
            store,
            evaluator,
            chat_adapter,
            shell: Mutex::new(ShellState::new(stored.profile, stored.history)),
            session: Mutex::new(EvaluationSession::new()),
            transcript: Mutex::new(ChatTranscript::new()),
            history_writes: tokio::sync::Mutex::new(()),
        }
    }
}

/// Locks a state machine, recovering the data if a previous holder panicked.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
