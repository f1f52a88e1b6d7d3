//! crates/flareonix_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the local storage layout and of the AI provider.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::domain::{ChatMessage, GroundingSource, IdeaEvaluation, UserProfile};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Transport failure: {0}")]
    Transport(String),
    #[error("Provider error: {0}")]
    Provider(String),
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
    #[error("Storage failure: {0}")]
    Storage(String),
    #[error("The request was cancelled")]
    Cancelled,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Port Payloads
//=========================================================================================

/// Everything read back from local storage at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredState {
    pub profile: Option<UserProfile>,
    pub history: Vec<IdeaEvaluation>,
}

/// The input of one streamed evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationRequest {
    pub idea: String,
    pub profile: UserProfile,
}

/// One fragment of a streamed evaluation.
///
/// `sources` is `Some` only when the provider attached citation metadata to
/// this fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationChunk {
    pub text: String,
    pub sources: Option<Vec<GroundingSource>>,
}

pub type EvaluationStream = Pin<Box<dyn Stream<Item = PortResult<EvaluationChunk>> + Send>>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    /// Reads the profile and history records. Unreadable records come back absent.
    async fn load(&self) -> PortResult<StoredState>;

    async fn save_profile(&self, profile: &UserProfile) -> PortResult<()>;

    async fn remove_profile(&self) -> PortResult<()>;

    /// Overwrites the whole history record.
    async fn save_history(&self, history: &[IdeaEvaluation]) -> PortResult<()>;

    async fn remove_history(&self) -> PortResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EvaluationService: Send + Sync {
    /// Opens a streaming, search-grounded evaluation of an idea.
    async fn stream_evaluation(&self, request: &EvaluationRequest) -> PortResult<EvaluationStream>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Sends one message with the conversation so far and returns the complete reply.
    async fn reply(&self, message: &str, history: &[ChatMessage]) -> PortResult<String>;
}
