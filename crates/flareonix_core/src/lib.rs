pub mod chat;
pub mod dashboard;
pub mod domain;
pub mod gateway;
pub mod guide;
pub mod persistence;
pub mod ports;
pub mod report;
pub mod session;
pub mod shell;

pub use domain::{
    ChatMessage, ChatRole, Competitor, EvaluationResult, GroundingSource, IdeaEvaluation,
    ProfileDraft, UserProfile,
};
pub use ports::{
    ChatService, EvaluationChunk, EvaluationRequest, EvaluationService, EvaluationStream,
    PersistenceStore, PortError, PortResult, StoredState,
};
