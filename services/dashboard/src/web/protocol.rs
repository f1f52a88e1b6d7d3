//! services/dashboard/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the
//! dashboard server for streaming idea evaluations.

use flareonix_core::domain::IdeaEvaluation;
use serde::{Deserialize, Serialize};

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Submits an idea for evaluation. Ignored while another evaluation streams.
    Submit { idea: String },

    /// Cancels the evaluation that is currently streaming.
    Cancel,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The submission was accepted and the session is now streaming.
    EvaluationStarted,

    /// One fragment of the report, to be appended to what is displayed.
    Chunk { text: String },

    /// The report finished and was saved to the history.
    Completed { evaluation: IdeaEvaluation },

    /// The evaluation failed; nothing was saved.
    Failed { message: String },

    /// The evaluation was cancelled; nothing was saved.
    Cancelled,

    /// A client message was understood but had no effect.
    Ignored { reason: String },

    /// The client sent something that could not be understood.
    Error { message: String },
}
