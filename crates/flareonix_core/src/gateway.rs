//! crates/flareonix_core/src/gateway.rs
//!
//! Consumes a streamed evaluation from an `EvaluationService`, forwarding every
//! fragment to the caller as it arrives and accumulating the full report.

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::GroundingSource;
use crate::ports::{EvaluationRequest, EvaluationService, PortError, PortResult};

/// The accumulated output of one streamed evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationOutput {
    pub full_text: String,
    pub sources: Vec<GroundingSource>,
}

/// Runs one evaluation request to completion, failure, or cancellation.
///
/// `on_chunk` is called synchronously with each text fragment before the next
/// fragment is polled. The most recent non-empty citation set replaces any
/// earlier one.
pub async fn evaluate<F>(
    service: &dyn EvaluationService,
    request: &EvaluationRequest,
    cancel: &CancellationToken,
    mut on_chunk: F,
) -> PortResult<EvaluationOutput>
where
    F: FnMut(&str) + Send,
{
    let mut stream = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(PortError::Cancelled),
        opened = service.stream_evaluation(request) => opened?,
    };

    let mut output = EvaluationOutput::default();
    let mut fragments = 0usize;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Evaluation cancelled after {} fragments.", fragments);
                return Err(PortError::Cancelled);
            }
            next = stream.next() => next,
        };

        let Some(chunk) = next else { break };
        let chunk = chunk?;
        fragments += 1;

        if !chunk.text.is_empty() {
            output.full_text.push_str(&chunk.text);
            on_chunk(&chunk.text);
        }

        if let Some(sources) = chunk.sources {
            if !sources.is_empty() {
                debug!("Received {} grounding sources.", sources.len());
                output.sources = sources;
            }
        }
    }

    info!(
        "Evaluation stream finished: {} fragments, {} characters.",
        fragments,
        output.full_text.len()
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserProfile;
    use crate::ports::{EvaluationChunk, MockEvaluationService};
    use futures::stream;

    fn request() -> EvaluationRequest {
        EvaluationRequest {
            idea: "A marketplace for used lab equipment".into(),
            profile: UserProfile::from_draft(Default::default()),
        }
    }

    fn source(title: &str) -> GroundingSource {
        GroundingSource {
            title: title.into(),
            uri: format!("https://example.com/{title}"),
        }
    }

    fn text(t: &str) -> PortResult<EvaluationChunk> {
        Ok(EvaluationChunk { text: t.into(), sources: None })
    }

    #[tokio::test]
    async fn forwards_chunks_and_keeps_last_non_empty_sources() {
        let mut service = MockEvaluationService::new();
        service.expect_stream_evaluation().times(1).returning(|_| {
            Ok(Box::pin(stream::iter(vec![
                text("Hello "),
                Ok(EvaluationChunk {
                    text: "world".into(),
                    sources: Some(vec![source("a")]),
                }),
                Ok(EvaluationChunk {
                    text: String::new(),
                    sources: Some(vec![source("b"), source("c")]),
                }),
                Ok(EvaluationChunk {
                    text: "!".into(),
                    sources: Some(vec![]),
                }),
            ])))
        });

        let mut seen = Vec::new();
        let output = evaluate(&service, &request(), &CancellationToken::new(), |c| {
            seen.push(c.to_string())
        })
        .await
        .unwrap();

        assert_eq!(seen, vec!["Hello ", "world", "!"]);
        assert_eq!(output.full_text, "Hello world!");
        assert_eq!(output.sources, vec![source("b"), source("c")]);
    }

    #[tokio::test]
    async fn stream_error_aborts_after_delivering_earlier_chunks() {
        let mut service = MockEvaluationService::new();
        service.expect_stream_evaluation().returning(|_| {
            Ok(Box::pin(stream::iter(vec![
                text("partial"),
                Err(PortError::Transport("connection reset".into())),
                text("never"),
            ])))
        });

        let mut seen = String::new();
        let result = evaluate(&service, &request(), &CancellationToken::new(), |c| {
            seen.push_str(c)
        })
        .await;

        assert_eq!(result, Err(PortError::Transport("connection reset".into())));
        assert_eq!(seen, "partial");
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_reading() {
        let mut service = MockEvaluationService::new();
        service
            .expect_stream_evaluation()
            .returning(|_| Ok(Box::pin(stream::pending::<PortResult<EvaluationChunk>>())));

        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = evaluate(&service, &request(), &cancel, |_| {}).await;
        assert_eq!(result, Err(PortError::Cancelled));
    }

    #[tokio::test]
    async fn cancelling_mid_stream_aborts() {
        let mut service = MockEvaluationService::new();
        service.expect_stream_evaluation().returning(|_| {
            Ok(Box::pin(
                stream::iter(vec![text("first")])
                    .chain(stream::pending::<PortResult<EvaluationChunk>>()),
            ))
        });

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let result = evaluate(&service, &request(), &cancel, move |_| trigger.cancel()).await;

        assert_eq!(result, Err(PortError::Cancelled));
    }
}
