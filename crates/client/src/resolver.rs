//! Analysis Stream Resolver
//!
//! Drives a [`ChunkSource`] to completion: decodes frames, hands step events
//! to the caller as they arrive, and resolves with the final analysis on the
//! first `complete` event.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use compscope_core::{AnalysisResult, FrameDecoder, StepEvent, StreamEvent};

use crate::error::ClientResult;
use crate::transport::ChunkSource;

/// How a consumed stream ended.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutcome {
    /// The server sent `complete`; carries its payload.
    Completed(AnalysisResult),
    /// The body ended without a `complete` event.
    Ended,
    /// The caller cancelled the run.
    Cancelled,
}

impl StreamOutcome {
    pub fn into_result(self) -> Option<AnalysisResult> {
        match self {
            StreamOutcome::Completed(result) => Some(result),
            _ => None,
        }
    }
}

/// Consume `source` until completion, end of body, error or cancellation.
///
/// `on_step` is called once per step event, in arrival order. It is never
/// called for the completion event, nor after cancellation is observed.
pub async fn consume_event_stream<S, F>(
    source: &mut S,
    cancel: &CancellationToken,
    mut on_step: F,
) -> ClientResult<StreamOutcome>
where
    S: ChunkSource + ?Sized,
    F: FnMut(&StepEvent),
{
    let mut decoder = FrameDecoder::new();
    let mut delivered = 0usize;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            chunk = source.next_chunk() => Some(chunk),
        };

        let Some(chunk) = next else {
            source.cancel();
            info!(events = delivered, "Analysis stream cancelled");
            return Ok(StreamOutcome::Cancelled);
        };

        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                source.cancel();
                return Err(e);
            }
        };

        match chunk {
            Some(bytes) => {
                for event in decoder.feed(&bytes) {
                    if let Some(outcome) =
                        deliver(event, source, cancel, &mut on_step, &mut delivered)
                    {
                        return Ok(outcome);
                    }
                }
            }
            None => {
                if let Some(event) = decoder.finish() {
                    if let Some(outcome) =
                        deliver(event, source, cancel, &mut on_step, &mut delivered)
                    {
                        return Ok(outcome);
                    }
                }
                debug!(events = delivered, "Analysis stream ended without completion");
                return Ok(StreamOutcome::Ended);
            }
        }
    }
}

/// Route one decoded event; `Some` ends the stream.
fn deliver<S, F>(
    event: StreamEvent,
    source: &mut S,
    cancel: &CancellationToken,
    on_step: &mut F,
    delivered: &mut usize,
) -> Option<StreamOutcome>
where
    S: ChunkSource + ?Sized,
    F: FnMut(&StepEvent),
{
    if cancel.is_cancelled() {
        source.cancel();
        info!(events = *delivered, "Analysis stream cancelled");
        return Some(StreamOutcome::Cancelled);
    }

    match event {
        StreamEvent::Step(step) => {
            debug!(step = %step.step, index = ?step.index, total = ?step.total, "Analysis step");
            *delivered += 1;
            on_step(&step);
            None
        }
        StreamEvent::Complete { data } => {
            source.cancel();
            info!(events = *delivered, "Analysis stream completed");
            Some(StreamOutcome::Completed(data))
        }
        StreamEvent::Unknown => None,
    }
}
