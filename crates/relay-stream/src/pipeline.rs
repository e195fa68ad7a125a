//! Drives one response from chunk pull to transport

use crate::aggregator::ChunkAggregator;
use crate::encoder::FrameEncoder;
use crate::render::FragmentRenderer;
use crate::runtime::ChunkStream;
use crate::session::StreamSession;
use crate::transport::TransportWriter;
use async_trait::async_trait;
use futures_util::StreamExt;
use relay_common::{RelayError, truncate_string};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// What one finished stream produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub stream_id: Option<String>,
    pub answer_text: String,
    /// Chunks pulled from the runtime
    pub chunks: u64,
    /// Chunks that produced no frame
    pub skipped: u64,
    pub frames: u64,
    pub bytes: u64,
}

/// How a pipeline run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The chunk sequence was exhausted
    Completed(StreamSummary),
    /// A write failed; nothing more was pulled
    Disconnected,
    /// The runtime or the renderer failed; frames already written stand
    Failed(String),
}

/// Called once a stream completed normally, e.g. to persist the final message
#[async_trait]
pub trait CompletionHook: Send + Sync {
    async fn on_complete(&self, summary: &StreamSummary) -> anyhow::Result<()>;
}

/// Hook that only logs the summary
#[derive(Debug, Clone, Default)]
pub struct LogCompletion;

#[async_trait]
impl CompletionHook for LogCompletion {
    async fn on_complete(&self, summary: &StreamSummary) -> anyhow::Result<()> {
        info!(
            "Stream {} complete: {} chunks ({} skipped), {} frames, {} bytes; answer: {}",
            summary.stream_id.as_deref().unwrap_or("-"),
            summary.chunks,
            summary.skipped,
            summary.frames,
            summary.bytes,
            truncate_string(&summary.answer_text, 80)
        );
        Ok(())
    }
}

/// Streaming state machine for a single response
pub struct StreamPipeline {
    aggregator: ChunkAggregator,
    encoder: FrameEncoder,
}

impl StreamPipeline {
    pub fn new(default_target_id: impl Into<String>, renderer: Arc<dyn FragmentRenderer>) -> Self {
        Self {
            aggregator: ChunkAggregator::new(StreamSession::new(default_target_id)),
            encoder: FrameEncoder::new(renderer),
        }
    }

    /// Pull every chunk and push the resulting frames, in order.
    pub async fn run(mut self, mut chunks: ChunkStream, mut writer: TransportWriter) -> PipelineOutcome {
        let mut pulled = 0u64;
        let mut skipped = 0u64;

        while let Some(item) = chunks.next().await {
            let chunk = match item {
                Ok(chunk) => chunk,
                Err(e) => {
                    error!("Upstream error after {} chunk(s): {:#}", pulled, e);
                    return PipelineOutcome::Failed(e.to_string());
                }
            };
            pulled += 1;

            let Some(applied) = self.aggregator.apply(&chunk) else {
                skipped += 1;
                continue;
            };

            let frames = match self.encoder.encode(self.aggregator.session_mut(), applied) {
                Ok(frames) => frames,
                Err(e) => {
                    error!("Failed to render frames for {} chunk: {}", chunk.kind(), e);
                    return PipelineOutcome::Failed(e.to_string());
                }
            };

            for frame in &frames {
                match writer.write(frame).await {
                    Ok(()) => {}
                    Err(RelayError::Disconnected) => {
                        info!(
                            "Client disconnected after {} frame(s); releasing upstream",
                            writer.frames_written()
                        );
                        drop(chunks);
                        return PipelineOutcome::Disconnected;
                    }
                    Err(e) => {
                        warn!("Transport write failed: {}", e);
                        return PipelineOutcome::Failed(e.to_string());
                    }
                }
            }
        }

        let session = self.aggregator.session();
        debug!("Chunk sequence exhausted after {} chunk(s)", pulled);
        PipelineOutcome::Completed(StreamSummary {
            stream_id: session.stream_id().map(str::to_string),
            answer_text: session.answer_text().to_string(),
            chunks: pulled,
            skipped,
            frames: writer.frames_written(),
            bytes: writer.bytes_written(),
        })
    }

    /// Run on its own task and call `hook` when the stream completes.
    pub fn spawn(
        self,
        chunks: ChunkStream,
        writer: TransportWriter,
        hook: Arc<dyn CompletionHook>,
    ) -> JoinHandle<PipelineOutcome> {
        tokio::spawn(async move {
            let outcome = self.run(chunks, writer).await;
            if let PipelineOutcome::Completed(summary) = &outcome {
                if let Err(e) = hook.on_complete(summary).await {
                    error!("Completion hook failed: {:#}", e);
                }
            }
            outcome
        })
    }
}
