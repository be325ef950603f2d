use std::io::Write;

use chrono::Utc;
use serde::Serialize;

use crate::assembler::{AssemblerStats, Batch, BatchAssembler};
use crate::source::TextSource;

/// Error type for batch consumers
#[derive(Debug, thiserror::Error)]
pub enum ConsumerError {
    /// Writing consumer output failed
    #[error("consumer io: {0}")]
    Io(#[from] std::io::Error),
    /// Encoding a record failed
    #[error("consumer json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Receives assembled batches; the seam where a model trainer plugs in.
pub trait BatchConsumer {
    /// Handle one batch.
    fn consume(&mut self, batch: &Batch) -> Result<(), ConsumerError>;
}

#[derive(Serialize)]
struct BatchRecord<'a> {
    index: u64,
    emitted_at: String,
    pairs: usize,
    sentences: usize,
    skipped_draws: usize,
    window_radius: usize,
    vocabulary_size: usize,
    provenance: &'a [String],
}

/// Writes one JSON object per batch, one per line.
#[derive(Debug)]
pub struct JsonLinesReport<W> {
    out: W,
    index: u64,
}

impl<W: Write> JsonLinesReport<W> {
    /// Report into `out`.
    pub fn new(out: W) -> Self {
        Self { out, index: 0 }
    }

    /// Give back the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> BatchConsumer for JsonLinesReport<W> {
    fn consume(&mut self, batch: &Batch) -> Result<(), ConsumerError> {
        let record = BatchRecord {
            index: self.index,
            emitted_at: Utc::now().to_rfc3339(),
            pairs: batch.len(),
            sentences: batch.sentences,
            skipped_draws: batch.skipped_draws,
            window_radius: batch.window_radius,
            vocabulary_size: batch.vocabulary_size,
            provenance: &batch.provenance,
        };
        serde_json::to_writer(&mut self.out, &record)?;
        writeln!(self.out)?;
        self.index += 1;
        Ok(())
    }
}

/// Assemble `batches` batches and hand each to `consumer`.
///
/// Source failures never stop the loop; a consumer error does.
pub fn drive<S, C>(
    assembler: &mut BatchAssembler<S>,
    consumer: &mut C,
    batches: usize,
    n_sources: usize,
    window_radius: usize,
) -> Result<AssemblerStats, ConsumerError>
where
    S: TextSource,
    C: BatchConsumer + ?Sized,
{
    for (i, batch) in assembler.batches(n_sources, window_radius).take(batches).enumerate() {
        consumer.consume(&batch)?;
        tracing::info!(
            batch = i,
            pairs = batch.len(),
            skipped_draws = batch.skipped_draws,
            vocabulary = batch.vocabulary_size,
            "batch consumed"
        );
    }
    Ok(assembler.stats())
}
