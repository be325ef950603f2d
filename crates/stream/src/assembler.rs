use ndarray::{Array1, Array2};
use serde::Serialize;
use tokenize::{TokenId, Vocabulary, PAD_TOKEN};

use crate::source::TextSource;

/// Aligned training tensors from one [`BatchAssembler::next_batch`] call.
///
/// Row `i` of `contexts` is the context window whose centre word is `labels[i]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    /// context windows, shape `(pairs, 2 * window_radius)`
    pub contexts: Array2<TokenId>,
    /// centre words, shape `(pairs,)`
    pub labels: Array1<TokenId>,
    /// sentences that produced at least one pair
    pub sentences: usize,
    /// provenance of every successful draw, in draw order
    pub provenance: Vec<String>,
    /// draws that failed and were skipped
    pub skipped_draws: usize,
    /// window radius the contexts were built with
    pub window_radius: usize,
    /// vocabulary size after encoding this batch
    pub vocabulary_size: usize,
}

impl Batch {
    /// Number of (context, label) pairs.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// `true` when the batch holds no pair.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Running totals over the lifetime of an assembler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AssemblerStats {
    /// batches assembled
    pub batches: u64,
    /// draws attempted
    pub draws: u64,
    /// draws that failed and were skipped
    pub failed_draws: u64,
    /// sentences that produced pairs
    pub sentences: u64,
    /// pairs emitted
    pub pairs: u64,
}

/// Pulls text from a source and turns it into CBOW training batches.
///
/// The vocabulary is owned by the assembler and keeps growing across calls;
/// nothing else about a batch outlives the call that built it.
#[derive(Debug)]
pub struct BatchAssembler<S> {
    source: S,
    vocab: Vocabulary,
    stats: AssemblerStats,
}

impl<S: TextSource> BatchAssembler<S> {
    /// Assemble from `source`, growing `vocab`.
    pub fn new(source: S, vocab: Vocabulary) -> Self {
        Self {
            source,
            vocab,
            stats: AssemblerStats::default(),
        }
    }

    /// Draw `n_sources` times, encode every sentence, expand each into
    /// context windows of radius `window_radius` and stack the pairs.
    ///
    /// A failed draw is logged and skipped, so the batch simply holds fewer
    /// sentences. Words the full vocabulary cannot admit are handled by its
    /// overflow policy. This call never fails.
    pub fn next_batch(&mut self, n_sources: usize, window_radius: usize) -> Batch {
        let width = window_radius.saturating_mul(2);
        let mut pairs = Vec::new();
        let mut sentences = 0usize;
        let mut provenance = Vec::with_capacity(n_sources);
        let mut skipped_draws = 0usize;

        for draw in 0..n_sources {
            self.stats.draws += 1;
            let drawn = match self.source.draw() {
                Ok(drawn) => drawn,
                Err(err) => {
                    skipped_draws += 1;
                    self.stats.failed_draws += 1;
                    tracing::warn!(draw, error = %err, "text source draw failed, skipping");
                    continue;
                }
            };
            tracing::debug!(
                provenance = %drawn.provenance,
                fetched_at = %drawn.fetched_at.to_rfc3339(),
                sentences = drawn.len(),
                "drew text"
            );
            for sentence in &drawn.sentences {
                let ids = self.vocab.encode_sentence(sentence);
                if ids.is_empty() {
                    continue;
                }
                sentences += 1;
                pairs.extend(sampler::windows(&ids, window_radius, PAD_TOKEN));
            }
            provenance.push(drawn.provenance);
        }

        let labels: Vec<TokenId> = pairs.iter().map(|p| p.label).collect();
        let flat: Vec<TokenId> = pairs.iter().flat_map(|p| p.context.iter().copied()).collect();
        let (contexts, labels) = match Array2::from_shape_vec((pairs.len(), width), flat) {
            Ok(contexts) => (contexts, Array1::from_vec(labels)),
            Err(err) => {
                tracing::error!(error = %err, pairs = pairs.len(), width, "context width mismatch, dropping pairs");
                pairs.clear();
                (Array2::from_elem((0, width), PAD_TOKEN), Array1::from_vec(Vec::new()))
            }
        };

        self.stats.batches += 1;
        self.stats.sentences += sentences as u64;
        self.stats.pairs += pairs.len() as u64;
        tracing::debug!(
            pairs = pairs.len(),
            sentences,
            skipped_draws,
            vocabulary = self.vocab.len(),
            "assembled batch"
        );

        Batch {
            contexts,
            labels,
            sentences,
            provenance,
            skipped_draws,
            window_radius,
            vocabulary_size: self.vocab.len(),
        }
    }

    /// Unbounded lazy sequence of batches; each `next` is one
    /// [`BatchAssembler::next_batch`] call.
    pub fn batches(&mut self, n_sources: usize, window_radius: usize) -> Batches<'_, S> {
        Batches {
            assembler: self,
            n_sources,
            window_radius,
        }
    }

    /// The vocabulary grown so far.
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Totals since construction.
    pub fn stats(&self) -> AssemblerStats {
        self.stats
    }

    /// The underlying text source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Take back the source and the grown vocabulary.
    pub fn into_parts(self) -> (S, Vocabulary) {
        (self.source, self.vocab)
    }
}

/// Iterator returned by [`BatchAssembler::batches`]. Never ends on its own.
#[derive(Debug)]
pub struct Batches<'a, S> {
    assembler: &'a mut BatchAssembler<S>,
    n_sources: usize,
    window_radius: usize,
}

impl<S: TextSource> Iterator for Batches<'_, S> {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        Some(self.assembler.next_batch(self.n_sources, self.window_radius))
    }
}
