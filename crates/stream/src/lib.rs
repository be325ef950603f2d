#![forbid(unsafe_code)]
#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
#![deny(missing_docs, unused_must_use)]
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

//! Streaming CBOW batch assembly.
//!
//! Text is drawn from a [`TextSource`], encoded through a growing
//! [`tokenize::Vocabulary`], expanded into context windows by [`sampler`] and
//! concatenated into aligned `contexts`/`labels` tensors for a trainer.
//!
//! Layout (important files):
//! - `source.rs`: `TextSource` trait, directory/line/scripted sources
//! - `assembler.rs`: `BatchAssembler::next_batch` and the `Batch` tensors
//! - `consumer.rs`: `BatchConsumer` seam for trainers, JSON-lines report
//! - `config.rs`: defaults, JSON file and `CBOW_*` environment overrides
//! - `bin/cbow_batches.rs`: CLI driving the whole pipeline

/// Text sources supplying cleaned sentences.
pub mod source;
pub use source::{CorpusDir, LineSource, ScriptedSource, SentenceBatch, SourceError, TextSource};

/// Batch assembly.
pub mod assembler;
pub use assembler::{AssemblerStats, Batch, BatchAssembler, Batches};

/// Batch consumers (trainer seam).
pub mod consumer;
pub use consumer::{drive, BatchConsumer, ConsumerError, JsonLinesReport};

/// Run configuration.
pub mod config;
pub use config::{from_env, Config, ConfigError};
