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

//! Word-level vocabulary for streamed CBOW training.
//!
//! Words are assigned integer IDs on first sight, up to a fixed capacity, and
//! every lookup is counted. ID `0` is reserved for padding.
//!
//! Layout:
//! - `words.rs`: text cleaning, sentence splitting, word splitting
//! - `vocab.rs`: the growing [`Vocabulary`] store and its [`OverflowPolicy`]
//! - `snapshot.rs`: bincode persistence of a vocabulary

/// Integer ID assigned to a word.
pub type TokenId = u32;

/// Reserved ID used to pad context windows. Never assigned to a word.
pub const PAD_TOKEN: TokenId = 0;

/// Word reserved by [`OverflowPolicy::Unknown`] as the substitute for words a
/// full vocabulary cannot admit.
pub const UNKNOWN_WORD: &str = "<unk>";

/// Error type for vocabulary operations
#[derive(Debug, thiserror::Error)]
pub enum VocabError {
    /// Capacity reached; the word was not admitted
    #[error("vocabulary full (capacity {capacity})")]
    Full {
        /// configured maximum number of distinct words
        capacity: u32,
    },
    /// ID is not assigned to any word
    #[error("unknown token id {0}")]
    UnknownId(TokenId),
    /// Snapshot contents violate the vocabulary invariants
    #[error("corrupt vocabulary snapshot: {0}")]
    Corrupt(String),
    /// Reading or writing a snapshot file failed
    #[error("vocabulary io: {0}")]
    Io(#[from] std::io::Error),
    /// Snapshot bytes could not be encoded or decoded
    #[error("vocabulary snapshot encoding: {0}")]
    Snapshot(#[from] bincode::Error),
}

/// Text cleaning and splitting helpers.
pub mod words;
pub use words::{clean_text, split_sentences, tokenize};

/// Growing word/ID store.
pub mod vocab;
pub use vocab::{OverflowPolicy, Vocabulary};

/// Snapshot persistence.
pub mod snapshot;
pub use snapshot::VocabSnapshot;
