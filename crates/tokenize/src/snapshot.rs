use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{OverflowPolicy, TokenId, VocabError, Vocabulary, PAD_TOKEN, UNKNOWN_WORD};

/// Serializable image of a [`Vocabulary`]: both mapping tables plus counts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VocabSnapshot {
    /// maximum number of distinct words
    pub capacity: u32,
    /// ID the next admitted word receives
    pub next_id: u64,
    /// overflow policy of the encoders
    pub overflow: OverflowPolicy,
    /// assigned words in ID order
    pub words: Vec<(TokenId, String)>,
    /// occurrence counts
    pub counts: Vec<(String, u64)>,
}

impl Vocabulary {
    /// Capture the current state.
    pub fn to_snapshot(&self) -> VocabSnapshot {
        let words = self
            .id_to_word
            .iter()
            .zip(1..)
            .map(|(w, id)| (id, w.clone()))
            .collect();
        let mut counts: Vec<(String, u64)> =
            self.counts.iter().map(|(w, c)| (w.clone(), *c)).collect();
        counts.sort();
        VocabSnapshot {
            capacity: self.capacity,
            next_id: self.next_id,
            overflow: self.overflow,
            words,
            counts,
        }
    }

    /// Rebuild a vocabulary, checking that the snapshot is one a store could
    /// have produced: IDs dense from 1, no pad or duplicate words, at most
    /// `capacity` words, `next_id` right after the last ID, counts only for
    /// known words.
    pub fn from_snapshot(snapshot: VocabSnapshot) -> Result<Self, VocabError> {
        let VocabSnapshot { capacity, next_id, overflow, words, counts } = snapshot;
        if words.len() > capacity as usize {
            return Err(VocabError::Corrupt(format!(
                "{} words exceed capacity {capacity}",
                words.len()
            )));
        }
        let mut vocab = Vocabulary::new(capacity);
        vocab.overflow = overflow;
        for (expected, (id, word)) in (1..).zip(words) {
            if id == PAD_TOKEN || id != expected {
                return Err(VocabError::Corrupt(format!("id {id} out of sequence, expected {expected}")));
            }
            if vocab.word_to_id.contains_key(&word) {
                return Err(VocabError::Corrupt(format!("duplicate word {word:?}")));
            }
            vocab.word_to_id.insert(word.clone(), id);
            vocab.id_to_word.push(word);
        }
        vocab.next_id = vocab.id_to_word.len() as u64 + 1;
        if next_id != vocab.next_id {
            return Err(VocabError::Corrupt(format!(
                "next_id {next_id} does not follow {} words",
                vocab.id_to_word.len()
            )));
        }
        if overflow == OverflowPolicy::Unknown && vocab.word(1) != Some(UNKNOWN_WORD) {
            return Err(VocabError::Corrupt(format!("id 1 must be {UNKNOWN_WORD:?}")));
        }
        let mut table = HashMap::with_capacity(counts.len());
        for (word, count) in counts {
            if !vocab.word_to_id.contains_key(&word) {
                return Err(VocabError::Corrupt(format!("count for unknown word {word:?}")));
            }
            table.insert(word, count);
        }
        vocab.counts = table;
        Ok(vocab)
    }

    /// Write a bincode snapshot to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), VocabError> {
        let bytes = bincode::serialize(&self.to_snapshot())?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Read a bincode snapshot written by [`Vocabulary::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, VocabError> {
        let bytes = std::fs::read(path)?;
        let snapshot: VocabSnapshot = bincode::deserialize(&bytes)?;
        Self::from_snapshot(snapshot)
    }
}
