use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{TokenId, VocabError, PAD_TOKEN, UNKNOWN_WORD};

/// What the sentence encoders do with a word a full vocabulary cannot admit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Drop the word from the encoded sentence.
    #[default]
    Skip,
    /// Replace the word with the reserved [`UNKNOWN_WORD`] (always ID 1).
    Unknown,
}

impl FromStr for OverflowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(OverflowPolicy::Skip),
            "unknown" | "unk" => Ok(OverflowPolicy::Unknown),
            other => Err(format!("unknown overflow policy {other:?} (expected skip or unknown)")),
        }
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::Skip => f.write_str("skip"),
            OverflowPolicy::Unknown => f.write_str("unknown"),
        }
    }
}

/// Growing bidirectional word/ID mapping with per-word occurrence counts.
///
/// IDs are handed out sequentially from 1; [`PAD_TOKEN`] is never assigned.
/// A new word is admitted while `next_id <= capacity`, so at most `capacity`
/// distinct words (IDs `1..=capacity`) are ever stored. Once assigned, a
/// word keeps its ID for the lifetime of the store.
#[derive(Clone, Debug)]
pub struct Vocabulary {
    pub(crate) word_to_id: HashMap<String, TokenId>,
    /// word for ID `i` lives at index `i - 1`
    pub(crate) id_to_word: Vec<String>,
    pub(crate) counts: HashMap<String, u64>,
    pub(crate) next_id: u64,
    pub(crate) capacity: u32,
    pub(crate) overflow: OverflowPolicy,
    pub(crate) full_reported: bool,
    pub(crate) rejected: u64,
}

impl Vocabulary {
    /// Empty vocabulary admitting up to `capacity` words, dropping overflow words.
    pub fn new(capacity: u32) -> Self {
        Self {
            word_to_id: HashMap::new(),
            id_to_word: Vec::new(),
            counts: HashMap::new(),
            next_id: 1,
            capacity,
            overflow: OverflowPolicy::Skip,
            full_reported: false,
            rejected: 0,
        }
    }

    /// Empty vocabulary with an explicit overflow policy.
    ///
    /// [`OverflowPolicy::Unknown`] reserves [`UNKNOWN_WORD`] as ID 1, which
    /// takes one slot of `capacity`; a zero capacity is rejected for it.
    pub fn with_overflow(capacity: u32, overflow: OverflowPolicy) -> Result<Self, VocabError> {
        let mut vocab = Self::new(capacity);
        vocab.overflow = overflow;
        if overflow == OverflowPolicy::Unknown {
            vocab.admit(UNKNOWN_WORD)?;
        }
        Ok(vocab)
    }

    /// Return the ID of `word`, assigning the next free ID on first sight.
    ///
    /// Every successful call (new or existing word) increments the word's
    /// count. Fails with [`VocabError::Full`] when the word is new and the
    /// capacity is exhausted; the store is left unchanged apart from the
    /// rejection counter. The first such failure is logged once.
    pub fn lookup_or_insert(&mut self, word: &str) -> Result<TokenId, VocabError> {
        let id = match self.word_to_id.get(word) {
            Some(&id) => id,
            None => self.admit(word)?,
        };
        self.bump(word);
        Ok(id)
    }

    /// Encode one sentence in order, applying the overflow policy to words
    /// that cannot be admitted.
    pub fn encode_sentence<S: AsRef<str>>(&mut self, words: &[S]) -> Vec<TokenId> {
        let mut ids = Vec::with_capacity(words.len());
        for word in words {
            match self.lookup_or_insert(word.as_ref()) {
                Ok(id) => ids.push(id),
                Err(_) => {
                    if let Some(id) = self.substitute() {
                        ids.push(id);
                    }
                }
            }
        }
        ids
    }

    /// Encode every sentence of a corpus with [`Vocabulary::encode_sentence`].
    pub fn encode_corpus<S: AsRef<str>>(&mut self, sentences: &[Vec<S>]) -> Vec<Vec<TokenId>> {
        sentences.iter().map(|s| self.encode_sentence(s)).collect()
    }

    /// Snapshot of the known words.
    pub fn vocabulary(&self) -> BTreeSet<String> {
        self.id_to_word.iter().cloned().collect()
    }

    /// ID of `word` without counting the lookup.
    pub fn id(&self, word: &str) -> Option<TokenId> {
        self.word_to_id.get(word).copied()
    }

    /// Word assigned to `id`.
    pub fn word(&self, id: TokenId) -> Option<&str> {
        let index = usize::try_from(id.checked_sub(1)?).ok()?;
        self.id_to_word.get(index).map(String::as_str)
    }

    /// Occurrence count of `word`; unseen words count zero.
    pub fn count(&self, word: &str) -> u64 {
        self.counts.get(word).copied().unwrap_or(0)
    }

    /// Snapshot of all occurrence counts.
    pub fn counts(&self) -> HashMap<String, u64> {
        self.counts.clone()
    }

    /// The `n` most frequent words, ties broken alphabetically.
    pub fn most_common(&self, n: usize) -> Vec<(String, u64)> {
        let mut pairs: Vec<(String, u64)> = self.counts.iter().map(|(w, c)| (w.clone(), *c)).collect();
        pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        pairs.truncate(n);
        pairs
    }

    /// Map IDs back to words. Pad tokens are dropped.
    pub fn decode(&self, ids: &[TokenId]) -> Result<Vec<&str>, VocabError> {
        ids.iter()
            .filter(|&&id| id != PAD_TOKEN)
            .map(|&id| self.word(id).ok_or(VocabError::UnknownId(id)))
            .collect()
    }

    /// Number of distinct words stored.
    pub fn len(&self) -> usize {
        self.id_to_word.len()
    }

    /// `true` when no word has been stored.
    pub fn is_empty(&self) -> bool {
        self.id_to_word.is_empty()
    }

    /// Maximum number of distinct words.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// ID the next admitted word will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// `true` once no further word can be admitted.
    pub fn is_full(&self) -> bool {
        self.next_id > u64::from(self.capacity)
    }

    /// Number of insertions refused because the store was full.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Overflow policy used by the sentence encoders.
    pub fn overflow(&self) -> OverflowPolicy {
        self.overflow
    }

    fn admit(&mut self, word: &str) -> Result<TokenId, VocabError> {
        if self.is_full() {
            return Err(self.reject());
        }
        let id = match TokenId::try_from(self.next_id) {
            Ok(id) => id,
            Err(_) => return Err(self.reject()),
        };
        self.word_to_id.insert(word.to_owned(), id);
        self.id_to_word.push(word.to_owned());
        self.next_id += 1;
        Ok(id)
    }

    fn reject(&mut self) -> VocabError {
        self.rejected += 1;
        if !self.full_reported {
            self.full_reported = true;
            tracing::warn!(
                capacity = self.capacity,
                "vocabulary full, new words are no longer admitted"
            );
        }
        VocabError::Full { capacity: self.capacity }
    }

    fn bump(&mut self, word: &str) {
        match self.counts.get_mut(word) {
            Some(count) => *count += 1,
            None => {
                self.counts.insert(word.to_owned(), 1);
            }
        }
    }

    fn substitute(&mut self) -> Option<TokenId> {
        match self.overflow {
            OverflowPolicy::Skip => None,
            OverflowPolicy::Unknown => {
                let id = self.id(UNKNOWN_WORD)?;
                self.bump(UNKNOWN_WORD);
                Some(id)
            }
        }
    }
}
