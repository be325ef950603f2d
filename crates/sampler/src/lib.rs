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

//! Context-window pair generation for CBOW training.
//!
//! Contract: for a sentence of `n` token IDs and window radius `r`, exactly `n`
//! pairs are produced. Each context holds the up-to-`r` neighbours on either
//! side of the centre (sentence order, centre excluded, clipped at the
//! sentence boundaries) right-padded to length `2r`; the label is the centre.
//! Identical input -> identical output.

use tokenize::TokenId;

/// One training example: neighbouring IDs and the centre word they predict.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContextPair {
    /// neighbours of the centre, padded to `2 * radius`
    pub context: Vec<TokenId>,
    /// ID of the centre word
    pub label: TokenId,
}

/// Lazy iterator over the context pairs of one sentence.
///
/// Created by [`windows`].
#[derive(Clone, Debug)]
pub struct Windows<'a> {
    sentence: &'a [TokenId],
    radius: usize,
    pad: TokenId,
    pos: usize,
}

impl Iterator for Windows<'_> {
    type Item = ContextPair;

    fn next(&mut self) -> Option<ContextPair> {
        let label = *self.sentence.get(self.pos)?;
        let centre = self.pos;
        self.pos += 1;

        let width = self.radius.saturating_mul(2);
        let lo = centre.saturating_sub(self.radius);
        let hi = centre.saturating_add(self.radius).saturating_add(1).min(self.sentence.len());
        let mut context = Vec::with_capacity(width);
        context.extend(
            self.sentence
                .iter()
                .enumerate()
                .take(hi)
                .skip(lo)
                .filter(|&(j, _)| j != centre)
                .map(|(_, &id)| id),
        );
        context.resize(width, self.pad);
        Some(ContextPair { context, label })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.sentence.len().saturating_sub(self.pos);
        (left, Some(left))
    }
}

impl ExactSizeIterator for Windows<'_> {}

/// Iterate the context pairs of `sentence` without materialising them.
pub fn windows(sentence: &[TokenId], window_radius: usize, pad_token: TokenId) -> Windows<'_> {
    Windows {
        sentence,
        radius: window_radius,
        pad: pad_token,
        pos: 0,
    }
}

/// All context pairs of one sentence, in centre order.
///
/// Empty sentences give no pairs; a one-word sentence gives a single pair
/// whose context is all padding.
pub fn generate(sentence: &[TokenId], window_radius: usize, pad_token: TokenId) -> Vec<ContextPair> {
    windows(sentence, window_radius, pad_token).collect()
}

/// Context pairs of every sentence, concatenated in sentence order.
pub fn generate_corpus<S: AsRef<[TokenId]>>(
    sentences: &[S],
    window_radius: usize,
    pad_token: TokenId,
) -> Vec<ContextPair> {
    sentences
        .iter()
        .flat_map(|s| windows(s.as_ref(), window_radius, pad_token))
        .collect()
}
