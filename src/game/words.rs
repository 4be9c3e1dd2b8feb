//! Word catalogue and non-repeating pair selection
//!
//! Embeds the default catalogue at build time. A pair is available while its
//! common word (case-insensitive) is absent from the session history; once
//! every pair has been used the whole catalogue becomes available again and
//! the caller restarts the history from the new pair.

use super::{ConfigurationError, WordPair};
use once_cell::sync::Lazy;
use rand::prelude::*;
use std::collections::HashSet;

/// Embedded catalogue, one `common|undercover` pair per line
static WORD_PAIRS_DATA: &str = include_str!("../../data/word_pairs.txt");

static BUILTIN: Lazy<WordBank> = Lazy::new(|| {
    WordBank::parse(WORD_PAIRS_DATA).expect("embedded word catalogue is valid")
});

/// Static, non-empty, ordered catalogue of word pairs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordBank {
    pairs: Vec<WordPair>,
}

/// Outcome of a pair draw
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub pair: WordPair,
    /// Every common word had been used; history must restart from `pair`
    pub did_reset: bool,
}

impl WordBank {
    /// Build a catalogue. Empty catalogues are rejected here so selection
    /// never has to handle them.
    pub fn new(pairs: Vec<WordPair>) -> Result<Self, ConfigurationError> {
        if pairs.is_empty() {
            return Err(ConfigurationError::EmptyWordBank);
        }
        Ok(Self { pairs })
    }

    /// The catalogue compiled into the binary
    pub fn builtin() -> &'static WordBank {
        &BUILTIN
    }

    /// Parse `common|undercover` lines. Blank lines and `#` comments are skipped.
    pub fn parse(text: &str) -> Result<Self, ConfigurationError> {
        let mut pairs = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (common, undercover) = line
                .split_once('|')
                .ok_or(ConfigurationError::MalformedWordBank { line: index + 1 })?;
            let pair = WordPair::from_input(common, undercover)
                .map_err(|_| ConfigurationError::MalformedWordBank { line: index + 1 })?;
            pairs.push(pair);
        }
        Self::new(pairs)
    }

    pub fn pairs(&self) -> &[WordPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Draw a pair whose common word is not in `history`.
    pub fn select_pair(&self, history: &[String]) -> Selection {
        self.select_pair_with_rng(history, &mut rand::rng())
    }

    /// Draw a pair using a specific RNG (for testing/seeding).
    pub fn select_pair_with_rng<R: Rng>(&self, history: &[String], rng: &mut R) -> Selection {
        let used: HashSet<String> = history.iter().map(|w| w.to_lowercase()).collect();
        let available: Vec<&WordPair> = self
            .pairs
            .iter()
            .filter(|pair| !used.contains(&pair.common_word.to_lowercase()))
            .collect();

        let (pool, did_reset) = if available.is_empty() {
            (self.pairs.iter().collect::<Vec<_>>(), true)
        } else {
            (available, false)
        };

        let pair = pool[rng.random_range(0..pool.len())].clone();
        tracing::debug!(
            available = pool.len(),
            did_reset,
            "selected word pair"
        );
        Selection { pair, did_reset }
    }
}

/// Words dealt so far in the current session chain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordHistory {
    words: Vec<String>,
}

impl WordHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append both words of a pair.
    pub fn push_pair(&mut self, pair: &WordPair) {
        self.words.push(pair.common_word.clone());
        self.words.push(pair.undercover_word.clone());
    }

    /// Record a draw: restart from the drawn pair on reset, append otherwise.
    pub fn record(&mut self, selection: &Selection) {
        if selection.did_reset {
            self.words.clear();
        }
        self.push_pair(&selection.pair);
    }

    pub fn clear(&mut self) {
        self.words.clear();
    }

    pub fn as_slice(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
