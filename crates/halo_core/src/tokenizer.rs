//! Committed text → glyph tokens.
//!
//! Word-like runs (`[A-Za-z0-9]+` with internal apostrophes, Latin letters
//! with diacritics included) stay whole; everything else, including CJK,
//! emoji and punctuation, is split into grapheme clusters. Whitespace never
//! produces a token.

use unicode_segmentation::UnicodeSegmentation;

use crate::config::{TokenGranularity, TokenizerConfig};
use crate::error::{HaloError, HaloResult};

/// Splits committed text into display tokens.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    config: TokenizerConfig,
}

impl Tokenizer {
    /// Creates a tokenizer.
    #[must_use]
    pub fn new(config: TokenizerConfig) -> Self {
        Self { config }
    }

    /// Returns the active granularity.
    #[must_use]
    pub fn granularity(&self) -> TokenGranularity {
        self.config.granularity
    }

    /// Splits `text` into tokens. Blank input yields an empty sequence.
    #[must_use]
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        for segment in text.split_word_bounds() {
            if segment.chars().all(char::is_whitespace) {
                continue;
            }
            match self.config.granularity {
                TokenGranularity::Words => push_words(segment, &mut tokens),
                TokenGranularity::Graphemes => push_graphemes(segment, &mut tokens),
            }
        }
        tokens
    }

    /// Tokenizes a commit, rejecting input no glyph can be built from.
    ///
    /// Blank text is accepted whatever its length. Otherwise the whole
    /// commit is refused when it is longer than the configured maximum or
    /// when any token consists only of control characters.
    pub fn prepare(&self, text: &str) -> HaloResult<Vec<String>> {
        if text.chars().all(char::is_whitespace) {
            return Ok(Vec::new());
        }
        let chars = text.chars().count();
        if chars > self.config.max_commit_chars {
            return Err(HaloError::CommitTooLong {
                chars,
                max: self.config.max_commit_chars,
            });
        }

        let tokens = self.tokenize(text);
        if let Some(bad) = tokens.iter().find(|t| t.chars().all(char::is_control)) {
            return Err(HaloError::InvalidToken(bad.clone()));
        }
        Ok(tokens)
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(TokenizerConfig::default())
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || (c.is_alphabetic() && ('\u{00C0}'..='\u{024F}').contains(&c))
}

fn is_apostrophe(c: char) -> bool {
    c == '\'' || c == '\u{2019}'
}

/// A cluster whose base character is a word character (`e` + U+0301 counts).
fn is_word_cluster(cluster: &str) -> bool {
    cluster.chars().next().is_some_and(is_word_char)
}

fn is_apostrophe_cluster(cluster: &str) -> bool {
    let mut chars = cluster.chars();
    chars.next().is_some_and(is_apostrophe) && chars.next().is_none()
}

fn push_graphemes(segment: &str, tokens: &mut Vec<String>) {
    tokens.extend(
        segment
            .graphemes(true)
            .filter(|g| !g.chars().all(char::is_whitespace))
            .map(str::to_string),
    );
}

/// Longest `word ( apostrophe word )*` runs stay whole; every other cluster
/// becomes its own token.
fn push_words(segment: &str, tokens: &mut Vec<String>) {
    let clusters: Vec<(usize, &str)> = segment.grapheme_indices(true).collect();
    let byte_end = |i: usize| clusters.get(i).map_or(segment.len(), |&(at, _)| at);

    let mut i = 0;
    while i < clusters.len() {
        let (start, cluster) = clusters[i];
        if !is_word_cluster(cluster) {
            if !cluster.chars().all(char::is_whitespace) {
                tokens.push(cluster.to_string());
            }
            i += 1;
            continue;
        }

        let mut end = i;
        loop {
            while end < clusters.len() && is_word_cluster(clusters[end].1) {
                end += 1;
            }
            let joined = end + 1 < clusters.len()
                && is_apostrophe_cluster(clusters[end].1)
                && is_word_cluster(clusters[end + 1].1);
            if !joined {
                break;
            }
            end += 1;
        }
        tokens.push(segment[start..byte_end(end)].to_string());
        i = end;
    }
}
