//! Keyword extraction feeding the location filter.
//!
//! The pipeline only needs a list of candidate tokens to substring-match
//! against catalog locations, so the contract is a small injectable trait:
//! a morphological tagger can be plugged in where one is available, and the
//! built-in [`UnicodeKeywordExtractor`] covers the common case without any
//! external tooling.
//!
//! The built-in extractor:
//!
//! 1. **Unicode NFC normalization** - composed/decomposed forms of the same
//!    visual text must yield the same keywords.
//! 2. **Script-run segmentation** - alphanumeric runs split on whitespace,
//!    punctuation, and script boundaries ("Kyoto京都" → "Kyoto", "京都").
//! 3. **CJK bigrams** - unsegmented CJK runs additionally emit every
//!    contiguous two-character window, so a location name embedded in a
//!    longer phrase still matches ("京都の寺" emits "京都").
//! 4. **Length + dedup** - tokens shorter than [`MIN_KEYWORD_CHARS`] are
//!    dropped; duplicates keep first-seen order so output is deterministic.

use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

/// Tokens shorter than this never survive extraction; the location filter
/// applies the same floor to whatever extractor is injected.
pub const MIN_KEYWORD_CHARS: usize = 2;

/// Produces candidate keywords from free query text.
///
/// Implementations must be deterministic and must not change the case of
/// the input: location matching downstream is case-sensitive.
pub trait KeywordExtractor: Send + Sync {
    /// De-duplicated keywords in a stable order.
    fn extract(&self, text: &str) -> Vec<String>;
}

/// Default extractor: pure Unicode segmentation, no dictionaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeKeywordExtractor;

impl KeywordExtractor for UnicodeKeywordExtractor {
    fn extract(&self, text: &str) -> Vec<String> {
        let normalized: String = text.nfc().collect();

        let mut seen: HashSet<String> = HashSet::new();
        let mut keywords: Vec<String> = Vec::new();
        let mut push = |candidate: String| {
            if candidate.chars().count() >= MIN_KEYWORD_CHARS && seen.insert(candidate.clone()) {
                keywords.push(candidate);
            }
        };

        for run in script_runs(&normalized) {
            if run.cjk {
                // The whole run first (it may itself be a location name),
                // then the bigram windows that recover embedded names.
                push(run.text.clone());
                let chars: Vec<char> = run.text.chars().collect();
                for window in chars.windows(2) {
                    push(window.iter().collect());
                }
            } else {
                push(run.text);
            }
        }

        keywords
    }
}

struct ScriptRun {
    text: String,
    cjk: bool,
}

/// Splits text into maximal alphanumeric runs of a single script class.
fn script_runs(text: &str) -> Vec<ScriptRun> {
    let mut runs = Vec::new();
    let mut current = String::new();
    let mut current_cjk = false;

    for c in text.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                runs.push(ScriptRun {
                    text: std::mem::take(&mut current),
                    cjk: current_cjk,
                });
            }
            continue;
        }

        let cjk = is_cjk_char(c);
        if !current.is_empty() && cjk != current_cjk {
            runs.push(ScriptRun {
                text: std::mem::take(&mut current),
                cjk: current_cjk,
            });
        }
        current_cjk = cjk;
        current.push(c);
    }

    if !current.is_empty() {
        runs.push(ScriptRun {
            text: current,
            cjk: current_cjk,
        });
    }

    runs
}

/// Hiragana, Katakana, and the CJK ideograph blocks that show up in
/// Japanese place names.
fn is_cjk_char(c: char) -> bool {
    matches!(
        c as u32,
        0x3040..=0x30FF       // Hiragana + Katakana
        | 0x3400..=0x4DBF     // CJK Extension A
        | 0x4E00..=0x9FFF     // CJK Unified Ideographs
        | 0xF900..=0xFAFF     // CJK Compatibility Ideographs
        | 0xFF66..=0xFF9D     // Halfwidth Katakana
    )
}
