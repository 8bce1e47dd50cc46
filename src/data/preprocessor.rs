// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Cleans sentence pairs before tokenisation and drops the ones
// that would only add noise to training.
//
// Why clean?
//   Spreadsheets and copy-pasted NGO documents carry:
//   - Non-breaking spaces (U+00A0) and zero-width spaces (U+200B)
//   - Byte order marks at the start of cells
//   - Tabs and carriage returns inside cells
//   - Runs of spaces from manual alignment
//
//   Left alone, "Barka  da safe" and "Barka da safe" would be two
//   different training targets.
//
// Cleaning steps (applied in order):
//   1. Map invisible / control characters to plain spaces
//   2. Collapse whitespace runs into one space, trim the ends
//   3. Optionally drop characters outside word characters,
//      whitespace, basic punctuation and the Hausa hooked letters
//      ƙ ɗ ƴ and the modifier apostrophe ʼ
//
// Pair filtering:
//   - either side shorter than `min_length` chars → dropped
//   - either side longer than `max_length` chars  → dropped
//   - exact duplicates (after cleaning)           → dropped

use std::collections::HashSet;

use regex::Regex;

use crate::domain::translation_pair::TranslationPair;
use crate::infra::config::PreprocessingSection;

/// Characters kept when `remove_special_chars` is on
const SPECIAL_CHARS_PATTERN: &str = r#"[^\w\s.,!?;:'"ƙɗƴƘƊƳʼ\-]"#;

const HAUSA_HOOKED_LETTERS: [char; 4] = ['ƙ', 'ɗ', 'ƴ', 'ʼ'];
const HAUSA_FUNCTION_WORDS: [&str; 9] = ["da", "na", "ya", "ta", "su", "mu", "ku", "shi", "ita"];

pub struct Preprocessor {
    min_length:        usize,
    max_length:        usize,
    remove_duplicates: bool,
    special_chars:     Option<Regex>,
}

impl Preprocessor {
    pub fn new(opts: &PreprocessingSection) -> Self {
        let special_chars = opts.remove_special_chars.then(|| {
            Regex::new(SPECIAL_CHARS_PATTERN).expect("special character pattern is valid")
        });
        Self {
            min_length:        opts.min_length,
            max_length:        opts.max_length,
            remove_duplicates: opts.remove_duplicates,
            special_chars,
        }
    }

    /// Clean a raw text string for downstream tokenisation.
    pub fn clean(&self, text: &str) -> String {
        let cleaned = clean_text(text);
        match &self.special_chars {
            Some(re) => clean_text(&re.replace_all(&cleaned, "")),
            None => cleaned,
        }
    }

    /// Clean both sides of every pair, then filter by length and
    /// duplicates. Order of first occurrence is preserved.
    pub fn preprocess_pairs(&self, pairs: &[TranslationPair]) -> Vec<TranslationPair> {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(pairs.len());
        let mut too_short = 0usize;
        let mut too_long  = 0usize;
        let mut duplicate = 0usize;

        for pair in pairs {
            let source = self.clean(pair.source_text());
            let target = self.clean(pair.target_text());

            let shortest = source.chars().count().min(target.chars().count());
            let longest  = source.chars().count().max(target.chars().count());
            if shortest < self.min_length.max(1) {
                too_short += 1;
                continue;
            }
            if longest > self.max_length {
                too_long += 1;
                continue;
            }

            let cleaned = pair.with_texts(source, target);
            if self.remove_duplicates && !seen.insert(cleaned.clone()) {
                duplicate += 1;
                continue;
            }
            kept.push(cleaned);
        }

        tracing::info!(
            "Preprocessed {} pairs → {} kept ({} too short, {} too long, {} duplicates)",
            pairs.len(),
            kept.len(),
            too_short,
            too_long,
            duplicate,
        );
        kept
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(&PreprocessingSection::default())
    }
}

/// Normalise whitespace and strip invisible characters.
pub fn clean_text(text: &str) -> String {
    let mapped: String = text
        .chars()
        .map(|c| match c {
            '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect();

    // split_whitespace collapses every run and trims both ends
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Heuristic: does this text read like Hausa?
///
/// True when it contains a hooked letter, or when more than 20% of
/// its words are common Hausa function words.
pub fn looks_like_hausa(text: &str) -> bool {
    let lower = text.to_lowercase();
    if lower.chars().any(|c| HAUSA_HOOKED_LETTERS.contains(&c)) {
        return true;
    }

    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return false;
    }
    let hits = words.iter().filter(|w| HAUSA_FUNCTION_WORDS.contains(*w)).count();
    hits as f64 / words.len() as f64 > 0.2
}
