// ============================================================
// Layer 4 — Parallel Corpus Loader
// ============================================================
// Reads English/Hausa sentence pairs from disk.
//
// Three file formats are understood, chosen by extension:
//
//   .json  [{"english": "...", "hausa": "..."}, ...]
//          (keys "en" / "ha" are accepted too)
//
//   .csv   header row + one pair per row; the English column is
//          the first of  english | en | source | English
//          and the Hausa column the first of
//                        hausa | ha | target | Hausa
//
//   .txt   one pair per line, separated by a tab or (if the line
//          has no tab) a pipe:   Good morning<TAB>Barka da safe
//
// A record that cannot be read (missing field, wrong column
// count, no separator) is skipped with a warning. A file that
// cannot be read at all is a FormatError. A file, or a whole
// directory, that yields zero pairs is an EmptyDatasetError.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_json::Value;

use crate::domain::{
    error::{Result, TranslatorError},
    language::Language,
    traits::PairSource,
    translation_pair::TranslationPair,
};

const ENGLISH_KEYS: [&str; 2] = ["english", "en"];
const HAUSA_KEYS:   [&str; 2] = ["hausa", "ha"];

const ENGLISH_COLUMNS: [&str; 4] = ["english", "en", "source", "English"];
const HAUSA_COLUMNS:   [&str; 4] = ["hausa", "ha", "target", "Hausa"];

/// Which side of each record becomes the source sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Direction {
    pub source: Language,
    pub target: Language,
}

impl Default for Direction {
    fn default() -> Self {
        Self { source: Language::En, target: Language::Ha }
    }
}

// ─── Format dispatch ──────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    Csv,
    Txt,
}

type ParseFn = fn(&Path, &str) -> Result<Vec<RawPair>>;

/// Extension → parser table
const FORMATS: [(&str, DataFormat, ParseFn); 3] = [
    ("json", DataFormat::Json, parse_json),
    ("csv",  DataFormat::Csv,  parse_csv),
    ("txt",  DataFormat::Txt,  parse_txt),
];

impl DataFormat {
    /// Detect the format from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        FORMATS
            .iter()
            .find(|(e, _, _)| *e == ext)
            .map(|(_, format, _)| *format)
    }

    fn parser(self) -> ParseFn {
        FORMATS
            .iter()
            .find(|(_, format, _)| *format == self)
            .map(|(_, _, parse)| *parse)
            .unwrap_or(parse_txt)
    }
}

/// English text and Hausa text, before direction is applied
struct RawPair {
    english: String,
    hausa:   String,
}

// ─── FileLoader ───────────────────────────────────────────────────────────────
/// Loads a single corpus file.
pub struct FileLoader {
    path:      PathBuf,
    direction: Direction,
}

impl FileLoader {
    pub fn new(path: impl Into<PathBuf>, direction: Direction) -> Self {
        Self { path: path.into(), direction }
    }
}

impl PairSource for FileLoader {
    fn load_pairs(&self) -> Result<Vec<TranslationPair>> {
        let pairs = load_file(&self.path, self.direction)?;
        if pairs.is_empty() {
            return Err(TranslatorError::EmptyDataset(format!(
                "'{}' contains no valid records",
                self.path.display()
            )));
        }
        Ok(pairs)
    }
}

// ─── DirectoryLoader ──────────────────────────────────────────────────────────
/// Loads every supported file in a directory (non-recursive).
pub struct DirectoryLoader {
    dir:       PathBuf,
    direction: Direction,
}

impl DirectoryLoader {
    pub fn new(dir: impl Into<PathBuf>, direction: Direction) -> Self {
        Self { dir: dir.into(), direction }
    }

    /// Supported corpus files, sorted by name so runs are reproducible
    pub fn data_files(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && DataFormat::from_path(p).is_some())
            .collect();
        files.sort();
        Ok(files)
    }
}

impl PairSource for DirectoryLoader {
    fn load_pairs(&self) -> Result<Vec<TranslationPair>> {
        let mut all = Vec::new();

        for path in self.data_files()? {
            // One bad file should not sink the whole corpus
            match load_file(&path, self.direction) {
                Ok(pairs) => {
                    tracing::info!("Loaded {} pairs from '{}'", pairs.len(), path.display());
                    all.extend(pairs);
                }
                Err(e) => tracing::warn!("Skipping '{}': {}", path.display(), e),
            }
        }

        if all.is_empty() {
            return Err(TranslatorError::EmptyDataset(format!(
                "no valid records in any file under '{}'",
                self.dir.display()
            )));
        }
        Ok(all)
    }
}

/// Parse one file into pairs. An empty result is returned as-is;
/// callers decide whether that is fatal.
pub fn load_file(path: &Path, direction: Direction) -> Result<Vec<TranslationPair>> {
    let format = DataFormat::from_path(path).ok_or_else(|| {
        TranslatorError::format(path, "unsupported file extension (expected .json, .csv or .txt)")
    })?;

    let text = fs::read_to_string(path)
        .map_err(|e| TranslatorError::format(path, format!("cannot read file: {e}")))?;

    let raw = (format.parser())(path, &text)?;

    raw.into_iter()
        .map(|r| {
            let (source, target) = match direction.source {
                Language::En => (r.english, r.hausa),
                Language::Ha => (r.hausa, r.english),
            };
            TranslationPair::new(source, target, direction.source, direction.target)
        })
        .collect()
}

// ─── Parsers ──────────────────────────────────────────────────────────────────

fn parse_json(path: &Path, text: &str) -> Result<Vec<RawPair>> {
    let doc: Value = serde_json::from_str(text)
        .map_err(|e| TranslatorError::format(path, format!("invalid JSON: {e}")))?;

    let items = doc
        .as_array()
        .ok_or_else(|| TranslatorError::format(path, "expected a top-level JSON array"))?;

    let mut pairs = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let english = first_string(item, &ENGLISH_KEYS);
        let hausa   = first_string(item, &HAUSA_KEYS);
        match (english, hausa) {
            (Some(english), Some(hausa)) => pairs.push(RawPair { english, hausa }),
            _ => tracing::warn!(
                "{}: record {} is missing an English or Hausa field, skipped",
                path.display(),
                index
            ),
        }
    }
    Ok(pairs)
}

/// First non-empty string value under any of `keys`
fn first_string(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| item.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_csv(path: &Path, text: &str) -> Result<Vec<RawPair>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| TranslatorError::format(path, format!("cannot read CSV header: {e}")))?
        .clone();

    let find_column = |candidates: &[&str]| {
        candidates
            .iter()
            .find_map(|name| headers.iter().position(|h| h.trim() == *name))
    };
    let (en_col, ha_col) = match (find_column(&ENGLISH_COLUMNS[..]), find_column(&HAUSA_COLUMNS[..])) {
        (Some(en), Some(ha)) => (en, ha),
        _ => {
            return Err(TranslatorError::format(
                path,
                "could not find English and Hausa columns in the header",
            ))
        }
    };

    let mut pairs = Vec::new();
    for (index, record) in reader.records().enumerate() {
        // +2: one for the header, one for 1-based line numbers
        let line = index + 2;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("{}:{}: unreadable row ({}), skipped", path.display(), line, e);
                continue;
            }
        };
        if record.len() != headers.len() {
            tracing::warn!(
                "{}:{}: expected {} columns, found {}, skipped",
                path.display(),
                line,
                headers.len(),
                record.len()
            );
            continue;
        }
        let english = record.get(en_col).map(str::trim).unwrap_or_default();
        let hausa   = record.get(ha_col).map(str::trim).unwrap_or_default();
        if is_blank(english) || is_blank(hausa) {
            tracing::warn!("{}:{}: empty cell, skipped", path.display(), line);
            continue;
        }
        pairs.push(RawPair { english: english.to_string(), hausa: hausa.to_string() });
    }
    Ok(pairs)
}

/// Spreadsheet exports write missing cells as "nan"
fn is_blank(cell: &str) -> bool {
    cell.is_empty() || cell.eq_ignore_ascii_case("nan")
}

fn parse_txt(path: &Path, text: &str) -> Result<Vec<RawPair>> {
    let mut pairs = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parts: Option<(&str, &str)> = line
            .split_once('\t')
            .or_else(|| line.split_once('|'));
        match parts.map(|(a, b)| (a.trim(), b.trim())) {
            Some((english, hausa)) if !english.is_empty() && !hausa.is_empty() => {
                pairs.push(RawPair { english: english.to_string(), hausa: hausa.to_string() });
            }
            _ => tracing::warn!(
                "{}:{}: no tab- or pipe-separated pair, skipped",
                path.display(),
                index + 1
            ),
        }
    }
    Ok(pairs)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_format_detection_by_extension() {
        assert_eq!(DataFormat::from_path(Path::new("a/b.JSON")), Some(DataFormat::Json));
        assert_eq!(DataFormat::from_path(Path::new("pairs.csv")), Some(DataFormat::Csv));
        assert_eq!(DataFormat::from_path(Path::new("pairs.txt")), Some(DataFormat::Txt));
        assert_eq!(DataFormat::from_path(Path::new("pairs.docx")), None);
        assert_eq!(DataFormat::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_json_skips_incomplete_records() {
        let dir  = TempDir::new().unwrap();
        let path = write(&dir, "d.json", r#"[
            {"english": "Hello, how are you?", "hausa": "Sannu, yaya kuke?"},
            {"en": "Good morning", "ha": "Barka da safe"},
            {"english": "Only English"},
            "not an object"
        ]"#);
        let pairs = load_file(&path, Direction::default()).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].source_text(), "Hello, how are you?");
        assert_eq!(pairs[1].target_text(), "Barka da safe");
    }

    #[test]
    fn test_invalid_json_is_format_error() {
        let dir  = TempDir::new().unwrap();
        let path = write(&dir, "d.json", "{ not json");
        assert!(matches!(
            load_file(&path, Direction::default()),
            Err(TranslatorError::Format { .. })
        ));
    }

    #[test]
    fn test_csv_detects_columns_and_skips_bad_rows() {
        let dir  = TempDir::new().unwrap();
        let path = write(&dir, "d.csv", "id,English,Hausa\n\
            1,Thank you very much,Na gode sosai\n\
            2,too,many,columns\n\
            3,I am fine,nan\n\
            4,\"Please, help us\",Don Allah ku taimake mu\n");
        let pairs = load_file(&path, Direction::default()).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1].source_text(), "Please, help us");
    }

    #[test]
    fn test_csv_without_language_columns_is_format_error() {
        let dir  = TempDir::new().unwrap();
        let path = write(&dir, "d.csv", "a,b\nx,y\n");
        assert!(matches!(
            load_file(&path, Direction::default()),
            Err(TranslatorError::Format { .. })
        ));
    }

    #[test]
    fn test_txt_accepts_tab_and_pipe() {
        let dir  = TempDir::new().unwrap();
        let path = write(&dir, "d.txt", "Good morning\tBarka da safe\n\
            \n\
            I am fine | Ina lafiya\n\
            no separator here\n");
        let pairs = load_file(&path, Direction::default()).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1].source_text(), "I am fine");
        assert_eq!(pairs[1].target_text(), "Ina lafiya");
    }

    #[test]
    fn test_hausa_source_direction_swaps_sides() {
        let dir  = TempDir::new().unwrap();
        let path = write(&dir, "d.txt", "Good morning\tBarka da safe\n");
        let direction = Direction { source: Language::Ha, target: Language::En };
        let pairs = load_file(&path, direction).unwrap();
        assert_eq!(pairs[0].source_text(), "Barka da safe");
        assert_eq!(pairs[0].source_lang(), Language::Ha);
    }

    #[test]
    fn test_file_with_no_valid_records_is_empty_dataset() {
        let dir  = TempDir::new().unwrap();
        let path = write(&dir, "d.txt", "just words\nmore words\n");
        let err  = FileLoader::new(&path, Direction::default()).load_pairs().unwrap_err();
        assert!(matches!(err, TranslatorError::EmptyDataset(_)));
    }

    #[test]
    fn test_unsupported_extension_is_format_error() {
        let dir  = TempDir::new().unwrap();
        let path = write(&dir, "d.xml", "<pairs/>");
        assert!(matches!(
            load_file(&path, Direction::default()),
            Err(TranslatorError::Format { .. })
        ));
    }

    #[test]
    fn test_directory_skips_bad_files_and_keeps_good_ones() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.json", "broken");
        write(&dir, "b.txt", "Good morning\tBarka da safe\n");
        write(&dir, "notes.md", "ignored");
        let pairs = DirectoryLoader::new(dir.path(), Direction::default())
            .load_pairs()
            .unwrap();
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn test_empty_directory_is_empty_dataset() {
        let dir = TempDir::new().unwrap();
        let err = DirectoryLoader::new(dir.path(), Direction::default())
            .load_pairs()
            .unwrap_err();
        assert!(matches!(err, TranslatorError::EmptyDataset(_)));
    }

    #[test]
    fn test_loaded_pairs_never_share_a_language() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.json", r#"[{"english": "Good morning", "hausa": "Barka da safe"}]"#);
        write(&dir, "b.csv", "en,ha\nI am fine,Ina lafiya\n");
        write(&dir, "c.txt", "Please help us|Don Allah ku taimake mu\n");
        for direction in [
            Direction::default(),
            Direction { source: Language::Ha, target: Language::En },
        ] {
            let pairs = DirectoryLoader::new(dir.path(), direction).load_pairs().unwrap();
            assert_eq!(pairs.len(), 3);
            assert!(pairs.iter().all(|p| p.source_lang() != p.target_lang()));
        }
    }
}
