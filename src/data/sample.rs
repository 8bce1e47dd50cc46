// ============================================================
// Layer 4 — Built-in Sample Corpus
// ============================================================
// Fifteen everyday NGO phrases, used by `train --create-sample`
// and whenever the data directory holds no corpus files, so the
// whole pipeline can be exercised on a fresh checkout.

use std::{fs, path::Path};

use serde_json::json;

use crate::domain::error::Result;

/// File name the sample corpus is written under inside the data dir
pub const SAMPLE_FILE_NAME: &str = "sample_data.json";

pub const SAMPLE_PAIRS: [(&str, &str); 15] = [
    ("Hello, how are you?",            "Sannu, yaya kuke?"),
    ("Good morning",                   "Barka da safe"),
    ("Thank you very much",            "Na gode sosai"),
    ("What is your name?",             "Menene sunanka?"),
    ("I am fine",                      "Ina lafiya"),
    ("Welcome to our community",       "Barka da zuwa ga al'ummarmu"),
    ("We need clean water",            "Muna bukatan ruwa mai tsabta"),
    ("Education is very important",    "Ilimi yana da muhimmanci sosai"),
    ("The clinic is open today",       "Asibitin yana bude yau"),
    ("Please help us",                 "Don Allah ku taimake mu"),
    ("The meeting will start at 9 AM", "Taron zai fara da karfe 9 na safe"),
    ("Children need vaccination",      "Yara suna bukatan allurar rigakafi"),
    ("Food distribution is tomorrow",  "Rabon abinci zai kasance gobe"),
    ("The school needs books",         "Makarantar tana bukatan littattafai"),
    ("Health care is a basic right",   "Kiwon lafiya hakki ne na asali"),
];

/// Write the sample corpus as `[{"english": .., "hausa": ..}]` JSON.
pub fn write_sample_dataset(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let records: Vec<_> = SAMPLE_PAIRS
        .iter()
        .map(|(english, hausa)| json!({ "english": english, "hausa": hausa }))
        .collect();
    let body = serde_json::to_string_pretty(&records)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    fs::write(path, body)?;
    tracing::info!("Sample data ({} pairs) saved to '{}'", SAMPLE_PAIRS.len(), path.display());
    Ok(())
}
