// ============================================================
// Layer 3 — Language Tags
// ============================================================
// The translator only knows two languages. Everything that
// arrives as a string (HTTP bodies, CLI flags, config keys) is
// parsed into this enum at the boundary, so the rest of the code
// never compares raw strings.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::error::TranslatorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Ha,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Ha];

    /// ISO 639-1 code used on the wire
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ha => "ha",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Ha => "Hausa",
        }
    }

    /// The other language of the pair
    pub fn opposite(self) -> Self {
        match self {
            Language::En => Language::Ha,
            Language::Ha => Language::En,
        }
    }

    /// Parse a source/target tag pair and enforce that they differ.
    pub fn parse_pair(source: &str, target: &str) -> Result<(Self, Self), TranslatorError> {
        let source: Language = source.parse()?;
        let target: Language = target.parse()?;
        if source == target {
            return Err(TranslatorError::InvalidLanguage(format!(
                "source and target language are both '{source}'"
            )));
        }
        Ok((source, target))
    }
}

impl FromStr for Language {
    type Err = TranslatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "ha" => Ok(Language::Ha),
            other => Err(TranslatorError::InvalidLanguage(format!(
                "unsupported language '{other}' (expected 'en' or 'ha')"
            ))),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
