use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{
    error::TranslatorError,
    language::Language,
    traits::{DecodingParams, ModelInfo},
};

pub const MAX_TEXT_CHARS: usize = 1000;
pub const MAX_BATCH_TEXTS: usize = 50;

fn default_source() -> String { "en".to_string() }
fn default_target() -> String { "ha".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    #[serde(default = "default_source")]
    pub source_lang: String,
    #[serde(default = "default_target")]
    pub target_lang: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranslateResponse {
    pub translation:   String,
    pub source_lang:   Language,
    pub target_lang:   Language,
    pub original_text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchTranslateRequest {
    pub texts: Vec<String>,
    #[serde(default = "default_source")]
    pub source_lang: String,
    #[serde(default = "default_target")]
    pub target_lang: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchTranslateResponse {
    pub translations: Vec<TranslateResponse>,
    pub count:        usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LanguageEntry {
    pub code: Language,
    pub name: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct LanguagesResponse {
    pub languages: Vec<LanguageEntry>,
    pub pairs:     Vec<[Language; 2]>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfoResponse {
    #[serde(flatten)]
    pub model:    ModelInfo,
    pub decoding: DecodingParams,
}

/// Reject texts the model was never meant to see in one request.
pub fn check_text_length(text: &str) -> Result<(), TranslatorError> {
    let chars = text.chars().count();
    if chars > MAX_TEXT_CHARS {
        return Err(TranslatorError::InvalidRequest(format!(
            "text has {chars} characters, the limit is {MAX_TEXT_CHARS}"
        )));
    }
    Ok(())
}

// ─── ApiError ─────────────────────────────────────────────────────────────────
/// Wraps a TranslatorError so handlers can return it with `?`.
#[derive(Debug)]
pub struct ApiError(pub TranslatorError);

impl From<TranslatorError> for ApiError {
    fn from(e: TranslatorError) -> Self {
        Self(e)
    }
}

/// Malformed or mistyped JSON bodies get the same envelope as
/// every other client error.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(TranslatorError::InvalidRequest(rejection.body_text()))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            TranslatorError::InvalidLanguage(_) | TranslatorError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::debug!("Rejected request: {}", self.0);
        }
        let body = Json(json!({
            "error":  self.0.kind(),
            "detail": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
