use axum::{
    extract::{rejection::JsonRejection, State},
    response::Html,
    Json,
};
use serde_json::{json, Value};

use crate::api::{
    types::{
        check_text_length, ApiError, BatchTranslateRequest, BatchTranslateResponse,
        LanguageEntry, LanguagesResponse, ModelInfoResponse, TranslateRequest,
        TranslateResponse, MAX_BATCH_TEXTS,
    },
    AppState,
};
use crate::domain::{error::TranslatorError, language::Language};

const INDEX_HTML: &str = include_str!("../../web/index.html");

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "model_loaded": true }))
}

pub async fn languages() -> Json<LanguagesResponse> {
    let languages = Language::ALL
        .iter()
        .map(|&code| LanguageEntry { code, name: code.name() })
        .collect();
    let pairs = Language::ALL.iter().map(|&l| [l, l.opposite()]).collect();
    Json(LanguagesResponse { languages, pairs })
}

pub async fn model_info(State(state): State<AppState>) -> Json<ModelInfoResponse> {
    Json(ModelInfoResponse {
        model:    state.service.info(),
        decoding: state.service.decoding(),
    })
}

pub async fn translate(
    State(state): State<AppState>,
    body: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<Json<TranslateResponse>, ApiError> {
    let Json(req) = body?;
    check_text_length(&req.text)?;
    let response = run_blocking(state, req.text, req.source_lang, req.target_lang).await?;
    Ok(Json(response))
}

pub async fn translate_batch(
    State(state): State<AppState>,
    body: Result<Json<BatchTranslateRequest>, JsonRejection>,
) -> Result<Json<BatchTranslateResponse>, ApiError> {
    let Json(req) = body?;
    if req.texts.is_empty() || req.texts.len() > MAX_BATCH_TEXTS {
        return Err(TranslatorError::InvalidRequest(format!(
            "texts must hold between 1 and {MAX_BATCH_TEXTS} entries, got {}",
            req.texts.len()
        ))
        .into());
    }
    for text in &req.texts {
        check_text_length(text)?;
    }

    let mut translations = Vec::with_capacity(req.texts.len());
    for text in req.texts {
        let response =
            run_blocking(state.clone(), text, req.source_lang.clone(), req.target_lang.clone()).await?;
        translations.push(response);
    }
    let count = translations.len();
    Ok(Json(BatchTranslateResponse { translations, count }))
}

/// Run one translation on the blocking pool.
async fn run_blocking(
    state:  AppState,
    text:   String,
    source: String,
    target: String,
) -> Result<TranslateResponse, ApiError> {
    let joined = tokio::task::spawn_blocking(move || {
        state
            .service
            .translate(&text, &source, &target)
            .map(|t| TranslateResponse {
                translation:   t.text,
                source_lang:   t.source_lang,
                target_lang:   t.target_lang,
                original_text: text,
            })
    })
    .await
    .map_err(|e| TranslatorError::Inference(format!("translation task failed: {e}")))?;
    Ok(joined?)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use tower::ServiceExt;

    use crate::api::{create_router, AppState};
    use crate::application::translate_use_case::tests::service;

    fn app() -> Router {
        let (_, svc) = service(false);
        create_router(AppState::new(svc))
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_translate_ok() {
        let (status, body) = send(
            app(),
            "POST",
            "/translate",
            Some(serde_json::json!({ "text": "Good morning", "source_lang": "en", "target_lang": "ha" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["translation"], "[ha] Good morning");
        assert_eq!(body["original_text"], "Good morning");
        assert_eq!(body["target_lang"], "ha");
    }

    #[tokio::test]
    async fn test_same_language_is_bad_request() {
        let (status, body) = send(
            app(),
            "POST",
            "/translate",
            Some(serde_json::json!({ "text": "Hello", "source_lang": "en", "target_lang": "en" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_language");
    }

    #[tokio::test]
    async fn test_engine_failure_is_server_error() {
        let (status, body) = send(
            app(),
            "POST",
            "/translate",
            Some(serde_json::json!({ "text": "boom" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "inference_error");
    }

    #[tokio::test]
    async fn test_overlong_text_rejected() {
        let text = "a".repeat(1001);
        let (status, body) = send(app(), "POST", "/translate", Some(serde_json::json!({ "text": text }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_request");
    }

    #[tokio::test]
    async fn test_malformed_json_gets_error_envelope() {
        let cases = [
            ("/translate", "application/json", "{not json"),
            ("/translate", "application/json", r#"{"source_lang": "en"}"#),
            ("/translate", "text/plain", r#"{"text": "Hello"}"#),
            ("/translate/batch", "application/json", r#"{"texts": "Hello"}"#),
        ];
        for (uri, content_type, raw) in cases {
            let request = Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", content_type)
                .body(Body::from(raw))
                .unwrap();
            let response = app().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri} {raw}");
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(body["error"], "invalid_request");
            assert!(!body["detail"].as_str().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_batch_translates_each_text() {
        let (status, body) = send(
            app(),
            "POST",
            "/translate/batch",
            Some(serde_json::json!({ "texts": ["Good morning", ""], "source_lang": "en", "target_lang": "ha" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["translations"][0]["translation"], "[ha] Good morning");
        assert_eq!(body["translations"][1]["translation"], "");
    }

    #[tokio::test]
    async fn test_batch_limits() {
        let (status, _) = send(app(), "POST", "/translate/batch", Some(serde_json::json!({ "texts": [] }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let texts: Vec<String> = (0..51).map(|i| format!("text {i}")).collect();
        let (status, _) = send(app(), "POST", "/translate/batch", Some(serde_json::json!({ "texts": texts }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_info_endpoints() {
        let (status, body) = send(app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model_loaded"], true);

        let (_, body) = send(app(), "GET", "/languages", None).await;
        assert_eq!(body["languages"].as_array().unwrap().len(), 2);
        assert_eq!(body["pairs"][0], serde_json::json!(["en", "ha"]));

        let (_, body) = send(app(), "GET", "/model/info", None).await;
        assert_eq!(body["backend"], "mock");
        assert_eq!(body["decoding"]["beam_size"], 5);
    }

    #[tokio::test]
    async fn test_index_serves_html() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("/translate"));
    }
}
