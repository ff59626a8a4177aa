//! Ollama, Gemini and web page clients against local stand-in servers

mod common;

use axum::{
    body::Bytes,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use base64::Engine;
use doc_chat::{
    config::{GeminiConfig, LlmConfig, OllamaConfig, WebConfig},
    ingestion::WebFetcher,
    providers::{
        EmbeddingProvider, GeminiClient, GeminiLlm, LlmProvider, OllamaClient, OllamaEmbedder,
        OllamaLlm, RetryPolicy,
    },
    retrieval::Attachment,
    DocumentKind, Error,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// A request seen by the stand-in server
#[derive(Debug, Clone)]
struct Seen {
    path: String,
    api_key: Option<String>,
    body: Value,
}

type Reply = dyn Fn(&str, usize) -> Response + Send + Sync;

/// Serve every request with `reply(path, request_number)` and record it
async fn stand_in(reply: Arc<Reply>) -> (SocketAddr, Arc<Mutex<Vec<Seen>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();

    let router = Router::new().fallback(move |uri: Uri, headers: HeaderMap, body: Bytes| {
        let log = log.clone();
        let reply = reply.clone();
        async move {
            let path = uri.path().to_string();
            let count = {
                let mut log = log.lock();
                log.push(Seen {
                    path: path.clone(),
                    api_key: headers
                        .get("x-goog-api-key")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string),
                    body: serde_json::from_slice(&body).unwrap_or(Value::Null),
                });
                log.len()
            };
            reply(&path, count)
        }
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (addr, seen)
}

fn json_reply(status: StatusCode, body: Value) -> Response {
    (status, axum::Json(body)).into_response()
}

fn no_retries() -> LlmConfig {
    LlmConfig {
        max_retries: 0,
        timeout_secs: 5,
        ..Default::default()
    }
}

fn ollama(addr: SocketAddr) -> OllamaClient {
    let config = OllamaConfig {
        base_url: format!("http://{}", addr),
        ..Default::default()
    };
    OllamaClient::new(&config, &no_retries()).unwrap()
}

fn gemini(addr: SocketAddr) -> GeminiClient {
    let config = GeminiConfig {
        api_key: Some("test-key".to_string()),
        base_url: format!("http://{}/v1beta", addr),
        generation_model: "gemini-test".to_string(),
        embedding_model: "embed-test".to_string(),
    };
    GeminiClient::new(&config, &no_retries()).unwrap()
}

#[tokio::test]
async fn test_ollama_embed_and_generate() {
    let (addr, seen) = stand_in(Arc::new(|path: &str, _: usize| match path {
        "/api/embeddings" => json_reply(StatusCode::OK, json!({ "embedding": [0.5, 0.25, 0.0] })),
        "/api/generate" => json_reply(StatusCode::OK, json!({ "response": "Paris", "done": true })),
        _ => json_reply(StatusCode::OK, json!({ "models": [] })),
    }))
    .await;
    let client = Arc::new(ollama(addr));

    let embedder = OllamaEmbedder::new(client.clone());
    assert_eq!(embedder.embed("hello").await.unwrap(), vec![0.5, 0.25, 0.0]);
    assert!(embedder.health_check().await.unwrap());

    let llm = OllamaLlm::new(client);
    assert_eq!(llm.complete("What is the capital?", None).await.unwrap(), "Paris");

    let seen = seen.lock();
    let embed = seen.iter().find(|s| s.path == "/api/embeddings").unwrap();
    assert_eq!(embed.body["model"], "nomic-embed-text");
    assert_eq!(embed.body["prompt"], "hello");
    let generate = seen.iter().find(|s| s.path == "/api/generate").unwrap();
    assert_eq!(generate.body["stream"], false);
    assert_eq!(generate.body["prompt"], "What is the capital?");
}

#[tokio::test]
async fn test_ollama_failure_is_model_error() {
    let (addr, _) = stand_in(Arc::new(|_: &str, _: usize| {
        (StatusCode::INTERNAL_SERVER_ERROR, "model not loaded").into_response()
    }))
    .await;

    let err = ollama(addr).generate("hi").await.unwrap_err();

    assert!(matches!(err, Error::ModelFailed(_)));
    assert!(err.to_string().contains("model not loaded"));
}

#[tokio::test]
async fn test_ollama_retries_transient_failures() {
    let (addr, seen) = stand_in(Arc::new(|_: &str, count: usize| {
        if count == 1 {
            (StatusCode::SERVICE_UNAVAILABLE, "warming up").into_response()
        } else {
            json_reply(StatusCode::OK, json!({ "embedding": [1.0] }))
        }
    }))
    .await;
    let client = ollama(addr).with_retry(RetryPolicy::new(2).with_base_delay(Duration::from_millis(5)));

    assert_eq!(client.embed("retry me").await.unwrap(), vec![1.0]);
    assert_eq!(seen.lock().len(), 2);
}

#[tokio::test]
async fn test_ollama_rejects_attachments() {
    let (addr, seen) = stand_in(Arc::new(|_: &str, _: usize| {
        json_reply(StatusCode::OK, json!({ "response": "unused" }))
    }))
    .await;
    let llm = OllamaLlm::new(Arc::new(ollama(addr)));
    let attachment = Attachment {
        bytes: Bytes::from_static(b"%PDF-1.5"),
        mime_type: "application/pdf".to_string(),
    };

    let err = llm.complete("question", Some(&attachment)).await.unwrap_err();

    assert!(matches!(err, Error::ModelFailed(_)));
    assert!(seen.lock().is_empty());
}

#[tokio::test]
async fn test_unreachable_ollama_is_unhealthy() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    assert!(!ollama(addr).health_check().await.unwrap());
}

#[tokio::test]
async fn test_gemini_generate_sends_key_and_inline_document() {
    let (addr, seen) = stand_in(Arc::new(|_: &str, _: usize| {
        json_reply(
            StatusCode::OK,
            json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "Paris" }, { "text": ", France" }] }
                }]
            }),
        )
    }))
    .await;
    let llm = GeminiLlm::new(Arc::new(gemini(addr)));
    let attachment = Attachment {
        bytes: Bytes::from_static(b"%PDF-1.5 fake"),
        mime_type: "application/pdf".to_string(),
    };

    let text = llm.complete("QUESTION: capital?", Some(&attachment)).await.unwrap();
    assert_eq!(text, "Paris, France");

    let seen = seen.lock();
    assert_eq!(seen[0].path, "/v1beta/models/gemini-test:generateContent");
    assert_eq!(seen[0].api_key.as_deref(), Some("test-key"));

    let parts = &seen[0].body["contents"][0]["parts"];
    assert_eq!(parts[0]["inlineData"]["mimeType"], "application/pdf");
    let data = parts[0]["inlineData"]["data"].as_str().unwrap();
    assert_eq!(
        base64::engine::general_purpose::STANDARD.decode(data).unwrap(),
        b"%PDF-1.5 fake"
    );
    assert_eq!(parts[1]["text"], "QUESTION: capital?");
}

#[tokio::test]
async fn test_gemini_rate_limit_is_model_error() {
    let (addr, seen) = stand_in(Arc::new(|_: &str, _: usize| {
        json_reply(
            StatusCode::TOO_MANY_REQUESTS,
            json!({ "error": { "code": 429, "status": "RESOURCE_EXHAUSTED" } }),
        )
    }))
    .await;

    let err = gemini(addr).generate("hi", None).await.unwrap_err();

    assert!(matches!(err, Error::ModelFailed(_)));
    assert!(err.to_string().contains("rate limited"));
    assert_eq!(seen.lock().len(), 1);
}

#[tokio::test]
async fn test_gemini_embed() {
    let (addr, seen) = stand_in(Arc::new(|_: &str, _: usize| {
        json_reply(StatusCode::OK, json!({ "embedding": { "values": [0.1, 0.2] } }))
    }))
    .await;

    let values = gemini(addr).embed("some chunk").await.unwrap();

    assert_eq!(values, vec![0.1, 0.2]);
    let seen = seen.lock();
    assert_eq!(seen[0].path, "/v1beta/models/embed-test:embedContent");
    assert_eq!(seen[0].body["model"], "models/embed-test");
    assert_eq!(seen[0].body["content"]["parts"][0]["text"], "some chunk");
}

#[tokio::test]
async fn test_gemini_empty_candidates_is_model_error() {
    let (addr, _) = stand_in(Arc::new(|_: &str, _: usize| {
        json_reply(StatusCode::OK, json!({ "candidates": [] }))
    }))
    .await;

    let err = gemini(addr).generate("hi", None).await.unwrap_err();

    assert!(matches!(err, Error::ModelFailed(_)));
}

fn web_config() -> WebConfig {
    WebConfig {
        timeout_secs: 5,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_fetch_web_page() {
    let (addr, _) = stand_in(Arc::new(|_: &str, _: usize| {
        (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            "<html><title>Notes</title><body><p>Lyon has silk workshops.</p></body></html>",
        )
            .into_response()
    }))
    .await;
    let fetcher = WebFetcher::new(&web_config()).unwrap();
    let url = WebFetcher::parse_url(&format!("http://{}/notes", addr)).unwrap();

    let document = fetcher.fetch(&url).await.unwrap();

    assert_eq!(document.kind, DocumentKind::WebPage);
    assert_eq!(document.source, format!("http://{}/notes", addr));
}

#[tokio::test]
async fn test_fetched_pdf_keeps_its_kind() {
    let (addr, _) = stand_in(Arc::new(|_: &str, _: usize| {
        ([(header::CONTENT_TYPE, "application/pdf")], common::france_pdf()).into_response()
    }))
    .await;
    let fetcher = WebFetcher::new(&web_config()).unwrap();
    let url = WebFetcher::parse_url(&format!("http://{}/facts.pdf", addr)).unwrap();

    let document = fetcher.fetch(&url).await.unwrap();

    assert_eq!(document.kind, DocumentKind::Pdf);
}

#[tokio::test]
async fn test_fetch_error_status_is_extraction_failure() {
    let (addr, _) = stand_in(Arc::new(|_: &str, _: usize| {
        (StatusCode::NOT_FOUND, "gone").into_response()
    }))
    .await;
    let fetcher = WebFetcher::new(&web_config()).unwrap();
    let url = WebFetcher::parse_url(&format!("http://{}/missing", addr)).unwrap();

    let err = fetcher.fetch(&url).await.unwrap_err();

    assert!(matches!(err, Error::ExtractionFailed { .. }));
}

#[tokio::test]
async fn test_oversized_page_is_rejected() {
    let (addr, _) = stand_in(Arc::new(|_: &str, _: usize| {
        ([(header::CONTENT_TYPE, "text/html")], "x".repeat(4096)).into_response()
    }))
    .await;
    let config = WebConfig {
        max_page_bytes: 1024,
        ..web_config()
    };
    let fetcher = WebFetcher::new(&config).unwrap();
    let url = WebFetcher::parse_url(&format!("http://{}/big", addr)).unwrap();

    let err = fetcher.fetch(&url).await.unwrap_err();

    assert!(matches!(err, Error::ExtractionFailed { .. }));
}

#[tokio::test]
async fn test_initialize_from_url_end_to_end() {
    let (addr, _) = stand_in(Arc::new(|_: &str, _: usize| {
        (
            [(header::CONTENT_TYPE, "text/html")],
            "<html><body><h1>Harbor guide</h1><p>The ferry leaves at nine every morning.</p></body></html>",
        )
            .into_response()
    }))
    .await;
    let (state, llm) = common::app();

    let index = state
        .coordinator()
        .ingest_url(&format!("http://{}/guide", addr), 1000, 200)
        .await
        .unwrap();
    assert_eq!(index.kind(), DocumentKind::WebPage);

    state.responder().answer("When does the ferry leave?").await.unwrap();
    assert!(llm.last_prompt().unwrap().contains("nine every morning"));
}
