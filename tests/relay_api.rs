use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::oneshot;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use prompt_relay::llm::{GeminiClient, GroqClient, Provider, Providers};
use prompt_relay::security::CorsMiddleware;
use prompt_relay::{Relay, Request, Response, Router, Server, StatusCode, api};

const GEMINI_PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";
const GROQ_PATH: &str = "/openai/v1/chat/completions";

fn gemini_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
    }))
}

fn groq_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": text } }]
    }))
}

fn app(gemini: Option<&MockServer>, groq: Option<&MockServer>) -> Router {
    let timeout = Duration::from_secs(5);
    let mut providers = Providers::new();
    if let Some(server) = gemini {
        let client = GeminiClient::new("gemini-key", &server.uri(), timeout).unwrap();
        providers = providers.with(Provider::Gemini, Arc::new(client));
    }
    if let Some(server) = groq {
        let client = GroqClient::new("groq-key", &server.uri(), timeout).unwrap();
        providers = providers.with(Provider::Groq, Arc::new(client));
    }
    api::router(Arc::new(Relay::new(providers)), CorsMiddleware::permissive())
}

fn post(path: &str, body: &Value) -> Request {
    let body = body.to_string();
    let raw = format!(
        "POST {path} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );
    Request::parse(raw.as_bytes()).unwrap().0
}

fn get(path: &str) -> Request {
    let raw = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n\r\n");
    Request::parse(raw.as_bytes()).unwrap().0
}

fn json_of(res: &Response) -> Value {
    serde_json::from_slice(res.payload()).unwrap()
}

#[tokio::test]
async fn generate_with_gemini_returns_extracted_code() {
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(body_string_contains("Write a Python function to add two numbers."))
        .respond_with(gemini_reply("```python\ndef add(a,b):\n    return a+b\n```"))
        .expect(1)
        .mount(&gemini)
        .await;

    let res = app(Some(&gemini), None)
        .route(post(
            "/api/ai/generate",
            &json!({
                "prompt": "Write a Python function to add two numbers.",
                "modelProvider": "gemini",
                "language": "python",
                "complexity": "simple"
            }),
        ))
        .await;

    assert_eq!(res.status(), StatusCode::Ok);
    let body = json_of(&res);
    assert_eq!(body["model"], "gemini-2.0-flash");
    assert_eq!(body["modelProvider"], "gemini");
    assert_eq!(body["result"], "def add(a,b):\n    return a+b");
    assert!(body["time_taken"].as_str().unwrap().ends_with(" seconds"));
}

#[tokio::test]
async fn explain_with_groq_returns_text_verbatim() {
    let groq = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GROQ_PATH))
        .and(body_string_contains("Explain this code in clear, concise terms:"))
        .respond_with(groq_reply("This function adds two numbers."))
        .expect(1)
        .mount(&groq)
        .await;

    let res = app(None, Some(&groq))
        .route(post(
            "/api/ai/explain",
            &json!({ "prompt": "def f(a,b): return a+b", "modelProvider": "groq" }),
        ))
        .await;

    assert_eq!(res.status(), StatusCode::Ok);
    let body = json_of(&res);
    assert_eq!(body["model"], "llama-3.3-70b-versatile");
    assert_eq!(body["modelProvider"], "groq");
    assert_eq!(body["result"], "This function adds two numbers.");
}

#[tokio::test]
async fn missing_prompt_is_rejected_before_any_call() {
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(gemini_reply("unused"))
        .expect(0)
        .mount(&gemini)
        .await;

    let res = app(Some(&gemini), None)
        .route(post("/api/ai/generate", &json!({ "modelProvider": "gemini" })))
        .await;

    assert_eq!(res.status(), StatusCode::BadRequest);
    assert_eq!(json_of(&res), json!({ "error": "Missing \"prompt\" in request body" }));
}

#[tokio::test]
async fn unconfigured_provider_is_500_without_network_traffic() {
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(gemini_reply("unused"))
        .expect(0)
        .mount(&gemini)
        .await;

    let res = app(Some(&gemini), None)
        .route(post("/api/ai/explain", &json!({ "prompt": "x", "modelProvider": "groq" })))
        .await;

    assert_eq!(res.status(), StatusCode::InternalServerError);
    assert_eq!(
        json_of(&res)["error"],
        "Groq API key not configured in environment variables"
    );
}

#[tokio::test]
async fn unsupported_provider_is_400() {
    let res = app(None, None)
        .route(post(
            "/api/ai/generate",
            &json!({ "prompt": "x", "modelProvider": "openai" }),
        ))
        .await;

    assert_eq!(res.status(), StatusCode::BadRequest);
    assert_eq!(
        json_of(&res)["error"],
        "Unsupported model provider: openai. Supported providers are 'gemini' and 'groq'."
    );
}

#[tokio::test]
async fn upstream_failure_is_500_with_its_message() {
    let groq = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API Key"))
        .mount(&groq)
        .await;

    let res = app(None, Some(&groq))
        .route(post("/api/ai/explain", &json!({ "prompt": "x", "modelProvider": "Groq" })))
        .await;

    assert_eq!(res.status(), StatusCode::InternalServerError);
    assert_eq!(json_of(&res)["error"], "Groq API returned 401: Invalid API Key");
}

#[tokio::test]
async fn status_reflects_configured_keys() {
    let groq = MockServer::start().await;
    let res = app(None, Some(&groq)).route(get("/api/status")).await;

    assert_eq!(res.status(), StatusCode::Ok);
    assert_eq!(
        json_of(&res),
        json!({
            "status": "online",
            "endpoints": { "generate": "/api/ai/generate", "explain": "/api/ai/explain" },
            "api_keys": { "gemini": false, "groq": true }
        })
    );
}

#[tokio::test]
async fn unknown_route_and_wrong_method() {
    let app = app(None, None);

    let res = app.route(get("/api/ai/translate")).await;
    assert_eq!(res.status(), StatusCode::NotFound);
    assert_eq!(json_of(&res), json!({ "error": "Route not found" }));

    let res = app.route(get("/api/ai/generate")).await;
    assert_eq!(res.status(), StatusCode::MethodNotAllowed);
    assert_eq!(json_of(&res), json!({ "error": "Method not allowed" }));
}

#[tokio::test]
async fn cors_preflight_short_circuits() {
    let raw = "OPTIONS /api/ai/generate HTTP/1.1\r\nHost: localhost\r\nOrigin: http://localhost:5173\r\nAccess-Control-Request-Method: POST\r\n\r\n";
    let res = app(None, None)
        .route(Request::parse(raw.as_bytes()).unwrap().0)
        .await;

    assert_eq!(res.status(), StatusCode::NoContent);
    assert_eq!(res.headers().get("access-control-allow-origin"), Some("*"));
    assert_eq!(
        res.headers().get("access-control-allow-methods"),
        Some("GET, POST, OPTIONS")
    );
}

#[tokio::test]
async fn serves_relay_over_tcp() {
    let groq = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GROQ_PATH))
        .respond_with(groq_reply("Here you go:\n```rust\nfn add(a: i32, b: i32) -> i32 { a + b }\n```"))
        .mount(&groq)
        .await;

    let router = Arc::new(app(None, Some(&groq)));
    let server = Server::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let serving = tokio::spawn(server.run_until(
        move |req: Request| {
            let router = Arc::clone(&router);
            async move { router.route(req).await }
        },
        async {
            let _ = stop_rx.await;
        },
    ));

    let client = reqwest::Client::new();
    let res = client
        .post(format!("http://{addr}/api/ai/generate"))
        .header("Origin", "http://localhost:5173")
        .json(&json!({ "prompt": "add two ints", "modelProvider": "groq", "language": "rust" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(
        res.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["result"], "fn add(a: i32, b: i32) -> i32 { a + b }");

    let health: Value = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "OK");

    stop_tx.send(()).unwrap();
    serving.await.unwrap().unwrap();
}
