use dashgen::{
    DashboardGenerator, Error, FinishReason, GeneratorConfig, LLMProvider, LLMRequest,
    OpenAICompatibleProvider, Prompt, ProviderFactory,
};
use serde_json::json;
use std::io::Write;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Load test fixture from file
fn load_fixture(filename: &str) -> String {
    let path = format!("{}/tests/fixtures/{filename}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to load test fixture: {path}"))
}

fn sse(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/event-stream")
        .insert_header("cache-control", "no-cache")
}

fn games_csv() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "title,console,publisher,total_sales,release_date").unwrap();
    writeln!(file, "Grand Theft Auto V,PS3,Rockstar Games,20.32,2013-09-17").unwrap();
    writeln!(file, "Call of Duty: Black Ops,X360,Activision,15.09,2010-11-09").unwrap();
    file
}

fn config_for(server: &MockServer) -> GeneratorConfig {
    let mut config = GeneratorConfig::new("test-key");
    config.base_url = format!("{}/v1", server.uri());
    config
}

#[tokio::test]
async fn test_generates_and_writes_dashboard() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gemini-2.0-flash",
            "stream": true,
            "stream_options": { "include_usage": true }
        })))
        .respond_with(sse(load_fixture("dashboard_stream.sse")))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let provider = ProviderFactory::create(&config).unwrap();
    let generator = DashboardGenerator::new(provider, config);

    let data = games_csv();
    let out_dir = tempfile::tempdir().unwrap();
    let out = out_dir.path().join("videogame_dashboard.py");

    let dashboard = generator
        .generate(data.path(), "Total sales per console for the top publishers")
        .await
        .unwrap();
    assert_eq!(dashboard.finish_reason, FinishReason::Stop);
    assert_eq!(dashboard.usage.input_tokens, 812);
    assert_eq!(dashboard.usage.output_tokens, 96);
    assert!(!dashboard.main_block_appended);

    generator.save(&dashboard, &out, false).unwrap();
    let written = std::fs::read_to_string(&out).unwrap();

    assert!(written.starts_with("# Generated by dashgen"));
    assert!(written.contains("#   Total sales per console for the top publishers\n"));
    assert!(written.contains("import dash\nfrom dash import dcc, html, Input, Output\n"));
    assert!(written.contains("df = pd.read_csv(r'games.csv')"));
    assert!(written.trim_end().ends_with("app.run(debug=True)"));
    assert!(!written.contains("```"));

    // The prompt carried the preview and the user's words.
    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let user = body["messages"][1]["content"].as_str().unwrap();
    assert_eq!(body["messages"][0]["role"], "system");
    assert!(user.contains("title, console, publisher, total_sales, release_date"));
    assert!(user.contains("Grand Theft Auto V,PS3,Rockstar Games,20.32,2013-09-17"));
    assert!(user.contains("Total sales per console for the top publishers"));
}

#[tokio::test]
async fn test_refusal_is_reported_and_nothing_written() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(sse(load_fixture("refusal_stream.sse")))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let generator = DashboardGenerator::new(ProviderFactory::create(&config).unwrap(), config);

    let data = games_csv();
    let out_dir = tempfile::tempdir().unwrap();
    let out = out_dir.path().join("dash.py");

    let err = generator
        .run(data.path(), "Anything", &out, false)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidResponse(ref msg) if msg.contains("I'm sorry")));
    assert!(!out.exists());
}

#[tokio::test]
async fn test_api_errors_are_mapped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!([{
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT"
            }
        }])))
        .mount(&server)
        .await;

    let provider =
        OpenAICompatibleProvider::new_with_base_url("bad-key".to_string(), format!("{}/v1", server.uri()))
            .unwrap();
    let request = LLMRequest::from_prompt("gemini-2.0-flash", &Prompt::user("hi"));

    match provider.generate(&request).await {
        Err(Error::Provider { provider, message }) => {
            assert_eq!(provider, "OpenAI-compatible");
            assert!(message.contains("API key not valid"));
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected an error"),
    }
}

#[tokio::test]
async fn test_rate_limit_and_auth_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer limited"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer revoked"))
        .respond_with(ResponseTemplate::new(401).set_body_string("{}"))
        .mount(&server)
        .await;

    let request = LLMRequest::from_prompt("gemini-2.0-flash", &Prompt::user("hi"));

    let limited =
        OpenAICompatibleProvider::new_with_base_url("limited".to_string(), server.uri()).unwrap();
    assert!(matches!(limited.generate(&request).await, Err(Error::RateLimit)));

    let revoked =
        OpenAICompatibleProvider::new_with_base_url("revoked".to_string(), server.uri()).unwrap();
    assert!(matches!(revoked.generate(&request).await, Err(Error::Auth(_))));
}

#[tokio::test]
async fn test_streamed_text_is_concatenated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(sse(load_fixture("dashboard_stream.sse")))
        .mount(&server)
        .await;

    let provider =
        OpenAICompatibleProvider::new_with_base_url("k".to_string(), server.uri()).unwrap();
    let request = LLMRequest::from_prompt("gemini-2.0-flash", &Prompt::user("hi")).max_tokens(2048);

    let text = provider.generate(&request).await.unwrap().text().await.unwrap();
    assert!(text.starts_with("```python\nimport dash"));
    assert!(text.ends_with("app.run(debug=True)\n```"));
}

#[tokio::test]
async fn test_error_inside_stream_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(sse(load_fixture("error_stream.sse")))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let generator = DashboardGenerator::new(ProviderFactory::create(&config).unwrap(), config);

    let data = games_csv();
    let out_dir = tempfile::tempdir().unwrap();
    let out = out_dir.path().join("dash.py");

    let err = generator
        .run(data.path(), "Sales per console", &out, false)
        .await
        .unwrap_err();
    assert!(
        matches!(err, Error::Streaming(ref msg) if msg.contains("Resource has been exhausted")),
        "unexpected error: {err}"
    );
    assert!(!out.exists());
}

#[tokio::test]
async fn test_truncated_stream_is_not_saved() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(sse(load_fixture("truncated_stream.sse")))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let generator = DashboardGenerator::new(ProviderFactory::create(&config).unwrap(), config);

    let data = games_csv();
    let out_dir = tempfile::tempdir().unwrap();
    let out = out_dir.path().join("dash.py");

    let err = generator
        .run(data.path(), "Sales per console", &out, false)
        .await
        .unwrap_err();
    assert!(
        matches!(err, Error::Streaming(ref msg) if msg.contains("ended before the model finished")),
        "unexpected error: {err}"
    );
    assert!(!out.exists());
}
