use std::collections::HashMap;

use common::Config;
use mockito::Matcher;
use newsart::worker::run_generation;

const CREDENTIALS: [(&str, &str); 4] = [
    ("NEWSAPI_KEY", "news-key"),
    ("GROQ_API_KEY", "groq-key"),
    ("FB_API_KEY", "fb-key"),
    ("FB_SECRET_KEY", "fb-secret"),
];

fn config_for(server_url: &str, output_dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.news.api_url = server_url.to_string();
    config.llm.api_url = format!("{}/chat/completions", server_url);
    config.images.api_url = server_url.to_string();
    config.images.poll_interval_seconds = 0;
    config.images.output_dir = output_dir.display().to_string();
    config
}

#[tokio::test]
async fn missing_any_credential_makes_no_network_calls() {
    for missing in ["NEWSAPI_KEY", "GROQ_API_KEY", "FB_API_KEY", "FB_SECRET_KEY"] {
        let mut server = mockito::Server::new_async().await;
        let get = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let post = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&server.url(), dir.path());
        let env: HashMap<&str, &str> = CREDENTIALS
            .into_iter()
            .filter(|(name, _)| *name != missing)
            .collect();

        let outcome = run_generation(&config, |name| env.get(name).map(|v| v.to_string()))
            .await
            .expect("missing credentials are not an error");

        assert!(outcome.is_none(), "run should be skipped without {}", missing);
        get.assert_async().await;
        post.assert_async().await;
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}

#[tokio::test]
async fn full_run_against_mock_services() {
    let mut server = mockito::Server::new_async().await;
    let url = server.url();

    let news = server
        .mock("GET", "/v2/top-headlines")
        .match_query(Matcher::Any)
        .match_header("x-api-key", "news-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"status": "ok", "articles": [
                {"title": "Harbour storm", "description": "A storm closed the harbour."},
                {"title": "", "description": null}
            ]}"#,
        )
        .create_async()
        .await;

    let llm = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer groq-key")
        .match_body(Matcher::Regex("A storm closed the harbour.".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": "Storm shuts harbour."}}]}"#)
        .expect(1)
        .create_async()
        .await;

    let pipelines = server
        .mock("GET", "/key/api/v1/pipelines")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"pipelines": [{"id": "p-1"}]}"#)
        .create_async()
        .await;

    let run = server
        .mock("POST", "/key/api/v1/pipeline/p-1/run")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "generateParams": {"query": "Storm shuts harbour.", "style": "PHOTO"}
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": "job-1"}"#)
        .expect(1)
        .create_async()
        .await;

    let status = server
        .mock("GET", "/key/api/v1/pipeline/status/job-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(
            r#"{{"status": "DONE", "result": [{{"image": "{}/files/job-1.jpg"}}]}}"#,
            url
        ))
        .create_async()
        .await;

    let image = server
        .mock("GET", "/files/job-1.jpg")
        .with_status(200)
        .with_body(b"\xFF\xD8fake-jpeg")
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&url, &dir.path().join("images"));
    let env: HashMap<&str, &str> = CREDENTIALS.into_iter().collect();

    let report = run_generation(&config, |name| env.get(name).map(|v| v.to_string()))
        .await
        .expect("run")
        .expect("credentials present");

    assert_eq!(report.headlines, 2);
    assert_eq!(report.skipped_empty, 1);
    assert_eq!(report.generated.len(), 1);
    assert_eq!(std::fs::read(&report.generated[0]).unwrap(), b"\xFF\xD8fake-jpeg");

    for mock in [news, llm, pipelines, run, status, image] {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn unreachable_news_service_aborts_run() {
    let mut server = mockito::Server::new_async().await;
    let _news = server
        .mock("GET", "/v2/top-headlines")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;
    let pipelines = server
        .mock("GET", "/key/api/v1/pipelines")
        .expect(0)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&server.url(), dir.path());
    let env: HashMap<&str, &str> = CREDENTIALS.into_iter().collect();

    let err = run_generation(&config, |name| env.get(name).map(|v| v.to_string()))
        .await
        .unwrap_err();

    assert!(format!("{:#}", err).contains("503"));
    pipelines.assert_async().await;
}
