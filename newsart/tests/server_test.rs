use common::Config;
use newsart::server::build_rocket;
use newsart::storage::ImageStore;
use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::Client;

async fn client_with_images(stamps: &[i64], limit: usize) -> (Client, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = ImageStore::new(dir.path());
    for ts in stamps {
        store.persist_at(format!("img {}", ts).as_bytes(), *ts).await.unwrap();
    }

    let mut config = Config::default();
    config.images.output_dir = dir.path().display().to_string();
    config.server.recent_limit = limit;

    let client = Client::tracked(build_rocket(&config))
        .await
        .expect("valid rocket instance");
    (client, dir)
}

#[rocket::async_test]
async fn index_lists_most_recent_images_first() {
    let stamps: Vec<i64> = (1..=12).map(|i| 1_700_000_000 + i).collect();
    let (client, _dir) = client_with_images(&stamps, 10).await;

    let response = client.get("/").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.content_type(), Some(ContentType::HTML));

    let body = response.into_string().await.unwrap();
    assert_eq!(body.matches("<img").count(), 10);
    let newest = body.find("image_1700000012.jpg").unwrap();
    let older = body.find("image_1700000003.jpg").unwrap();
    assert!(newest < older);
    assert!(!body.contains("image_1700000002.jpg"));
}

#[rocket::async_test]
async fn images_api_respects_limit() {
    let (client, _dir) = client_with_images(&[10, 30, 20], 2).await;

    let response = client.get("/api/v1/images").dispatch().await;
    assert_eq!(response.status(), Status::Ok);

    let body: serde_json::Value = response.into_json().await.unwrap();
    assert_eq!(
        body,
        serde_json::json!({"images": ["image_30.jpg", "image_20.jpg"]})
    );
}

#[rocket::async_test]
async fn stored_images_are_served() {
    let (client, _dir) = client_with_images(&[42], 10).await;

    let response = client.get("/images/image_42.jpg").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.into_bytes().await.unwrap(), b"img 42");
}

#[rocket::async_test]
async fn empty_directory_renders_placeholder() {
    let (client, _dir) = client_with_images(&[], 10).await;

    let body = client.get("/").dispatch().await.into_string().await.unwrap();
    assert!(body.contains("No images generated yet."));
}

#[rocket::async_test]
async fn health_and_status() {
    let (client, _dir) = client_with_images(&[], 10).await;

    let health = client.get("/health").dispatch().await;
    assert_eq!(health.status(), Status::Ok);
    assert_eq!(health.into_string().await.unwrap(), "OK");

    let status: serde_json::Value = client
        .get("/api/v1/status")
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert_eq!(status["status"], "ok");
}
