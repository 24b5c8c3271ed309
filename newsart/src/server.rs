use std::fmt::Write as _;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rocket::fs::{FileServer, Options};
use rocket::http::Status;
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::{get, routes, Build, Rocket, State};
use serde::Serialize;

use common::Config;

use crate::storage::ImageStore;

/// Application state stored inside Rocket managed state.
pub struct AppState {
    pub started_at: DateTime<Utc>,
    pub store: ImageStore,
    pub recent_limit: usize,
}

/// Response structure for `/api/v1/status`.
#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    uptime_seconds: i64,
    images_dir: String,
}

/// Response structure for `/api/v1/images`, newest first.
#[derive(Serialize)]
struct ImagesResponse {
    images: Vec<String>,
}

async fn recent_images(state: &AppState) -> Result<Vec<String>, Status> {
    state.store.list_recent(state.recent_limit).await.map_err(|e| {
        tracing::error!(error = %e, dir = %state.store.dir().display(), "failed to list images");
        Status::InternalServerError
    })
}

/// Index page: the most recent generated images.
#[get("/")]
async fn index(state: &State<AppState>) -> Result<RawHtml<String>, Status> {
    let images = recent_images(state).await?;
    Ok(RawHtml(render_index(&images)))
}

#[get("/health")]
async fn health() -> &'static str {
    "OK"
}

#[get("/api/v1/images")]
async fn list_images(state: &State<AppState>) -> Result<Json<ImagesResponse>, Status> {
    let images = recent_images(state).await?;
    Ok(Json(ImagesResponse { images }))
}

/// Status endpoint returning uptime and where images are read from.
#[get("/api/v1/status")]
async fn status(state: &State<AppState>) -> Json<StatusResponse> {
    let uptime = (Utc::now() - state.started_at).num_seconds();
    Json(StatusResponse {
        status: "ok",
        uptime_seconds: uptime,
        images_dir: state.store.dir().display().to_string(),
    })
}

// Names come from ImageStore::list_recent and only match `image_<digits>.jpg`,
// so they are inserted into the markup as-is.
fn render_index(images: &[String]) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>News in pictures</title>\n</head>\n<body>\n<h1>News in pictures</h1>\n",
    );
    if images.is_empty() {
        html.push_str("<p>No images generated yet.</p>\n");
    } else {
        html.push_str("<ul>\n");
        for name in images {
            let _ = writeln!(
                html,
                "<li><img src=\"/images/{name}\" alt=\"{name}\" width=\"512\"></li>"
            );
        }
        html.push_str("</ul>\n");
    }
    html.push_str("</body>\n</html>\n");
    html
}

/// Build the Rocket instance: routes, managed state, static images, bind address and port
/// from `[server]`.
pub fn build_rocket(config: &Config) -> Rocket<Build> {
    let store = ImageStore::new(&config.images.output_dir);
    let state = AppState {
        started_at: Utc::now(),
        store,
        recent_limit: config.server.recent_limit,
    };

    let fig = rocket::Config::figment()
        .merge(("address", config.server.bind.clone()))
        .merge(("port", config.server.port));

    rocket::custom(fig)
        .manage(state)
        .mount("/", routes![index, health, list_images, status])
        // The directory may not exist until the first image is stored.
        .mount("/images", FileServer::new(&config.images.output_dir, Options::Missing))
}

/// Launch the HTTP server and block until it shuts down.
pub async fn launch_rocket(config: &Config) -> Result<()> {
    tracing::info!(
        bind = %config.server.bind,
        port = config.server.port,
        "Starting Rocket HTTP server"
    );
    build_rocket(config)
        .launch()
        .await
        .map_err(|e| anyhow!("Rocket failed: {}", e))?;

    tracing::info!("Rocket HTTP server has shut down");
    Ok(())
}
