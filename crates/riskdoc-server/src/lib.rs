//! HTTP server assembly for riskdoc.
//!
//! Nests the JSON API under `/api`, serves stored attachments under
//! [`FILES_PATH`], and wraps everything in request tracing.

pub mod attachments;
pub mod error;

pub use error::{Error, Result};

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use riskdoc_core::store::{DocumentStore, MemberDirectory};
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};

use attachments::FsAttachmentStore;

/// Route prefix under which uploaded files are served.
pub const FILES_PATH: &str = "/files";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `RISKDOC_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  pub store_path:          PathBuf,
  pub attachment_dir:      PathBuf,
  /// Prefix of attachment URLs handed to clients.
  #[serde(default = "default_attachment_base_url")]
  pub attachment_base_url: String,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_attachment_base_url() -> String { FILES_PATH.to_owned() }

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn app<S>(store: Arc<S>, attachments: Arc<FsAttachmentStore>) -> Router
where
  S: DocumentStore + MemberDirectory + 'static,
{
  let files = ServeDir::new(attachments.dir());
  Router::new()
    .nest("/api", riskdoc_api::api_router(store, attachments))
    .nest_service(FILES_PATH, files)
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use riskdoc_core::rows::Attachment;
  use riskdoc_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  async fn test_app(dir: &std::path::Path) -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let files = FsAttachmentStore::open(dir, FILES_PATH).await.unwrap();
    app(Arc::new(store), Arc::new(files))
  }

  async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
  }

  #[tokio::test]
  async fn api_is_nested() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_app(tmp.path()).await;

    let (status, body) = get(&app, "/api/risk-ranges").await;
    assert_eq!(status, StatusCode::OK);
    let ranges: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(ranges[1]["label"], "관리필요");

    let (status, _) = get(&app, "/risk-ranges").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn uploaded_file_is_served() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_app(tmp.path()).await;

    let req = Request::builder()
      .method("POST")
      .uri("/api/attachments?name=sign.png")
      .body(Body::from(b"\x89PNG signature".to_vec()))
      .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let attachment: Attachment = serde_json::from_slice(&bytes).unwrap();
    assert!(attachment.url.starts_with("/files/"));
    assert!(attachment.url.ends_with(".png"));

    let (status, body) = get(&app, &attachment.url).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"\x89PNG signature");
  }

  #[test]
  fn config_defaults() {
    let settings = config::Config::builder()
      .set_override("store_path", "riskdoc.db")
      .unwrap()
      .set_override("attachment_dir", "files")
      .unwrap()
      .build()
      .unwrap();
    let cfg: ServerConfig = settings.try_deserialize().unwrap();
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.attachment_base_url, FILES_PATH);
  }
}
