//! JSON REST API for safety documents.
//!
//! Exposes an axum [`Router`] backed by any
//! [`riskdoc_core::store::DocumentStore`] that is also a
//! [`riskdoc_core::store::MemberDirectory`], plus an
//! [`riskdoc_core::store::AttachmentStore`] for uploads. Auth, TLS, and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", riskdoc_api::api_router(store.clone(), attachments.clone()))
//! ```

pub mod attachments;
pub mod documents;
pub mod error;
pub mod members;
pub mod ranges;

use std::sync::Arc;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use riskdoc_core::store::{AttachmentStore, DocumentStore, MemberDirectory};

pub use error::ApiError;

/// Largest accepted attachment upload.
pub const MAX_ATTACHMENT_BYTES: usize = 20 * 1024 * 1024;

/// Shared handler state.
pub struct ApiState<S, A> {
  pub store:       Arc<S>,
  pub attachments: Arc<A>,
}

impl<S, A> Clone for ApiState<S, A> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), attachments: Arc::clone(&self.attachments) }
  }
}

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, A>(store: Arc<S>, attachments: Arc<A>) -> Router<()>
where
  S: DocumentStore + MemberDirectory + 'static,
  A: AttachmentStore + 'static,
{
  Router::new()
    // Documents
    .route("/documents", get(documents::list::<S, A>).post(documents::submit::<S, A>))
    .route("/documents/temporary", post(documents::temporary_save::<S, A>))
    .route("/documents/id/{id}", get(documents::get_one::<S, A>))
    .route("/documents/{reference}/open", get(documents::open::<S, A>))
    // Members
    .route("/members", get(members::search::<S, A>).post(members::create::<S, A>))
    // Risk ranges
    .route("/risk-ranges", get(ranges::list::<S, A>).put(ranges::replace::<S, A>))
    .route("/risk-ranges/resolve", post(ranges::resolve::<S, A>))
    // Attachments
    .route(
      "/attachments",
      post(attachments::upload::<S, A>).layer(DefaultBodyLimit::max(MAX_ATTACHMENT_BYTES)),
    )
    .with_state(ApiState { store, attachments })
}
