//! Core types and trait definitions for safety-document editing.
//!
//! This crate is free of HTTP and database dependencies. It holds the
//! document schemas and their row types, the editable form state, the
//! approval workflow, and the collaborator traits that backends implement.

// Native `async fn` in traits; the returned futures carry explicit `Send`
// bounds where the traits declare them.
#![allow(async_fn_in_trait)]

pub mod approval;
pub mod body;
pub mod draft;
pub mod error;
pub mod form;
pub mod list;
pub mod member;
pub mod reference;
pub mod risk;
pub mod rows;
pub mod schema;
pub mod session;
pub mod store;
pub mod validation;

pub use error::{Error, Result};
