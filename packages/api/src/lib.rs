//! # patternbox-api
//!
//! HTTP client primitives for the patternbox backend.
//!
//! This crate provides the request helper every higher layer is built on,
//! plus a generic storage client for named entities.
//!
//! ## ApiClient
//!
//! Requests go to a configured base URL with a default JSON content type.
//! HTTP-level failure is data, not an `Err`:
//!
//! ```ignore
//! use patternbox_api::{ApiClient, ApiResponse};
//!
//! let client = ApiClient::new("http://localhost:8080/api")?;
//!
//! match client.get::<Vec<String>>("patterns/names").await? {
//!     ApiResponse::Data(names) => println!("{:?}", names),
//!     ApiResponse::Backend(msg) => eprintln!("backend said: {msg}"),
//! }
//! ```
//!
//! ## EntityStore
//!
//! Typed CRUD over one entity type. Backend errors surface as ordinary
//! `Err(Error::Backend(..))`:
//!
//! ```ignore
//! use patternbox_api::{ApiClient, EntityStore};
//! use std::sync::Arc;
//!
//! let client = Arc::new(ApiClient::new("http://localhost:8080/api")?);
//! let store = EntityStore::new(client, "patterns");
//!
//! let names = store.names().await?;
//! let record: serde_json::Value = store.get(&names[0]).await?;
//! ```

pub mod client;
pub mod error;
pub mod storage;

pub use client::{ApiClient, ApiResponse, RequestOptions};
pub use error::Error;
pub use storage::{EntityStore, SaveTarget};
