//! # patternbox-store
//!
//! The pattern data model and the reactive session cache built on
//! `patternbox-api`.
//!
//! ```ignore
//! use std::sync::Arc;
//! use patternbox_api::ApiClient;
//! use patternbox_store::{PatternStore, PatternStoreConfig};
//!
//! let client = Arc::new(ApiClient::new("http://localhost:8080/api")?);
//! let config = PatternStoreConfig::conventional("http://localhost:8080")?;
//! let store = PatternStore::new(client, config);
//!
//! let mut patterns = store.subscribe_patterns();
//! store.load_patterns().await;
//!
//! store.select_pattern("summarize");
//! println!("{}", store.system_prompt());
//! ```

pub mod pattern;
pub mod store;

pub use pattern::{filter_by_language, language_prefix, DescriptionManifest, Pattern, PatternDescription};
pub use store::{NewPattern, PatternStore, PatternStoreConfig, Selection};

// The error type is shared with the api crate; backend messages flow
// through unchanged.
pub use patternbox_api::Error;
